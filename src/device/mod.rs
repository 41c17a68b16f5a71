// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BLE link manager for a single Volcano device.
//!
//! [`VolcanoDevice`] owns at most one live connection. It connects with a
//! capped number of attempts, keeps a state cache fed by notifications, and
//! exposes every characteristic as a typed async operation.
//!
//! ```no_run
//! use volcano_lib::{VolcanoConfig, VolcanoDevice};
//! use volcano_lib::protocol::BleConnector;
//!
//! # async fn example() -> volcano_lib::Result<()> {
//! let config = VolcanoConfig::new("00:11:22:33:44:55".parse()?);
//! let device = VolcanoDevice::new(BleConnector::new().await?, config);
//!
//! device.connect(3).await?;
//! device.set_target_temperature(185.0).await?;
//! device.heat_on().await?;
//! println!("heater at {:?}", device.current_temperature().await);
//! device.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod listener;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::VolcanoConfig;
use crate::error::{Error, ProtocolError, Result};
use crate::event::{EventBus, VolcanoEvent};
use crate::protocol::{Characteristic, Connector, GattClient, codec};
use crate::state::{DeviceInfo, DeviceState, StateChange};
use crate::subscription::{Subscribable, SubscriptionId};
use crate::types::{Brightness, DeviceAddress, StatusRegister, Temperature};

use listener::Shared;

/// A Volcano Hybrid reachable through a [`Connector`].
///
/// All GATT operations go through one async mutex, so requests on the same
/// device never overlap. The cached [`DeviceState`] is readable at any time
/// without touching the link.
pub struct VolcanoDevice<C: Connector> {
    connector: C,
    config: VolcanoConfig,
    client: Mutex<Option<C::Client>>,
    listener: SyncMutex<Option<JoinHandle<()>>>,
    shared: Shared,
}

impl<C: Connector> VolcanoDevice<C> {
    /// Creates a disconnected device.
    #[must_use]
    pub fn new(connector: C, config: VolcanoConfig) -> Self {
        let events = EventBus::with_capacity(config.event_capacity);
        Self::with_event_bus(connector, config, events)
    }

    /// Creates a disconnected device publishing on an existing bus.
    #[must_use]
    pub fn with_event_bus(connector: C, config: VolcanoConfig, events: EventBus) -> Self {
        Self {
            shared: Shared::new(config.address.clone(), events),
            connector,
            config,
            client: Mutex::new(None),
            listener: SyncMutex::new(None),
        }
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.config.address
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VolcanoConfig {
        &self.config
    }

    /// Returns the event bus this device publishes on.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.events
    }

    /// Returns a copy of the cached state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        *self.shared.state.read()
    }

    /// Stores the callback run when the link drops on its own.
    ///
    /// Replaces any previously stored callback. Not invoked for
    /// [`disconnect`](Self::disconnect).
    pub fn set_disconnect_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.on_disconnect.write() = Some(Arc::new(callback));
    }

    /// Removes the disconnect callback.
    pub fn clear_disconnect_callback(&self) {
        *self.shared.on_disconnect.write() = None;
    }

    // ========== Connection ==========

    /// Connects to the device, trying up to `max_retries` times.
    ///
    /// Waits `retry_backoff` between attempts. Each attempt is bounded by
    /// `connect_timeout`. A `max_retries` of zero is treated as one.
    /// Returns immediately if the link is already up.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ConnectionFailed` carrying the last error if
    /// every attempt failed.
    #[instrument(skip(self), fields(address = %self.config.address))]
    pub async fn connect(&self, max_retries: u32) -> Result<()> {
        let mut slot = self.client.lock().await;

        if self.shared.is_flagged_connected()
            && let Some(client) = slot.as_ref()
            && client.is_connected().await
        {
            return Ok(());
        }
        if let Some(stale) = slot.take() {
            self.stop_listener();
            self.shared.connected.store(false, Ordering::Release);
            if let Err(error) = stale.disconnect().await {
                debug!(%error, "failed to close stale client");
            }
        }

        let attempts = max_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            info!(attempt, max_retries = attempts, "connecting");
            match self.open_link().await {
                Ok(client) => {
                    *slot = Some(client);
                    self.shared.connected.store(true, Ordering::Release);
                    info!(attempt, "connected");
                    self.shared.callbacks.dispatch_connected(&self.state());
                    self.shared.events.publish(VolcanoEvent::Connected);
                    return Ok(());
                }
                Err(error) => {
                    warn!(attempt, max_retries = attempts, %error, "connection attempt failed");
                    last_error = Some(error);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }

        let reason = last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
        error!(attempts, %reason, "giving up");
        Err(ProtocolError::ConnectionFailed(format!(
            "{} after {attempts} attempt(s): {reason}",
            self.config.address
        ))
        .into())
    }

    /// One connection attempt: open, subscribe, start listening.
    async fn open_link(&self) -> std::result::Result<C::Client, ProtocolError> {
        let timeout = self.config.connect_timeout;
        let address = &self.config.address;
        let Ok(connected) = tokio::time::timeout(timeout, self.connector.connect(address)).await
        else {
            // The dropped attempt may have brought the link up without a client
            if let Err(error) = self.connector.abandon(address).await {
                debug!(%error, "failed to close timed-out link");
            }
            return Err(ProtocolError::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ));
        };
        let client = connected?;

        for characteristic in Characteristic::NOTIFYING {
            if let Err(error) = client.subscribe(characteristic).await {
                warn!(%characteristic, %error, "failed to enable notifications");
            }
        }

        let events = match client.events().await {
            Ok(events) => events,
            Err(error) => {
                if let Err(close_error) = client.disconnect().await {
                    debug!(error = %close_error, "failed to close partial client");
                }
                return Err(error);
            }
        };

        self.stop_listener();
        let task = tokio::spawn(self.shared.clone().listen(events));
        *self.listener.lock() = Some(task);
        Ok(client)
    }

    fn stop_listener(&self) {
        if let Some(task) = self.listener.lock().take() {
            task.abort();
        }
    }

    /// Closes the connection.
    ///
    /// Always leaves the device disconnected: unsubscribe failures are
    /// logged at debug level and close failures at error level.
    #[instrument(skip(self), fields(address = %self.config.address))]
    pub async fn disconnect(&self) {
        let mut slot = self.client.lock().await;
        let was_connected = self.shared.connected.swap(false, Ordering::AcqRel);
        self.stop_listener();

        if let Some(client) = slot.take() {
            for characteristic in Characteristic::NOTIFYING {
                if let Err(error) = client.unsubscribe(characteristic).await {
                    debug!(%characteristic, %error, "failed to disable notifications");
                }
            }
            if let Err(error) = client.disconnect().await {
                error!(%error, "failed to close connection");
            }
        }

        if was_connected {
            info!("disconnected");
            self.shared.callbacks.dispatch_disconnected();
            self.shared
                .events
                .publish(VolcanoEvent::Disconnected { unexpected: false });
        }
    }

    /// Returns `true` if the link is up.
    ///
    /// Requires the connected flag, a client handle, and the client itself
    /// reporting a live connection.
    pub async fn is_connected(&self) -> bool {
        if !self.shared.is_flagged_connected() {
            return false;
        }
        match self.client.lock().await.as_ref() {
            Some(client) => client.is_connected().await,
            None => false,
        }
    }

    /// Makes a single connection attempt if the link is down.
    async fn ensure_connected_once(&self) -> bool {
        if self.is_connected().await {
            return true;
        }
        match self.connect(1).await {
            Ok(()) => true,
            Err(error) => {
                debug!(address = %self.config.address, %error, "reconnect for read failed");
                false
            }
        }
    }

    // ========== Raw access ==========

    async fn read_raw(&self, characteristic: Characteristic) -> Result<Vec<u8>> {
        let slot = self.client.lock().await;
        let client = match slot.as_ref() {
            Some(client) if self.shared.is_flagged_connected() && client.is_connected().await => {
                client
            }
            _ => return Err(Error::NotConnected),
        };
        let value = client.read(characteristic).await?;
        debug!(address = %self.config.address, %characteristic, ?value, "read");
        Ok(value)
    }

    async fn write_raw(&self, characteristic: Characteristic, value: &[u8]) -> Result<()> {
        let slot = self.client.lock().await;
        let client = match slot.as_ref() {
            Some(client) if self.shared.is_flagged_connected() && client.is_connected().await => {
                client
            }
            _ => return Err(Error::NotConnected),
        };
        debug!(address = %self.config.address, %characteristic, ?value, "write");
        client.write(characteristic, value).await.map_err(|error| {
            error!(address = %self.config.address, %characteristic, %error, "write failed");
            Error::from(error)
        })
    }

    // ========== Temperature ==========

    /// Reads the heater temperature.
    ///
    /// If the link is down, makes exactly one connection attempt first.
    /// Returns `None` if that attempt or the read fails.
    pub async fn current_temperature(&self) -> Option<Temperature> {
        self.tolerant_temperature(Characteristic::CurrentTemperature).await
    }

    /// Reads the target temperature.
    ///
    /// Same reconnect behaviour as [`current_temperature`](Self::current_temperature).
    pub async fn target_temperature(&self) -> Option<Temperature> {
        self.tolerant_temperature(Characteristic::TargetTemperature).await
    }

    async fn tolerant_temperature(&self, characteristic: Characteristic) -> Option<Temperature> {
        if !self.ensure_connected_once().await {
            return None;
        }
        let result = self
            .read_raw(characteristic)
            .await
            .and_then(|raw| codec::decode_temperature(&raw).map_err(Error::from));
        match result {
            Ok(temperature) => {
                let change = if characteristic == Characteristic::CurrentTemperature {
                    StateChange::CurrentTemperature(temperature)
                } else {
                    StateChange::TargetTemperature(temperature)
                };
                self.shared.apply(change);
                Some(temperature)
            }
            Err(error) => {
                error!(address = %self.config.address, %characteristic, %error, "read failed");
                None
            }
        }
    }

    /// Sets the target temperature in °C.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TemperatureOutOfRange` before any I/O if the
    /// value is outside 40-230 °C, `Error::NotConnected` if the link is
    /// down, or the transport error if the write fails.
    pub async fn set_target_temperature(&self, celsius: f64) -> Result<Temperature> {
        let temperature = Temperature::new(celsius)?;
        self.write_raw(
            Characteristic::TargetTemperature,
            &codec::encode_temperature(temperature),
        )
        .await?;
        info!(address = %self.config.address, %temperature, "target temperature set");
        self.shared
            .apply(StateChange::TargetTemperature(temperature));
        Ok(temperature)
    }

    // ========== Heater & Fan ==========

    /// Switches the heater and returns the state confirmed by the device.
    ///
    /// After the write, waits `settle_delay` and reads the status register.
    /// If that read fails the requested value is cached and returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected` if the link is down, or the transport
    /// error if the write fails.
    pub async fn set_heat(&self, on: bool) -> Result<bool> {
        let characteristic = if on {
            Characteristic::HeatOn
        } else {
            Characteristic::HeatOff
        };
        self.write_raw(characteristic, codec::switch_payload(on)).await?;
        Ok(self
            .confirm_switch(on, StateChange::Heat, StatusRegister::heat_on)
            .await)
    }

    /// Turns the heater on.
    ///
    /// # Errors
    ///
    /// See [`set_heat`](Self::set_heat).
    pub async fn heat_on(&self) -> Result<bool> {
        self.set_heat(true).await
    }

    /// Turns the heater off.
    ///
    /// # Errors
    ///
    /// See [`set_heat`](Self::set_heat).
    pub async fn heat_off(&self) -> Result<bool> {
        self.set_heat(false).await
    }

    /// Switches the air pump and returns the state confirmed by the device.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected` if the link is down, or the transport
    /// error if the write fails.
    pub async fn set_fan(&self, on: bool) -> Result<bool> {
        let characteristic = if on {
            Characteristic::FanOn
        } else {
            Characteristic::FanOff
        };
        self.write_raw(characteristic, codec::switch_payload(on)).await?;
        Ok(self
            .confirm_switch(on, StateChange::Fan, StatusRegister::fan_on)
            .await)
    }

    /// Turns the fan on.
    ///
    /// # Errors
    ///
    /// See [`set_fan`](Self::set_fan).
    pub async fn fan_on(&self) -> Result<bool> {
        self.set_fan(true).await
    }

    /// Turns the fan off.
    ///
    /// # Errors
    ///
    /// See [`set_fan`](Self::set_fan).
    pub async fn fan_off(&self) -> Result<bool> {
        self.set_fan(false).await
    }

    async fn confirm_switch(
        &self,
        requested: bool,
        change: fn(bool) -> StateChange,
        field: fn(&StatusRegister) -> bool,
    ) -> bool {
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        match self.read_status().await {
            Ok(status) => {
                let confirmed = field(&status);
                if confirmed != requested {
                    warn!(
                        address = %self.config.address,
                        requested,
                        confirmed,
                        "device did not confirm switch"
                    );
                }
                confirmed
            }
            Err(error) => {
                warn!(
                    address = %self.config.address,
                    %error,
                    "verification read failed, assuming success"
                );
                self.shared.apply(change(requested));
                requested
            }
        }
    }

    // ========== Status & Display ==========

    /// Reads the status register and refreshes the cached heat/fan state.
    ///
    /// Fields that moved are dispatched to subscribers like a notification.
    /// # Errors
    ///
    /// Returns `Error::NotConnected` if the link is down, a transport error
    /// if the read fails, or `ParseError::ShortRead` for a truncated value.
    pub async fn read_status(&self) -> Result<StatusRegister> {
        let raw = self.read_raw(Characteristic::StatusRegister).await?;
        let status = codec::decode_status(&raw)?;
        self.shared.apply(StateChange::from_status(status));
        Ok(status)
    }

    /// Reads the status register and returns the refreshed cached state.
    ///
    /// # Errors
    ///
    /// See [`read_status`](Self::read_status).
    pub async fn device_state(&self) -> Result<DeviceState> {
        self.read_status().await?;
        Ok(self.state())
    }

    /// Sets the screen brightness in percent.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` before any I/O if the value exceeds
    /// 100, `Error::NotConnected` if the link is down, or the transport
    /// error if the write fails.
    pub async fn set_screen_brightness(&self, percent: u8) -> Result<Brightness> {
        let brightness = Brightness::new(percent)?;
        self.write_raw(
            Characteristic::ScreenBrightness,
            &codec::encode_brightness(brightness),
        )
        .await?;
        Ok(brightness)
    }

    // ========== Device Information ==========

    /// Reads the BLE module firmware version.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected`, a transport error, or
    /// `ParseError::InvalidUtf8`.
    pub async fn ble_firmware_version(&self) -> Result<String> {
        self.read_string(Characteristic::BleFirmwareVersion).await
    }

    /// Reads the heater firmware version.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected`, a transport error, or
    /// `ParseError::InvalidUtf8`.
    pub async fn volcano_firmware_version(&self) -> Result<String> {
        self.read_string(Characteristic::VolcanoFirmwareVersion).await
    }

    /// Reads the serial number.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected`, a transport error, or
    /// `ParseError::InvalidUtf8`.
    pub async fn serial_number(&self) -> Result<String> {
        self.read_string(Characteristic::SerialNumber).await
    }

    /// Reads the hours of operation counter.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected`, a transport error, or
    /// `ParseError::UnexpectedLength`.
    pub async fn hours_of_operation(&self) -> Result<u32> {
        self.read_counter(Characteristic::HoursOfOperation).await
    }

    /// Reads the minutes of operation counter.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected`, a transport error, or
    /// `ParseError::UnexpectedLength`.
    pub async fn minutes_of_operation(&self) -> Result<u32> {
        self.read_counter(Characteristic::MinutesOfOperation).await
    }

    /// Reads every information characteristic.
    ///
    /// Individual read failures are logged and leave that field empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConnected` if the link is down.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        if !self.is_connected().await {
            return Err(Error::NotConnected);
        }
        Ok(DeviceInfo {
            ble_firmware_version: self.optional(self.ble_firmware_version().await),
            volcano_firmware_version: self.optional(self.volcano_firmware_version().await),
            serial_number: self.optional(self.serial_number().await),
            hours_of_operation: self.optional(self.hours_of_operation().await),
            minutes_of_operation: self.optional(self.minutes_of_operation().await),
        })
    }

    fn optional<T>(&self, result: Result<T>) -> Option<T> {
        result
            .inspect_err(|error| {
                warn!(address = %self.config.address, %error, "device info read failed");
            })
            .ok()
    }

    async fn read_string(&self, characteristic: Characteristic) -> Result<String> {
        let raw = self.read_raw(characteristic).await?;
        Ok(codec::decode_string(characteristic.name(), &raw)?)
    }

    async fn read_counter(&self, characteristic: Characteristic) -> Result<u32> {
        let raw = self.read_raw(characteristic).await?;
        Ok(codec::decode_counter(characteristic.name(), &raw)?)
    }
}

impl<C: Connector> Subscribable for VolcanoDevice<C> {
    fn on_heat_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_heat_changed(callback)
    }

    fn on_fan_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_fan_changed(callback)
    }

    fn on_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_temperature_changed(callback)
    }

    fn on_target_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static,
    {
        self.shared
            .callbacks
            .on_target_temperature_changed(callback)
    }

    fn on_connected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_connected(callback)
    }

    fn on_disconnected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.callbacks.on_disconnected(callback)
    }

    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_state_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.callbacks.unsubscribe(id)
    }
}

impl<C: Connector> std::fmt::Debug for VolcanoDevice<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolcanoDevice")
            .field("address", &self.config.address)
            .field("connected", &self.shared.is_flagged_connected())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Drop for VolcanoDevice<C> {
    fn drop(&mut self) {
        self.stop_listener();
    }
}
