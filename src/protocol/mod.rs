// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BLE transport for communicating with Volcano devices.
//!
//! The transport is split in two traits so the link manager can create a
//! fresh client per connection attempt and drop it cleanly on failure:
//!
//! - [`Connector`]: resolves a device address and opens a [`GattClient`]
//! - [`GattClient`]: a single live connection (read, write, notify)
//!
//! The [`codec`] module holds the wire encodings for every characteristic.
//!
//! # Implementations
//!
//! - [`BleConnector`]: platform Bluetooth via `btleplug` (feature `ble`)

#[cfg(feature = "ble")]
mod ble;
pub mod codec;

#[cfg(feature = "ble")]
pub use ble::{BleClient, BleConnector};

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::types::DeviceAddress;

/// Primary service advertised by Volcano devices.
pub const VOLCANO_SERVICE_UUID: Uuid = Uuid::from_u128(0x1010_0000_5354_4f52_5a26_4249_434b_454c);

/// GATT characteristics used by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Write-only switch that turns the heater on.
    HeatOn,
    /// Write-only switch that turns the heater off.
    HeatOff,
    /// Write-only switch that turns the fan on.
    FanOn,
    /// Write-only switch that turns the fan off.
    FanOff,
    /// Target temperature, u16 LE tenths of °C.
    TargetTemperature,
    /// Current temperature, u16 LE tenths of °C. Notifies.
    CurrentTemperature,
    /// 16-bit status register. Notifies.
    StatusRegister,
    /// Screen brightness, one byte 0-100.
    ScreenBrightness,
    /// BLE module firmware version string.
    BleFirmwareVersion,
    /// Heater firmware version string.
    VolcanoFirmwareVersion,
    /// Serial number string.
    SerialNumber,
    /// Total hours of operation.
    HoursOfOperation,
    /// Minutes part of the operation counter.
    MinutesOfOperation,
}

impl Characteristic {
    /// All characteristics known to the library.
    pub const ALL: [Self; 13] = [
        Self::HeatOn,
        Self::HeatOff,
        Self::FanOn,
        Self::FanOff,
        Self::TargetTemperature,
        Self::CurrentTemperature,
        Self::StatusRegister,
        Self::ScreenBrightness,
        Self::BleFirmwareVersion,
        Self::VolcanoFirmwareVersion,
        Self::SerialNumber,
        Self::HoursOfOperation,
        Self::MinutesOfOperation,
    ];

    /// Characteristics subscribed to after connecting.
    pub const NOTIFYING: [Self; 2] = [Self::CurrentTemperature, Self::StatusRegister];

    /// Returns the characteristic UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        let prefix: u128 = match self {
            Self::HeatOn => 0x1011_000f,
            Self::HeatOff => 0x1011_0010,
            Self::FanOn => 0x1011_0013,
            Self::FanOff => 0x1011_0014,
            Self::TargetTemperature => 0x1011_0003,
            Self::CurrentTemperature => 0x1011_0001,
            Self::StatusRegister => 0x1010_000c,
            Self::ScreenBrightness => 0x1011_0005,
            Self::BleFirmwareVersion => 0x1010_0004,
            Self::VolcanoFirmwareVersion => 0x1010_0003,
            Self::SerialNumber => 0x1010_0008,
            Self::HoursOfOperation => 0x1011_0015,
            Self::MinutesOfOperation => 0x1011_0016,
        };
        Uuid::from_u128((prefix << 96) | 0x5354_4f52_5a26_4249_434b_454c)
    }

    /// Looks up a characteristic by UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    /// Returns a human readable name, used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeatOn => "heat on",
            Self::HeatOff => "heat off",
            Self::FanOn => "fan on",
            Self::FanOff => "fan off",
            Self::TargetTemperature => "target temperature",
            Self::CurrentTemperature => "current temperature",
            Self::StatusRegister => "status register",
            Self::ScreenBrightness => "screen brightness",
            Self::BleFirmwareVersion => "BLE firmware version",
            Self::VolcanoFirmwareVersion => "Volcano firmware version",
            Self::SerialNumber => "serial number",
            Self::HoursOfOperation => "hours of operation",
            Self::MinutesOfOperation => "minutes of operation",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Asynchronous events delivered by a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A subscribed characteristic pushed a new value.
    Notification {
        /// The characteristic that notified.
        characteristic: Characteristic,
        /// The raw payload.
        value: Vec<u8>,
    },
    /// The peripheral dropped the connection.
    Disconnected,
}

/// Stream of [`LinkEvent`]s for one connection.
pub type LinkEventStream = BoxStream<'static, LinkEvent>;

/// Resolves a device address and opens a connection to it.
///
/// A new client is created for every connection attempt; the link manager
/// drops it when the attempt fails or the device disconnects.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Client: GattClient;

    /// Resolves the peripheral for `address` and connects to it.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::DeviceNotFound` if no connectable peripheral
    /// with that address is visible, or any transport error raised while
    /// connecting.
    async fn connect(&self, address: &DeviceAddress) -> Result<Self::Client, ProtocolError>;

    /// Tears down any link to `address` left behind by an attempt that
    /// never produced a client, such as one cut short by a timeout.
    ///
    /// The default does nothing.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the link could not be closed.
    async fn abandon(&self, _address: &DeviceAddress) -> Result<(), ProtocolError> {
        Ok(())
    }
}

/// A live GATT connection to one device.
///
/// Implementations are not expected to serialise requests themselves; the
/// link manager never issues overlapping operations on the same client.
#[async_trait]
pub trait GattClient: Send + Sync + 'static {
    /// Returns `true` while the underlying connection is up.
    async fn is_connected(&self) -> bool;

    /// Reads the current value of a characteristic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the read fails.
    async fn read(&self, characteristic: Characteristic) -> Result<Vec<u8>, ProtocolError>;

    /// Writes a value to a characteristic, waiting for the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the write fails.
    async fn write(&self, characteristic: Characteristic, value: &[u8])
    -> Result<(), ProtocolError>;

    /// Enables notifications for a characteristic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the subscription fails.
    async fn subscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError>;

    /// Disables notifications for a characteristic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn unsubscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError>;

    /// Returns the stream of notifications and disconnect events.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the stream cannot be opened.
    async fn events(&self) -> Result<LinkEventStream, ProtocolError>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the platform reports a failure.
    async fn disconnect(&self) -> Result<(), ProtocolError>;
}
