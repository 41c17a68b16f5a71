// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport shared by the integration tests.
//!
//! [`FakeConnector`] simulates a Volcano: switch writes flip the status
//! register, the target temperature write is stored, and reads return the
//! stored values. Tests script failures and push notifications through the
//! same handle they gave to the device.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use parking_lot::Mutex;
use volcano_lib::error::ProtocolError;
use volcano_lib::protocol::{Characteristic, Connector, GattClient, LinkEvent, LinkEventStream};
use volcano_lib::types::DeviceAddress;
use volcano_lib::{VolcanoConfig, VolcanoDevice};

pub const ADDRESS: &str = "00:11:22:33:44:55";

const HEAT_BIT: u16 = 0x0020;
const FAN_BIT: u16 = 0x2000;

struct FakeState {
    values: HashMap<Characteristic, Vec<u8>>,
    writes: Vec<(Characteristic, Vec<u8>)>,
    subscriptions: Vec<Characteristic>,
    connect_attempts: u32,
    failing_connects: u32,
    hang_connects: bool,
    failing_reads: HashSet<Characteristic>,
    failing_writes: bool,
    failing_events: bool,
    connected: bool,
    disconnects: u32,
    abandoned: u32,
    events: Option<mpsc::UnboundedSender<LinkEvent>>,
}

impl Default for FakeState {
    fn default() -> Self {
        let mut values = HashMap::new();
        values.insert(Characteristic::CurrentTemperature, 250_u16.to_le_bytes().to_vec());
        values.insert(Characteristic::TargetTemperature, 1850_u16.to_le_bytes().to_vec());
        values.insert(Characteristic::StatusRegister, vec![0x00, 0x00]);
        values.insert(Characteristic::BleFirmwareVersion, b"V01.0.7\0".to_vec());
        values.insert(Characteristic::VolcanoFirmwareVersion, b"V2.38".to_vec());
        values.insert(Characteristic::SerialNumber, b"VH123456".to_vec());
        values.insert(Characteristic::HoursOfOperation, 412_u16.to_le_bytes().to_vec());
        values.insert(Characteristic::MinutesOfOperation, 27_u32.to_le_bytes().to_vec());
        Self {
            values,
            writes: Vec::new(),
            subscriptions: Vec::new(),
            connect_attempts: 0,
            failing_connects: 0,
            hang_connects: false,
            failing_reads: HashSet::new(),
            failing_writes: false,
            failing_events: false,
            connected: false,
            disconnects: 0,
            abandoned: 0,
            events: None,
        }
    }
}

impl FakeState {
    fn status(&self) -> u16 {
        self.values
            .get(&Characteristic::StatusRegister)
            .map_or(0, |v| u16::from_le_bytes([v[0], v[1]]))
    }

    fn set_status_bits(&mut self, bit: u16, on: bool) {
        let status = if on {
            self.status() | bit
        } else {
            self.status() & !bit
        };
        self.values
            .insert(Characteristic::StatusRegister, status.to_le_bytes().to_vec());
    }
}

/// Cloneable handle to a simulated device.
#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- scripting -----

    pub fn set_current(&self, tenths: u16) {
        self.state
            .lock()
            .values
            .insert(Characteristic::CurrentTemperature, tenths.to_le_bytes().to_vec());
    }

    pub fn set_target(&self, tenths: u16) {
        self.state
            .lock()
            .values
            .insert(Characteristic::TargetTemperature, tenths.to_le_bytes().to_vec());
    }

    pub fn set_heat(&self, on: bool) {
        self.state.lock().set_status_bits(HEAT_BIT, on);
    }

    pub fn set_fan(&self, on: bool) {
        self.state.lock().set_status_bits(FAN_BIT, on);
    }

    pub fn set_raw(&self, characteristic: Characteristic, value: &[u8]) {
        self.state.lock().values.insert(characteristic, value.to_vec());
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: u32) {
        self.state.lock().failing_connects = count;
    }

    /// Makes connection attempts bring the link up, then never complete.
    pub fn hang_connects(&self, hang: bool) {
        self.state.lock().hang_connects = hang;
    }

    pub fn fail_reads(&self, characteristic: Characteristic) {
        self.state.lock().failing_reads.insert(characteristic);
    }

    pub fn heal_reads(&self) {
        self.state.lock().failing_reads.clear();
    }

    pub fn fail_writes(&self, failing: bool) {
        self.state.lock().failing_writes = failing;
    }

    pub fn fail_events(&self, failing: bool) {
        self.state.lock().failing_events = failing;
    }

    /// Pushes a notification to the live connection.
    pub fn notify(&self, characteristic: Characteristic, value: &[u8]) {
        if let Some(tx) = self.state.lock().events.as_ref() {
            let _ = tx.unbounded_send(LinkEvent::Notification {
                characteristic,
                value: value.to_vec(),
            });
        }
    }

    /// Simulates the peripheral dropping the link.
    pub fn drop_link(&self) {
        let mut state = self.state.lock();
        state.connected = false;
        if let Some(tx) = state.events.take() {
            let _ = tx.unbounded_send(LinkEvent::Disconnected);
        }
    }

    // ----- inspection -----

    pub fn connect_attempts(&self) -> u32 {
        self.state.lock().connect_attempts
    }

    pub fn disconnects(&self) -> u32 {
        self.state.lock().disconnects
    }

    pub fn abandoned(&self) -> u32 {
        self.state.lock().abandoned
    }

    pub fn is_linked(&self) -> bool {
        self.state.lock().connected
    }

    pub fn writes(&self) -> Vec<(Characteristic, Vec<u8>)> {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, characteristic: Characteristic) -> Vec<Vec<u8>> {
        self.writes()
            .into_iter()
            .filter(|(c, _)| *c == characteristic)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<Characteristic> {
        self.state.lock().subscriptions.clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self, address: &DeviceAddress) -> Result<FakeClient, ProtocolError> {
        let hang = {
            let mut state = self.state.lock();
            state.connect_attempts += 1;
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                return Err(ProtocolError::DeviceNotFound(address.to_string()));
            }
            state.hang_connects
        };
        self.state.lock().connected = true;
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(FakeClient {
            state: self.state.clone(),
        })
    }

    async fn abandon(&self, _address: &DeviceAddress) -> Result<(), ProtocolError> {
        let mut state = self.state.lock();
        state.abandoned += 1;
        state.connected = false;
        Ok(())
    }
}

pub struct FakeClient {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl GattClient for FakeClient {
    async fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn read(&self, characteristic: Characteristic) -> Result<Vec<u8>, ProtocolError> {
        let state = self.state.lock();
        if !state.connected || state.failing_reads.contains(&characteristic) {
            return Err(ProtocolError::ConnectionFailed(format!(
                "read {characteristic} failed"
            )));
        }
        state
            .values
            .get(&characteristic)
            .cloned()
            .ok_or(ProtocolError::CharacteristicNotFound(characteristic.uuid()))
    }

    async fn write(
        &self,
        characteristic: Characteristic,
        value: &[u8],
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock();
        if !state.connected || state.failing_writes {
            return Err(ProtocolError::ConnectionFailed(format!(
                "write {characteristic} failed"
            )));
        }
        state.writes.push((characteristic, value.to_vec()));
        match characteristic {
            Characteristic::HeatOn => state.set_status_bits(HEAT_BIT, true),
            Characteristic::HeatOff => state.set_status_bits(HEAT_BIT, false),
            Characteristic::FanOn => state.set_status_bits(FAN_BIT, true),
            Characteristic::FanOff => state.set_status_bits(FAN_BIT, false),
            other => {
                state.values.insert(other, value.to_vec());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError> {
        self.state.lock().subscriptions.push(characteristic);
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError> {
        self.state
            .lock()
            .subscriptions
            .retain(|c| *c != characteristic);
        Ok(())
    }

    async fn events(&self) -> Result<LinkEventStream, ProtocolError> {
        let mut state = self.state.lock();
        if state.failing_events {
            return Err(ProtocolError::ChannelClosed("notifications".to_string()));
        }
        let (tx, rx) = mpsc::unbounded();
        state.events = Some(tx);
        Ok(rx.boxed())
    }

    async fn disconnect(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock();
        state.connected = false;
        state.disconnects += 1;
        state.events = None;
        Ok(())
    }
}

/// Config with no settle delay and short timings.
pub fn config() -> VolcanoConfig {
    VolcanoConfig::new(ADDRESS.parse().unwrap())
        .with_settle_delay(Duration::ZERO)
        .with_retry_backoff(Duration::from_secs(2))
        .with_connect_timeout(Duration::from_secs(15))
}

pub fn device(fake: &FakeConnector) -> VolcanoDevice<FakeConnector> {
    VolcanoDevice::new(fake.clone(), config())
}

/// Lets spawned tasks (listener, timers) run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
