// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only sensors.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::coordinator::{Coordinator, round_one_decimal};
use crate::protocol::Connector;
use crate::state::DeviceInfo;

/// Link state as shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionStatus {
    /// The last poll reached the device.
    Connected,
    /// The device is out of reach.
    Disconnected,
}

impl ConnectionStatus {
    /// Icon name for the status.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Connected => "mdi:bluetooth-connect",
            Self::Disconnected => "mdi:bluetooth-off",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Connected"),
            Self::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// All sensor values derived from the coordinator.
///
/// Durations are in minutes unless the method name says otherwise, rounded
/// to one decimal.
pub struct Sensors<C: Connector> {
    coordinator: Arc<Coordinator<C>>,
}

impl<C: Connector> Sensors<C> {
    /// Creates the sensor set.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self { coordinator }
    }

    /// Target temperature from the last poll.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.coordinator
            .snapshot()
            .and_then(|snapshot| snapshot.target_temperature)
    }

    /// Whether the last poll reached the device.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        match self.coordinator.snapshot() {
            Some(snapshot) if snapshot.connected => ConnectionStatus::Connected,
            _ => ConnectionStatus::Disconnected,
        }
    }

    /// Sessions started today.
    #[must_use]
    pub fn sessions_today(&self) -> u32 {
        self.coordinator.session_summary().sessions_today
    }

    /// Sessions started since the coordinator was created.
    #[must_use]
    pub fn total_sessions(&self) -> u64 {
        self.coordinator.session_summary().total_sessions
    }

    /// Length of the last completed session.
    #[must_use]
    pub fn last_session_duration(&self) -> Option<f64> {
        self.coordinator
            .session_summary()
            .last_session_duration
            .map(round_one_decimal)
    }

    /// Mean length of the last completed sessions.
    #[must_use]
    pub fn average_session_duration(&self) -> Option<f64> {
        self.coordinator.session_summary().average_session_duration
    }

    /// Hours since the last session ended.
    #[must_use]
    pub fn time_since_last_use_hours(&self) -> Option<f64> {
        let elapsed = self
            .coordinator
            .usage_statistics()
            .time_since_last_use(Utc::now())?;
        #[allow(clippy::cast_precision_loss)]
        let hours = elapsed.num_seconds() as f64 / 3600.0;
        Some(round_one_decimal(hours))
    }

    /// Most frequent session temperature over the last 30 days, in °C.
    #[must_use]
    pub fn favorite_temperature(&self) -> Option<f64> {
        self.coordinator
            .usage_statistics()
            .favorite_temperature(30, Utc::now())
    }

    /// Total session time today.
    #[must_use]
    pub fn total_runtime_today(&self) -> f64 {
        round_one_decimal(
            self.coordinator
                .usage_statistics()
                .total_runtime_today(Utc::now()),
        )
    }

    /// Mean session length over the last 7 days.
    #[must_use]
    pub fn average_duration_7d(&self) -> f64 {
        round_one_decimal(
            self.coordinator
                .usage_statistics()
                .average_session_duration(7, Utc::now()),
        )
    }

    /// Device information from the last slow-path poll.
    #[must_use]
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.coordinator.device_info()
    }

    /// Heater firmware version.
    #[must_use]
    pub fn volcano_firmware_version(&self) -> Option<String> {
        self.device_info()?.volcano_firmware_version
    }

    /// BLE module firmware version.
    #[must_use]
    pub fn ble_firmware_version(&self) -> Option<String> {
        self.device_info()?.ble_firmware_version
    }

    /// Serial number.
    #[must_use]
    pub fn serial_number(&self) -> Option<String> {
        self.device_info()?.serial_number
    }

    /// Hours of operation.
    #[must_use]
    pub fn hours_of_operation(&self) -> Option<u32> {
        self.device_info()?.hours_of_operation
    }

    /// Minutes of operation.
    #[must_use]
    pub fn minutes_of_operation(&self) -> Option<u32> {
        self.device_info()?.minutes_of_operation
    }
}

impl<C: Connector> fmt::Debug for Sensors<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensors")
            .field("connection_status", &self.connection_status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_status_labels() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(ConnectionStatus::Disconnected.icon(), "mdi:bluetooth-off");
    }
}
