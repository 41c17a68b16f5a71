// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll results handed to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static information read from the device.
///
/// Refreshed on a slow cadence by the coordinator. Every field is optional
/// because individual reads may fail independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// BLE module firmware version.
    pub ble_firmware_version: Option<String>,
    /// Heater firmware version.
    pub volcano_firmware_version: Option<String>,
    /// Device serial number.
    pub serial_number: Option<String>,
    /// Total hours of operation.
    pub hours_of_operation: Option<u32>,
    /// Minutes part of the operation counter.
    pub minutes_of_operation: Option<u32>,
}

impl DeviceInfo {
    /// Returns `true` if no field could be read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Session counters derived by the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Sessions started since local midnight.
    pub sessions_today: u32,
    /// Sessions started since the coordinator was created.
    pub total_sessions: u64,
    /// Whether a session is currently open.
    pub session_active: bool,
    /// Duration of the most recent completed session, in minutes.
    pub last_session_duration: Option<f64>,
    /// Rolling average of recent session durations, in minutes.
    pub average_session_duration: Option<f64>,
    /// When the most recent session ended.
    pub last_session_end: Option<DateTime<Utc>>,
}

/// Merged device state produced by one poll cycle.
///
/// # Examples
///
/// ```
/// use volcano_lib::state::Snapshot;
///
/// let snapshot = Snapshot::disconnected();
/// assert!(!snapshot.connected);
/// assert_eq!(snapshot.current_temperature, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Whether the link was up during the poll.
    pub connected: bool,
    /// Heater temperature in °C.
    pub current_temperature: Option<f64>,
    /// Target temperature in °C.
    pub target_temperature: Option<f64>,
    /// Heater switched on.
    pub heat_on: bool,
    /// Air pump switched on.
    pub fan_on: bool,
    /// Static device information, if it has been read.
    pub device_info: Option<DeviceInfo>,
    /// Session counters.
    pub statistics: SessionSummary,
}

impl Snapshot {
    /// The snapshot reported while the device is unreachable.
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Same as [`Snapshot::disconnected`] but keeps known session counters.
    #[must_use]
    pub fn disconnected_with(statistics: SessionSummary) -> Self {
        Self {
            statistics,
            ..Self::default()
        }
    }
}
