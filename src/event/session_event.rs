// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Usage session events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events derived from consecutive poll samples.
///
/// Serialized with a `type` tag so automations can match on it:
///
/// ```
/// use chrono::Utc;
/// use volcano_lib::event::SessionEvent;
///
/// let event = SessionEvent::FanStarted {
///     timestamp: Utc::now(),
///     session_active: true,
/// };
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["type"], "fan_started");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Heater climbed from cold towards a real target.
    SessionStarted {
        /// Target temperature in °C.
        target_temperature: f64,
        /// Current temperature in °C.
        current_temperature: f64,
        /// Session start time.
        timestamp: DateTime<Utc>,
        /// Sessions started today, this one included.
        session_count_today: u32,
        /// Sessions started overall, this one included.
        total_sessions: u64,
    },

    /// Current temperature came within 5 °C of the target.
    TemperatureReached {
        /// Target temperature in °C.
        target_temperature: f64,
        /// Current temperature in °C.
        actual_temperature: f64,
        /// When it was observed.
        timestamp: DateTime<Utc>,
        /// Whether a session is open.
        session_active: bool,
    },

    /// An open session was closed.
    SessionEnded {
        /// Session length in minutes, one decimal.
        duration_minutes: f64,
        /// When the session started.
        start_time: DateTime<Utc>,
        /// When the session ended.
        end_time: DateTime<Utc>,
        /// Same as `end_time`.
        timestamp: DateTime<Utc>,
    },

    /// Fan switched on.
    FanStarted {
        /// When it was observed.
        timestamp: DateTime<Utc>,
        /// Whether a session is open.
        session_active: bool,
    },

    /// Fan switched off.
    FanStopped {
        /// When it was observed.
        timestamp: DateTime<Utc>,
        /// Whether a session is open.
        session_active: bool,
    },
}

impl SessionEvent {
    /// Returns the serialized `type` tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::TemperatureReached { .. } => "temperature_reached",
            Self::SessionEnded { .. } => "session_ended",
            Self::FanStarted { .. } => "fan_started",
            Self::FanStopped { .. } => "fan_stopped",
        }
    }

    /// Returns when the event happened.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionStarted { timestamp, .. }
            | Self::TemperatureReached { timestamp, .. }
            | Self::SessionEnded { timestamp, .. }
            | Self::FanStarted { timestamp, .. }
            | Self::FanStopped { timestamp, .. } => *timestamp,
        }
    }
}
