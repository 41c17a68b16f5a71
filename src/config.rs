// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runtime configuration for a Volcano device.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::event::DEFAULT_CHANNEL_CAPACITY;
use crate::types::DeviceAddress;

/// Configuration for one device and its coordinator.
///
/// Only `address` is required when deserializing; every other field falls
/// back to its default. Durations are expressed in milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use volcano_lib::VolcanoConfig;
///
/// let config = VolcanoConfig::from_json(r#"{ "address": "00:11:22:33:44:55" }"#).unwrap();
/// assert_eq!(config.connect_retries, 3);
///
/// let config = config
///     .with_connect_retries(5)
///     .with_settle_delay(Duration::ZERO);
/// assert_eq!(config.connect_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolcanoConfig {
    /// Bluetooth address of the device.
    pub address: DeviceAddress,

    /// Attempts made by an explicit `connect()`.
    #[serde(default = "defaults::connect_retries")]
    pub connect_retries: u32,

    /// Attempts made when a poll cycle finds the link down.
    #[serde(default = "defaults::poll_connect_retries")]
    pub poll_connect_retries: u32,

    /// Pause between connection attempts.
    #[serde(default = "defaults::retry_backoff", with = "duration_ms")]
    pub retry_backoff: Duration,

    /// Upper bound for a single connection attempt.
    #[serde(default = "defaults::connect_timeout", with = "duration_ms")]
    pub connect_timeout: Duration,

    /// Wait between a switch write and its verification read.
    #[serde(default = "defaults::settle_delay", with = "duration_ms")]
    pub settle_delay: Duration,

    /// Device information is re-read every this many poll cycles.
    #[serde(default = "defaults::device_info_every")]
    pub device_info_every: u32,

    /// Capacity of the event bus.
    #[serde(default = "defaults::event_capacity")]
    pub event_capacity: usize,

    /// Default auto-off delay for the fan timer.
    #[serde(default = "defaults::fan_timer", with = "duration_ms")]
    pub fan_timer: Duration,
}

mod defaults {
    use std::time::Duration;

    pub(super) fn connect_retries() -> u32 {
        3
    }

    pub(super) fn poll_connect_retries() -> u32 {
        2
    }

    pub(super) fn retry_backoff() -> Duration {
        Duration::from_secs(2)
    }

    pub(super) fn connect_timeout() -> Duration {
        Duration::from_secs(15)
    }

    pub(super) fn settle_delay() -> Duration {
        Duration::from_millis(100)
    }

    pub(super) fn device_info_every() -> u32 {
        120
    }

    pub(super) fn event_capacity() -> usize {
        super::DEFAULT_CHANNEL_CAPACITY
    }

    pub(super) fn fan_timer() -> Duration {
        Duration::from_secs(30)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl VolcanoConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            connect_retries: defaults::connect_retries(),
            poll_connect_retries: defaults::poll_connect_retries(),
            retry_backoff: defaults::retry_backoff(),
            connect_timeout: defaults::connect_timeout(),
            settle_delay: defaults::settle_delay(),
            device_info_every: defaults::device_info_every(),
            event_capacity: defaults::event_capacity(),
            fan_timer: defaults::fan_timer(),
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the document is malformed, lacks an
    /// address, or the address is not a valid Bluetooth address.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(ParseError::from)
            .map_err(Into::into)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(ParseError::from)
            .map_err(Into::into)
    }

    /// Sets the number of attempts for an explicit connect.
    #[must_use]
    pub fn with_connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }

    /// Sets the number of attempts made from the poll loop.
    #[must_use]
    pub fn with_poll_connect_retries(mut self, retries: u32) -> Self {
        self.poll_connect_retries = retries;
        self
    }

    /// Sets the pause between connection attempts.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the per-attempt connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the delay between a switch write and its verification.
    ///
    /// Zero is allowed.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets how many poll cycles pass between device info reads.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub fn with_device_info_every(mut self, cycles: u32) -> Self {
        self.device_info_every = cycles.max(1);
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the default fan timer.
    #[must_use]
    pub fn with_fan_timer(mut self, duration: Duration) -> Self {
        self.fan_timer = duration;
        self
    }
}
