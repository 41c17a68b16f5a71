// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric settings: fan timer length and screen brightness.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::coordinator::Coordinator;
use crate::protocol::Connector;
use crate::types::{Brightness, FanTimer};

use super::{Fan, complete};

/// Locally stored fan timer length.
///
/// The value never leaves the library; [`start`](Self::start) runs the
/// fan for that long through a [`Fan`] entity.
pub struct FanTimerNumber<C: Connector> {
    fan: Arc<Fan<C>>,
    value: RwLock<FanTimer>,
}

impl<C: Connector> FanTimerNumber<C> {
    /// Creates the number with the configured `fan_timer`.
    ///
    /// Falls back to 30 seconds if the configured value is out of range.
    #[must_use]
    pub fn new(fan: Arc<Fan<C>>) -> Self {
        let configured = fan.coordinator().device().config().fan_timer.as_secs();
        let value = u16::try_from(configured)
            .ok()
            .and_then(|seconds| FanTimer::new(seconds).ok())
            .unwrap_or_default();
        Self::with_value(fan, value)
    }

    /// Creates the number with an initial value.
    #[must_use]
    pub fn with_value(fan: Arc<Fan<C>>, value: FanTimer) -> Self {
        Self {
            fan,
            value: RwLock::new(value),
        }
    }

    /// Current timer length.
    #[must_use]
    pub fn value(&self) -> FanTimer {
        *self.value.read()
    }

    /// Stores a new timer length in seconds.
    ///
    /// Values outside 1-300 are logged and ignored.
    pub fn set_value(&self, seconds: u16) -> bool {
        match FanTimer::new(seconds) {
            Ok(timer) => {
                *self.value.write() = timer;
                debug!(%timer, "fan timer set");
                true
            }
            Err(error) => {
                error!(%error, "invalid fan timer");
                false
            }
        }
    }

    /// Turns the fan on for the stored duration.
    pub async fn start(&self) -> bool {
        let duration = self.value().as_duration();
        self.fan.turn_on(Some(duration)).await
    }
}

impl<C: Connector> std::fmt::Debug for FanTimerNumber<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanTimerNumber")
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

/// Screen brightness.
///
/// The device does not report brightness back, so the value shown is the
/// last one written successfully (70 % until then).
pub struct BrightnessNumber<C: Connector> {
    coordinator: Arc<Coordinator<C>>,
    value: RwLock<Brightness>,
}

impl<C: Connector> BrightnessNumber<C> {
    /// Creates the number.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self {
            coordinator,
            value: RwLock::new(Brightness::DEFAULT),
        }
    }

    /// Last written brightness.
    #[must_use]
    pub fn value(&self) -> Brightness {
        *self.value.read()
    }

    /// Writes the screen brightness in percent.
    ///
    /// The stored value only changes if the device accepted the write.
    pub async fn set_value(&self, percent: u8) -> bool {
        let result = self
            .coordinator
            .device()
            .set_screen_brightness(percent)
            .await;
        if let Ok(brightness) = &result {
            *self.value.write() = *brightness;
        }
        complete(&self.coordinator, "screen brightness", result)
    }
}

impl<C: Connector> std::fmt::Debug for BrightnessNumber<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrightnessNumber")
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}
