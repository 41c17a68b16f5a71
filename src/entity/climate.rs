// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater as a thermostat.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinator::Coordinator;
use crate::protocol::Connector;
use crate::types::Temperature;

use super::complete;

/// Heater operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    /// Heater on.
    Heat,
    /// Heater off.
    Off,
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heat => f.write_str("heat"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Thermostat view of the heater.
#[derive(Debug)]
pub struct Climate<C: Connector> {
    coordinator: Arc<Coordinator<C>>,
}

impl<C: Connector> Clone for Climate<C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<C: Connector> Climate<C> {
    /// Lowest settable target, in °C.
    pub const MIN_TEMPERATURE: f64 = Temperature::MIN_CELSIUS;

    /// Highest settable target, in °C.
    pub const MAX_TEMPERATURE: f64 = Temperature::MAX_CELSIUS;

    /// Target temperature step, in °C.
    pub const TEMPERATURE_STEP: f64 = 1.0;

    /// Creates the climate entity.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self { coordinator }
    }

    /// Returns `true` if the last poll reached the device.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.coordinator
            .snapshot()
            .is_some_and(|snapshot| snapshot.connected)
    }

    /// Heater temperature from the last poll.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.coordinator
            .snapshot()
            .and_then(|snapshot| snapshot.current_temperature)
    }

    /// Target temperature from the last poll.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.coordinator
            .snapshot()
            .and_then(|snapshot| snapshot.target_temperature)
    }

    /// Current mode; [`HvacMode::Off`] until the first poll.
    #[must_use]
    pub fn hvac_mode(&self) -> HvacMode {
        match self.coordinator.snapshot() {
            Some(snapshot) if snapshot.heat_on => HvacMode::Heat,
            _ => HvacMode::Off,
        }
    }

    /// Switches the heater to match `mode`.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> bool {
        let device = self.coordinator.device();
        let result = match mode {
            HvacMode::Heat => device.heat_on().await,
            HvacMode::Off => device.heat_off().await,
        };
        complete(&self.coordinator, "set hvac mode", result)
    }

    /// Sets the target temperature in °C.
    ///
    /// Values outside 40-230 °C are rejected without touching the device.
    pub async fn set_temperature(&self, celsius: f64) -> bool {
        let result = self
            .coordinator
            .device()
            .set_target_temperature(celsius)
            .await;
        complete(&self.coordinator, "set temperature", result)
    }

    /// Turns the heater on.
    pub async fn turn_on(&self) -> bool {
        self.set_hvac_mode(HvacMode::Heat).await
    }

    /// Turns the heater off.
    pub async fn turn_off(&self) -> bool {
        self.set_hvac_mode(HvacMode::Off).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hvac_mode_serde_and_display() {
        assert_eq!(serde_json::to_string(&HvacMode::Heat).unwrap(), "\"heat\"");
        assert_eq!(
            serde_json::from_str::<HvacMode>("\"off\"").unwrap(),
            HvacMode::Off
        );
        assert_eq!(HvacMode::Heat.to_string(), "heat");
    }
}
