// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use crate::types::{StatusRegister, Temperature};

use super::StateChange;

/// Last known state of a Volcano device.
///
/// All fields are optional because nothing is known until the device
/// reports it, either through a notification or a poll read.
///
/// # Examples
///
/// ```
/// use volcano_lib::state::{DeviceState, StateChange};
/// use volcano_lib::types::Temperature;
///
/// let mut state = DeviceState::new();
/// state.apply(&StateChange::TargetTemperature(Temperature::new(185.0).unwrap()));
/// assert_eq!(state.target_temperature().map(|t| t.celsius()), Some(185.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    current_temperature: Option<Temperature>,
    target_temperature: Option<Temperature>,
    heat_on: Option<bool>,
    fan_on: Option<bool>,
}

impl DeviceState {
    /// Creates a new empty device state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Temperatures ==========

    /// Gets the last reported heater temperature.
    #[must_use]
    pub fn current_temperature(&self) -> Option<Temperature> {
        self.current_temperature
    }

    /// Sets the current temperature.
    pub fn set_current_temperature(&mut self, temperature: Temperature) {
        self.current_temperature = Some(temperature);
    }

    /// Gets the last known target temperature.
    #[must_use]
    pub fn target_temperature(&self) -> Option<Temperature> {
        self.target_temperature
    }

    /// Sets the target temperature.
    pub fn set_target_temperature(&mut self, temperature: Temperature) {
        self.target_temperature = Some(temperature);
    }

    // ========== Switches ==========

    /// Gets the heater state.
    #[must_use]
    pub fn heat_on(&self) -> Option<bool> {
        self.heat_on
    }

    /// Sets the heater state.
    pub fn set_heat_on(&mut self, on: bool) {
        self.heat_on = Some(on);
    }

    /// Gets the fan state.
    #[must_use]
    pub fn fan_on(&self) -> Option<bool> {
        self.fan_on
    }

    /// Sets the fan state.
    pub fn set_fan_on(&mut self, on: bool) {
        self.fan_on = Some(on);
    }

    /// Overwrites heat and fan from a status register.
    pub fn set_status(&mut self, status: StatusRegister) {
        self.heat_on = Some(status.heat_on());
        self.fan_on = Some(status.fan_on());
    }

    // ========== Bulk ==========

    /// Applies a state change.
    ///
    /// Returns `true` if any field actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        fn replace<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
            if slot.as_ref() == Some(&value) {
                false
            } else {
                *slot = Some(value);
                true
            }
        }

        match change {
            StateChange::Heat(on) => replace(&mut self.heat_on, *on),
            StateChange::Fan(on) => replace(&mut self.fan_on, *on),
            StateChange::CurrentTemperature(t) => replace(&mut self.current_temperature, *t),
            StateChange::TargetTemperature(t) => replace(&mut self.target_temperature, *t),
            StateChange::Batch(changes) => changes
                .iter()
                .fold(false, |changed, change| self.apply(change) || changed),
        }
    }

    /// Forgets everything.
    ///
    /// Called when the link drops so stale values are not reported.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
