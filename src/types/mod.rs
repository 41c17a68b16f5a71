// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Volcano device control.
//!
//! This module provides type-safe representations of values exchanged with
//! the device. Settable types ensure values are within their valid ranges
//! at construction time, so invalid input is rejected before any BLE write.
//!
//! # Types
//!
//! - [`Temperature`] - Heater temperature in tenths of a degree (40-230 °C settable)
//! - [`Brightness`] - Screen brightness (0-100%)
//! - [`StatusRegister`] - 16-bit status word with heat and fan flags
//! - [`DeviceAddress`] - Normalised Bluetooth address
//! - [`FanTimer`] - Automatic fan-off delay (1-300 s)
//! - [`TemperaturePreset`] - Named target temperatures

mod address;
mod brightness;
mod fan_timer;
mod preset;
mod status_register;
mod temperature;

pub use address::DeviceAddress;
pub use brightness::Brightness;
pub use fan_timer::FanTimer;
pub use preset::TemperaturePreset;
pub use status_register::StatusRegister;
pub use temperature::Temperature;
