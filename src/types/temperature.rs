// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature type for the heater target and readings.
//!
//! The device exchanges temperatures as unsigned 16-bit integers holding
//! tenths of a degree Celsius.

use std::fmt;

use crate::error::ValueError;

/// A temperature in tenths of a degree Celsius.
///
/// Values built with [`Temperature::new`] are guaranteed to be inside the
/// range the heater accepts (40–230 °C). Values decoded from the device
/// with [`Temperature::from_raw`] are not range checked, since the current
/// temperature of a cold device is below the settable minimum.
///
/// # Examples
///
/// ```
/// use volcano_lib::types::Temperature;
///
/// let temp = Temperature::new(185.0).unwrap();
/// assert_eq!(temp.raw(), 1850);
/// assert!((temp.celsius() - 185.0).abs() < f64::EPSILON);
///
/// assert!(Temperature::new(39.9).is_err());
/// assert!(Temperature::new(230.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temperature(u16);

impl Temperature {
    /// Lowest settable target temperature in °C.
    pub const MIN_CELSIUS: f64 = 40.0;

    /// Highest settable target temperature in °C.
    pub const MAX_CELSIUS: f64 = 230.0;

    /// Default target temperature in °C.
    pub const DEFAULT_CELSIUS: f64 = 180.0;

    /// Creates a settable temperature from degrees Celsius.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TemperatureOutOfRange` if the value is outside
    /// 40–230 °C or is not a number.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(celsius: f64) -> Result<Self, ValueError> {
        if !(Self::MIN_CELSIUS..=Self::MAX_CELSIUS).contains(&celsius) {
            return Err(ValueError::TemperatureOutOfRange(celsius));
        }
        // In range, so the scaled value fits in u16.
        Ok(Self((celsius * 10.0).round() as u16))
    }

    /// Wraps a raw tenths-of-a-degree value read from the device.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw value in tenths of a degree.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Returns the temperature in degrees Celsius.
    #[must_use]
    pub fn celsius(&self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.celsius())
    }
}

impl TryFrom<f64> for Temperature {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
