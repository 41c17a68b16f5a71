// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named target temperature presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::Temperature;

/// A named target temperature.
///
/// # Examples
///
/// ```
/// use volcano_lib::types::TemperaturePreset;
///
/// let preset: TemperaturePreset = "potent".parse().unwrap();
/// assert_eq!(preset, TemperaturePreset::Potent);
/// assert_eq!(preset.temperature().raw(), 1950);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperaturePreset {
    /// 185 °C.
    Flavor,
    /// 190 °C.
    Balanced,
    /// 195 °C.
    Potent,
    /// 200 °C.
    Maximum,
}

impl TemperaturePreset {
    /// All presets, coolest first.
    pub const ALL: [Self; 4] = [Self::Flavor, Self::Balanced, Self::Potent, Self::Maximum];

    /// Returns the preset's target temperature.
    #[must_use]
    pub const fn temperature(self) -> Temperature {
        match self {
            Self::Flavor => Temperature::from_raw(1850),
            Self::Balanced => Temperature::from_raw(1900),
            Self::Potent => Temperature::from_raw(1950),
            Self::Maximum => Temperature::from_raw(2000),
        }
    }

    /// Returns the preset's lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flavor => "flavor",
            Self::Balanced => "balanced",
            Self::Potent => "potent",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for TemperaturePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemperaturePreset {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValueError::UnknownPreset(s.to_string()))
    }
}
