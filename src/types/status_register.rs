// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device status register.

use std::fmt;

/// A 16-bit status word packing the device flags.
///
/// Only the heater and fan bits are interpreted. The raw word is kept
/// intact so it can be written back or logged bit-exact.
///
/// # Examples
///
/// ```
/// use volcano_lib::types::StatusRegister;
///
/// let status = StatusRegister::from_raw(0x0020);
/// assert!(status.heat_on());
/// assert!(!status.fan_on());
///
/// let status = StatusRegister::from_raw(0xFFFF);
/// assert!(status.heat_on() && status.fan_on());
/// assert_eq!(status.raw(), 0xFFFF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusRegister(u16);

impl StatusRegister {
    /// Heater active (bit 5).
    pub const HEAT_ON_MASK: u16 = 0x0020;

    /// Fan/pump active (bit 13).
    pub const FAN_ON_MASK: u16 = 0x2000;

    /// Wraps a raw status word.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw status word.
    #[must_use]
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Returns `true` if the heater bit is set.
    #[must_use]
    pub const fn heat_on(&self) -> bool {
        self.0 & Self::HEAT_ON_MASK != 0
    }

    /// Returns `true` if the fan bit is set.
    #[must_use]
    pub const fn fan_on(&self) -> bool {
        self.0 & Self::FAN_ON_MASK != 0
    }

    /// Returns a copy with the heater bit set or cleared.
    #[must_use]
    pub const fn with_heat(self, on: bool) -> Self {
        if on {
            Self(self.0 | Self::HEAT_ON_MASK)
        } else {
            Self(self.0 & !Self::HEAT_ON_MASK)
        }
    }

    /// Returns a copy with the fan bit set or cleared.
    #[must_use]
    pub const fn with_fan(self, on: bool) -> Self {
        if on {
            Self(self.0 | Self::FAN_ON_MASK)
        } else {
            Self(self.0 & !Self::FAN_ON_MASK)
        }
    }
}

impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#06x} (heat: {}, fan: {})",
            self.0,
            self.heat_on(),
            self.fan_on()
        )
    }
}
