// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan timer duration.

use std::fmt;
use std::time::Duration;

use crate::error::ValueError;

/// How long the fan runs before it is switched off automatically (1-300 s).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use volcano_lib::types::FanTimer;
///
/// let timer = FanTimer::new(45).unwrap();
/// assert_eq!(timer.as_duration(), Duration::from_secs(45));
/// assert_eq!(FanTimer::default().seconds(), 30);
/// assert!(FanTimer::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FanTimer(u16);

impl FanTimer {
    /// Shortest timer (1 second).
    pub const MIN: Self = Self(1);

    /// Longest timer (5 minutes).
    pub const MAX: Self = Self(300);

    /// Default timer (30 seconds).
    pub const DEFAULT: Self = Self(30);

    /// Creates a timer from seconds.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `seconds` is not in 1-300.
    pub fn new(seconds: u16) -> Result<Self, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&seconds) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN.0,
                max: Self::MAX.0,
                actual: seconds,
            });
        }
        Ok(Self(seconds))
    }

    /// Returns the timer length in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u16 {
        self.0
    }

    /// Returns the timer length as a `Duration`.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for FanTimer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FanTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(FanTimer::new(1).is_ok());
        assert!(FanTimer::new(300).is_ok());
        assert!(FanTimer::new(0).is_err());
        assert!(FanTimer::new(301).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(FanTimer::DEFAULT.to_string(), "30s");
    }
}
