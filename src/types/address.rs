// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth device address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A normalised Bluetooth device address.
///
/// Input may use `:` or `-` separators, or none at all, in any letter case.
/// The stored form is always upper-case and colon separated.
///
/// # Examples
///
/// ```
/// use volcano_lib::types::DeviceAddress;
///
/// let addr: DeviceAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
/// assert_eq!(addr.as_str(), "AA:BB:CC:DD:EE:FF");
///
/// let addr: DeviceAddress = "001122334455".parse().unwrap();
/// assert_eq!(addr.to_string(), "00:11:22:33:44:55");
///
/// assert!("not-a-mac".parse::<DeviceAddress>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Parses and normalises an address.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` unless the input contains
    /// exactly 12 hexadecimal digits once separators are removed.
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        let digits: String = input
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidAddress(input.to_string()));
        }

        let grouped = digits
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":");
        Ok(Self(grouped))
    }

    /// Returns the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against an address in any accepted notation.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        Self::parse(other).is_ok_and(|parsed| parsed == *self)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
