// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire encodings for Volcano characteristics.
//!
//! Pure functions, no I/O. All integers are little-endian.
//!
//! | Characteristic            | Encoding                               |
//! |---------------------------|----------------------------------------|
//! | temperatures              | u16, tenths of °C                      |
//! | status register           | u16 bitmask, both bytes required       |
//! | screen brightness         | one byte, 0-100                        |
//! | firmware / serial         | UTF-8, NUL padded                      |
//! | hours / minutes           | u16 or u32 depending on payload length |
//! | heat/fan switches         | single byte, `0x01` on, `0x00` off     |

use crate::error::ParseError;
use crate::types::{Brightness, StatusRegister, Temperature};

/// Payload written to the heat-on and fan-on switches.
pub const SWITCH_ON: [u8; 1] = [0x01];

/// Payload written to the heat-off and fan-off switches.
pub const SWITCH_OFF: [u8; 1] = [0x00];

fn read_u16(field: &'static str, data: &[u8]) -> Result<u16, ParseError> {
    match data {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(ParseError::ShortRead {
            field,
            expected: 2,
            actual: data.len(),
        }),
    }
}

/// Encodes a temperature for the target temperature characteristic.
#[must_use]
pub fn encode_temperature(temperature: Temperature) -> [u8; 2] {
    temperature.raw().to_le_bytes()
}

/// Decodes a temperature reading.
///
/// Extra trailing bytes are ignored.
///
/// # Errors
///
/// Returns `ParseError::ShortRead` if fewer than two bytes are given.
pub fn decode_temperature(data: &[u8]) -> Result<Temperature, ParseError> {
    read_u16("temperature", data).map(Temperature::from_raw)
}

/// Encodes a status register word.
#[must_use]
pub fn encode_status(status: StatusRegister) -> [u8; 2] {
    status.raw().to_le_bytes()
}

/// Decodes the status register.
///
/// Both bytes are required: the fan flag lives in the high byte, so a
/// single-byte read cannot be interpreted.
///
/// # Errors
///
/// Returns `ParseError::ShortRead` if fewer than two bytes are given.
pub fn decode_status(data: &[u8]) -> Result<StatusRegister, ParseError> {
    read_u16("status register", data).map(StatusRegister::from_raw)
}

/// Encodes a screen brightness.
#[must_use]
pub fn encode_brightness(brightness: Brightness) -> [u8; 1] {
    [brightness.value()]
}

/// Decodes a firmware version or serial number string.
///
/// # Errors
///
/// Returns `ParseError::InvalidUtf8` if the payload is not UTF-8.
pub fn decode_string(field: &'static str, data: &[u8]) -> Result<String, ParseError> {
    let text = String::from_utf8(data.to_vec())
        .map_err(|source| ParseError::InvalidUtf8 { field, source })?;
    Ok(text
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_start()
        .to_string())
}

/// Decodes an operation counter.
///
/// The device reports these as 16- or 32-bit values; the width is taken
/// from the payload length.
///
/// # Errors
///
/// Returns `ParseError::UnexpectedLength` for any other length.
pub fn decode_counter(field: &'static str, data: &[u8]) -> Result<u32, ParseError> {
    match *data {
        [a, b] => Ok(u32::from(u16::from_le_bytes([a, b]))),
        [a, b, c, d] => Ok(u32::from_le_bytes([a, b, c, d])),
        _ => Err(ParseError::UnexpectedLength {
            field,
            actual: data.len(),
        }),
    }
}

/// Returns the switch payload for an on/off state.
#[must_use]
pub fn switch_payload(on: bool) -> &'static [u8] {
    if on { &SWITCH_ON } else { &SWITCH_OFF }
}
