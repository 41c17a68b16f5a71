// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Volcano library.
//!
//! This module provides the error hierarchy for handling failures across
//! the library: value validation, BLE transport, payload decoding, and
//! coordinator updates.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when interacting
/// with a Volcano device.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during BLE communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a characteristic payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Device is not connected.
    #[error("device is not connected")]
    NotConnected,

    /// A poll cycle failed for a reason other than connectivity.
    #[error("update failed: {0}")]
    UpdateFailed(String),
}

impl Error {
    /// Returns `true` if this error is caused by the BLE link rather than
    /// by bad input or a malformed payload.
    ///
    /// The coordinator uses this to decide between reporting a disconnected
    /// snapshot and failing the update.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::NotConnected)
    }
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values. They are always raised before any device I/O.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A temperature is outside the range the device accepts.
    #[error("temperature {0}°C is out of range [40, 230]")]
    TemperatureOutOfRange(f64),

    /// A device address could not be parsed.
    #[error("invalid device address: {0}")]
    InvalidAddress(String),

    /// An unknown temperature preset name was provided.
    #[error("unknown temperature preset: {0}")]
    UnknownPreset(String),
}

/// Errors related to the BLE transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Error reported by the platform BLE stack.
    #[cfg(feature = "ble")]
    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// No connectable peripheral with the configured address was found.
    #[error("device {0} not found or not connectable")]
    DeviceNotFound(String),

    /// The connected peripheral does not expose a required characteristic.
    #[error("characteristic not found: {0}")]
    CharacteristicNotFound(uuid::Uuid),

    /// No Bluetooth adapter is available.
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to decoding characteristic payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Fewer bytes were returned than the encoding requires.
    #[error("short read for {field}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// The characteristic being decoded.
        field: &'static str,
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// Payload length does not match any supported width.
    #[error("unexpected payload length for {field}: {actual} bytes")]
    UnexpectedLength {
        /// The characteristic being decoded.
        field: &'static str,
        /// Number of bytes received.
        actual: usize,
    },

    /// String characteristic was not valid UTF-8.
    #[error("invalid UTF-8 in {field}: {source}")]
    InvalidUtf8 {
        /// The characteristic being decoded.
        field: &'static str,
        /// The underlying decoding error.
        source: std::string::FromUtf8Error,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
