// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the building blocks for updating a
//! [`DeviceState`](super::DeviceState). They come from notifications, from
//! poll reads and from the confirmed result of writes.
//!
//! # Examples
//!
//! ```
//! use volcano_lib::state::{DeviceState, StateChange};
//!
//! let mut state = DeviceState::new();
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&StateChange::Heat(true)));
//!
//! // Applying same change again returns false
//! assert!(!state.apply(&StateChange::Heat(true)));
//! ```

use crate::types::{StatusRegister, Temperature};

/// Represents a change in device state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Heater switched on or off.
    Heat(bool),

    /// Air pump switched on or off.
    Fan(bool),

    /// New current temperature reading.
    CurrentTemperature(Temperature),

    /// New target temperature.
    TargetTemperature(Temperature),

    /// Multiple changes at once.
    ///
    /// Used when a single status word carries several fields.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Splits a status register into its heat and fan changes.
    #[must_use]
    pub fn from_status(status: StatusRegister) -> Self {
        Self::Batch(vec![Self::Heat(status.heat_on()), Self::Fan(status.fan_on())])
    }

    /// Returns `true` if this is a batch change.
    #[must_use]
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Returns the number of individual changes.
    ///
    /// Batches are counted recursively.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Batch(changes) => changes.iter().map(Self::len).sum(),
            _ => 1,
        }
    }

    /// Returns `true` for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens nested batches into individual changes.
    #[must_use]
    pub fn into_leaves(self) -> Vec<StateChange> {
        match self {
            Self::Batch(changes) => changes.into_iter().flat_map(Self::into_leaves).collect(),
            change => vec![change],
        }
    }

    /// Builds the smallest change covering `changes`.
    ///
    /// Returns `None` when there is nothing to report.
    #[must_use]
    pub fn from_leaves(mut changes: Vec<StateChange>) -> Option<Self> {
        match changes.len() {
            0 => None,
            1 => changes.pop(),
            _ => Some(Self::Batch(changes)),
        }
    }
}
