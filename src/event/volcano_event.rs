// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::state::{DeviceState, Snapshot, StateChange};

use super::SessionEvent;

/// Events published on the [`EventBus`](super::EventBus).
///
/// # Examples
///
/// ```
/// use volcano_lib::event::VolcanoEvent;
/// use volcano_lib::state::Snapshot;
///
/// let event = VolcanoEvent::Updated(Snapshot::disconnected());
/// assert!(event.is_update());
/// ```
#[derive(Debug, Clone)]
pub enum VolcanoEvent {
    /// The BLE link came up.
    Connected,

    /// The BLE link dropped.
    Disconnected {
        /// `true` if the drop was not requested by the library.
        unexpected: bool,
    },

    /// A notification changed the cached state.
    StateChanged {
        /// The specific change that occurred.
        change: StateChange,
        /// The complete new state.
        new_state: DeviceState,
    },

    /// A session event was derived from the latest poll.
    Session(SessionEvent),

    /// A poll cycle finished.
    Updated(Snapshot),
}

impl VolcanoEvent {
    /// Returns `true` if this is a connection event.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected { .. })
    }

    /// Returns `true` if this is a state change event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns `true` if this is a session event.
    #[must_use]
    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns `true` if this is a poll result.
    #[must_use]
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Returns the session event, if any.
    #[must_use]
    pub fn as_session(&self) -> Option<&SessionEvent> {
        match self {
            Self::Session(event) => Some(event),
            _ => None,
        }
    }
}
