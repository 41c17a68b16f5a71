// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! [`DeviceState`] is the cache the link manager keeps up to date from
//! notifications and reads; [`StateChange`] is a single update that can be
//! applied to it. [`Snapshot`] is the merged result of one poll cycle.
//!
//! # Examples
//!
//! ```
//! use volcano_lib::state::{DeviceState, StateChange};
//! use volcano_lib::types::StatusRegister;
//!
//! let mut state = DeviceState::new();
//!
//! let change = StateChange::from_status(StatusRegister::from_raw(0x0020));
//! state.apply(&change);
//!
//! assert_eq!(state.heat_on(), Some(true));
//! assert_eq!(state.fan_on(), Some(false));
//! ```

mod device_state;
mod snapshot;
mod state_change;

pub use device_state::DeviceState;
pub use snapshot::{DeviceInfo, SessionSummary, Snapshot};
pub use state_change::StateChange;
