// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for device state changes.
//!
//! The [`EventBus`] uses tokio's broadcast channel so several consumers can
//! observe connection changes, notification-driven state changes, session
//! events and poll results.
//!
//! # Examples
//!
//! ```
//! use volcano_lib::event::{EventBus, VolcanoEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(VolcanoEvent::Disconnected { unexpected: false });
//! ```

mod event_bus;
mod session_event;
mod volcano_event;

pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use session_event::SessionEvent;
pub use volcano_event::VolcanoEvent;
