// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification listener shared between a device and its background task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::event::{EventBus, VolcanoEvent};
use crate::protocol::{Characteristic, LinkEvent, LinkEventStream, codec};
use crate::state::{DeviceState, StateChange};
use crate::subscription::CallbackRegistry;
use crate::types::DeviceAddress;

pub(super) type DisconnectCallback = Arc<dyn Fn() + Send + Sync>;

/// State the link manager shares with its listener task.
#[derive(Clone)]
pub(super) struct Shared {
    pub(super) address: DeviceAddress,
    pub(super) state: Arc<RwLock<DeviceState>>,
    pub(super) callbacks: Arc<CallbackRegistry>,
    pub(super) events: EventBus,
    pub(super) connected: Arc<AtomicBool>,
    pub(super) on_disconnect: Arc<RwLock<Option<DisconnectCallback>>>,
}

impl Shared {
    pub(super) fn new(address: DeviceAddress, events: EventBus) -> Self {
        Self {
            address,
            state: Arc::new(RwLock::new(DeviceState::new())),
            callbacks: Arc::new(CallbackRegistry::new()),
            events,
            connected: Arc::new(AtomicBool::new(false)),
            on_disconnect: Arc::new(RwLock::new(None)),
        }
    }

    pub(super) fn is_flagged_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Drains the link event stream until the link drops.
    pub(super) async fn listen(self, mut events: LinkEventStream) {
        while let Some(event) = events.next().await {
            match event {
                LinkEvent::Notification {
                    characteristic,
                    value,
                } => self.handle_notification(characteristic, &value),
                LinkEvent::Disconnected => break,
            }
        }
        self.link_lost();
    }

    pub(super) fn handle_notification(&self, characteristic: Characteristic, value: &[u8]) {
        trace!(address = %self.address, %characteristic, ?value, "notification");
        let change = match characteristic {
            Characteristic::StatusRegister => {
                codec::decode_status(value).map(StateChange::from_status)
            }
            Characteristic::CurrentTemperature => {
                codec::decode_temperature(value).map(StateChange::CurrentTemperature)
            }
            other => {
                debug!(address = %self.address, characteristic = %other, "ignoring notification");
                return;
            }
        };

        match change {
            Ok(change) => self.apply(change),
            Err(error) => {
                warn!(
                    address = %self.address,
                    %characteristic,
                    %error,
                    "dropping malformed notification"
                );
            }
        }
    }

    /// Applies a change and reports only the fields that actually moved.
    pub(super) fn apply(&self, change: StateChange) {
        let (changed, new_state) = {
            let mut state = self.state.write();
            let changed: Vec<StateChange> = change
                .into_leaves()
                .into_iter()
                .filter(|leaf| state.apply(leaf))
                .collect();
            (changed, *state)
        };

        let Some(change) = StateChange::from_leaves(changed) else {
            return;
        };
        debug!(address = %self.address, ?change, "state changed");
        self.callbacks.dispatch(&change);
        self.events
            .publish(VolcanoEvent::StateChanged { change, new_state });
    }

    /// Handles an involuntary disconnect.
    ///
    /// No-op if the link was already marked down, so a requested disconnect
    /// never fires the disconnect callback.
    pub(super) fn link_lost(&self) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        warn!(address = %self.address, "BLE link lost");
        self.callbacks.dispatch_disconnected();
        self.events
            .publish(VolcanoEvent::Disconnected { unexpected: true });

        let callback = self.on_disconnect.read().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}
