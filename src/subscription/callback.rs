// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for device state subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::{DeviceState, StateChange};
use crate::types::Temperature;

/// Unique identifier for a subscription.
///
/// Returned when registering a callback and used to unsubscribe later. IDs
/// are unique within a registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type SwitchCallback = Arc<dyn Fn(bool) + Send + Sync>;
type TemperatureCallback = Arc<dyn Fn(Temperature) + Send + Sync>;
type ConnectedCallback = Arc<dyn Fn(&DeviceState) + Send + Sync>;
type DisconnectedCallback = Arc<dyn Fn() + Send + Sync>;
type StateChangedCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Registry for device subscription callbacks.
///
/// Uses `parking_lot::RwLock` for interior mutability so it can be shared
/// between the notification listener and user code. Callbacks are wrapped
/// in `Arc` and called synchronously in arbitrary order.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    heat_callbacks: RwLock<HashMap<SubscriptionId, SwitchCallback>>,
    fan_callbacks: RwLock<HashMap<SubscriptionId, SwitchCallback>>,
    temperature_callbacks: RwLock<HashMap<SubscriptionId, TemperatureCallback>>,
    target_callbacks: RwLock<HashMap<SubscriptionId, TemperatureCallback>>,
    connected_callbacks: RwLock<HashMap<SubscriptionId, ConnectedCallback>>,
    disconnected_callbacks: RwLock<HashMap<SubscriptionId, DisconnectedCallback>>,
    state_changed_callbacks: RwLock<HashMap<SubscriptionId, StateChangedCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            heat_callbacks: RwLock::new(HashMap::new()),
            fan_callbacks: RwLock::new(HashMap::new()),
            temperature_callbacks: RwLock::new(HashMap::new()),
            target_callbacks: RwLock::new(HashMap::new()),
            connected_callbacks: RwLock::new(HashMap::new()),
            disconnected_callbacks: RwLock::new(HashMap::new()),
            state_changed_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for heater on/off changes.
    pub fn on_heat_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.heat_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for fan on/off changes.
    pub fn on_fan_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.fan_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for current temperature changes.
    pub fn on_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.temperature_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for target temperature changes.
    pub fn on_target_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.target_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for when the link comes up.
    ///
    /// The callback receives the cached state at connection time.
    pub fn on_connected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.connected_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for when the link drops.
    pub fn on_disconnected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.disconnected_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for all state changes.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state_changed_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.heat_callbacks.write().remove(&id).is_some()
            || self.fan_callbacks.write().remove(&id).is_some()
            || self.temperature_callbacks.write().remove(&id).is_some()
            || self.target_callbacks.write().remove(&id).is_some()
            || self.connected_callbacks.write().remove(&id).is_some()
            || self.disconnected_callbacks.write().remove(&id).is_some()
            || self.state_changed_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.heat_callbacks.write().clear();
        self.fan_callbacks.write().clear();
        self.temperature_callbacks.write().clear();
        self.target_callbacks.write().clear();
        self.connected_callbacks.write().clear();
        self.disconnected_callbacks.write().clear();
        self.state_changed_callbacks.write().clear();
    }

    // =========================================================================
    // Dispatch methods
    // =========================================================================

    /// Dispatches a state change to the matching callbacks.
    ///
    /// Generic `on_state_changed` callbacks see every change, batches
    /// included; field callbacks see the leaves of a batch.
    pub fn dispatch(&self, change: &StateChange) {
        for callback in self.state_changed_callbacks.read().values() {
            callback(change);
        }

        match change {
            StateChange::Heat(on) => {
                for callback in self.heat_callbacks.read().values() {
                    callback(*on);
                }
            }
            StateChange::Fan(on) => {
                for callback in self.fan_callbacks.read().values() {
                    callback(*on);
                }
            }
            StateChange::CurrentTemperature(t) => {
                for callback in self.temperature_callbacks.read().values() {
                    callback(*t);
                }
            }
            StateChange::TargetTemperature(t) => {
                for callback in self.target_callbacks.read().values() {
                    callback(*t);
                }
            }
            StateChange::Batch(changes) => {
                for nested in changes {
                    self.dispatch(nested);
                }
            }
        }
    }

    /// Dispatches the connected event.
    pub fn dispatch_connected(&self, state: &DeviceState) {
        for callback in self.connected_callbacks.read().values() {
            callback(state);
        }
    }

    /// Dispatches the disconnected event.
    pub fn dispatch_disconnected(&self) {
        for callback in self.disconnected_callbacks.read().values() {
            callback();
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.heat_callbacks.read().len()
            + self.fan_callbacks.read().len()
            + self.temperature_callbacks.read().len()
            + self.target_callbacks.read().len()
            + self.connected_callbacks.read().len()
            + self.disconnected_callbacks.read().len()
            + self.state_changed_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
