// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for devices that push state changes.

use crate::state::{DeviceState, StateChange};
use crate::subscription::SubscriptionId;
use crate::types::Temperature;

/// Trait for types that support event subscriptions.
///
/// Callbacks only fire when a value actually changes; a notification that
/// repeats the cached value is ignored.
///
/// # Examples
///
/// ```no_run
/// use volcano_lib::{VolcanoConfig, VolcanoDevice};
/// use volcano_lib::protocol::BleConnector;
/// use volcano_lib::subscription::Subscribable;
///
/// # async fn example() -> volcano_lib::Result<()> {
/// let config = VolcanoConfig::new("00:11:22:33:44:55".parse()?);
/// let device = VolcanoDevice::new(BleConnector::new().await?, config);
///
/// let sub_id = device.on_heat_changed(|on| {
///     println!("heater is now {}", if on { "on" } else { "off" });
/// });
///
/// device.on_temperature_changed(|t| println!("heater at {t}"));
///
/// device.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to heater on/off changes.
    fn on_heat_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to fan on/off changes.
    fn on_fan_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Subscribes to current temperature changes.
    fn on_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static;

    /// Subscribes to target temperature changes.
    fn on_target_temperature_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Temperature) + Send + Sync + 'static;

    /// Subscribes to connection events.
    ///
    /// The callback receives the cached state when the link comes up.
    fn on_connected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static;

    /// Subscribes to disconnection events.
    fn on_disconnected<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static;

    /// Subscribes to all state changes.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
