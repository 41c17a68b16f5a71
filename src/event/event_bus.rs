// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting device events.

use tokio::sync::broadcast;

use super::VolcanoEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting device events to multiple subscribers.
///
/// Uses tokio's broadcast channel: every subscriber gets its own copy of
/// each event published after it subscribed.
///
/// # Capacity
///
/// If a subscriber falls more than `capacity` events behind, it loses the
/// oldest ones and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use volcano_lib::event::{EventBus, VolcanoEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(VolcanoEvent::Connected);
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<VolcanoEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to device events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VolcanoEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: VolcanoEvent) {
        let _ = self.sender.send(event);
    }

    /// Publishes an event and returns the number of receivers that got it.
    #[must_use]
    pub fn publish_counted(&self, event: VolcanoEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_delivers_to_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(VolcanoEvent::Connected);

        assert!(rx1.recv().await.unwrap().is_connection());
        assert!(rx2.recv().await.unwrap().is_connection());
    }

    #[test]
    fn publish_counted() {
        let bus = EventBus::new();
        assert_eq!(bus.publish_counted(VolcanoEvent::Connected), 0);

        let _rx = bus.subscribe();
        assert_eq!(bus.publish_counted(VolcanoEvent::Connected), 1);
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::with_capacity(16);
        let bus2 = bus1.clone();

        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for _ in 0..4 {
            bus.publish(VolcanoEvent::Connected);
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
    }
}
