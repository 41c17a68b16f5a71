// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Air pump with an optional auto-off timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::coordinator::Coordinator;
use crate::protocol::Connector;

use super::complete;

/// Fan entity.
///
/// Turning the fan on with a duration spawns a task that turns it off
/// again once the duration elapses. At most one such task is pending:
/// scheduling a new timer or calling [`turn_off`](Self::turn_off) aborts
/// the previous one. Dropping the entity aborts it too.
pub struct Fan<C: Connector> {
    coordinator: Arc<Coordinator<C>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> Fan<C> {
    /// Creates the fan entity.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>) -> Self {
        Self {
            coordinator,
            timer: Mutex::new(None),
        }
    }

    pub(super) fn coordinator(&self) -> &Arc<Coordinator<C>> {
        &self.coordinator
    }

    /// Fan state from the last poll.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.coordinator
            .snapshot()
            .is_some_and(|snapshot| snapshot.fan_on)
    }

    /// Returns `true` while an auto-off timer is waiting.
    #[must_use]
    pub fn timer_pending(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Turns the fan on, optionally switching it off after `duration`.
    ///
    /// Without a duration a pending timer is left running.
    pub async fn turn_on(&self, duration: Option<Duration>) -> bool {
        let result = self.coordinator.device().fan_on().await;
        let ok = complete(&self.coordinator, "fan on", result);
        if ok && let Some(duration) = duration {
            self.schedule_off(duration);
        }
        ok
    }

    /// Cancels any pending timer and turns the fan off.
    pub async fn turn_off(&self) -> bool {
        self.cancel_timer();
        let result = self.coordinator.device().fan_off().await;
        complete(&self.coordinator, "fan off", result)
    }

    /// Aborts the pending timer. Returns `true` if one was pending.
    pub fn cancel_timer(&self) -> bool {
        match self.timer.lock().take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                debug!("fan timer cancelled");
                true
            }
            _ => false,
        }
    }

    fn schedule_off(&self, duration: Duration) {
        self.cancel_timer();
        let coordinator = self.coordinator.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            match coordinator.device().fan_off().await {
                Ok(_) => {
                    info!(seconds = duration.as_secs(), "fan turned off by timer");
                    coordinator.request_refresh();
                }
                Err(error) => error!(%error, "fan timer failed to turn the fan off"),
            }
        });
        *self.timer.lock() = Some(task);
    }
}

impl<C: Connector> std::fmt::Debug for Fan<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fan")
            .field("is_on", &self.is_on())
            .field("timer_pending", &self.timer_pending())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Drop for Fan<C> {
    fn drop(&mut self) {
        if let Some(task) = self.timer.get_mut().take() {
            task.abort();
        }
    }
}
