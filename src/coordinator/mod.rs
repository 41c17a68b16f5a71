// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator.
//!
//! The [`Coordinator`] owns the poll loop for one device: it reconnects
//! when needed, reads temperatures and the status register, feeds the
//! [`SessionTracker`] and [`UsageStatistics`], and publishes a [`Snapshot`]
//! after every cycle. The poll interval adapts to what the device is doing
//! (see [`heuristics::poll_interval`]).
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use volcano_lib::{Coordinator, VolcanoConfig, VolcanoDevice};
//! use volcano_lib::protocol::BleConnector;
//!
//! # async fn example() -> volcano_lib::Result<()> {
//! let config = VolcanoConfig::new("00:11:22:33:44:55".parse()?);
//! let device = Arc::new(VolcanoDevice::new(BleConnector::new().await?, config));
//! let coordinator = Arc::new(Coordinator::new(device));
//!
//! let mut events = coordinator.subscribe();
//! let poller = tokio::spawn({
//!     let coordinator = coordinator.clone();
//!     async move { coordinator.run().await }
//! });
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//!
//! coordinator.shutdown().await;
//! poller.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod heuristics;
mod session;

pub use session::{DURATION_HISTORY, PollSample, SessionTracker};
pub(crate) use session::round_one_decimal;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex as SyncMutex, RwLock};
use serde_json::json;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tracing::{debug, error, instrument, warn};

use crate::config::VolcanoConfig;
use crate::device::VolcanoDevice;
use crate::error::{Error, Result};
use crate::event::{EventBus, SessionEvent, VolcanoEvent};
use crate::protocol::Connector;
use crate::state::{DeviceInfo, SessionSummary, Snapshot};
use crate::statistics::UsageStatistics;
use crate::types::Temperature;

use heuristics::IDLE_INTERVAL;

/// Session bookkeeping, touched only between awaits.
#[derive(Debug, Default)]
struct Tracking {
    tracker: SessionTracker,
    statistics: UsageStatistics,
    device_info: Option<DeviceInfo>,
}

impl Tracking {
    /// Runs one poll through the tracker and mirrors the result into the
    /// usage statistics.
    fn observe(
        &mut self,
        current: Option<Temperature>,
        target: Option<Temperature>,
        fan_on: bool,
        now: DateTime<Utc>,
    ) -> Vec<SessionEvent> {
        let current = current.map(|t| t.celsius());
        let events = match (current, target.map(|t| t.celsius())) {
            (Some(current), Some(target)) => self.tracker.observe(
                PollSample {
                    current,
                    target,
                    fan_on,
                },
                now,
            ),
            _ => self.tracker.observe_without_temperatures(fan_on, now),
        };

        for event in &events {
            match event {
                SessionEvent::SessionStarted {
                    target_temperature,
                    ..
                } => self.statistics.record_heat_on(*target_temperature, now),
                SessionEvent::SessionEnded { .. } => {
                    self.statistics.record_heat_off(now);
                }
                _ => {}
            }
        }
        if let Some(current) = current {
            self.statistics.record_temperature(current);
        }
        events
    }
}

#[derive(Debug, Clone)]
struct Status {
    snapshot: Option<Snapshot>,
    last_update: Option<DateTime<Utc>>,
    interval: Duration,
}

/// Drives polling, session tracking and event publication for one device.
///
/// Share it behind an [`Arc`]: [`run`](Self::run) borrows it for the
/// lifetime of the poll loop while entities call
/// [`request_refresh`](Self::request_refresh) and read
/// [`snapshot`](Self::snapshot) concurrently.
pub struct Coordinator<C: Connector> {
    device: Arc<VolcanoDevice<C>>,
    config: VolcanoConfig,
    /// Serialises poll cycles; holds the device info cycle counter.
    cycle: Mutex<u64>,
    tracking: SyncMutex<Tracking>,
    status: RwLock<Status>,
    refresh_requested: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    events: EventBus,
}

impl<C: Connector> Coordinator<C> {
    /// Creates a coordinator for `device`.
    ///
    /// Installs the device's disconnect callback so that a dropped link
    /// triggers an immediate refresh.
    #[must_use]
    pub fn new(device: Arc<VolcanoDevice<C>>) -> Self {
        let refresh_requested = Arc::new(Notify::new());
        let notify = refresh_requested.clone();
        device.set_disconnect_callback(move || notify.notify_one());

        let (shutdown, _) = watch::channel(false);
        Self {
            config: device.config().clone(),
            events: device.event_bus().clone(),
            device,
            cycle: Mutex::new(0),
            tracking: SyncMutex::new(Tracking::default()),
            status: RwLock::new(Status {
                snapshot: None,
                last_update: None,
                interval: IDLE_INTERVAL,
            }),
            refresh_requested,
            shutdown,
        }
    }

    /// Returns the device this coordinator polls.
    #[must_use]
    pub fn device(&self) -> &Arc<VolcanoDevice<C>> {
        &self.device
    }

    /// Returns the event bus shared with the device.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to device, session and update events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VolcanoEvent> {
        self.events.subscribe()
    }

    /// Returns the snapshot produced by the last successful cycle.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.status.read().snapshot.clone()
    }

    /// Returns the interval the poll loop waits before the next cycle.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.status.read().interval
    }

    /// Returns when the device last answered a poll.
    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.status.read().last_update
    }

    /// Returns a copy of the usage statistics.
    #[must_use]
    pub fn usage_statistics(&self) -> UsageStatistics {
        self.tracking.lock().statistics.clone()
    }

    /// Returns the session tracker counters as of now.
    #[must_use]
    pub fn session_summary(&self) -> SessionSummary {
        self.tracking.lock().tracker.summary(Utc::now())
    }

    /// Returns the device info fetched by the last slow-path cycle.
    #[must_use]
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.tracking.lock().device_info.clone()
    }

    /// Wakes the poll loop for an immediate cycle.
    ///
    /// Requests made while a cycle is running are kept and trigger one
    /// more cycle right after it.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn disconnected_snapshot(&self) -> Snapshot {
        Snapshot::disconnected_with(self.session_summary())
    }

    // ========== Poll cycle ==========

    /// Runs one poll cycle and returns the resulting snapshot.
    ///
    /// Connection problems never fail the cycle: they yield a disconnected
    /// snapshot instead. Cycles never overlap.
    ///
    /// # Errors
    ///
    /// Returns `Error::UpdateFailed` if the device answered with something
    /// that could not be processed.
    #[instrument(skip(self), fields(address = %self.config.address))]
    pub async fn refresh(&self) -> Result<Snapshot> {
        let mut cycle = self.cycle.lock().await;
        if self.is_shut_down() {
            return Ok(self.disconnected_snapshot());
        }

        let snapshot = match self.poll(&mut cycle).await {
            Ok(snapshot) => {
                self.status.write().last_update = Some(Utc::now());
                snapshot
            }
            Err(error) if error.is_connection() => {
                warn!(%error, "device unavailable");
                self.disconnected_snapshot()
            }
            Err(error) => {
                error!(%error, "update failed");
                return Err(Error::UpdateFailed(error.to_string()));
            }
        };

        let interval = heuristics::poll_interval(&snapshot);
        let mut status = self.status.write();
        if status.interval != interval {
            debug!(
                from_ms = status.interval.as_millis(),
                to_ms = interval.as_millis(),
                "poll interval changed"
            );
            status.interval = interval;
        }
        status.snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    async fn poll(&self, cycle: &mut u64) -> Result<Snapshot> {
        if !self.device.is_connected().await {
            self.device
                .connect(self.config.poll_connect_retries)
                .await?;
        }

        let current = self.device.current_temperature().await;
        let target = self.device.target_temperature().await;
        let status = self.device.read_status().await?;

        let now = Utc::now();
        let events = self
            .tracking
            .lock()
            .observe(current, target, status.fan_on(), now);
        for event in events {
            debug!(kind = event.kind(), "session event");
            self.events.publish(VolcanoEvent::Session(event));
        }

        let every = u64::from(self.config.device_info_every.max(1));
        let device_info = if cycle.is_multiple_of(every) {
            let info = self.device.device_info().await?;
            let mut tracking = self.tracking.lock();
            if !info.is_empty() {
                tracking.device_info = Some(info);
            }
            tracking.device_info.clone()
        } else {
            self.device_info()
        };
        *cycle += 1;

        Ok(Snapshot {
            connected: true,
            current_temperature: current.map(|t| t.celsius()),
            target_temperature: target.map(|t| t.celsius()),
            heat_on: status.heat_on(),
            fan_on: status.fan_on(),
            device_info,
            statistics: self.tracking.lock().tracker.summary(now),
        })
    }

    // ========== Lifecycle ==========

    /// Polls until [`shutdown`](Self::shutdown) is called.
    ///
    /// Each cycle publishes [`VolcanoEvent::Updated`] on success, then waits
    /// for the current interval, a refresh request or shutdown, whichever
    /// comes first.
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            // Failures are logged by refresh
            if let Ok(snapshot) = self.refresh().await {
                self.events.publish(VolcanoEvent::Updated(snapshot));
            }

            let interval = self.interval();
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = self.refresh_requested.notified() => {
                    debug!("refresh requested");
                }
                _ = shutdown.changed() => {}
            }
        }
        debug!(address = %self.config.address, "poll loop stopped");
    }

    /// Stops the poll loop and disconnects the device.
    ///
    /// Waits for a running cycle to finish first.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let _cycle = self.cycle.lock().await;
        self.device.clear_disconnect_callback();
        self.device.disconnect().await;
    }

    /// Returns a JSON summary for troubleshooting.
    pub async fn diagnostics(&self) -> serde_json::Value {
        let connected = self.device.is_connected().await;
        let status = self.status.read().clone();
        let statistics = self.tracking.lock().statistics.diagnostics(Utc::now());
        json!({
            "address": self.config.address.to_string(),
            "connection_state": if connected { "connected" } else { "disconnected" },
            "last_update": status.last_update.map(|t| t.to_rfc3339()),
            "update_interval_seconds": status.interval.as_secs_f64(),
            "current_state": status.snapshot,
            "statistics": statistics,
        })
    }
}

impl<C: Connector> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("address", &self.config.address)
            .field("interval", &self.interval())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn tenths(raw: u16) -> Option<Temperature> {
        Some(Temperature::from_raw(raw))
    }

    #[test]
    fn tracking_feeds_statistics_through_a_session() {
        let mut tracking = Tracking::default();
        let t0 = Utc::now();

        tracking.observe(tenths(250), tenths(1850), false, t0);
        let started = tracking.observe(tenths(700), tenths(1850), false, t0);
        assert_eq!(started.len(), 1);
        assert!(tracking.statistics.session_active());

        tracking.observe(tenths(1860), tenths(1850), false, t0);
        let end = t0 + ChronoDuration::minutes(12);
        let ended = tracking.observe(tenths(400), tenths(1850), false, end);
        assert!(
            ended
                .iter()
                .any(|e| matches!(e, SessionEvent::SessionEnded { .. }))
        );

        let sessions = tracking.statistics.sessions();
        assert_eq!(sessions.len(), 1);
        assert!((sessions[0].start_temperature - 185.0).abs() < f64::EPSILON);
        assert!((sessions[0].max_temperature - 186.0).abs() < 1e-9);
        assert_eq!(sessions[0].duration(), ChronoDuration::minutes(12));
    }

    #[test]
    fn tracking_without_temperatures_reports_fan() {
        let mut tracking = Tracking::default();
        let events = tracking.observe(None, tenths(1850), true, Utc::now());
        assert!(matches!(events.as_slice(), [SessionEvent::FanStarted { .. }]));
        assert!(tracking.statistics.sessions().is_empty());
    }
}
