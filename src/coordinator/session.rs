// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session detection from consecutive poll samples.
//!
//! The tracker is pure: time is passed in by the caller, so the rules can be
//! exercised without a clock or a device.

use std::collections::VecDeque;

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::event::SessionEvent;
use crate::state::SessionSummary;

/// Number of completed session durations kept for the rolling average.
pub const DURATION_HISTORY: usize = 100;

const COLD_BELOW: f64 = 50.0;
const WARMING_ABOVE: f64 = 60.0;
const MIN_SESSION_TARGET: f64 = 100.0;
const REACHED_MARGIN: f64 = 5.0;
const HOT_ABOVE: f64 = 80.0;
const FAN_STOP_HOT_ABOVE: f64 = 100.0;

/// The values a poll cycle contributes to session detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSample {
    /// Current temperature in °C.
    pub current: f64,
    /// Target temperature in °C.
    pub target: f64,
    /// Whether the fan is running.
    pub fan_on: bool,
}

/// Derives usage sessions from poll samples.
///
/// Rules are evaluated against the previous sample in this order:
///
/// 1. **start**: previous below 50 °C, now above 60 °C, target above
///    100 °C and no session open
/// 2. **reached**: target set, now within 5 °C of it, previous was not
/// 3. **end**: open session and either a drop below 50 °C from above
///    80 °C, or the fan stopping while above 100 °C
/// 4. **fan edge**: fan state differs from the last known fan state
///
/// The first sample has nothing to compare against, so only a fan edge
/// (against "off") can fire. The fan state survives polls that read no
/// temperatures, so a fan stop after such a poll still ends the session.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use volcano_lib::coordinator::{PollSample, SessionTracker};
///
/// let mut tracker = SessionTracker::new();
/// let now = Utc::now();
/// for current in [30.0, 45.0] {
///     let sample = PollSample { current, target: 150.0, fan_on: false };
///     assert!(tracker.observe(sample, now).is_empty());
/// }
/// let events = tracker.observe(PollSample { current: 70.0, target: 150.0, fan_on: false }, now);
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].kind(), "session_started");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    previous: Option<PollSample>,
    fan_was_on: bool,
    session_start: Option<DateTime<Utc>>,
    last_session_end: Option<DateTime<Utc>>,
    durations: VecDeque<f64>,
    sessions_today: u32,
    total_sessions: u64,
    counting_day: Option<NaiveDate>,
}

impl SessionTracker {
    /// Creates a tracker with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample and returns the events it triggers, in rule order.
    pub fn observe(&mut self, sample: PollSample, now: DateTime<Utc>) -> Vec<SessionEvent> {
        self.roll_day(now);

        let mut events = Vec::new();

        if let Some(previous) = self.previous {
            if let Some(event) = self.detect_start(previous, sample, now) {
                events.push(event);
            }
            if let Some(event) = self.detect_reached(previous, sample, now) {
                events.push(event);
            }
        }
        if let Some(event) = self.detect_end(self.previous, sample, now) {
            events.push(event);
        }

        if let Some(event) = self.fan_edge(sample.fan_on, now) {
            events.push(event);
        }

        self.previous = Some(sample);
        events
    }

    /// Feeds a poll that read the status register but no temperatures.
    ///
    /// Only the fan edge can fire; the previous temperatures are dropped so
    /// the next full sample is not compared against stale values. The fan
    /// state is kept for the next sample's end check.
    pub fn observe_without_temperatures(
        &mut self,
        fan_on: bool,
        now: DateTime<Utc>,
    ) -> Vec<SessionEvent> {
        self.roll_day(now);
        self.previous = None;
        self.fan_edge(fan_on, now).into_iter().collect()
    }

    fn fan_edge(&mut self, fan_on: bool, now: DateTime<Utc>) -> Option<SessionEvent> {
        if fan_on == self.fan_was_on {
            return None;
        }
        self.fan_was_on = fan_on;
        let session_active = self.session_start.is_some();
        Some(if fan_on {
            SessionEvent::FanStarted {
                timestamp: now,
                session_active,
            }
        } else {
            SessionEvent::FanStopped {
                timestamp: now,
                session_active,
            }
        })
    }

    fn detect_start(
        &mut self,
        previous: PollSample,
        sample: PollSample,
        now: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        let starting = previous.current < COLD_BELOW
            && sample.current > WARMING_ABOVE
            && sample.target > MIN_SESSION_TARGET
            && self.session_start.is_none();
        if !starting {
            return None;
        }

        self.session_start = Some(now);
        self.sessions_today += 1;
        self.total_sessions += 1;
        tracing::debug!(target_temperature = sample.target, "session started");

        Some(SessionEvent::SessionStarted {
            target_temperature: sample.target,
            current_temperature: sample.current,
            timestamp: now,
            session_count_today: self.sessions_today,
            total_sessions: self.total_sessions,
        })
    }

    fn detect_reached(
        &self,
        previous: PollSample,
        sample: PollSample,
        now: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        let threshold = sample.target - REACHED_MARGIN;
        let reached =
            sample.target > 0.0 && sample.current >= threshold && previous.current < threshold;
        reached.then(|| SessionEvent::TemperatureReached {
            target_temperature: sample.target,
            actual_temperature: sample.current,
            timestamp: now,
            session_active: self.session_start.is_some(),
        })
    }

    /// Runs before the fan edge so `fan_was_on` still holds the last state.
    fn detect_end(
        &mut self,
        previous: Option<PollSample>,
        sample: PollSample,
        now: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        let cooled = sample.current < COLD_BELOW
            && previous.is_some_and(|previous| previous.current > HOT_ABOVE);
        let fan_stopped_hot =
            !sample.fan_on && self.fan_was_on && sample.current > FAN_STOP_HOT_ABOVE;
        if !(cooled || fan_stopped_hot) {
            return None;
        }
        let start = self.session_start.take()?;

        let minutes = minutes_between(start, now);
        self.durations.push_back(minutes);
        while self.durations.len() > DURATION_HISTORY {
            self.durations.pop_front();
        }
        self.last_session_end = Some(now);
        tracing::debug!(duration_minutes = minutes, "session ended");

        Some(SessionEvent::SessionEnded {
            duration_minutes: round_one_decimal(minutes),
            start_time: start,
            end_time: now,
            timestamp: now,
        })
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.with_timezone(&Local).date_naive();
        if self.counting_day != Some(today) {
            if self.counting_day.is_some() {
                self.sessions_today = 0;
            }
            self.counting_day = Some(today);
        }
    }

    // ========== Queries ==========

    /// Returns `true` while a session is open.
    #[must_use]
    pub fn session_active(&self) -> bool {
        self.session_start.is_some()
    }

    /// When the open session started.
    #[must_use]
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    /// Sessions started today, after resetting the count on a new day.
    pub fn sessions_today(&mut self, now: DateTime<Utc>) -> u32 {
        self.roll_day(now);
        self.sessions_today
    }

    /// Sessions started since the tracker was created.
    #[must_use]
    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    /// Duration of the most recent completed session, in minutes.
    #[must_use]
    pub fn last_session_duration(&self) -> Option<f64> {
        self.durations.back().copied()
    }

    /// Average of the retained session durations, one decimal.
    #[must_use]
    pub fn average_session_duration(&self) -> Option<f64> {
        if self.durations.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.durations.len() as f64;
        Some(round_one_decimal(self.durations.iter().sum::<f64>() / count))
    }

    /// Number of retained session durations.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.durations.len()
    }

    /// When the most recent session ended.
    #[must_use]
    pub fn last_session_end(&self) -> Option<DateTime<Utc>> {
        self.last_session_end
    }

    /// Whole minutes since the most recent session ended.
    #[must_use]
    pub fn minutes_since_last_use(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_session_end.map(|end| (now - end).num_minutes())
    }

    /// Collects the counters for a snapshot.
    pub fn summary(&mut self, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            sessions_today: self.sessions_today(now),
            total_sessions: self.total_sessions,
            session_active: self.session_active(),
            last_session_duration: self.last_session_duration(),
            average_session_duration: self.average_session_duration(),
            last_session_end: self.last_session_end,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
