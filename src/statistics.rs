// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-session usage statistics.
//!
//! [`UsageStatistics`] keeps a record for every completed session: start
//! temperature, mean and peak temperature, and duration. The coordinator
//! feeds it from session events; queries take the current time so they are
//! deterministic in tests.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

/// Completed sessions older than this are dropped.
pub const RETENTION_DAYS: i64 = 90;

/// One completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    /// When heating started.
    pub start_time: DateTime<Utc>,
    /// When the session ended.
    pub end_time: DateTime<Utc>,
    /// Temperature the session started with, in °C.
    pub start_temperature: f64,
    /// Mean of the recorded temperatures, in °C.
    pub average_temperature: f64,
    /// Highest recorded temperature, in °C.
    pub max_temperature: f64,
}

impl SessionRecord {
    /// Session length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    fn local_date(&self) -> NaiveDate {
        local_date(self.end_time)
    }
}

#[derive(Debug, Clone)]
struct OpenSession {
    start_time: DateTime<Utc>,
    start_temperature: f64,
    samples: Vec<f64>,
    peak: f64,
}

/// In-memory usage statistics.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use volcano_lib::statistics::UsageStatistics;
///
/// let mut stats = UsageStatistics::new();
/// let start = Utc::now();
/// stats.record_heat_on(185.0, start);
/// stats.record_temperature(187.0);
/// stats.record_heat_off(start + Duration::minutes(10));
///
/// assert_eq!(stats.sessions_today(start + Duration::minutes(10)), 1);
/// assert_eq!(stats.favorite_temperature(30, start), Some(185.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct UsageStatistics {
    current: Option<OpenSession>,
    sessions: Vec<SessionRecord>,
}

impl UsageStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session. An already open session is replaced.
    pub fn record_heat_on(&mut self, temperature: f64, now: DateTime<Utc>) {
        self.current = Some(OpenSession {
            start_time: now,
            start_temperature: temperature,
            samples: vec![temperature],
            peak: temperature,
        });
        tracing::debug!(temperature, "statistics session opened");
    }

    /// Adds a temperature sample to the open session, if any.
    pub fn record_temperature(&mut self, temperature: f64) {
        if let Some(session) = self.current.as_mut() {
            session.samples.push(temperature);
            session.peak = session.peak.max(temperature);
        }
    }

    /// Closes the open session and stores its record.
    ///
    /// Returns `None` if no session was open.
    pub fn record_heat_off(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        let session = self.current.take()?;

        #[allow(clippy::cast_precision_loss)]
        let average_temperature =
            session.samples.iter().sum::<f64>() / session.samples.len() as f64;
        let record = SessionRecord {
            start_time: session.start_time,
            end_time: now,
            start_temperature: session.start_temperature,
            average_temperature,
            max_temperature: session.peak,
        };

        tracing::info!(
            duration_minutes = minutes(record.duration()),
            average_temperature,
            "session completed"
        );

        self.sessions.push(record.clone());
        let cutoff = now - Duration::days(RETENTION_DAYS);
        self.sessions.retain(|s| s.end_time >= cutoff);
        Some(record)
    }

    /// Returns `true` while a session is open.
    #[must_use]
    pub fn session_active(&self) -> bool {
        self.current.is_some()
    }

    /// Completed sessions, oldest first.
    #[must_use]
    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    fn since(&self, days: i64, now: DateTime<Utc>) -> impl Iterator<Item = &SessionRecord> {
        let cutoff = local_date(now) - Duration::days(days);
        self.sessions
            .iter()
            .filter(move |s| s.local_date() >= cutoff)
    }

    fn today(&self, now: DateTime<Utc>) -> impl Iterator<Item = &SessionRecord> {
        let today = local_date(now);
        self.sessions
            .iter()
            .filter(move |s| s.local_date() == today)
    }

    /// Sessions completed today.
    #[must_use]
    pub fn sessions_today(&self, now: DateTime<Utc>) -> usize {
        self.today(now).count()
    }

    /// Mean session duration over the last `days` days, in minutes.
    ///
    /// Returns 0 when there are no sessions in the window.
    #[must_use]
    pub fn average_session_duration(&self, days: i64, now: DateTime<Utc>) -> f64 {
        let (total, count) = self
            .since(days, now)
            .fold((0.0, 0_u32), |(total, count), s| {
                (total + minutes(s.duration()), count + 1)
            });
        if count == 0 {
            0.0
        } else {
            total / f64::from(count)
        }
    }

    /// Most frequent start temperature over the last `days` days.
    ///
    /// Ties go to the temperature seen first.
    #[must_use]
    pub fn favorite_temperature(&self, days: i64, now: DateTime<Utc>) -> Option<f64> {
        let mut counts: Vec<(f64, u32)> = Vec::new();
        for session in self.since(days, now) {
            let temperature = session.start_temperature;
            match counts
                .iter_mut()
                .find(|(t, _)| (t - temperature).abs() < 0.05)
            {
                Some((_, count)) => *count += 1,
                None => counts.push((temperature, 1)),
            }
        }

        let max = counts.iter().map(|(_, count)| *count).max()?;
        counts
            .into_iter()
            .find(|(_, count)| *count == max)
            .map(|(t, _)| t)
    }

    /// Total session time today, in minutes.
    #[must_use]
    pub fn total_runtime_today(&self, now: DateTime<Utc>) -> f64 {
        self.today(now).map(|s| minutes(s.duration())).sum()
    }

    /// Time since the most recent session ended.
    #[must_use]
    pub fn time_since_last_use(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.sessions
            .iter()
            .map(|s| s.end_time)
            .max()
            .map(|end| now - end)
    }

    /// Summary for diagnostics output.
    #[must_use]
    pub fn diagnostics(&self, now: DateTime<Utc>) -> serde_json::Value {
        json!({
            "total_sessions": self.sessions.len(),
            "sessions_today": self.sessions_today(now),
            "avg_session_duration_7d": self.average_session_duration(7, now),
            "favorite_temperature_30d": self.favorite_temperature(30, now),
            "total_runtime_today": self.total_runtime_today(now),
            "time_since_last_use_minutes": self.time_since_last_use(now).map(|d| d.num_minutes()),
            "current_session_active": self.session_active(),
        })
    }
}

fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

#[allow(clippy::cast_precision_loss)]
fn minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}
