// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adaptive poll interval.

use std::time::Duration;

use crate::state::Snapshot;

/// Interval while the fan runs or the heater is about to reach its target.
pub const FAST_INTERVAL: Duration = Duration::from_secs(1);

/// Interval while heating.
pub const ACTIVE_INTERVAL: Duration = Duration::from_secs(2);

/// Interval while cooling down but still warm.
pub const COOLING_INTERVAL: Duration = Duration::from_secs(3);

/// Interval when cold and idle.
pub const IDLE_INTERVAL: Duration = Duration::from_secs(5);

/// Picks the next poll interval from the latest snapshot.
///
/// First matching rule wins; missing temperatures count as 0 °C.
///
/// | Condition                                          | Interval |
/// |----------------------------------------------------|----------|
/// | fan on                                             | 1 s      |
/// | heat on, target set, within 10 °C of target        | 1 s      |
/// | heat on, or below a set target                     | 2 s      |
/// | above 50 °C                                        | 3 s      |
/// | otherwise                                          | 5 s      |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use volcano_lib::coordinator::heuristics::poll_interval;
/// use volcano_lib::state::Snapshot;
///
/// assert_eq!(poll_interval(&Snapshot::disconnected()), Duration::from_secs(5));
/// ```
#[must_use]
pub fn poll_interval(snapshot: &Snapshot) -> Duration {
    let current = snapshot.current_temperature.unwrap_or(0.0);
    let target = snapshot.target_temperature.unwrap_or(0.0);

    let near_target = snapshot.heat_on && target > 0.0 && current > target - 10.0;

    if snapshot.fan_on || near_target {
        FAST_INTERVAL
    } else if snapshot.heat_on || (target > 0.0 && current < target) {
        ACTIVE_INTERVAL
    } else if current > 50.0 {
        COOLING_INTERVAL
    } else {
        IDLE_INTERVAL
    }
}
