// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Home-automation style views over a [`Coordinator`].
//!
//! Each entity reads from the coordinator's last [`Snapshot`] and turns
//! user actions into device writes. Actions never fail: errors are logged
//! and the action reports `false`. A successful action asks the
//! coordinator for an immediate refresh so readers see the new state.
//!
//! | Entity                | Reads                          | Writes                 |
//! |-----------------------|--------------------------------|------------------------|
//! | [`Climate`]           | temperatures, heater           | target, heater         |
//! | [`Fan`]               | fan                            | fan, deferred fan-off  |
//! | [`Sensors`]           | statistics, device info        |                        |
//! | [`PresetButton`]      |                                | target temperature     |
//! | [`FanTimerNumber`]    | local timer value              | fan with timer         |
//! | [`BrightnessNumber`]  | last written brightness        | screen brightness      |
//!
//! [`Snapshot`]: crate::state::Snapshot

mod button;
mod climate;
mod fan;
mod number;
mod sensor;

pub use button::PresetButton;
pub use climate::{Climate, HvacMode};
pub use fan::Fan;
pub use number::{BrightnessNumber, FanTimerNumber};
pub use sensor::{ConnectionStatus, Sensors};

use tracing::error;

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::protocol::Connector;

/// Logs a failed action or requests a refresh after a successful one.
fn complete<C: Connector, T>(
    coordinator: &Coordinator<C>,
    action: &'static str,
    result: Result<T>,
) -> bool {
    match result {
        Ok(_) => {
            coordinator.request_refresh();
            true
        }
        Err(error) => {
            error!(address = %coordinator.device().address(), action, %error, "action failed");
            false
        }
    }
}
