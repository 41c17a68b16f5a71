// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature preset buttons.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::protocol::Connector;
use crate::types::TemperaturePreset;

use super::complete;

/// Button that sets the target temperature to a preset.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use volcano_lib::Coordinator;
/// # use volcano_lib::protocol::BleConnector;
/// use volcano_lib::entity::PresetButton;
///
/// # async fn example(coordinator: Arc<Coordinator<BleConnector>>) {
/// for button in PresetButton::all(&coordinator) {
///     println!("{}: {}", button.preset(), button.preset().temperature());
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct PresetButton<C: Connector> {
    coordinator: Arc<Coordinator<C>>,
    preset: TemperaturePreset,
}

impl<C: Connector> PresetButton<C> {
    /// Creates a button for one preset.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>, preset: TemperaturePreset) -> Self {
        Self {
            coordinator,
            preset,
        }
    }

    /// Creates one button per preset, coolest first.
    #[must_use]
    pub fn all(coordinator: &Arc<Coordinator<C>>) -> Vec<Self> {
        TemperaturePreset::ALL
            .into_iter()
            .map(|preset| Self::new(coordinator.clone(), preset))
            .collect()
    }

    /// The preset this button applies.
    #[must_use]
    pub fn preset(&self) -> TemperaturePreset {
        self.preset
    }

    /// Sets the target temperature to the preset value.
    pub async fn press(&self) -> bool {
        let result = self
            .coordinator
            .device()
            .set_target_temperature(self.preset.temperature().celsius())
            .await;
        complete(&self.coordinator, "preset", result)
    }
}
