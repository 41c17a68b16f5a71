// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bluetooth discovery of Volcano devices.
//!
//! A peripheral counts as a Volcano when its advertised name contains
//! "volcano" or "storz" (any case), or when it advertises the Volcano
//! service UUID. See [`is_volcano`].
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use volcano_lib::discovery::discover;
//!
//! # async fn example() -> volcano_lib::Result<()> {
//! for device in discover(Duration::from_secs(10)).await? {
//!     println!("{device}");
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::protocol::VOLCANO_SERVICE_UUID;
use crate::types::DeviceAddress;

#[cfg(feature = "ble")]
pub use scan::{DEFAULT_DISCOVERY_TIMEOUT, discover, discover_with};

/// A Volcano seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    /// Advertised name, if any.
    pub name: Option<String>,
    /// Bluetooth address.
    pub address: DeviceAddress,
    /// Signal strength at discovery time, in dBm.
    pub rssi: Option<i16>,
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - ({})",
            self.name.as_deref().unwrap_or("Volcano"),
            self.address
        )
    }
}

/// Returns `true` if an advertisement looks like a Volcano.
///
/// # Examples
///
/// ```
/// use volcano_lib::discovery::is_volcano;
/// use volcano_lib::protocol::VOLCANO_SERVICE_UUID;
///
/// assert!(is_volcano(Some("S&B VOLCANO H"), &[]));
/// assert!(is_volcano(None, &[VOLCANO_SERVICE_UUID]));
/// assert!(!is_volcano(Some("Headphones"), &[]));
/// ```
#[must_use]
pub fn is_volcano(name: Option<&str>, services: &[Uuid]) -> bool {
    let name_matches = name.is_some_and(|name| {
        let name = name.to_lowercase();
        name.contains("volcano") || name.contains("storz")
    });
    name_matches || services.contains(&VOLCANO_SERVICE_UUID)
}

#[cfg(feature = "ble")]
mod scan {
    use std::collections::HashSet;
    use std::time::Duration;

    use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
    use btleplug::platform::{Adapter, Manager};
    use tracing::{debug, info, warn};

    use crate::error::{ProtocolError, Result};
    use crate::types::DeviceAddress;

    use super::{DiscoveredDevice, is_volcano};

    /// Scan length used when callers have no preference.
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Scans with the first platform adapter for `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::NoAdapter` if the system has no Bluetooth
    /// adapter, or a BLE error if scanning cannot start.
    pub async fn discover(timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        let manager = Manager::new().await.map_err(ProtocolError::from)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(ProtocolError::from)?
            .into_iter()
            .next()
            .ok_or(ProtocolError::NoAdapter)?;
        discover_with(&adapter, timeout).await
    }

    /// Scans with a specific adapter for `timeout`.
    ///
    /// Peripherals whose properties cannot be read are skipped.
    ///
    /// # Errors
    ///
    /// Returns a BLE error if scanning cannot start or the peripheral list
    /// cannot be read.
    pub async fn discover_with(
        adapter: &Adapter,
        timeout: Duration,
    ) -> Result<Vec<DiscoveredDevice>> {
        info!(timeout_secs = timeout.as_secs(), "scanning for Volcano devices");
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(ProtocolError::from)?;
        tokio::time::sleep(timeout).await;
        let peripherals = adapter.peripherals().await;
        if let Err(error) = adapter.stop_scan().await {
            warn!(%error, "failed to stop scan");
        }

        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for peripheral in peripherals.map_err(ProtocolError::from)? {
            let properties = match peripheral.properties().await {
                Ok(Some(properties)) => properties,
                Ok(None) => continue,
                Err(error) => {
                    debug!(%error, "skipping peripheral without properties");
                    continue;
                }
            };
            if !is_volcano(properties.local_name.as_deref(), &properties.services) {
                continue;
            }
            let address = match DeviceAddress::parse(&properties.address.to_string()) {
                Ok(address) => address,
                Err(error) => {
                    debug!(%error, "skipping peripheral with unusable address");
                    continue;
                }
            };
            if !seen.insert(address.clone()) {
                continue;
            }
            debug!(%address, name = ?properties.local_name, "found Volcano");
            devices.push(DiscoveredDevice {
                name: properties.local_name,
                address,
                rssi: properties.rssi,
            });
        }

        info!(count = devices.len(), "discovery finished");
        Ok(devices)
    }
}
