// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform Bluetooth transport built on `btleplug`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic as GattCharacteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::types::DeviceAddress;

use super::{Characteristic, Connector, GattClient, LinkEvent, LinkEventStream};

/// Interval between peripheral list checks while scanning.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Connector that resolves devices through the first platform adapter.
///
/// # Examples
///
/// ```no_run
/// use volcano_lib::protocol::{BleConnector, Connector};
/// use volcano_lib::types::DeviceAddress;
///
/// # async fn example() -> volcano_lib::Result<()> {
/// let connector = BleConnector::new().await?;
/// let address: DeviceAddress = "00:11:22:33:44:55".parse()?;
/// let client = connector.connect(&address).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BleConnector {
    adapter: Adapter,
    scan_timeout: Duration,
}

impl BleConnector {
    /// Default time spent looking for the peripheral before giving up.
    pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a connector bound to the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::NoAdapter` if the system has no Bluetooth
    /// adapter, or a BLE error if the platform manager cannot be created.
    pub async fn new() -> Result<Self, ProtocolError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(ProtocolError::NoAdapter)?;
        Ok(Self::with_adapter(adapter))
    }

    /// Creates a connector bound to a specific adapter.
    #[must_use]
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            scan_timeout: Self::DEFAULT_SCAN_TIMEOUT,
        }
    }

    /// Sets how long to scan for the peripheral.
    #[must_use]
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Returns the adapter used by this connector.
    #[must_use]
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    async fn find_peripheral(&self, address: &DeviceAddress) -> Result<Peripheral, ProtocolError> {
        if let Some(peripheral) = self.known_peripheral(address).await? {
            return Ok(peripheral);
        }

        self.adapter.start_scan(ScanFilter::default()).await?;
        let deadline = Instant::now() + self.scan_timeout;
        let found = loop {
            if let Some(peripheral) = self.known_peripheral(address).await? {
                break Some(peripheral);
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(SCAN_POLL_INTERVAL).await;
        };
        if let Err(error) = self.adapter.stop_scan().await {
            debug!(?error, "failed to stop scan cleanly");
        }

        found.ok_or_else(|| ProtocolError::DeviceNotFound(address.to_string()))
    }

    async fn known_peripheral(
        &self,
        address: &DeviceAddress,
    ) -> Result<Option<Peripheral>, ProtocolError> {
        for peripheral in self.adapter.peripherals().await? {
            let Some(properties) = peripheral.properties().await? else {
                continue;
            };
            if address.matches(&properties.address.to_string()) {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Connector for BleConnector {
    type Client = BleClient;

    async fn connect(&self, address: &DeviceAddress) -> Result<BleClient, ProtocolError> {
        let peripheral = self.find_peripheral(address).await?;

        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        if let Err(error) = peripheral.discover_services().await {
            if let Err(close_error) = peripheral.disconnect().await {
                debug!(%address, error = %close_error, "failed to close half-open link");
            }
            return Err(error.into());
        }

        let characteristics: HashMap<Uuid, GattCharacteristic> = peripheral
            .characteristics()
            .into_iter()
            .map(|c| (c.uuid, c))
            .collect();
        debug!(%address, count = characteristics.len(), "discovered characteristics");
        info!(%address, "BLE link established");

        Ok(BleClient {
            adapter: self.adapter.clone(),
            peripheral,
            characteristics,
        })
    }

    async fn abandon(&self, address: &DeviceAddress) -> Result<(), ProtocolError> {
        let Some(peripheral) = self.known_peripheral(address).await? else {
            return Ok(());
        };
        if peripheral.is_connected().await? {
            debug!(%address, "closing abandoned link");
            peripheral.disconnect().await?;
        }
        Ok(())
    }
}

/// A live `btleplug` connection.
#[derive(Debug)]
pub struct BleClient {
    adapter: Adapter,
    peripheral: Peripheral,
    characteristics: HashMap<Uuid, GattCharacteristic>,
}

impl BleClient {
    fn characteristic(&self, which: Characteristic) -> Result<&GattCharacteristic, ProtocolError> {
        self.characteristics
            .get(&which.uuid())
            .ok_or(ProtocolError::CharacteristicNotFound(which.uuid()))
    }
}

#[async_trait]
impl GattClient for BleClient {
    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn read(&self, characteristic: Characteristic) -> Result<Vec<u8>, ProtocolError> {
        let gatt = self.characteristic(characteristic)?;
        Ok(self.peripheral.read(gatt).await?)
    }

    async fn write(
        &self,
        characteristic: Characteristic,
        value: &[u8],
    ) -> Result<(), ProtocolError> {
        let gatt = self.characteristic(characteristic)?;
        Ok(self
            .peripheral
            .write(gatt, value, WriteType::WithResponse)
            .await?)
    }

    async fn subscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError> {
        let gatt = self.characteristic(characteristic)?;
        Ok(self.peripheral.subscribe(gatt).await?)
    }

    async fn unsubscribe(&self, characteristic: Characteristic) -> Result<(), ProtocolError> {
        let gatt = self.characteristic(characteristic)?;
        Ok(self.peripheral.unsubscribe(gatt).await?)
    }

    async fn events(&self) -> Result<LinkEventStream, ProtocolError> {
        let notifications = self
            .peripheral
            .notifications()
            .await?
            .filter_map(|notification| {
                futures::future::ready(Characteristic::from_uuid(notification.uuid).map(
                    |characteristic| LinkEvent::Notification {
                        characteristic,
                        value: notification.value,
                    },
                ))
            });

        let peripheral_id = self.peripheral.id();
        let disconnects = self.adapter.events().await?.filter_map(move |event| {
            futures::future::ready(match event {
                CentralEvent::DeviceDisconnected(id) if id == peripheral_id => {
                    Some(LinkEvent::Disconnected)
                }
                _ => None,
            })
        });

        Ok(futures::stream::select(notifications, disconnects).boxed())
    }

    async fn disconnect(&self) -> Result<(), ProtocolError> {
        Ok(self.peripheral.disconnect().await?)
    }
}
