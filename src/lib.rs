// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Volcano` Lib - A Rust library to control Storz & Bickel Volcano Hybrid
//! vaporizers over Bluetooth Low Energy.
//!
//! This library provides async APIs to drive the heater and air pump, read
//! temperatures and device information, and follow usage sessions.
//!
//! # Supported Features
//!
//! - **Heater control**: Target temperature, heat on/off, temperature presets
//! - **Fan control**: Fan on/off, automatic fan-off timer
//! - **Live state**: Notification-driven cache with change callbacks
//! - **Polling**: Adaptive poll loop with reconnection and session tracking
//! - **Statistics**: Sessions per day, durations, favourite temperature
//!
//! # Layers
//!
//! - [`VolcanoDevice`]: one BLE link, typed operations, state cache
//! - [`Coordinator`]: poll loop, snapshots, session and fan events
//! - [`entity`]: climate, fan, sensor, button and number views
//!
//! The BLE transport sits behind the [`protocol::Connector`] trait. The
//! default `ble` feature provides [`protocol::BleConnector`] on top of
//! `btleplug`; tests plug in their own.
//!
//! # Quick Start
//!
//! ```no_run
//! use volcano_lib::{VolcanoConfig, VolcanoDevice};
//! use volcano_lib::protocol::BleConnector;
//!
//! #[tokio::main]
//! async fn main() -> volcano_lib::Result<()> {
//!     let config = VolcanoConfig::new("00:11:22:33:44:55".parse()?);
//!     let device = VolcanoDevice::new(BleConnector::new().await?, config);
//!
//!     device.connect(3).await?;
//!     device.set_target_temperature(190.0).await?;
//!     device.heat_on().await?;
//!
//!     if let Some(temperature) = device.current_temperature().await {
//!         println!("Heater at {temperature}");
//!     }
//!
//!     device.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Callbacks
//!
//! ```no_run
//! use volcano_lib::{Subscribable, VolcanoConfig, VolcanoDevice};
//! use volcano_lib::protocol::BleConnector;
//!
//! # async fn example() -> volcano_lib::Result<()> {
//! let config = VolcanoConfig::new("00:11:22:33:44:55".parse()?);
//! let device = VolcanoDevice::new(BleConnector::new().await?, config);
//!
//! device.on_temperature_changed(|temperature| {
//!     println!("Heater now at {temperature}");
//! });
//! device.on_fan_changed(|on| println!("Fan {}", if on { "on" } else { "off" }));
//!
//! device.connect(3).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
mod device;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod event;
pub mod protocol;
pub mod state;
pub mod statistics;
pub mod subscription;
pub mod types;

pub use config::VolcanoConfig;
pub use coordinator::Coordinator;
pub use device::VolcanoDevice;
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{EventBus, SessionEvent, VolcanoEvent};
pub use state::{DeviceInfo, DeviceState, Snapshot, StateChange};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{
    Brightness, DeviceAddress, FanTimer, StatusRegister, Temperature, TemperaturePreset,
};
