// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor a Volcano Hybrid: poll it and print every event.
//!
//! Without an address the program scans for nearby devices and uses the
//! first one found.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example monitor -- [address] [seconds]
//! ```
//!
//! # Example
//!
//! ```bash
//! # Scan, then monitor the first Volcano for 60 seconds
//! cargo run --example monitor
//!
//! # Monitor a known device for 5 minutes
//! cargo run --example monitor -- 00:11:22:33:44:55 300
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use volcano_lib::discovery::{self, DEFAULT_DISCOVERY_TIMEOUT};
use volcano_lib::protocol::BleConnector;
use volcano_lib::types::DeviceAddress;
use volcano_lib::{Coordinator, VolcanoConfig, VolcanoDevice, VolcanoEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let address: DeviceAddress = if let Some(address) = args.get(1) {
        address.parse()?
    } else {
        println!("Scanning for {}s...", DEFAULT_DISCOVERY_TIMEOUT.as_secs());
        let found = discovery::discover(DEFAULT_DISCOVERY_TIMEOUT).await?;
        for device in &found {
            println!("  found {device} rssi={:?}", device.rssi);
        }
        let Some(first) = found.into_iter().next() else {
            eprintln!("No Volcano found");
            std::process::exit(1);
        };
        first.address
    };
    let seconds: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(60);

    let config = VolcanoConfig::new(address);
    let device = Arc::new(VolcanoDevice::new(BleConnector::new().await?, config));
    let coordinator = Arc::new(Coordinator::new(device));
    let mut events = coordinator.subscribe();

    let runner = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run().await })
    };

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            event = events.recv() => match event {
                Ok(VolcanoEvent::Updated(snapshot)) => {
                    println!(
                        "update: connected={} current={:?} target={:?} heat={} fan={} \
                         sessions_today={}",
                        snapshot.connected,
                        snapshot.current_temperature,
                        snapshot.target_temperature,
                        snapshot.heat_on,
                        snapshot.fan_on,
                        snapshot.statistics.sessions_today,
                    );
                }
                Ok(VolcanoEvent::Session(session)) => println!("session: {session:?}"),
                Ok(other) => println!("event: {other:?}"),
                Err(error) => eprintln!("event stream: {error}"),
            },
        }
    }

    println!("{:#}", coordinator.diagnostics().await);
    coordinator.shutdown().await;
    runner.abort();
    Ok(())
}
