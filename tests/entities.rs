// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the entity adapters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeConnector, device, settle};
use volcano_lib::Coordinator;
use volcano_lib::coordinator::heuristics::IDLE_INTERVAL;
use volcano_lib::entity::{
    BrightnessNumber, Climate, ConnectionStatus, Fan, FanTimerNumber, HvacMode, PresetButton,
    Sensors,
};
use volcano_lib::protocol::Characteristic;
use volcano_lib::types::TemperaturePreset;

async fn connected(fake: &FakeConnector) -> Arc<Coordinator<FakeConnector>> {
    let coordinator = Arc::new(Coordinator::new(Arc::new(device(fake))));
    coordinator.refresh().await.unwrap();
    coordinator
}

// ============================================================================
// Climate
// ============================================================================

mod climate {
    use super::*;

    #[tokio::test]
    async fn reads_from_the_last_snapshot() {
        let fake = FakeConnector::new();
        let climate = Climate::new(connected(&fake).await);

        assert!(climate.is_available());
        assert_eq!(climate.current_temperature(), Some(25.0));
        assert_eq!(climate.target_temperature(), Some(185.0));
        assert_eq!(climate.hvac_mode(), HvacMode::Off);
    }

    #[tokio::test]
    async fn hvac_mode_switches_the_heater() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let climate = Climate::new(coordinator.clone());

        assert!(climate.set_hvac_mode(HvacMode::Heat).await);
        assert_eq!(fake.writes_to(Characteristic::HeatOn).len(), 1);

        coordinator.refresh().await.unwrap();
        assert_eq!(climate.hvac_mode(), HvacMode::Heat);

        assert!(climate.turn_off().await);
        assert_eq!(fake.writes_to(Characteristic::HeatOff).len(), 1);
    }

    #[tokio::test]
    async fn set_temperature_validates_range() {
        let fake = FakeConnector::new();
        let climate = Climate::new(connected(&fake).await);

        assert!(!climate.set_temperature(Climate::<FakeConnector>::MAX_TEMPERATURE + 1.0).await);
        assert!(!climate.set_temperature(39.0).await);
        assert!(fake.writes().is_empty());

        assert!(climate.set_temperature(200.0).await);
        assert_eq!(
            fake.writes_to(Characteristic::TargetTemperature),
            vec![vec![0xD0, 0x07]]
        );
    }

    #[tokio::test]
    async fn transport_errors_are_swallowed() {
        let fake = FakeConnector::new();
        let climate = Climate::new(connected(&fake).await);
        fake.fail_writes(true);

        assert!(!climate.turn_on().await);
        assert!(!climate.set_temperature(190.0).await);
    }

    #[tokio::test]
    async fn unavailable_before_first_poll() {
        let fake = FakeConnector::new();
        let coordinator = Arc::new(Coordinator::new(Arc::new(device(&fake))));
        let climate = Climate::new(coordinator);

        assert!(!climate.is_available());
        assert_eq!(climate.hvac_mode(), HvacMode::Off);
        // Never connected: the write is refused without a connection attempt
        assert!(!climate.turn_on().await);
        assert_eq!(fake.connect_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_action_requests_a_refresh() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let climate = Climate::new(coordinator.clone());
        let mut events = coordinator.subscribe();
        let poller = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.run().await }
        });
        // First cycle of the loop
        while !matches!(events.recv().await, Ok(volcano_lib::VolcanoEvent::Updated(_))) {}

        let started = tokio::time::Instant::now();
        assert!(climate.turn_on().await);
        while !matches!(events.recv().await, Ok(volcano_lib::VolcanoEvent::Updated(_))) {}

        assert!(started.elapsed() < IDLE_INTERVAL);
        assert_eq!(climate.hvac_mode(), HvacMode::Heat);
        coordinator.shutdown().await;
        poller.await.unwrap();
    }
}

// ============================================================================
// Fan
// ============================================================================

mod fan {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_turns_the_fan_off() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);

        assert!(fan.turn_on(Some(Duration::from_secs(30))).await);
        assert!(fan.timer_pending());
        assert!(fake.writes_to(Characteristic::FanOff).is_empty());

        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;

        assert_eq!(fake.writes_to(Characteristic::FanOff).len(), 1);
        assert!(!fan.timer_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn turn_off_cancels_the_timer() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);

        fan.turn_on(Some(Duration::from_secs(30))).await;
        assert!(fan.turn_off().await);
        assert!(!fan.timer_pending());

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(fake.writes_to(Characteristic::FanOff).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_timer_replaces_the_pending_one() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);

        fan.turn_on(Some(Duration::from_secs(10))).await;
        fan.turn_on(Some(Duration::from_secs(60))).await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert!(fake.writes_to(Characteristic::FanOff).is_empty());

        tokio::time::sleep(Duration::from_secs(45)).await;
        settle().await;
        assert_eq!(fake.writes_to(Characteristic::FanOff).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn turn_on_without_duration_keeps_the_timer() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);

        fan.turn_on(Some(Duration::from_secs(10))).await;
        fan.turn_on(None).await;

        assert!(fan.timer_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_turn_on_schedules_nothing() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);
        fake.fail_writes(true);

        assert!(!fan.turn_on(Some(Duration::from_secs(10))).await);
        assert!(!fan.timer_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_fan_cancels_the_timer() {
        let fake = FakeConnector::new();
        let fan = Fan::new(connected(&fake).await);

        fan.turn_on(Some(Duration::from_secs(10))).await;
        drop(fan);

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert!(fake.writes_to(Characteristic::FanOff).is_empty());
    }

    #[tokio::test]
    async fn is_on_follows_the_snapshot() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let fan = Fan::new(coordinator.clone());
        assert!(!fan.is_on());

        fan.turn_on(None).await;
        coordinator.refresh().await.unwrap();
        assert!(fan.is_on());
    }
}

// ============================================================================
// Buttons and numbers
// ============================================================================

mod controls {
    use super::*;

    #[tokio::test]
    async fn preset_buttons_set_the_target() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let buttons = PresetButton::all(&coordinator);

        assert_eq!(buttons.len(), 4);
        let potent = buttons
            .iter()
            .find(|button| button.preset() == TemperaturePreset::Potent)
            .unwrap();
        assert!(potent.press().await);
        assert_eq!(
            fake.writes_to(Characteristic::TargetTemperature),
            vec![vec![0x9E, 0x07]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fan_timer_number_runs_the_fan() {
        let fake = FakeConnector::new();
        let fan = Arc::new(Fan::new(connected(&fake).await));
        let timer = FanTimerNumber::new(fan.clone());

        assert_eq!(timer.value().seconds(), 30);
        assert!(!timer.set_value(0));
        assert!(!timer.set_value(301));
        assert!(timer.set_value(45));
        assert_eq!(timer.value().seconds(), 45);

        assert!(timer.start().await);
        assert_eq!(fake.writes_to(Characteristic::FanOn).len(), 1);
        assert!(fan.timer_pending());

        tokio::time::sleep(Duration::from_secs(44)).await;
        settle().await;
        assert!(fake.writes_to(Characteristic::FanOff).is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(fake.writes_to(Characteristic::FanOff).len(), 1);
    }

    #[tokio::test]
    async fn fan_timer_number_uses_configured_default() {
        let fake = FakeConnector::new();
        let config = common::config().with_fan_timer(Duration::from_secs(90));
        let device = volcano_lib::VolcanoDevice::new(fake.clone(), config);
        let coordinator = Arc::new(Coordinator::new(Arc::new(device)));
        let timer = FanTimerNumber::new(Arc::new(Fan::new(coordinator)));

        assert_eq!(timer.value().seconds(), 90);
    }

    #[tokio::test]
    async fn brightness_number_keeps_last_accepted_value() {
        let fake = FakeConnector::new();
        let brightness = BrightnessNumber::new(connected(&fake).await);

        assert_eq!(brightness.value().value(), 70);
        assert!(!brightness.set_value(150).await);
        assert_eq!(brightness.value().value(), 70);

        assert!(brightness.set_value(40).await);
        assert_eq!(brightness.value().value(), 40);
        assert_eq!(
            fake.writes_to(Characteristic::ScreenBrightness),
            vec![vec![40]]
        );

        fake.fail_writes(true);
        assert!(!brightness.set_value(90).await);
        assert_eq!(brightness.value().value(), 40);
    }
}

// ============================================================================
// Sensors
// ============================================================================

mod sensors {
    use super::*;

    #[tokio::test]
    async fn report_session_statistics_and_device_info() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let sensors = Sensors::new(coordinator.clone());

        assert_eq!(sensors.connection_status(), ConnectionStatus::Connected);
        assert_eq!(sensors.target_temperature(), Some(185.0));
        assert_eq!(sensors.sessions_today(), 0);
        assert_eq!(sensors.average_session_duration(), None);
        assert_eq!(sensors.favorite_temperature(), None);
        assert_eq!(sensors.time_since_last_use_hours(), None);
        assert_eq!(sensors.serial_number().as_deref(), Some("VH123456"));
        assert_eq!(sensors.hours_of_operation(), Some(412));
        assert_eq!(sensors.volcano_firmware_version().as_deref(), Some("V2.38"));

        fake.set_current(700);
        coordinator.refresh().await.unwrap();
        fake.set_current(900);
        coordinator.refresh().await.unwrap();
        fake.set_current(400);
        coordinator.refresh().await.unwrap();

        assert_eq!(sensors.sessions_today(), 1);
        assert_eq!(sensors.total_sessions(), 1);
        assert!(sensors.last_session_duration().is_some());
        assert_eq!(sensors.favorite_temperature(), Some(185.0));
        assert_eq!(sensors.time_since_last_use_hours(), Some(0.0));
        assert!(sensors.total_runtime_today() >= 0.0);
        assert!(sensors.average_duration_7d() >= 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_status_follows_the_link() {
        let fake = FakeConnector::new();
        let coordinator = connected(&fake).await;
        let sensors = Sensors::new(coordinator.clone());

        fake.drop_link();
        fake.fail_next_connects(10);
        settle().await;
        coordinator.refresh().await.unwrap();

        assert_eq!(sensors.connection_status(), ConnectionStatus::Disconnected);
        assert_eq!(sensors.connection_status().to_string(), "Disconnected");
    }
}
