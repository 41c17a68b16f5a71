// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the BLE link manager using the scripted fake.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use common::{FakeConnector, device, settle};
use volcano_lib::error::{Error, ParseError, ProtocolError, ValueError};
use volcano_lib::protocol::Characteristic;
use volcano_lib::{Subscribable, VolcanoEvent};

fn counter() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
    let count = Arc::new(AtomicU32::new(0));
    (count.clone(), count)
}

// ============================================================================
// Connection
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_subscribes_to_notifications() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        device.connect(3).await.unwrap();

        assert!(device.is_connected().await);
        assert_eq!(fake.connect_attempts(), 1);
        let subscriptions = fake.subscriptions();
        assert!(subscriptions.contains(&Characteristic::CurrentTemperature));
        assert!(subscriptions.contains(&Characteristic::StatusRegister));
    }

    #[tokio::test]
    async fn connect_when_connected_is_a_no_op() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        device.connect(3).await.unwrap();
        device.connect(3).await.unwrap();

        assert_eq!(fake.connect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_tries_exactly_max_retries_with_backoff() {
        let fake = FakeConnector::new();
        fake.fail_next_connects(10);
        let device = device(&fake);

        let started = tokio::time::Instant::now();
        let err = device.connect(3).await.unwrap_err();

        assert_eq!(fake.connect_attempts(), 3);
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionFailed(_))
        ));
        assert!(err.is_connection());
        // Two waits between three attempts, none after the last
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert!(!device.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_recovers_after_failures() {
        let fake = FakeConnector::new();
        fake.fail_next_connects(2);
        let device = device(&fake);

        device.connect(3).await.unwrap();

        assert_eq!(fake.connect_attempts(), 3);
        assert!(device.is_connected().await);
    }

    #[tokio::test]
    async fn zero_retries_still_tries_once() {
        let fake = FakeConnector::new();
        fake.fail_next_connects(1);
        let device = device(&fake);

        assert!(device.connect(0).await.is_err());
        assert_eq!(fake.connect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_connect_times_out() {
        let fake = FakeConnector::new();
        fake.hang_connects(true);
        let device = device(&fake);

        let err = device.connect(1).await.unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(!device.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_attempts_leave_no_link_behind() {
        let fake = FakeConnector::new();
        fake.hang_connects(true);
        let device = device(&fake);

        assert!(device.connect(2).await.is_err());

        assert_eq!(fake.connect_attempts(), 2);
        assert_eq!(fake.abandoned(), 2);
        assert!(!fake.is_linked());
    }

    #[tokio::test]
    async fn failed_setup_closes_partial_client() {
        let fake = FakeConnector::new();
        fake.fail_events(true);
        let device = device(&fake);

        assert!(device.connect(1).await.is_err());
        assert_eq!(fake.disconnects(), 1);
        assert!(!fake.is_linked());
    }

    #[tokio::test]
    async fn voluntary_disconnect_skips_disconnect_callback() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let (calls, seen) = counter();
        device.set_disconnect_callback(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        let (registry_calls, registry_seen) = counter();
        device.on_disconnected(move || {
            registry_calls.fetch_add(1, Ordering::SeqCst);
        });
        let mut events = device.event_bus().subscribe();

        device.connect(1).await.unwrap();
        device.disconnect().await;
        settle().await;

        assert!(!device.is_connected().await);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(registry_seen.load(Ordering::SeqCst), 1);
        assert_eq!(fake.disconnects(), 1);
        assert!(fake.subscriptions().is_empty());

        assert!(matches!(events.try_recv(), Ok(VolcanoEvent::Connected)));
        assert!(matches!(
            events.try_recv(),
            Ok(VolcanoEvent::Disconnected { unexpected: false })
        ));
    }

    #[tokio::test]
    async fn disconnect_when_not_connected_is_quiet() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let mut events = device.event_bus().subscribe();

        device.disconnect().await;

        assert_eq!(fake.disconnects(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn link_loss_runs_disconnect_callback_once() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let (calls, seen) = counter();
        device.set_disconnect_callback(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        let mut events = device.event_bus().subscribe();

        device.connect(1).await.unwrap();
        fake.drop_link();
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!device.is_connected().await);
        assert!(matches!(events.try_recv(), Ok(VolcanoEvent::Connected)));
        assert!(matches!(
            events.try_recv(),
            Ok(VolcanoEvent::Disconnected { unexpected: true })
        ));

        // A later voluntary disconnect does not fire it again
        device.disconnect().await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_after_link_loss() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        device.connect(1).await.unwrap();
        fake.drop_link();
        settle().await;
        device.connect(1).await.unwrap();

        assert!(device.is_connected().await);
        assert_eq!(fake.connect_attempts(), 2);
    }
}

// ============================================================================
// Notifications
// ============================================================================

mod notifications {
    use super::*;

    #[tokio::test]
    async fn status_notification_updates_cache_on_change_only() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let (calls, heat_changes) = counter();
        device.on_heat_changed(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        device.connect(1).await.unwrap();
        fake.notify(Characteristic::StatusRegister, &[0x20, 0x00]);
        settle().await;

        assert_eq!(device.state().heat_on(), Some(true));
        assert_eq!(device.state().fan_on(), Some(false));
        assert_eq!(heat_changes.load(Ordering::SeqCst), 1);

        fake.notify(Characteristic::StatusRegister, &[0x20, 0x00]);
        settle().await;
        assert_eq!(heat_changes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn temperature_notification_reaches_callback() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        device.on_temperature_changed(move |temperature| {
            sink.lock().push(temperature.celsius());
        });

        device.connect(1).await.unwrap();
        fake.notify(Characteristic::CurrentTemperature, &1850_u16.to_le_bytes());
        settle().await;

        assert_eq!(*seen.lock(), vec![185.0]);
    }

    #[tokio::test]
    async fn target_changes_reach_callback_from_writes_and_reads() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        device.on_target_temperature_changed(move |temperature| {
            sink.lock().push(temperature.celsius());
        });
        device.connect(1).await.unwrap();

        device.set_target_temperature(200.0).await.unwrap();
        // Adjusted on the device itself
        fake.set_target(2100);
        device.target_temperature().await.unwrap();
        // Unchanged: no second report
        device.target_temperature().await.unwrap();

        assert_eq!(*seen.lock(), vec![200.0, 210.0]);
    }

    #[tokio::test]
    async fn status_read_reports_moved_fields() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let (calls, fan_changes) = counter();
        device.on_fan_changed(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        device.connect(1).await.unwrap();

        device.read_status().await.unwrap();
        fake.set_fan(true);
        device.read_status().await.unwrap();
        device.read_status().await.unwrap();

        // Unknown -> off, then off -> on
        assert_eq!(fan_changes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_notification_is_ignored() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        device.connect(1).await.unwrap();
        fake.notify(Characteristic::StatusRegister, &[0x20]);
        settle().await;

        assert_eq!(device.state().heat_on(), None);
        assert!(device.is_connected().await);
    }

    #[tokio::test]
    async fn unsubscribed_callback_is_not_called() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        let (calls, fan_changes) = counter();
        let id = device.on_fan_changed(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert!(device.unsubscribe(id));

        device.connect(1).await.unwrap();
        fake.notify(Characteristic::StatusRegister, &[0x00, 0x20]);
        settle().await;

        assert_eq!(device.state().fan_on(), Some(true));
        assert_eq!(fan_changes.load(Ordering::SeqCst), 0);
    }
}

// ============================================================================
// Operations
// ============================================================================

mod operations {
    use super::*;

    #[tokio::test]
    async fn tolerant_getters_read_and_cache() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();

        let current = device.current_temperature().await.unwrap();
        let target = device.target_temperature().await.unwrap();

        assert!((current.celsius() - 25.0).abs() < f64::EPSILON);
        assert!((target.celsius() - 185.0).abs() < f64::EPSILON);
        assert_eq!(device.state().current_temperature(), Some(current));
        assert_eq!(device.state().target_temperature(), Some(target));
    }

    #[tokio::test]
    async fn tolerant_getter_reconnects_once() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        assert!(device.current_temperature().await.is_some());
        assert_eq!(fake.connect_attempts(), 1);
        assert!(device.is_connected().await);
    }

    #[tokio::test]
    async fn tolerant_getter_gives_up_after_one_attempt() {
        let fake = FakeConnector::new();
        fake.fail_next_connects(5);
        let device = device(&fake);

        assert!(device.target_temperature().await.is_none());
        assert_eq!(fake.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn tolerant_getter_swallows_read_errors() {
        let fake = FakeConnector::new();
        fake.fail_reads(Characteristic::CurrentTemperature);
        let device = device(&fake);
        device.connect(1).await.unwrap();

        assert!(device.current_temperature().await.is_none());
    }

    #[tokio::test]
    async fn target_out_of_range_is_rejected_before_io() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        let err = device.set_target_temperature(250.0).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Value(ValueError::TemperatureOutOfRange(_))
        ));
        assert_eq!(fake.connect_attempts(), 0);
        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn set_target_writes_tenths() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();

        let temperature = device.set_target_temperature(190.0).await.unwrap();

        assert_eq!(temperature.raw(), 1900);
        assert_eq!(
            fake.writes_to(Characteristic::TargetTemperature),
            vec![vec![0x6C, 0x07]]
        );
        assert_eq!(device.state().target_temperature(), Some(temperature));
    }

    #[tokio::test]
    async fn writes_require_a_connection() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        assert!(matches!(
            device.heat_on().await.unwrap_err(),
            Error::NotConnected
        ));
        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();
        fake.fail_writes(true);

        let err = device.fan_on().await.unwrap_err();

        assert!(err.is_connection());
        assert_eq!(device.state().fan_on(), None);
    }

    #[tokio::test]
    async fn switch_is_confirmed_by_status_read() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();

        assert!(device.heat_on().await.unwrap());
        assert_eq!(fake.writes_to(Characteristic::HeatOn), vec![vec![0x01]]);
        assert_eq!(device.state().heat_on(), Some(true));

        assert!(!device.heat_off().await.unwrap());
        assert_eq!(device.state().heat_on(), Some(false));
    }

    #[tokio::test]
    async fn failed_verification_assumes_requested_state() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();
        fake.fail_reads(Characteristic::StatusRegister);

        assert!(device.fan_on().await.unwrap());
        assert_eq!(device.state().fan_on(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn verification_waits_for_settle_delay() {
        let fake = FakeConnector::new();
        let config = common::config().with_settle_delay(Duration::from_millis(100));
        let device = volcano_lib::VolcanoDevice::new(fake.clone(), config);
        device.connect(1).await.unwrap();

        let started = tokio::time::Instant::now();
        device.fan_on().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn short_status_read_is_a_parse_error() {
        let fake = FakeConnector::new();
        fake.set_raw(Characteristic::StatusRegister, &[0x20]);
        let device = device(&fake);
        device.connect(1).await.unwrap();

        let err = device.read_status().await.unwrap_err();

        assert!(matches!(err, Error::Parse(ParseError::ShortRead { .. })));
        assert!(!err.is_connection());
    }

    #[tokio::test]
    async fn brightness_is_validated_then_written() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();

        assert!(device.set_screen_brightness(101).await.is_err());
        assert_eq!(device.set_screen_brightness(80).await.unwrap().value(), 80);
        assert_eq!(
            fake.writes_to(Characteristic::ScreenBrightness),
            vec![vec![80]]
        );
    }

    #[tokio::test]
    async fn device_info_reads_everything() {
        let fake = FakeConnector::new();
        let device = device(&fake);
        device.connect(1).await.unwrap();

        let info = device.device_info().await.unwrap();

        assert_eq!(info.ble_firmware_version.as_deref(), Some("V01.0.7"));
        assert_eq!(info.volcano_firmware_version.as_deref(), Some("V2.38"));
        assert_eq!(info.serial_number.as_deref(), Some("VH123456"));
        assert_eq!(info.hours_of_operation, Some(412));
        assert_eq!(info.minutes_of_operation, Some(27));
    }

    #[tokio::test]
    async fn device_info_tolerates_single_failures() {
        let fake = FakeConnector::new();
        fake.fail_reads(Characteristic::HoursOfOperation);
        fake.set_raw(Characteristic::MinutesOfOperation, &[1, 2, 3]);
        let device = device(&fake);
        device.connect(1).await.unwrap();

        let info = device.device_info().await.unwrap();

        assert_eq!(info.hours_of_operation, None);
        assert_eq!(info.minutes_of_operation, None);
        assert_eq!(info.serial_number.as_deref(), Some("VH123456"));
    }

    #[tokio::test]
    async fn device_info_requires_a_connection() {
        let fake = FakeConnector::new();
        let device = device(&fake);

        assert!(matches!(
            device.device_info().await.unwrap_err(),
            Error::NotConnected
        ));
    }
}
