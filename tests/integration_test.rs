//! Integration tests for city-energy-live
//!
//! These tests verify the core functionality without requiring a broker or backend.

use chrono::{TimeZone, Utc};
use city_energy_live::api::{EnergySource, LatestReading, SensorSnapshot, SensorStatus};
use city_energy_live::config::{Config, MqttConfig};
use city_energy_live::errors::{ApiError, MqttError, SinkError};
use city_energy_live::live::aggregator::{round, IngestOutcome, LiveAggregator, LiveTotals};
use city_energy_live::live::marker::MarkerKind;
use city_energy_live::live::selection::{Selection, SelectionStore};
use city_energy_live::live::summary::FleetSummary;
use city_energy_live::mqtt::context::MqttPayload;
use city_energy_live::mqtt::MqttPublisher;
use std::sync::mpsc;
use std::time::Duration;

fn sensor(id: &str, district: &str, source: EnergySource, kwh: Option<f64>) -> SensorSnapshot {
    SensorSnapshot {
        sensor_id: id.to_string(),
        district_name: district.to_string(),
        energy_source: source,
        status: if kwh.is_some() {
            SensorStatus::Active
        } else {
            SensorStatus::Offline
        },
        latitude: -6.2,
        longitude: 106.8,
        latest_reading: kwh.map(|kwh_usage| LatestReading {
            kwh_usage,
            voltage: 225.0,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        }),
    }
}

#[test]
fn test_mqtt_config_debug_redacts_password() {
    let config = MqttConfig {
        root: "city-energy".to_string(),
        host: Some("mqtt.example.com".to_string()),
        port: 1883,
        socket: None,
        username: "test-user".to_string(),
        password: "secret-password".to_string(),
    };

    let debug_output = format!("{:?}", config);

    // Password should be redacted
    assert!(!debug_output.contains("secret-password"));
    assert!(debug_output.contains("***REDACTED***"));

    // Username should still be visible
    assert!(debug_output.contains("test-user"));
}

#[test]
fn test_config_from_missing_file() {
    let result = Config::from_file("/nonexistent/city-energy.toml");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

fn unreachable_broker() -> MqttConfig {
    MqttConfig {
        root: "city-energy".to_string(),
        host: Some("127.0.0.1".to_string()),
        port: 1,
        socket: None,
        username: String::new(),
        password: String::new(),
    }
}

#[test]
fn test_publishing_without_broker_returns_promptly() {
    let publisher = MqttPublisher::new(&unreachable_broker()).unwrap();
    let (done_tx, done_rx) = mpsc::channel();

    std::thread::spawn(move || {
        let mut failed_ticks = 0;
        for tick in 0..40 {
            let totals = LiveTotals {
                total_kwh: tick as f64,
                ..LiveTotals::default()
            };
            if publisher.publish_totals("total", &totals, None).is_err() {
                failed_ticks += 1;
            }
        }
        let _ = done_tx.send(failed_ticks);
    });

    let failed_ticks = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("publishing blocked while the broker is down");
    // the request queue fills up and further publishes are dropped
    assert!(failed_ticks > 0);
}

#[tokio::test]
async fn test_wait_connected_times_out_without_broker() {
    let publisher = MqttPublisher::new(&unreachable_broker()).unwrap();

    assert!(!publisher.wait_connected(Duration::from_millis(200)).await);
    assert!(!publisher.is_connected());
}

// ============================================================================
// MQTT Payload Tests
// ============================================================================

#[test]
fn test_mqtt_payload_f64() {
    assert_eq!(42.5_f64.to_payload(), "42.5");
    assert_eq!(0.0_f64.to_payload(), "0");
    assert_eq!(round(12.345_6, 2).to_payload(), "12.35");
}

#[test]
fn test_mqtt_payload_u64() {
    assert_eq!(12345_u64.to_payload(), "12345");
    assert_eq!(0_u64.to_payload(), "0");
}

#[test]
fn test_mqtt_payload_bool_and_string() {
    assert_eq!(true.to_payload(), "true");
    assert_eq!(false.to_payload(), "false");
    assert_eq!("10:00:01".to_string().to_payload(), "10:00:01");
}

#[test]
fn test_mqtt_payload_datetime() {
    let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
    let payload = dt.to_payload();

    // Should be RFC3339 format
    assert!(payload.starts_with("2024-01-15T12:30:45"));
}

// ============================================================================
// Error Type Tests
// ============================================================================

#[test]
fn test_api_error_display() {
    let error = ApiError::HttpStatus {
        url: "http://localhost/api/v1/sensors".to_string(),
        status: 503,
    };
    let error_string = error.to_string();
    assert!(error_string.contains("503"));
    assert!(error_string.contains("/sensors"));

    let error = ApiError::Rejected("Sensor service down".to_string());
    assert!(error.to_string().contains("Sensor service down"));
}

#[test]
fn test_sink_error_wraps_mqtt_error() {
    let error: SinkError = MqttError::PublishFailed {
        topic: "city-energy/total/window".to_string(),
        reason: "Connection lost".to_string(),
    }
    .into();
    let error_string = error.to_string();
    assert!(error_string.contains("city-energy/total/window"));
    assert!(error_string.contains("Connection lost"));

    let _: &dyn std::error::Error = &error;
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_polled_lists_fold_into_window_and_fleet() {
    let first = vec![
        sensor("S-1", "Menteng", EnergySource::Solar, Some(5.0)),
        sensor("G-1", "Menteng", EnergySource::Grid, Some(3.0)),
        sensor("G-2", "Kemang", EnergySource::Grid, None),
    ];
    let second = vec![
        sensor("S-1", "Menteng", EnergySource::Solar, Some(6.0)),
        sensor("G-1", "Menteng", EnergySource::Grid, Some(3.0)),
    ];
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap();

    let mut aggregator = LiveAggregator::new(30);
    assert_eq!(aggregator.ingest_labeled(&first, "10:00:00", t0), IngestOutcome::Appended);
    assert_eq!(aggregator.ingest_labeled(&second, "10:00:01", t1), IngestOutcome::Appended);
    assert_eq!(aggregator.ingest_labeled(&[], "10:00:02", t1), IngestOutcome::Empty);

    let totals: Vec<f64> = aggregator.window().points().iter().map(|p| p.total_kwh).collect();
    assert_eq!(totals, vec![8.0, 9.0]);
    assert_eq!(aggregator.window().points()[0].active_count, 2);

    let store = SelectionStore::default();
    store.select_district("Kemang");
    let fleet = FleetSummary::from_sensors(&first, &store.current());
    assert_eq!(fleet.total_sensors, 3);
    assert_eq!(fleet.legend.count(MarkerKind::GridInactive), 1);
    let district = fleet.district.unwrap();
    assert_eq!(district.sensor_count, 1);
    assert_eq!(district.reporting_count, 0);
}

#[test]
fn test_fleet_summary_json_shape() {
    let sensors = vec![sensor("S-1", "Menteng", EnergySource::Solar, Some(1.5))];
    let selection = Selection {
        sensor: Some("S-1".to_string()),
        district: None,
    };

    let json = serde_json::to_value(FleetSummary::from_sensors(&sensors, &selection)).unwrap();

    assert_eq!(json["totalSensors"], 1);
    assert_eq!(json["legend"]["solar_active"], 1);
    assert_eq!(json["sensor"]["marker"], "solar_active");
    assert_eq!(json["sensor"]["latestReading"]["kwhUsage"], 1.5);
    assert!(json["district"].is_null());
}
