//! Wire types for the sensor API
//!
//! Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response wrapper used by every backend endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where a sensor's energy comes from.
///
/// Classification is binary: anything the backend sends other than
/// `"Solar"` counts as grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum EnergySource {
    Solar,
    Grid,
}

impl From<String> for EnergySource {
    fn from(value: String) -> Self {
        if value == "Solar" {
            EnergySource::Solar
        } else {
            EnergySource::Grid
        }
    }
}

impl EnergySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergySource::Solar => "Solar",
            EnergySource::Grid => "Grid",
        }
    }
}

/// Operational status of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum SensorStatus {
    Active,
    Maintenance,
    Offline,
}

impl From<String> for SensorStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Active" => SensorStatus::Active,
            "Maintenance" => SensorStatus::Maintenance,
            _ => SensorStatus::Offline,
        }
    }
}

impl SensorStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SensorStatus::Active)
    }
}

/// Most recent reading attached to a sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReading {
    pub kwh_usage: f64, // kWh
    pub voltage: f64,   // V
    pub recorded_at: DateTime<Utc>,
}

/// One sensor's current state, as delivered by a single poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub sensor_id: String,
    pub district_name: String,
    pub energy_source: EnergySource,
    pub status: SensorStatus,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub latest_reading: Option<LatestReading>,
}

/// Server-side hourly aggregate for one hour of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyStats {
    pub hour: u32,
    pub time_label: String,
    pub total_kwh: f64,
    pub solar_kwh: f64,
    pub grid_kwh: f64,
    pub reading_count: u64,
}
