//! Map marker classification
//!
//! Every sensor maps to exactly one of four marker kinds (energy source ×
//! active/inactive). Maintenance and offline sensors share the inactive look.

use serde::Serialize;

use crate::api::{EnergySource, SensorSnapshot, SensorStatus};

const SOLAR_FILL: &str = "#f59e0b";
const GRID_FILL: &str = "#3b82f6";
const ACTIVE_RING: &str = "#10b981";
const INACTIVE_RING: &str = "#ef4444";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    SolarActive,
    SolarInactive,
    GridActive,
    GridInactive,
}

/// Visual parameters for one marker kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub fill: &'static str,
    pub ring: &'static str,
    pub opacity: f64,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 4] = [
        MarkerKind::SolarActive,
        MarkerKind::SolarInactive,
        MarkerKind::GridActive,
        MarkerKind::GridInactive,
    ];

    pub fn of(source: EnergySource, status: SensorStatus) -> Self {
        match (source, status.is_active()) {
            (EnergySource::Solar, true) => MarkerKind::SolarActive,
            (EnergySource::Solar, false) => MarkerKind::SolarInactive,
            (EnergySource::Grid, true) => MarkerKind::GridActive,
            (EnergySource::Grid, false) => MarkerKind::GridInactive,
        }
    }

    pub fn for_sensor(sensor: &SensorSnapshot) -> Self {
        Self::of(sensor.energy_source, sensor.status)
    }

    pub fn style(&self) -> MarkerStyle {
        match self {
            MarkerKind::SolarActive => MarkerStyle {
                fill: SOLAR_FILL,
                ring: ACTIVE_RING,
                opacity: 1.0,
            },
            MarkerKind::SolarInactive => MarkerStyle {
                fill: SOLAR_FILL,
                ring: INACTIVE_RING,
                opacity: 0.7,
            },
            MarkerKind::GridActive => MarkerStyle {
                fill: GRID_FILL,
                ring: ACTIVE_RING,
                opacity: 1.0,
            },
            MarkerKind::GridInactive => MarkerStyle {
                fill: GRID_FILL,
                ring: INACTIVE_RING,
                opacity: 0.7,
            },
        }
    }

    /// Topic-safe name
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::SolarActive => "solar_active",
            MarkerKind::SolarInactive => "solar_inactive",
            MarkerKind::GridActive => "grid_active",
            MarkerKind::GridInactive => "grid_inactive",
        }
    }
}

/// Number of sensors drawn with each marker kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarkerLegend {
    pub solar_active: u64,
    pub solar_inactive: u64,
    pub grid_active: u64,
    pub grid_inactive: u64,
}

impl MarkerLegend {
    pub fn from_sensors(sensors: &[SensorSnapshot]) -> Self {
        let mut legend = Self::default();
        for sensor in sensors {
            legend.record(MarkerKind::for_sensor(sensor));
        }
        legend
    }

    fn record(&mut self, kind: MarkerKind) {
        match kind {
            MarkerKind::SolarActive => self.solar_active += 1,
            MarkerKind::SolarInactive => self.solar_inactive += 1,
            MarkerKind::GridActive => self.grid_active += 1,
            MarkerKind::GridInactive => self.grid_inactive += 1,
        }
    }

    pub fn count(&self, kind: MarkerKind) -> u64 {
        match kind {
            MarkerKind::SolarActive => self.solar_active,
            MarkerKind::SolarInactive => self.solar_inactive,
            MarkerKind::GridActive => self.grid_active,
            MarkerKind::GridInactive => self.grid_inactive,
        }
    }

    pub fn total(&self) -> u64 {
        MarkerKind::ALL.iter().map(|k| self.count(*k)).sum()
    }
}
