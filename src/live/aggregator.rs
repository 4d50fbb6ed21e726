//! Rolling live-metrics aggregation
//!
//! Each delivered sensor snapshot folds into one [`AggregatePoint`], which is
//! appended to a bounded [`RollingWindow`]. Points are keyed by their
//! second-resolution time label: a second snapshot landing in the same clock
//! second is dropped.

use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::api::{EnergySource, SensorSnapshot};

/// Window length of the live total-energy chart
pub const TOTAL_WINDOW_CAPACITY: usize = 30;

/// Window length of the live solar/grid trend chart
pub const TREND_WINDOW_CAPACITY: usize = 60;

const LABEL_FORMAT: &str = "%H:%M:%S";

pub fn round(value: f64, decimals: i32) -> f64 {
    let multiplier = 10_f64.powi(decimals);
    (value * multiplier).round() / multiplier
}

/// Totals of the most recent snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTotals {
    pub total_kwh: f64,
    pub solar_kwh: f64,
    pub grid_kwh: f64,
    /// Sensors that carried a reading
    pub active_count: u64,
    pub avg_voltage: f64,
}

impl LiveTotals {
    pub fn from_sensors(sensors: &[SensorSnapshot]) -> Self {
        let mut totals = LiveTotals::default();
        let mut voltage_sum = 0.0;

        for sensor in sensors {
            let Some(reading) = &sensor.latest_reading else {
                continue;
            };
            totals.total_kwh += reading.kwh_usage;
            match sensor.energy_source {
                EnergySource::Solar => totals.solar_kwh += reading.kwh_usage,
                EnergySource::Grid => totals.grid_kwh += reading.kwh_usage,
            }
            voltage_sum += reading.voltage;
            totals.active_count += 1;
        }

        if totals.active_count > 0 {
            totals.avg_voltage = voltage_sum / totals.active_count as f64;
        }
        totals
    }
}

/// One sample of the live time series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePoint {
    pub time: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub total_kwh: f64,
    pub solar_kwh: f64,
    pub grid_kwh: f64,
    pub active_count: u64,
    pub avg_voltage: f64,
}

impl AggregatePoint {
    /// Round totals into a chartable point.
    ///
    /// The total is derived from the rounded split so that it always equals
    /// `solar_kwh + grid_kwh` at two decimals.
    pub fn from_totals(time: impl Into<String>, timestamp: DateTime<Utc>, totals: &LiveTotals) -> Self {
        let solar_kwh = round(totals.solar_kwh, 2);
        let grid_kwh = round(totals.grid_kwh, 2);
        Self {
            time: time.into(),
            timestamp,
            total_kwh: round(solar_kwh + grid_kwh, 2),
            solar_kwh,
            grid_kwh,
            active_count: totals.active_count,
            avg_voltage: round(totals.avg_voltage, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No point recorded yet
    Idle,
    Accumulating,
}

/// Bounded, insertion-ordered series of points with FIFO eviction
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    points: VecDeque<AggregatePoint>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `point` unless the newest point carries the same label.
    ///
    /// Returns `false` when the point was dropped as a duplicate.
    pub fn push(&mut self, point: AggregatePoint) -> bool {
        if self.points.back().is_some_and(|last| last.time == point.time) {
            return false;
        }
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&AggregatePoint> {
        self.points.back()
    }

    pub fn points(&self) -> &VecDeque<AggregatePoint> {
        &self.points
    }

    pub fn state(&self) -> WindowState {
        if self.points.is_empty() {
            WindowState::Idle
        } else {
            WindowState::Accumulating
        }
    }
}

/// What happened to a snapshot handed to [`LiveAggregator::ingest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Appended,
    /// Same time label as the newest point
    Duplicate,
    /// Snapshot held no sensors
    Empty,
}

/// Owns one view's window together with the totals of the latest snapshot
#[derive(Debug, Clone)]
pub struct LiveAggregator {
    window: RollingWindow,
    totals: Option<LiveTotals>,
}

impl LiveAggregator {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RollingWindow::new(capacity),
            totals: None,
        }
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn totals(&self) -> Option<&LiveTotals> {
        self.totals.as_ref()
    }

    /// Fold a snapshot taken now
    pub fn ingest(&mut self, sensors: &[SensorSnapshot]) -> IngestOutcome {
        self.ingest_at(sensors, Local::now())
    }

    pub fn ingest_at(&mut self, sensors: &[SensorSnapshot], at: DateTime<Local>) -> IngestOutcome {
        let label = at.format(LABEL_FORMAT).to_string();
        self.ingest_labeled(sensors, label, at.with_timezone(&Utc))
    }

    pub fn ingest_labeled(
        &mut self,
        sensors: &[SensorSnapshot],
        label: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> IngestOutcome {
        let totals = LiveTotals::from_sensors(sensors);
        self.totals = Some(totals);

        if sensors.is_empty() {
            return IngestOutcome::Empty;
        }

        let point = AggregatePoint::from_totals(label, timestamp, &totals);
        if self.window.push(point) {
            IngestOutcome::Appended
        } else {
            IngestOutcome::Duplicate
        }
    }
}
