//! Rendering sinks for live data
//!
//! A sink receives the window and totals after every accepted tick, the totals
//! alone when a tick changed them without touching the window, and the fleet
//! summary whenever it changes. Views pass the previously rendered value so
//! sinks can skip unchanged fields.

use tracing::info;

use crate::errors::SinkError;
use crate::live::aggregator::{LiveTotals, RollingWindow};
use crate::live::summary::FleetSummary;

pub trait LiveSink: Send + Sync {
    fn window_updated(
        &self,
        view: &str,
        window: &RollingWindow,
        totals: &LiveTotals,
        old: Option<&LiveTotals>,
    ) -> Result<(), SinkError>;

    /// Totals of an empty or duplicate tick; the window is unchanged
    fn totals_updated(
        &self,
        view: &str,
        totals: &LiveTotals,
        old: Option<&LiveTotals>,
    ) -> Result<(), SinkError>;

    fn fleet_updated(
        &self,
        fleet: &FleetSummary,
        old: Option<&FleetSummary>,
    ) -> Result<(), SinkError>;
}

/// Writes one log line per update, used when no broker is configured
#[derive(Debug, Default)]
pub struct LogSink;

impl LiveSink for LogSink {
    fn window_updated(
        &self,
        view: &str,
        window: &RollingWindow,
        totals: &LiveTotals,
        _old: Option<&LiveTotals>,
    ) -> Result<(), SinkError> {
        let time = window.last().map(|p| p.time.as_str()).unwrap_or("-");
        info!(
            "[{}] {} Total={:.2}kWh Solar={:.2}kWh Grid={:.2}kWh Sensors={} Voltage={:.0}V ({}/{} points)",
            view,
            time,
            totals.total_kwh,
            totals.solar_kwh,
            totals.grid_kwh,
            totals.active_count,
            totals.avg_voltage,
            window.len(),
            window.capacity()
        );
        Ok(())
    }

    fn totals_updated(
        &self,
        view: &str,
        totals: &LiveTotals,
        _old: Option<&LiveTotals>,
    ) -> Result<(), SinkError> {
        info!(
            "[{}] Total={:.2}kWh Solar={:.2}kWh Grid={:.2}kWh Sensors={} (window unchanged)",
            view, totals.total_kwh, totals.solar_kwh, totals.grid_kwh, totals.active_count
        );
        Ok(())
    }

    fn fleet_updated(
        &self,
        fleet: &FleetSummary,
        _old: Option<&FleetSummary>,
    ) -> Result<(), SinkError> {
        info!(
            "[fleet] Active={}/{} Solar={} Grid={}",
            fleet.active_sensors, fleet.total_sensors, fleet.solar_sensors, fleet.grid_sensors
        );
        if let Some(top) = fleet.ranking.districts.first() {
            info!(
                "[fleet] {} districts, {:.2}kWh, top {} {:.2}kWh, avg solar {:.1}%",
                fleet.ranking.districts.len(),
                fleet.ranking.total_consumption,
                top.district_name,
                top.total_consumption,
                fleet.ranking.avg_solar_percentage
            );
        }
        if let Some(district) = &fleet.district {
            info!(
                "[fleet] District {}: {} sensors, {}/{} reporting, {:.2}kWh",
                district.district_name,
                district.sensor_count,
                district.reporting_count,
                district.sensor_count,
                district.total_kwh
            );
        }
        if let Some(sensor) = &fleet.sensor {
            match &sensor.latest_reading {
                Some(reading) => info!(
                    "[fleet] Sensor {} ({}): {:.2}kWh {:.1}V",
                    sensor.sensor_id, sensor.district_name, reading.kwh_usage, reading.voltage
                ),
                None => info!(
                    "[fleet] Sensor {} ({}): no reading",
                    sensor.sensor_id, sensor.district_name
                ),
            }
        }
        Ok(())
    }
}
