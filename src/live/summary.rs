//! Fleet-level summary of a snapshot
//!
//! Sensor counts for the stats cards, the marker legend, the district
//! consumption ranking, and detail for whatever the selection store currently
//! points at.

use std::collections::BTreeMap;

use serde::Serialize;

use super::aggregator::{round, LiveTotals};
use super::marker::{MarkerKind, MarkerLegend};
use super::selection::Selection;
use crate::api::{EnergySource, LatestReading, SensorSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictFocus {
    pub district_name: String,
    pub sensor_count: u64,
    pub total_kwh: f64,
    pub solar_kwh: f64,
    pub grid_kwh: f64,
    pub reporting_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorFocus {
    pub sensor_id: String,
    pub district_name: String,
    pub marker: MarkerKind,
    pub latitude: f64,
    pub longitude: f64,
    pub latest_reading: Option<LatestReading>,
}

/// Consumption of one district in the current snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictStats {
    pub district_name: String,
    pub total_sensors: u64,
    pub total_consumption: f64,
    /// Per sensor, counting sensors without a reading as zero
    pub avg_consumption: f64,
    /// Share of the district's sensors that are solar, in percent
    pub solar_percentage: f64,
}

/// All districts, highest consumption first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRanking {
    pub districts: Vec<DistrictStats>,
    pub total_consumption: f64,
    pub total_sensors: u64,
    /// Unweighted mean of the districts' solar percentages
    pub avg_solar_percentage: f64,
}

impl DistrictRanking {
    pub fn from_sensors(sensors: &[SensorSnapshot]) -> Self {
        // (sensors, solar sensors, kWh) per district
        let mut groups: BTreeMap<&str, (u64, u64, f64)> = BTreeMap::new();
        for sensor in sensors {
            let group = groups.entry(sensor.district_name.as_str()).or_default();
            group.0 += 1;
            if sensor.energy_source == EnergySource::Solar {
                group.1 += 1;
            }
            group.2 += sensor.latest_reading.as_ref().map_or(0.0, |r| r.kwh_usage);
        }

        let mut districts: Vec<DistrictStats> = groups
            .into_iter()
            .map(|(name, (count, solar, kwh))| DistrictStats {
                district_name: name.to_string(),
                total_sensors: count,
                total_consumption: round(kwh, 2),
                avg_consumption: round(kwh / count as f64, 2),
                solar_percentage: round(solar as f64 / count as f64 * 100.0, 1),
            })
            .collect();
        // stable, so equal consumption keeps name order
        districts.sort_by(|a, b| b.total_consumption.total_cmp(&a.total_consumption));

        let total_consumption = round(districts.iter().map(|d| d.total_consumption).sum(), 2);
        let avg_solar_percentage = if districts.is_empty() {
            0.0
        } else {
            let sum: f64 = districts.iter().map(|d| d.solar_percentage).sum();
            round(sum / districts.len() as f64, 1)
        };

        Self {
            total_consumption,
            total_sensors: districts.iter().map(|d| d.total_sensors).sum(),
            avg_solar_percentage,
            districts,
        }
    }

    /// 1-based rank of a district, `None` if it has no sensors
    pub fn rank_of(&self, district_name: &str) -> Option<usize> {
        self.districts
            .iter()
            .position(|d| d.district_name == district_name)
            .map(|index| index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total_sensors: u64,
    pub active_sensors: u64,
    pub solar_sensors: u64,
    pub grid_sensors: u64,
    pub legend: MarkerLegend,
    pub ranking: DistrictRanking,
    pub district: Option<DistrictFocus>,
    pub sensor: Option<SensorFocus>,
}

impl FleetSummary {
    pub fn from_sensors(sensors: &[SensorSnapshot], selection: &Selection) -> Self {
        let solar_sensors = sensors
            .iter()
            .filter(|s| s.energy_source == EnergySource::Solar)
            .count() as u64;

        Self {
            total_sensors: sensors.len() as u64,
            active_sensors: sensors.iter().filter(|s| s.status.is_active()).count() as u64,
            solar_sensors,
            grid_sensors: sensors.len() as u64 - solar_sensors,
            legend: MarkerLegend::from_sensors(sensors),
            ranking: DistrictRanking::from_sensors(sensors),
            district: selection
                .district
                .as_deref()
                .map(|name| district_focus(sensors, name)),
            sensor: selection
                .sensor
                .as_deref()
                .and_then(|id| sensor_focus(sensors, id)),
        }
    }
}

fn district_focus(sensors: &[SensorSnapshot], name: &str) -> DistrictFocus {
    let members: Vec<SensorSnapshot> = sensors
        .iter()
        .filter(|s| s.district_name == name)
        .cloned()
        .collect();
    let totals = LiveTotals::from_sensors(&members);

    DistrictFocus {
        district_name: name.to_string(),
        sensor_count: members.len() as u64,
        total_kwh: round(totals.total_kwh, 2),
        solar_kwh: round(totals.solar_kwh, 2),
        grid_kwh: round(totals.grid_kwh, 2),
        reporting_count: totals.active_count,
    }
}

/// `None` when the selected sensor is not part of the snapshot
fn sensor_focus(sensors: &[SensorSnapshot], sensor_id: &str) -> Option<SensorFocus> {
    sensors
        .iter()
        .find(|s| s.sensor_id == sensor_id)
        .map(|s| SensorFocus {
            sensor_id: s.sensor_id.clone(),
            district_name: s.district_name.clone(),
            marker: MarkerKind::for_sensor(s),
            latitude: s.latitude,
            longitude: s.longitude,
            latest_reading: s.latest_reading.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SensorStatus;
    use chrono::{TimeZone, Utc};

    fn sensor(
        id: &str,
        district: &str,
        source: EnergySource,
        status: SensorStatus,
        kwh: Option<f64>,
    ) -> SensorSnapshot {
        SensorSnapshot {
            sensor_id: id.to_string(),
            district_name: district.to_string(),
            energy_source: source,
            status,
            latitude: -6.2,
            longitude: 106.8,
            latest_reading: kwh.map(|kwh_usage| LatestReading {
                kwh_usage,
                voltage: 220.0,
                recorded_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            }),
        }
    }

    fn fleet() -> Vec<SensorSnapshot> {
        vec![
            sensor("S-1", "Menteng", EnergySource::Solar, SensorStatus::Active, Some(2.5)),
            sensor("S-2", "Kemang", EnergySource::Solar, SensorStatus::Maintenance, None),
            sensor("G-1", "Menteng", EnergySource::Grid, SensorStatus::Active, Some(4.0)),
            sensor("G-2", "Kemang", EnergySource::Grid, SensorStatus::Offline, Some(1.0)),
        ]
    }

    #[test]
    fn test_counts_without_selection() {
        let summary = FleetSummary::from_sensors(&fleet(), &Selection::default());

        assert_eq!(summary.total_sensors, 4);
        assert_eq!(summary.active_sensors, 2);
        assert_eq!(summary.solar_sensors, 2);
        assert_eq!(summary.grid_sensors, 2);
        assert_eq!(summary.legend.count(MarkerKind::SolarInactive), 1);
        assert_eq!(summary.legend.total(), 4);
        assert!(summary.district.is_none());
        assert!(summary.sensor.is_none());
    }

    #[test]
    fn test_district_focus() {
        let selection = Selection {
            sensor: None,
            district: Some("Menteng".to_string()),
        };

        let summary = FleetSummary::from_sensors(&fleet(), &selection);
        let district = summary.district.unwrap();

        assert_eq!(district.sensor_count, 2);
        assert_eq!(district.reporting_count, 2);
        assert_eq!(district.total_kwh, 6.5);
        assert_eq!(district.solar_kwh, 2.5);
        assert_eq!(district.grid_kwh, 4.0);
    }

    #[test]
    fn test_unknown_district_reports_zero() {
        let selection = Selection {
            sensor: None,
            district: Some("Atlantis".to_string()),
        };

        let district = FleetSummary::from_sensors(&fleet(), &selection)
            .district
            .unwrap();
        assert_eq!(district.sensor_count, 0);
        assert_eq!(district.total_kwh, 0.0);
    }

    #[test]
    fn test_sensor_focus() {
        let selection = Selection {
            sensor: Some("G-2".to_string()),
            district: None,
        };

        let focus = FleetSummary::from_sensors(&fleet(), &selection)
            .sensor
            .unwrap();
        assert_eq!(focus.marker, MarkerKind::GridInactive);
        assert_eq!(focus.latest_reading.unwrap().kwh_usage, 1.0);

        let missing = Selection {
            sensor: Some("X-9".to_string()),
            district: None,
        };
        assert!(FleetSummary::from_sensors(&fleet(), &missing).sensor.is_none());
    }

    #[test]
    fn test_ranking_orders_by_consumption() {
        let mut sensors = fleet();
        sensors.push(sensor("S-3", "Kemang", EnergySource::Solar, SensorStatus::Active, Some(9.0)));
        sensors.push(sensor("G-3", "Tebet", EnergySource::Grid, SensorStatus::Active, Some(0.5)));

        let ranking = DistrictRanking::from_sensors(&sensors);
        let names: Vec<&str> = ranking
            .districts
            .iter()
            .map(|d| d.district_name.as_str())
            .collect();

        // Kemang 10.0, Menteng 6.5, Tebet 0.5
        assert_eq!(names, vec!["Kemang", "Menteng", "Tebet"]);
        assert_eq!(ranking.districts[0].total_consumption, 10.0);
        assert_eq!(ranking.districts[0].total_sensors, 3);
        assert_eq!(ranking.districts[0].avg_consumption, 3.33);
        assert_eq!(ranking.total_consumption, 17.0);
        assert_eq!(ranking.total_sensors, 6);
        assert_eq!(ranking.rank_of("Tebet"), Some(3));
        assert_eq!(ranking.rank_of("Atlantis"), None);
    }

    #[test]
    fn test_solar_percentage_per_district() {
        let mut sensors = fleet();
        sensors.push(sensor("S-3", "Kemang", EnergySource::Solar, SensorStatus::Active, Some(9.0)));

        let ranking = DistrictRanking::from_sensors(&sensors);
        let kemang = &ranking.districts[0];
        let menteng = &ranking.districts[1];

        // Kemang: 2 of 3 solar, Menteng: 1 of 2 solar
        assert_eq!(kemang.solar_percentage, 66.7);
        assert_eq!(menteng.solar_percentage, 50.0);
        assert_eq!(ranking.avg_solar_percentage, 58.4);
    }

    #[test]
    fn test_empty_snapshot_has_empty_ranking() {
        let ranking = DistrictRanking::from_sensors(&[]);
        assert!(ranking.districts.is_empty());
        assert_eq!(ranking.total_consumption, 0.0);
        assert_eq!(ranking.avg_solar_percentage, 0.0);
    }

    #[test]
    fn test_equal_consumption_keeps_name_order() {
        let sensors = vec![
            sensor("G-1", "Tebet", EnergySource::Grid, SensorStatus::Active, Some(2.0)),
            sensor("G-2", "Cikini", EnergySource::Grid, SensorStatus::Active, Some(2.0)),
        ];
        let ranking = DistrictRanking::from_sensors(&sensors);
        assert_eq!(ranking.rank_of("Cikini"), Some(1));
        assert_eq!(ranking.rank_of("Tebet"), Some(2));
    }
}
