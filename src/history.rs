//! Hourly history
//!
//! One-shot read of the server's hourly aggregates for a day, summed into
//! day totals.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::api::{ApiClient, HourlyStats};
use crate::errors::ApiError;
use crate::live::aggregator::round;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub total_kwh: f64,
    pub solar_kwh: f64,
    pub grid_kwh: f64,
    pub reading_count: u64,
}

impl DayTotals {
    pub fn from_hours(hours: &[HourlyStats]) -> Self {
        let totals = hours.iter().fold(DayTotals::default(), |acc, h| DayTotals {
            total_kwh: acc.total_kwh + h.total_kwh,
            solar_kwh: acc.solar_kwh + h.solar_kwh,
            grid_kwh: acc.grid_kwh + h.grid_kwh,
            reading_count: acc.reading_count + h.reading_count,
        });

        DayTotals {
            total_kwh: round(totals.total_kwh, 2),
            solar_kwh: round(totals.solar_kwh, 2),
            grid_kwh: round(totals.grid_kwh, 2),
            reading_count: totals.reading_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyReport {
    pub date: NaiveDate,
    pub hours: Vec<HourlyStats>,
    pub totals: DayTotals,
}

/// Fetch the hourly report for `date`; dates after `today` are rejected
pub async fn fetch_hourly(
    client: &ApiClient,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<HourlyReport, ApiError> {
    if date > today {
        return Err(ApiError::FutureDate(date));
    }

    let hours = client.hourly_stats(date).await?;
    debug!("Received {} hourly rows for {}", hours.len(), date);
    let totals = DayTotals::from_hours(&hours);

    Ok(HourlyReport {
        date,
        hours,
        totals,
    })
}
