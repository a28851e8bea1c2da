//! Long-format time series and trailing averages.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use incidencia_incidence_models::{IncidentRecord, Period};
use incidencia_region_models::RegionKey;
use serde::{Deserialize, Serialize};

use crate::filter::CategoryFilter;

/// Window of the trailing average used by sparkline reports.
pub const DEFAULT_WINDOW: usize = 12;

/// Total of one category in one region and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub region: RegionKey,
    pub category: String,
    pub total: u64,
}

impl SeriesPoint {
    /// First day of the point's period (January 1st for annual points).
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        period_start(self.period)
    }
}

fn period_start(period: Period) -> Option<NaiveDate> {
    let month = period.month().map_or(1, |month| month.number());
    NaiveDate::from_ymd_opt(period.year(), month, 1)
}

/// Collapses records into one point per period, region and category,
/// ignoring the secondary dimension.
///
/// Every period and category with state-level records also gets a
/// `Nacional` point summing those states. Municipal records get no
/// national point, and national rows already in the input are dropped.
/// Points are ordered by period, then region (national first), then
/// category.
#[must_use]
pub fn to_timeseries(records: &[IncidentRecord]) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<(Period, RegionKey, &str), u64> = BTreeMap::new();

    for record in records {
        if record.region.is_national() {
            continue;
        }
        *totals
            .entry((record.period, record.region, record.category.as_str()))
            .or_default() += record.count;
        if matches!(record.region, RegionKey::State(_)) {
            *totals
                .entry((record.period, RegionKey::National, record.category.as_str()))
                .or_default() += record.count;
        }
    }

    totals
        .into_iter()
        .map(|((period, region, category), total)| SeriesPoint {
            period,
            region,
            category: category.to_string(),
            total,
        })
        .collect()
}

/// Points of one region and category in period order.
#[must_use]
pub fn series_points<'a>(
    points: &'a [SeriesPoint],
    region: RegionKey,
    category: &str,
) -> Vec<&'a SeriesPoint> {
    let mut selected: Vec<&SeriesPoint> = points
        .iter()
        .filter(|point| point.region == region && point.category == category)
        .collect();
    selected.sort_by_key(|point| point.period);
    selected
}

/// Values of one region and category in period order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn series_values(points: &[SeriesPoint], region: RegionKey, category: &str) -> Vec<f64> {
    series_points(points, region, category)
        .into_iter()
        .map(|point| point.total as f64)
        .collect()
}

/// One observation of a national series with its trailing mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: Period,
    pub total: u64,
    /// Mean of the last `window` observations, once the window fills.
    pub rolling_mean: Option<f64>,
}

impl TrendPoint {
    /// First day of the point's period.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        period_start(self.period)
    }
}

/// National series of the categories `categories` selects, up to and
/// including `through`, with a trailing mean over `window` observations.
///
/// Only the last `tail` points are returned; their means still see the
/// full history before them.
#[must_use]
pub fn national_series(
    records: &[IncidentRecord],
    categories: &CategoryFilter,
    through: Period,
    window: usize,
    tail: usize,
) -> Vec<TrendPoint> {
    let label = categories.label();
    let selected: Vec<IncidentRecord> = records
        .iter()
        .filter(|record| record.period <= through && categories.matches(&record.category))
        .map(|record| IncidentRecord {
            category: label.to_string(),
            ..record.clone()
        })
        .collect();

    let points = to_timeseries(&selected);
    let means = rolling_mean(&series_values(&points, RegionKey::National, label), window);
    let series: Vec<TrendPoint> = series_points(&points, RegionKey::National, label)
        .into_iter()
        .zip(means)
        .map(|(point, rolling_mean)| TrendPoint {
            period: point.period,
            total: point.total,
            rolling_mean,
        })
        .collect();

    let skip = series.len().saturating_sub(tail);
    series.into_iter().skip(skip).collect()
}

/// Yearly totals of the categories `categories` selects, summed over
/// every subnational record. National rows in the input are ignored.
#[must_use]
pub fn annual_totals(records: &[IncidentRecord], categories: &CategoryFilter) -> BTreeMap<i32, u64> {
    let mut totals = BTreeMap::new();
    for record in records {
        if record.region.is_national() || !categories.matches(&record.category) {
            continue;
        }
        *totals.entry(record.period.year()).or_default() += record.count;
    }
    totals
}

/// Trailing mean over `window` observations.
///
/// Position `i` holds the mean of `series[i + 1 - window..=i]`; positions
/// before the window fills (and every position for a zero window) are
/// `None`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; series.len()];
    }

    let mut sum = 0.0;
    series
        .iter()
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            if i >= window {
                sum -= series[i - window];
            }
            (i + 1 >= window).then(|| sum / window as f64)
        })
        .collect()
}
