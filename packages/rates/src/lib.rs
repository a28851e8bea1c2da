#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rate calculation for aggregated incidence counts.
//!
//! Divisions that have no meaningful result (zero population, zero base
//! period) are surfaced as [`DivisionUndefined`] instead of propagating
//! `NaN` or infinity into rankings and scales.

pub mod format;
pub mod join;
pub mod scale;
pub mod stats;
pub mod trend;

pub use join::{Exclusion, ExclusionReason, JoinPolicy, JoinedCount, NationalPopulation, RateTable};

use incidencia_incidence_models::AggregatedCount;
use serde::{Deserialize, Serialize};

/// Rates are expressed per this many inhabitants.
pub const PER_INHABITANTS: f64 = 100_000.0;

/// A division whose denominator is zero, negative, missing or not a
/// number.
///
/// This is a value, not a failure of the run: callers decide whether to
/// exclude the row, report it, or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("division undefined: denominator is zero, negative or missing")]
pub struct DivisionUndefined;

/// Incidents per 100,000 inhabitants.
///
/// # Errors
///
/// Returns [`DivisionUndefined`] if `population` is zero, negative or not
/// finite.
#[allow(clippy::cast_precision_loss)]
pub fn rate(total: u64, population: f64) -> Result<f64, DivisionUndefined> {
    if !population.is_finite() || population <= 0.0 {
        return Err(DivisionUndefined);
    }
    Ok(total as f64 / population * PER_INHABITANTS)
}

/// [`rate`] for a denominator that may be missing.
///
/// # Errors
///
/// Returns [`DivisionUndefined`] if `population` is `None` or not positive.
pub fn rate_opt(total: u64, population: Option<f64>) -> Result<f64, DivisionUndefined> {
    population.map_or(Err(DivisionUndefined), |population| rate(total, population))
}

/// Percent change from `old` to `new`: `(new - old) / old * 100`.
///
/// # Errors
///
/// Returns [`DivisionUndefined`] if `old` is zero or either value is not
/// finite.
#[allow(clippy::float_cmp)]
pub fn percent_change(old: f64, new: f64) -> Result<f64, DivisionUndefined> {
    if !old.is_finite() || !new.is_finite() || old == 0.0 {
        return Err(DivisionUndefined);
    }
    if old == new {
        return Ok(0.0);
    }
    Ok((new - old) / old * 100.0)
}

/// Percent change that may be undefined, as carried by comparison rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PercentChange {
    /// A finite change in percent.
    Defined(f64),
    /// The base value was zero.
    Undefined,
}

impl PercentChange {
    /// Computes the change between two counts.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn between(old: u64, new: u64) -> Self {
        percent_change(old as f64, new as f64).map_or(Self::Undefined, Self::Defined)
    }

    /// The change, if defined.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(value),
            Self::Undefined => None,
        }
    }
}

/// Sum of the subnational totals in `counts` divided by the national
/// population.
///
/// Rows for the national pseudo-region are skipped so that a result that
/// already carries a national row is not counted twice.
///
/// # Errors
///
/// Returns [`DivisionUndefined`] if `national_population` is not positive.
pub fn national_rate(
    counts: &[AggregatedCount],
    national_population: f64,
) -> Result<f64, DivisionUndefined> {
    let total = counts
        .iter()
        .filter(|count| !count.region.is_national())
        .map(|count| count.total)
        .sum();
    rate(total, national_population)
}
