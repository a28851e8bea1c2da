#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Top-N and bottom-N rankings.
//!
//! The population threshold is applied before ordering and truncation, so
//! a ranking never comes back short because a small region was cut after
//! it had already taken a slot. Ordering is a stable sort: regions with
//! identical values keep their input order.

use std::cmp::Ordering;

use incidencia_incidence_models::{Direction, Metric, RankedEntry, Rate};
use incidencia_rates::{Exclusion, ExclusionReason, JoinedCount};
use incidencia_region_models::RegionKey;
use incidencia_region_models::directory::{LabelStyle, RegionDirectory};
use serde::{Deserialize, Serialize};

/// Errors that can occur while ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    /// Nothing left to rank after the population threshold.
    #[error("no rows left to rank ({excluded} excluded)")]
    Empty {
        /// Rows removed by the threshold or for an undefined rate.
        excluded: usize,
    },
}

/// A row that can be ranked.
///
/// Implemented for the rate calculator's [`Rate`] and [`JoinedCount`], and
/// for [`RankedEntry`] itself, so a ranking can be re-ranked.
pub trait Rankable {
    fn region(&self) -> RegionKey;
    fn total(&self) -> u64;
    fn population(&self) -> Option<f64>;
    fn rate(&self) -> Option<f64>;

    /// Value the ranking orders by, if the row has one.
    #[allow(clippy::cast_precision_loss)]
    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Rate => self.rate(),
            Metric::Total => Some(self.total() as f64),
        }
    }
}

impl Rankable for Rate {
    fn region(&self) -> RegionKey {
        self.region
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn population(&self) -> Option<f64> {
        Some(self.population)
    }

    fn rate(&self) -> Option<f64> {
        Some(self.rate)
    }
}

impl Rankable for JoinedCount {
    fn region(&self) -> RegionKey {
        self.region
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn population(&self) -> Option<f64> {
        self.population
    }

    fn rate(&self) -> Option<f64> {
        self.rate
    }
}

impl Rankable for RankedEntry {
    fn region(&self) -> RegionKey {
        self.region
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn population(&self) -> Option<f64> {
        self.population
    }

    fn rate(&self) -> Option<f64> {
        self.rate
    }
}

/// Parameters of one ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    /// Value to order by.
    pub metric: Metric,
    /// Top (descending) or bottom (ascending).
    pub direction: Direction,
    /// Number of entries to keep; all when `None`.
    pub top_n: Option<usize>,
    /// Minimum population for a region to be ranked.
    pub min_denominator: Option<f64>,
    /// How state labels are rendered.
    #[serde(default)]
    pub label_style: LabelStyle,
}

/// Ranked entries plus the regions left out by policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankedEntry>,
    pub exclusions: Vec<Exclusion>,
}

/// Ranks `rows` by the configured metric and direction.
///
/// Steps, in order: drop rows below `min_denominator` (recorded as
/// [`ExclusionReason::BelowThreshold`]) and rows with a missing or
/// non-finite metric, stable-sort, take the first `top_n`, and number from
/// 1. A row without a population cannot pass a threshold. The national
/// pseudo-region is never ranked against subnational rows.
///
/// # Errors
///
/// Returns [`RankError::Empty`] if no row survives the filters.
pub fn rank<R: Rankable>(
    rows: &[R],
    options: &RankOptions,
    directory: &RegionDirectory,
) -> Result<Ranking, RankError> {
    let mut exclusions = Vec::new();
    let mut kept: Vec<(f64, &R)> = Vec::with_capacity(rows.len());

    for row in rows {
        if row.region().is_national() {
            continue;
        }
        if let Some(threshold) = options.min_denominator {
            match row.population() {
                None => {
                    exclusions.push(unrated(row));
                    continue;
                }
                Some(population) if population < threshold => {
                    exclusions.push(Exclusion {
                        region: row.region(),
                        reason: ExclusionReason::BelowThreshold {
                            population,
                            threshold,
                        },
                    });
                    continue;
                }
                Some(_) => {}
            }
        }
        match row.metric(options.metric) {
            Some(value) if value.is_finite() => kept.push((value, row)),
            _ => exclusions.push(unrated(row)),
        }
    }

    if kept.is_empty() {
        return Err(RankError::Empty {
            excluded: exclusions.len(),
        });
    }

    kept.sort_by(|(a, _), (b, _)| compare(*a, *b, options.direction));

    if let Some(top_n) = options.top_n {
        kept.truncate(top_n);
    }

    log::debug!(
        "Ranked {} rows by {} ({}), {} excluded",
        kept.len(),
        options.metric,
        options.direction,
        exclusions.len()
    );

    let entries = kept
        .into_iter()
        .enumerate()
        .map(|(i, (_, row))| RankedEntry {
            rank: i + 1,
            region: row.region(),
            label: directory.label(row.region(), options.label_style),
            total: row.total(),
            population: row.population(),
            rate: row.rate(),
        })
        .collect();

    Ok(Ranking {
        entries,
        exclusions,
    })
}

/// Exclusion for a row whose metric or population is unusable.
fn unrated<R: Rankable>(row: &R) -> Exclusion {
    let reason = row.population().map_or(
        ExclusionReason::MissingPopulation { total: row.total() },
        |population| ExclusionReason::UndefinedRate {
            total: row.total(),
            population,
        },
    );
    Exclusion {
        region: row.region(),
        reason,
    }
}

fn compare(a: f64, b: f64, direction: Direction) -> Ordering {
    match direction {
        Direction::Descending => b.total_cmp(&a),
        Direction::Ascending => a.total_cmp(&b),
    }
}
