//! Joining aggregated counts with population denominators.

use std::collections::BTreeMap;

use incidencia_incidence_models::{AggregatedCount, PopulationRecord, Rate};
use incidencia_region_models::RegionKey;
use serde::{Deserialize, Serialize};

use crate::{DivisionUndefined, rate};

/// Why a region was left out of a rate table or ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The population was zero, so no rate exists.
    UndefinedRate {
        /// Incident total of the excluded region.
        total: u64,
        /// The non-positive population.
        population: f64,
    },
    /// The population is below the configured minimum.
    BelowThreshold {
        /// Population of the excluded region.
        population: f64,
        /// Configured minimum.
        threshold: f64,
    },
    /// The population table has no value for the region.
    MissingPopulation {
        /// Incident total of the excluded region.
        total: u64,
    },
}

/// A region dropped by policy, kept so the drop stays auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    /// The dropped region.
    pub region: RegionKey,
    /// Why it was dropped.
    pub reason: ExclusionReason,
}

impl Exclusion {
    /// The division error behind an undefined or missing denominator.
    #[must_use]
    pub const fn division(&self) -> Option<DivisionUndefined> {
        match self.reason {
            ExclusionReason::UndefinedRate { .. } | ExclusionReason::MissingPopulation { .. } => {
                Some(DivisionUndefined)
            }
            ExclusionReason::BelowThreshold { .. } => None,
        }
    }
}

/// Where the national pseudo-region's denominator comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NationalPopulation {
    /// The national row of the population table.
    #[default]
    FromTable,
    /// The sum of every subnational population for the year.
    SumOfRegions,
}

/// Options for [`attach_population`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinPolicy {
    /// Source of the national denominator.
    pub national: NationalPopulation,
}

/// A count with whatever denominator the join found for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedCount {
    pub region: RegionKey,
    pub total: u64,
    /// `None` when the population table has no value for the region.
    pub population: Option<f64>,
    /// `None` when the population is missing or not positive.
    pub rate: Option<f64>,
}

/// Defined rates plus the regions whose rate is undefined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    /// One rate per count with a positive population, in input order.
    pub rates: Vec<Rate>,
    /// Counts whose population was zero or missing.
    pub exclusions: Vec<Exclusion>,
    /// Every count, rated or not, in input order. Rankings by total use
    /// these so a region without a denominator still takes its place.
    pub joined: Vec<JoinedCount>,
}

/// Joins counts with the population of `year` by region key.
///
/// Only population records for `year` are considered, which lets a table
/// of 2020 census values serve incidence from later years. A counted
/// region with no population for `year` is recorded as
/// [`ExclusionReason::MissingPopulation`] and the join goes on.
#[must_use]
pub fn attach_population(
    counts: &[AggregatedCount],
    population: &[PopulationRecord],
    year: i32,
    policy: JoinPolicy,
) -> RateTable {
    let mut denominators: BTreeMap<RegionKey, f64> = population
        .iter()
        .filter(|record| record.year == year)
        .map(|record| (record.region, record.population))
        .collect();

    if policy.national == NationalPopulation::SumOfRegions {
        let sum: f64 = denominators
            .iter()
            .filter(|(region, _)| !region.is_national())
            .map(|(_, population)| population)
            .sum();
        denominators.insert(RegionKey::National, sum);
    }

    let mut table = RateTable::default();

    for count in counts {
        let Some(&population) = denominators.get(&count.region) else {
            log::warn!("No population for {} in {year}", count.region);
            table.exclusions.push(Exclusion {
                region: count.region,
                reason: ExclusionReason::MissingPopulation { total: count.total },
            });
            table.joined.push(JoinedCount {
                region: count.region,
                total: count.total,
                population: None,
                rate: None,
            });
            continue;
        };

        let value = rate(count.total, population).ok();
        table.joined.push(JoinedCount {
            region: count.region,
            total: count.total,
            population: Some(population),
            rate: value,
        });

        match value {
            Some(value) => table.rates.push(Rate {
                region: count.region,
                period: count.period,
                category: count.category.clone(),
                total: count.total,
                population,
                rate: value,
            }),
            None => {
                log::debug!("Rate undefined for {} (population {population})", count.region);
                table.exclusions.push(Exclusion {
                    region: count.region,
                    reason: ExclusionReason::UndefinedRate {
                        total: count.total,
                        population,
                    },
                });
            }
        }
    }

    table
}
