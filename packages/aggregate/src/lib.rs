#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation of incidence records into per-region totals.
//!
//! Records are filtered by period and category union, then summed per
//! region. The national pseudo-region is always derived from the
//! subnational rows of the same result and never read from a source file.

pub mod compare;
pub mod filter;
pub mod series;
pub mod shares;

use std::collections::BTreeMap;

use incidencia_incidence_models::{AggregatedCount, IncidentRecord};
use incidencia_region_models::RegionKey;

pub use filter::{ALL_CATEGORIES_LABEL, CategoryFilter, PeriodFilter, Scope};

/// Breakdown key for records that carry no secondary value.
pub const UNSPECIFIED_SECONDARY: &str = "No especificado";

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// No record passed the filters.
    #[error("no records match category '{category}' in {year}")]
    Empty {
        /// Label of the category filter.
        category: String,
        /// Year of the period filter.
        year: i32,
    },
}

/// Regional level totals are grouped at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// The region each record carries.
    #[default]
    Region,
    /// The state containing each record's region; municipal records are
    /// rolled up into their state.
    State,
}

/// Parameters of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateQuery {
    /// Periods that count.
    pub period: PeriodFilter,
    /// Categories that count, and the label of the result.
    pub categories: CategoryFilter,
    /// Regional level of the result.
    pub grouping: Grouping,
    /// Append a national row summing every subnational row.
    pub include_national: bool,
    /// Keep per-secondary-value totals in each row's breakdown.
    pub pivot: bool,
}

impl AggregateQuery {
    /// A query for one category filter over a whole year, without a
    /// national row or pivot.
    #[must_use]
    pub fn new(year: i32, categories: CategoryFilter) -> Self {
        Self {
            period: PeriodFilter::Year { year },
            categories,
            grouping: Grouping::Region,
            include_national: false,
            pivot: false,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    total: u64,
    breakdown: BTreeMap<String, u64>,
}

impl Accumulator {
    fn add(&mut self, count: u64, secondary: Option<&str>, pivot: bool) {
        self.total += count;
        if pivot {
            *self
                .breakdown
                .entry(secondary.unwrap_or(UNSPECIFIED_SECONDARY).to_string())
                .or_default() += count;
        }
    }

    fn merge(&mut self, other: &Self) {
        self.total += other.total;
        for (key, value) in &other.breakdown {
            *self.breakdown.entry(key.clone()).or_default() += value;
        }
    }
}

/// Sums matching records per region.
///
/// Rows come back in ascending region order, with the national row (when
/// requested) first. Records for the national pseudo-region present in
/// the input are ignored.
///
/// # Errors
///
/// Returns [`AggregateError::Empty`] if no record passes the filters.
pub fn aggregate(
    records: &[IncidentRecord],
    query: &AggregateQuery,
) -> Result<Vec<AggregatedCount>, AggregateError> {
    let mut groups: BTreeMap<RegionKey, Accumulator> = BTreeMap::new();
    let mut matched = 0usize;
    let mut skipped_national = 0usize;

    for record in records {
        if !query.period.matches(record.period) || !query.categories.matches(&record.category) {
            continue;
        }
        if record.region.is_national() {
            skipped_national += 1;
            continue;
        }

        let region = match query.grouping {
            Grouping::Region => record.region,
            Grouping::State => record.region.state().map_or(record.region, RegionKey::State),
        };

        matched += 1;
        groups.entry(region).or_default().add(
            record.count,
            record.secondary.as_deref(),
            query.pivot,
        );
    }

    if skipped_national > 0 {
        log::debug!("Ignored {skipped_national} national source rows");
    }

    if matched == 0 {
        return Err(AggregateError::Empty {
            category: query.categories.label().to_string(),
            year: query.period.year(),
        });
    }

    if query.include_national {
        let mut national = Accumulator::default();
        for group in groups.values() {
            national.merge(group);
        }
        groups.insert(RegionKey::National, national);
    }

    log::debug!(
        "Aggregated {matched} records into {} rows for '{}'",
        groups.len(),
        query.categories.label()
    );

    let period = query.period.output_period();
    Ok(groups
        .into_iter()
        .map(|(region, group)| AggregatedCount {
            region,
            period,
            category: query.categories.label().to_string(),
            total: group.total,
            breakdown: group.breakdown,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use incidencia_incidence_models::{Month, Period};
    use incidencia_region_models::{MunicipalityCode, StateCode};

    use super::*;

    fn state(code: u32) -> RegionKey {
        RegionKey::State(StateCode::new(code).unwrap())
    }

    fn record(region: RegionKey, category: &str, month: Month, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: Period::YearMonth { year: 2023, month },
            region,
            category: category.to_string(),
            secondary: None,
            count,
        }
    }

    #[test]
    fn duplicate_records_are_summed() {
        let records = vec![
            record(state(9), "Robo", Month::January, 100),
            record(state(9), "Robo", Month::January, 50),
        ];
        let rows = aggregate(&records, &AggregateQuery::new(2023, CategoryFilter::single("Robo")))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region.code(), "09");
        assert_eq!(rows[0].total, 150);
        assert_eq!(rows[0].period, Period::Year(2023));
    }

    #[test]
    fn union_matches_before_grouping() {
        let records = vec![
            record(state(2), "Homicidio doloso", Month::March, 10),
            record(state(2), "Feminicidio", Month::March, 2),
            record(state(1), "Feminicidio", Month::April, 1),
            record(state(1), "Robo a negocio", Month::April, 99),
        ];
        let query = AggregateQuery::new(
            2023,
            CategoryFilter::union(["Homicidio doloso", "Feminicidio"]),
        );
        let rows = aggregate(&records, &query).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, state(1));
        assert_eq!(rows[0].total, 1);
        assert_eq!(rows[1].total, 12);
        assert_eq!(rows[1].category, "Homicidio doloso y Feminicidio");
    }

    #[test]
    fn national_row_is_sum_of_regions() {
        let records = vec![
            record(state(1), "Robo", Month::January, 10),
            record(state(2), "Robo", Month::January, 20),
            // A national row in the source must not be double counted.
            record(RegionKey::National, "Robo", Month::January, 1000),
        ];
        let mut query = AggregateQuery::new(2023, CategoryFilter::single("Robo"));
        query.include_national = true;
        let rows = aggregate(&records, &query).unwrap();

        assert_eq!(rows[0].region, RegionKey::National);
        assert_eq!(rows[0].total, 30);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn pivot_by_secondary_dimension() {
        let mut woman = record(state(5), "Homicidio doloso", Month::May, 3);
        woman.secondary = Some("Mujer".to_string());
        let mut man = record(state(5), "Homicidio doloso", Month::June, 7);
        man.secondary = Some("Hombre".to_string());
        let unknown = record(state(5), "Homicidio doloso", Month::June, 1);

        let mut query = AggregateQuery::new(2023, CategoryFilter::single("Homicidio doloso"));
        query.pivot = true;
        let rows = aggregate(&[woman, man, unknown], &query).unwrap();

        assert_eq!(rows[0].total, 11);
        assert_eq!(rows[0].breakdown["Mujer"], 3);
        assert_eq!(rows[0].breakdown["Hombre"], 7);
        assert_eq!(rows[0].breakdown[UNSPECIFIED_SECONDARY], 1);
    }

    #[test]
    fn month_filter_and_state_rollup() {
        let municipality = RegionKey::Municipality(MunicipalityCode::parse("09015").unwrap());
        let records = vec![
            record(municipality, "Robo", Month::July, 4),
            record(municipality, "Robo", Month::August, 40),
            record(state(9), "Robo", Month::July, 1),
        ];
        let query = AggregateQuery {
            period: PeriodFilter::YearMonths {
                year: 2023,
                months: vec![Month::July],
            },
            grouping: Grouping::State,
            ..AggregateQuery::new(2023, CategoryFilter::single("Robo"))
        };
        let rows = aggregate(&records, &query).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region, state(9));
        assert_eq!(rows[0].total, 5);
        assert_eq!(
            rows[0].period,
            Period::YearMonth {
                year: 2023,
                month: Month::July
            }
        );
    }

    #[test]
    fn empty_working_set_is_an_error() {
        let records = vec![record(state(1), "Robo", Month::January, 10)];
        let err = aggregate(&records, &AggregateQuery::new(2020, CategoryFilter::single("Robo")))
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::Empty {
                category: "Robo".to_string(),
                year: 2020
            }
        );
    }
}
