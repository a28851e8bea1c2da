//! Comparisons of two periods, per category or per region.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use incidencia_incidence_models::IncidentRecord;
use incidencia_rates::PercentChange;
use incidencia_region_models::RegionKey;
use serde::{Deserialize, Serialize};

use crate::filter::{ALL_CATEGORIES_LABEL, CategoryFilter, PeriodFilter, Scope};
use crate::AggregateError;

/// Totals of one category in two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    pub first: u64,
    pub second: u64,
    /// `second - first`.
    pub diff: i64,
    pub change: PercentChange,
}

impl ComparisonRow {
    fn new(category: String, first: u64, second: u64) -> Self {
        Self {
            category,
            first,
            second,
            diff: signed_diff(first, second),
            change: PercentChange::between(first, second),
        }
    }
}

/// Totals of one region in two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionChange {
    pub region: RegionKey,
    pub first: u64,
    pub second: u64,
    /// `second - first`.
    pub diff: i64,
    pub change: PercentChange,
}

impl RegionChange {
    fn new(region: RegionKey, first: u64, second: u64) -> Self {
        Self {
            region,
            first,
            second,
            diff: signed_diff(first, second),
            change: PercentChange::between(first, second),
        }
    }
}

/// `second - first`, saturating at the bounds of `i64`.
fn signed_diff(first: u64, second: u64) -> i64 {
    let diff = i128::from(second) - i128::from(first);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

/// Compares per-category totals of `first` and `second` within `scope`.
///
/// A category present in only one period counts as zero in the other.
/// A leading `"Todos los delitos"` row sums every category. Rows are
/// sorted by the second period's total, descending; ties keep category
/// name order.
///
/// # Errors
///
/// Returns [`AggregateError::Empty`] if no record falls in either period.
pub fn compare_periods(
    records: &[IncidentRecord],
    first: &PeriodFilter,
    second: &PeriodFilter,
    scope: Scope,
) -> Result<Vec<ComparisonRow>, AggregateError> {
    let mut totals: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    let mut matched = false;

    for record in records.iter().filter(|record| scope.contains(record.region)) {
        let in_first = first.matches(record.period);
        let in_second = second.matches(record.period);
        if !in_first && !in_second {
            continue;
        }
        matched = true;

        let entry = totals.entry(record.category.as_str()).or_default();
        if in_first {
            entry.0 += record.count;
        }
        if in_second {
            entry.1 += record.count;
        }
    }

    if !matched {
        return Err(AggregateError::Empty {
            category: ALL_CATEGORIES_LABEL.to_string(),
            year: second.year(),
        });
    }

    let (all_first, all_second) = totals
        .values()
        .fold((0, 0), |(a, b), (first, second)| (a + first, b + second));

    let mut rows = vec![ComparisonRow::new(
        ALL_CATEGORIES_LABEL.to_string(),
        all_first,
        all_second,
    )];
    rows.extend(
        totals
            .into_iter()
            .map(|(category, (first, second))| ComparisonRow::new(category.to_string(), first, second)),
    );
    rows.sort_by(|a, b| b.second.cmp(&a.second));

    Ok(rows)
}

/// Compares per-region totals of the categories `categories` selects.
///
/// States also feed a national row, as in the long series; national rows
/// already in the input are ignored. A region present in only one period
/// counts as zero in the other. Rows are sorted by percent change,
/// largest first, with undefined changes last; ties keep region order.
///
/// # Errors
///
/// Returns [`AggregateError::Empty`] if no record of the categories falls
/// in either period.
pub fn compare_regions(
    records: &[IncidentRecord],
    first: &PeriodFilter,
    second: &PeriodFilter,
    categories: &CategoryFilter,
) -> Result<Vec<RegionChange>, AggregateError> {
    let mut totals: BTreeMap<RegionKey, (u64, u64)> = BTreeMap::new();

    for record in records {
        if record.region.is_national() || !categories.matches(&record.category) {
            continue;
        }
        let in_first = first.matches(record.period);
        let in_second = second.matches(record.period);
        if !in_first && !in_second {
            continue;
        }

        let mut targets = vec![record.region];
        if matches!(record.region, RegionKey::State(_)) {
            targets.push(RegionKey::National);
        }
        for region in targets {
            let entry = totals.entry(region).or_default();
            if in_first {
                entry.0 += record.count;
            }
            if in_second {
                entry.1 += record.count;
            }
        }
    }

    if totals.is_empty() {
        return Err(AggregateError::Empty {
            category: categories.label().to_string(),
            year: second.year(),
        });
    }

    let mut rows: Vec<RegionChange> = totals
        .into_iter()
        .map(|(region, (first, second))| RegionChange::new(region, first, second))
        .collect();
    rows.sort_by(|a, b| match (a.change.value(), b.change.value()) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use incidencia_incidence_models::{Month, Period};
    use incidencia_region_models::StateCode;

    use super::*;

    fn record(year: i32, state: u32, category: &str, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: Period::YearMonth {
                year,
                month: Month::July,
            },
            region: RegionKey::State(StateCode::new(state).unwrap()),
            category: category.to_string(),
            secondary: None,
            count,
        }
    }

    fn july(year: i32) -> PeriodFilter {
        PeriodFilter::YearMonths {
            year,
            months: vec![Month::July],
        }
    }

    #[test]
    fn rows_sorted_by_second_period_with_total_first() {
        let records = vec![
            record(2022, 1, "Robo", 50),
            record(2023, 1, "Robo", 75),
            record(2022, 2, "Fraude", 10),
            record(2023, 2, "Fraude", 90),
            record(2023, 2, "Extorsión", 5),
        ];
        let rows = compare_periods(&records, &july(2022), &july(2023), Scope::National).unwrap();

        let categories: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec![ALL_CATEGORIES_LABEL, "Fraude", "Robo", "Extorsión"]);

        assert_eq!(rows[0].first, 60);
        assert_eq!(rows[0].second, 170);
        assert_eq!(rows[2].diff, 25);
        assert_eq!(rows[2].change, PercentChange::Defined(50.0));
        assert_eq!(rows[3].change, PercentChange::Undefined);
        assert_eq!(rows[3].diff, 5);
    }

    #[test]
    fn scope_limits_to_one_state() {
        let records = vec![record(2022, 1, "Robo", 50), record(2022, 2, "Robo", 7)];
        let scope = Scope::Region(RegionKey::State(StateCode::new(2).unwrap()));
        let rows = compare_periods(&records, &july(2022), &july(2023), scope).unwrap();
        assert_eq!(rows[0].first, 7);
        assert_eq!(rows[1].diff, -7);
    }

    #[test]
    fn no_matching_records_is_empty() {
        let records = vec![record(2020, 1, "Robo", 50)];
        assert!(matches!(
            compare_periods(&records, &july(2022), &july(2023), Scope::National),
            Err(AggregateError::Empty { .. })
        ));
    }

    fn annual(year: i32, state: u32, category: &str, count: u64) -> IncidentRecord {
        IncidentRecord {
            period: Period::Year(year),
            ..record(year, state, category, count)
        }
    }

    #[test]
    fn region_changes_sorted_by_change_with_national_row() {
        let records = vec![
            annual(2022, 1, "Extorsión", 10),
            annual(2023, 1, "Extorsión", 5),
            annual(2022, 2, "Extorsión", 10),
            annual(2023, 2, "Extorsión", 30),
            annual(2023, 3, "Extorsión", 4),
            annual(2023, 2, "Robo", 1000),
        ];
        let rows = compare_regions(
            &records,
            &PeriodFilter::Year { year: 2022 },
            &PeriodFilter::Year { year: 2023 },
            &CategoryFilter::single("Extorsión"),
        )
        .unwrap();

        let regions: Vec<String> = rows.iter().map(|row| row.region.code()).collect();
        assert_eq!(regions, vec!["02", "Nacional", "01", "03"]);

        assert_eq!(rows[0].change, PercentChange::Defined(200.0));
        assert_eq!(rows[1].first, 20);
        assert_eq!(rows[1].second, 39);
        assert_eq!(rows[2].diff, -5);
        assert_eq!(rows[3].change, PercentChange::Undefined);
    }

    #[test]
    fn region_changes_without_matches_are_empty() {
        let records = vec![annual(2023, 1, "Robo", 1)];
        assert!(matches!(
            compare_regions(
                &records,
                &PeriodFilter::Year { year: 2022 },
                &PeriodFilter::Year { year: 2023 },
                &CategoryFilter::single("Extorsión"),
            ),
            Err(AggregateError::Empty { .. })
        ));
    }
}
