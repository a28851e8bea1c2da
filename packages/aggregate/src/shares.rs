//! Shares of a pivoted breakdown (victims by sex).

use std::collections::BTreeMap;

use incidencia_incidence_models::AggregatedCount;
use incidencia_rates::DivisionUndefined;
use incidencia_region_models::RegionKey;

/// Breakdown values of one row as percentages of its total.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub region: RegionKey,
    pub total: u64,
    /// Percent per breakdown key, or [`DivisionUndefined`] for a row
    /// whose total is zero.
    pub shares: Result<BTreeMap<String, f64>, DivisionUndefined>,
}

/// Turns each row's breakdown into percentages of the row total.
///
/// Rows must come from a pivoted aggregation; a row without a breakdown
/// yields an empty share map.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sex_shares(counts: &[AggregatedCount]) -> Vec<ShareRow> {
    counts
        .iter()
        .map(|count| {
            let shares = if count.total == 0 {
                Err(DivisionUndefined)
            } else {
                Ok(count
                    .breakdown
                    .iter()
                    .map(|(key, value)| (key.clone(), *value as f64 / count.total as f64 * 100.0))
                    .collect())
            };
            ShareRow {
                region: count.region,
                total: count.total,
                shares,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use incidencia_incidence_models::Period;
    use incidencia_region_models::StateCode;

    use super::*;

    fn count(total: u64, breakdown: &[(&str, u64)]) -> AggregatedCount {
        AggregatedCount {
            region: RegionKey::State(StateCode::new(3).unwrap()),
            period: Period::Year(2023),
            category: "Homicidio doloso".to_string(),
            total,
            breakdown: breakdown
                .iter()
                .map(|(key, value)| ((*key).to_string(), *value))
                .collect(),
        }
    }

    #[test]
    fn shares_are_percent_of_total() {
        let rows = sex_shares(&[count(8, &[("Hombre", 6), ("Mujer", 2)])]);
        let shares = rows[0].shares.as_ref().unwrap();
        assert!((shares["Hombre"] - 75.0).abs() < 1e-9);
        assert!((shares["Mujer"] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_is_undefined_not_zero() {
        let rows = sex_shares(&[count(0, &[("Hombre", 0), ("Mujer", 0)])]);
        assert_eq!(rows[0].shares, Err(DivisionUndefined));
    }
}
