//! National rates over several years.

use std::collections::BTreeMap;

use incidencia_incidence_models::PopulationRecord;
use serde::{Deserialize, Serialize};

use crate::rate;

/// Rate of one year of a national series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualRate {
    pub year: i32,
    pub total: u64,
    /// `None` when the table has no population for the year.
    pub population: Option<f64>,
    /// `None` when the population is missing or not positive.
    pub rate: Option<f64>,
}

/// National population of `year`: the national row when the table has
/// one, else the sum of every subnational value of the year.
#[must_use]
pub fn national_population(population: &[PopulationRecord], year: i32) -> Option<f64> {
    let (national, regions): (Vec<&PopulationRecord>, Vec<&PopulationRecord>) = population
        .iter()
        .filter(|record| record.year == year)
        .partition(|record| record.region.is_national());

    national.first().map(|record| record.population).or_else(|| {
        (!regions.is_empty()).then(|| regions.iter().map(|record| record.population).sum())
    })
}

/// One national rate per year of `totals`, in year order.
#[must_use]
pub fn annual_rates(totals: &BTreeMap<i32, u64>, population: &[PopulationRecord]) -> Vec<AnnualRate> {
    totals
        .iter()
        .map(|(&year, &total)| {
            let population = national_population(population, year);
            if population.is_none() {
                log::warn!("No national population for {year}");
            }
            AnnualRate {
                year,
                total,
                population,
                rate: population.and_then(|population| rate(total, population).ok()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use incidencia_region_models::{RegionKey, StateCode};

    use super::*;

    fn population(region: RegionKey, year: i32, population: f64) -> PopulationRecord {
        PopulationRecord {
            region,
            year,
            population,
        }
    }

    #[test]
    fn national_row_wins_over_the_sum() {
        let state = RegionKey::State(StateCode::new(1).unwrap());
        let table = vec![
            population(state, 2022, 400_000.0),
            population(state, 2023, 500_000.0),
            population(RegionKey::National, 2023, 1_000_000.0),
        ];
        assert_eq!(national_population(&table, 2023), Some(1_000_000.0));
        assert_eq!(national_population(&table, 2022), Some(400_000.0));
        assert_eq!(national_population(&table, 2021), None);
    }

    #[test]
    fn one_rate_per_year() {
        let table = vec![
            population(RegionKey::National, 2022, 1_000_000.0),
            population(RegionKey::National, 2023, 0.0),
        ];
        let totals = BTreeMap::from([(2021, 5), (2022, 150), (2023, 7)]);
        let rates = annual_rates(&totals, &table);

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].population, None);
        assert_eq!(rates[0].rate, None);
        assert!((rates[1].rate.unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(rates[2].population, Some(0.0));
        assert_eq!(rates[2].rate, None);
    }
}
