//! Record filters: which categories and which periods count.

use std::collections::BTreeSet;

use incidencia_incidence_models::{Month, Period};
use incidencia_region_models::RegionKey;
use serde::{Deserialize, Serialize};

/// Label of the filter that matches every category.
pub const ALL_CATEGORIES_LABEL: &str = "Todos los delitos";

/// A named union of categories.
///
/// Matching happens per record, before grouping, so a region's total is
/// the combined count of every member category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    label: String,
    members: Option<BTreeSet<String>>,
}

impl CategoryFilter {
    /// A single category, labelled with its own name.
    #[must_use]
    pub fn single(category: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            label: category.clone(),
            members: Some(BTreeSet::from([category])),
        }
    }

    /// A union labelled with its members joined by `" y "`, in the order
    /// given (`"Homicidio doloso y Feminicidio"`).
    #[must_use]
    pub fn union<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ordered: Vec<String> = members.into_iter().map(Into::into).collect();
        Self {
            label: ordered.join(" y "),
            members: Some(ordered.into_iter().collect()),
        }
    }

    /// A union with an explicit label.
    #[must_use]
    pub fn named<I, S>(label: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            members: Some(members.into_iter().map(Into::into).collect()),
        }
    }

    /// Matches every category.
    #[must_use]
    pub fn all() -> Self {
        Self {
            label: ALL_CATEGORIES_LABEL.to_string(),
            members: None,
        }
    }

    /// Logical category label of the union.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether `category` belongs to the union.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        self.members
            .as_ref()
            .is_none_or(|members| members.contains(category))
    }
}

/// Which periods of the source records count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodFilter {
    /// Every record of a year, monthly or annual.
    Year {
        /// Calendar year.
        year: i32,
    },
    /// Selected months of a year. Annual records never match.
    YearMonths {
        /// Calendar year.
        year: i32,
        /// Months to keep.
        months: Vec<Month>,
    },
    /// January through `month` of a year (year to date). Annual records
    /// never match.
    Through {
        /// Calendar year.
        year: i32,
        /// Last month included.
        month: Month,
    },
}

impl PeriodFilter {
    /// Whether a record's period passes the filter.
    #[must_use]
    pub fn matches(&self, period: Period) -> bool {
        match self {
            Self::Year { year } => period.year() == *year,
            Self::YearMonths { year, months } => {
                period.year() == *year && period.month().is_some_and(|m| months.contains(&m))
            }
            Self::Through { year, month } => {
                period.year() == *year && period.month().is_some_and(|m| m <= *month)
            }
        }
    }

    /// The calendar year the filter selects.
    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Year { year } | Self::YearMonths { year, .. } | Self::Through { year, .. } => {
                *year
            }
        }
    }

    /// Period stamped on aggregated rows: the single month when exactly
    /// one is selected, the year otherwise.
    #[must_use]
    pub fn output_period(&self) -> Period {
        match self {
            Self::YearMonths { year, months } if months.len() == 1 => Period::YearMonth {
                year: *year,
                month: months[0],
            },
            _ => Period::Year(self.year()),
        }
    }
}

/// Geographic scope of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every subnational record.
    #[default]
    National,
    /// Records of one region; for a state, its municipalities too.
    Region(RegionKey),
}

impl Scope {
    /// Whether a record from `region` is in scope. Rows for the national
    /// pseudo-region read from a source file are never in scope, since
    /// national figures are always derived from subnational ones.
    #[must_use]
    pub fn contains(self, region: RegionKey) -> bool {
        if region.is_national() {
            return false;
        }
        match self {
            Self::National | Self::Region(RegionKey::National) => true,
            Self::Region(RegionKey::State(state)) => region.state() == Some(state),
            Self::Region(scope) => region == scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use incidencia_region_models::{MunicipalityCode, StateCode};

    use super::*;

    #[test]
    fn union_label_and_matching() {
        let filter = CategoryFilter::union(["Homicidio doloso", "Feminicidio"]);
        assert_eq!(filter.label(), "Homicidio doloso y Feminicidio");
        assert!(filter.matches("Feminicidio"));
        assert!(!filter.matches("Robo a negocio"));

        let named = CategoryFilter::named("Homicidios", ["Homicidio doloso", "Feminicidio"]);
        assert_eq!(named.label(), "Homicidios");
        assert!(CategoryFilter::all().matches("cualquier cosa"));
    }

    #[test]
    fn period_filters() {
        let july = Period::YearMonth {
            year: 2023,
            month: Month::July,
        };
        let december = Period::YearMonth {
            year: 2023,
            month: Month::December,
        };

        assert!(PeriodFilter::Year { year: 2023 }.matches(july));
        assert!(PeriodFilter::Year { year: 2023 }.matches(Period::Year(2023)));
        assert!(!PeriodFilter::Year { year: 2022 }.matches(july));

        let months = PeriodFilter::YearMonths {
            year: 2023,
            months: vec![Month::July],
        };
        assert!(months.matches(july));
        assert!(!months.matches(december));
        assert!(!months.matches(Period::Year(2023)));
        assert_eq!(months.output_period(), july);

        let through = PeriodFilter::Through {
            year: 2023,
            month: Month::July,
        };
        assert!(through.matches(july));
        assert!(!through.matches(december));
        assert_eq!(through.output_period(), Period::Year(2023));
    }

    #[test]
    fn scope_contains_municipalities_of_state() {
        let cdmx = StateCode::new(9).unwrap();
        let cuauhtemoc = RegionKey::Municipality(MunicipalityCode::parse("09015").unwrap());
        let aguascalientes = RegionKey::State(StateCode::new(1).unwrap());

        let scope = Scope::Region(RegionKey::State(cdmx));
        assert!(scope.contains(cuauhtemoc));
        assert!(scope.contains(RegionKey::State(cdmx)));
        assert!(!scope.contains(aguascalientes));

        assert!(Scope::National.contains(aguascalientes));
        assert!(!Scope::National.contains(RegionKey::National));
    }
}
