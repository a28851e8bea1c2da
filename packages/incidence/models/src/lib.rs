#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types shared by every stage of the incidence pipeline.
//!
//! Raw inputs ([`IncidentRecord`], [`PopulationRecord`]) come out of the
//! loader; [`AggregatedCount`], [`Rate`] and [`RankedEntry`] are produced by
//! the later stages and live only for the duration of one report run.

use std::collections::BTreeMap;
use std::fmt;

use incidencia_region_models::RegionKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Calendar month, named the way SESNSP column headers spell it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Month {
    #[strum(serialize = "Enero")]
    #[serde(rename = "Enero")]
    January = 1,
    #[strum(serialize = "Febrero")]
    #[serde(rename = "Febrero")]
    February = 2,
    #[strum(serialize = "Marzo")]
    #[serde(rename = "Marzo")]
    March = 3,
    #[strum(serialize = "Abril")]
    #[serde(rename = "Abril")]
    April = 4,
    #[strum(serialize = "Mayo")]
    #[serde(rename = "Mayo")]
    May = 5,
    #[strum(serialize = "Junio")]
    #[serde(rename = "Junio")]
    June = 6,
    #[strum(serialize = "Julio")]
    #[serde(rename = "Julio")]
    July = 7,
    #[strum(serialize = "Agosto")]
    #[serde(rename = "Agosto")]
    August = 8,
    #[strum(serialize = "Septiembre")]
    #[serde(rename = "Septiembre")]
    September = 9,
    #[strum(serialize = "Octubre")]
    #[serde(rename = "Octubre")]
    October = 10,
    #[strum(serialize = "Noviembre")]
    #[serde(rename = "Noviembre")]
    November = 11,
    #[strum(serialize = "Diciembre")]
    #[serde(rename = "Diciembre")]
    December = 12,
}

impl Month {
    /// Month number, 1-12.
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Creates a month from its number.
    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::January),
            2 => Some(Self::February),
            3 => Some(Self::March),
            4 => Some(Self::April),
            5 => Some(Self::May),
            6 => Some(Self::June),
            7 => Some(Self::July),
            8 => Some(Self::August),
            9 => Some(Self::September),
            10 => Some(Self::October),
            11 => Some(Self::November),
            12 => Some(Self::December),
            _ => None,
        }
    }

    /// Returns all months in calendar order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::January,
            Self::February,
            Self::March,
            Self::April,
            Self::May,
            Self::June,
            Self::July,
            Self::August,
            Self::September,
            Self::October,
            Self::November,
            Self::December,
        ]
    }
}

/// Time granularity of a record: a whole year or a single month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Calendar year.
    Year(i32),
    /// One month of a year.
    YearMonth {
        /// Calendar year.
        year: i32,
        /// Month within the year.
        month: Month,
    },
}

impl Period {
    /// Calendar year of the period.
    #[must_use]
    pub const fn year(self) -> i32 {
        match self {
            Self::Year(year) | Self::YearMonth { year, .. } => year,
        }
    }

    /// Month of the period, if it is monthly.
    #[must_use]
    pub const fn month(self) -> Option<Month> {
        match self {
            Self::Year(_) => None,
            Self::YearMonth { month, .. } => Some(month),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::YearMonth { year, month } => write!(f, "{year}-{:02}", month.number()),
        }
    }
}

/// Which SESNSP classification column is used as the record category.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CategoryLevel {
    /// `Tipo de delito` (e.g. `"Robo"`).
    Type,
    /// `Subtipo de delito` (e.g. `"Robo de vehículo automotor"`).
    #[default]
    Subtype,
}

/// One raw incidence observation.
///
/// `(period, region, category, secondary)` is not unique in the source
/// files; duplicates are summed during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// When the incidents were recorded.
    pub period: Period,
    /// Where the incidents were recorded.
    pub region: RegionKey,
    /// Crime type or subtype, depending on the loader's [`CategoryLevel`].
    pub category: String,
    /// Optional secondary dimension (victim sex, robbery modality).
    pub secondary: Option<String>,
    /// Number of records (or victims).
    pub count: u64,
}

/// Population of one region for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Region the population belongs to.
    pub region: RegionKey,
    /// Reference year.
    pub year: i32,
    /// Inhabitants. Non-negative; may be zero in the source data.
    pub population: f64,
}

/// Total incidents for one region, period and logical category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedCount {
    /// Region the total belongs to.
    pub region: RegionKey,
    /// Period the total covers.
    pub period: Period,
    /// Logical category label (a single category or a union name).
    pub category: String,
    /// Sum of all matching record counts.
    pub total: u64,
    /// Totals per secondary-dimension value when a pivot was requested;
    /// empty otherwise.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakdown: BTreeMap<String, u64>,
}

/// A defined per-100k rate. Only built when the population is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Region the rate belongs to.
    pub region: RegionKey,
    /// Period the rate covers.
    pub period: Period,
    /// Logical category label.
    pub category: String,
    /// Incident total used as numerator.
    pub total: u64,
    /// Population used as denominator.
    pub population: f64,
    /// Incidents per 100,000 inhabitants.
    pub rate: f64,
}

/// Ordering direction for rankings.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Highest values first ("top").
    #[default]
    Descending,
    /// Lowest values first ("bottom").
    Ascending,
}

/// Value a ranking orders by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Incidents per 100,000 inhabitants.
    #[default]
    Rate,
    /// Absolute incident total.
    Total,
}

/// One row of a ranking, ready for a table or map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position after ordering and truncation.
    pub rank: usize,
    /// Region being ranked.
    pub region: RegionKey,
    /// Display label (state abbreviation or `"Municipio, Entidad"`).
    pub label: String,
    /// Incident total.
    pub total: u64,
    /// Population denominator, when the population table has one.
    pub population: Option<f64>,
    /// Incidents per 100,000 inhabitants, when defined.
    pub rate: Option<f64>,
}
