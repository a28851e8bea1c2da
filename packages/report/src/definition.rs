//! Config-driven report definitions.
//!
//! A [`ReportDefinition`] captures everything that distinguishes one report
//! variant from another (year, categories, ordering, thresholds, inputs),
//! so a single pipeline produces all of them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use incidencia_aggregate::series::DEFAULT_WINDOW;
use incidencia_aggregate::{CategoryFilter, PeriodFilter, Scope};
use incidencia_incidence_models::{CategoryLevel, Direction, Metric, Month, Period};
use incidencia_rank::RankOptions;
use incidencia_rates::scale::{DEFAULT_EDGES, DEFAULT_UPPER_PERCENTILE};
use incidencia_region_models::RegionKey;
use incidencia_region_models::directory::LabelStyle;
use incidencia_region_models::states::resolve_name;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ReportError;

// ── Top-level report definition ──────────────────────────────────────────

/// A complete report variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    /// Unique identifier (e.g., `"estatal_top_10"`).
    pub id: String,
    /// Human-readable title.
    pub name: String,
    /// Which pipeline shape the report follows.
    pub kind: ReportKind,
    /// Incidence year (the second year of a comparison).
    pub year: i32,
    /// Population year used as denominator. Defaults to `year`; municipal
    /// reports point this at the census year.
    #[serde(default)]
    pub population_year: Option<i32>,
    /// First year of a comparison. Defaults to `year - 1`.
    #[serde(default)]
    pub compare_year: Option<i32>,
    /// First year of a national trend. Defaults to the first year in the
    /// data.
    #[serde(default)]
    pub first_year: Option<i32>,
    /// Restrict to these months.
    #[serde(default)]
    pub months: Vec<Month>,
    /// Restrict to January through this month (year to date).
    #[serde(default)]
    pub through: Option<Month>,
    /// Classification column used as category.
    #[serde(default)]
    pub level: CategoryLevel,
    /// Category unions, one report section each. Empty means every
    /// category in a single section.
    #[serde(default)]
    pub categories: Vec<CategoryUnion>,
    /// Region a comparison is limited to (padded code or state name).
    #[serde(default)]
    pub scope: Option<String>,
    /// Ranking options.
    #[serde(default)]
    pub ranking: RankingConfig,
    /// Choropleth scale options.
    #[serde(default)]
    pub scale: ScaleConfig,
    /// Monthly series options.
    #[serde(default)]
    pub series: SeriesConfig,
    /// Input files.
    pub inputs: InputPaths,
}

/// Pipeline shape of a report.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum ReportKind {
    /// Per-state rates ranked top or bottom.
    StateRanking,
    /// Per-municipality rates ranked with a population threshold.
    MunicipalRanking,
    /// Per-municipality rates with stats, scale and bucket per region.
    MunicipalChoropleth,
    /// Per-state victim rates with their split by sex.
    VictimRanking,
    /// Per-category totals of two periods.
    PeriodComparison,
    /// Per-region totals of two years and their percent change.
    RegionComparison,
    /// National rate per year.
    NationalTrend,
    /// National monthly totals with a trailing mean.
    MonthlySeries,
}

impl ReportKind {
    /// Whether the report works on municipal data.
    #[must_use]
    pub const fn is_municipal(self) -> bool {
        matches!(self, Self::MunicipalRanking | Self::MunicipalChoropleth)
    }

    /// Whether the report divides by population.
    #[must_use]
    pub const fn needs_population(self) -> bool {
        !matches!(
            self,
            Self::PeriodComparison | Self::RegionComparison | Self::MonthlySeries
        )
    }

    /// Whether the report produces one ranked section per category union.
    #[must_use]
    pub const fn is_ranking(self) -> bool {
        matches!(
            self,
            Self::StateRanking
                | Self::MunicipalRanking
                | Self::MunicipalChoropleth
                | Self::VictimRanking
        )
    }
}

// ── Categories ───────────────────────────────────────────────────────────

/// A union of categories reported as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUnion {
    /// Label of the union. Defaults to the members joined by `" y "`.
    #[serde(default)]
    pub name: Option<String>,
    /// Member categories.
    pub members: Vec<String>,
}

impl CategoryUnion {
    /// Builds the matching filter.
    #[must_use]
    pub fn filter(&self) -> CategoryFilter {
        match &self.name {
            Some(name) => CategoryFilter::named(name.clone(), self.members.iter().cloned()),
            None => CategoryFilter::union(self.members.iter().cloned()),
        }
    }
}

// ── Ranking and scale ────────────────────────────────────────────────────

/// Ranking section of a report definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub metric: Metric,
    pub direction: Direction,
    pub top_n: Option<usize>,
    /// Regions with fewer inhabitants are excluded before ranking.
    pub min_population: Option<f64>,
    pub label_style: LabelStyle,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Rate,
            direction: Direction::Descending,
            top_n: Some(10),
            min_population: None,
            label_style: LabelStyle::Name,
        }
    }
}

impl RankingConfig {
    /// Ranker options for this config.
    #[must_use]
    pub const fn options(&self) -> RankOptions {
        RankOptions {
            metric: self.metric,
            direction: self.direction,
            top_n: self.top_n,
            min_denominator: self.min_population,
            label_style: self.label_style,
        }
    }
}

/// Choropleth scale section of a report definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Build a scale and a bucket per region. Always on for
    /// `municipal_choropleth`.
    pub map: bool,
    /// Number of edges (ticks).
    pub edges: usize,
    /// Quantile used as the top edge.
    pub upper_percentile: f64,
    /// Leave zero rates out of the statistics, the scale and the map.
    pub exclude_zero: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            map: false,
            edges: DEFAULT_EDGES,
            upper_percentile: DEFAULT_UPPER_PERCENTILE,
            exclude_zero: false,
        }
    }
}

/// Monthly series section of a report definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Observations in the trailing mean.
    pub window: usize,
    /// Points kept from the end of the series. Defaults to `window + 1`.
    pub tail: Option<usize>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            tail: None,
        }
    }
}

impl SeriesConfig {
    /// Points kept from the end of the series.
    #[must_use]
    pub fn tail(&self) -> usize {
        self.tail.unwrap_or(self.window + 1)
    }
}

// ── Inputs ───────────────────────────────────────────────────────────────

/// Layout of the incidence input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentFormat {
    /// SESNSP wide extract (Latin-1).
    #[default]
    Wide,
    /// Long series written by the `timeseries` subcommand (UTF-8).
    Timeseries,
}

/// Extract a wide incidence file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WideLayout {
    State,
    Municipal,
    Victims,
}

/// Input files of a report, relative to the run's base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPaths {
    /// Incidence file.
    pub incidents: PathBuf,
    /// Layout of the incidence file.
    #[serde(default)]
    pub incidents_format: IncidentFormat,
    /// Extract of a wide incidence file. Follows the report kind when
    /// absent.
    #[serde(default)]
    pub layout: Option<WideLayout>,
    /// Population table: wide annual for state reports, long municipal
    /// for municipal ones.
    #[serde(default)]
    pub population: Option<PathBuf>,
    /// Sum population rows that repeat a state (tables split by sex).
    #[serde(default)]
    pub population_sum_rows: bool,
    /// Wide annual table holding the national population of municipal
    /// reports. The sum of municipal populations is used when absent.
    #[serde(default)]
    pub national_population: Option<PathBuf>,
}

// ── Derived settings ─────────────────────────────────────────────────────

impl ReportDefinition {
    /// Population year used as denominator.
    #[must_use]
    pub fn population_year(&self) -> i32 {
        self.population_year.unwrap_or(self.year)
    }

    /// First year of a comparison.
    #[must_use]
    pub fn compare_year(&self) -> i32 {
        self.compare_year.unwrap_or(self.year - 1)
    }

    /// Period filter for `year`, honoring `months` and `through`.
    #[must_use]
    pub fn period_filter(&self, year: i32) -> PeriodFilter {
        if let Some(month) = self.through {
            PeriodFilter::Through { year, month }
        } else if self.months.is_empty() {
            PeriodFilter::Year { year }
        } else {
            PeriodFilter::YearMonths {
                year,
                months: self.months.clone(),
            }
        }
    }

    /// Whether the incidence input must be read month by month.
    #[must_use]
    pub fn needs_months(&self) -> bool {
        self.through.is_some()
            || !self.months.is_empty()
            || matches!(self.kind, ReportKind::PeriodComparison | ReportKind::MonthlySeries)
    }

    /// Extract of the wide incidence file.
    #[must_use]
    pub fn wide_layout(&self) -> WideLayout {
        self.inputs.layout.unwrap_or(match self.kind {
            ReportKind::MunicipalRanking | ReportKind::MunicipalChoropleth => WideLayout::Municipal,
            ReportKind::VictimRanking => WideLayout::Victims,
            ReportKind::StateRanking
            | ReportKind::PeriodComparison
            | ReportKind::RegionComparison
            | ReportKind::NationalTrend
            | ReportKind::MonthlySeries => WideLayout::State,
        })
    }

    /// Whether sections carry a choropleth scale and map.
    #[must_use]
    pub fn has_map(&self) -> bool {
        self.kind == ReportKind::MunicipalChoropleth || self.scale.map
    }

    /// Last month of a monthly series: `through` of `year`, or December.
    #[must_use]
    pub fn series_end(&self) -> Period {
        Period::YearMonth {
            year: self.year,
            month: self.through.unwrap_or(Month::December),
        }
    }

    /// One filter per configured union, or a single all-categories filter.
    #[must_use]
    pub fn category_filters(&self) -> Vec<CategoryFilter> {
        if self.categories.is_empty() {
            vec![CategoryFilter::all()]
        } else {
            self.categories.iter().map(CategoryUnion::filter).collect()
        }
    }

    /// Scope of a comparison.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidScope`] if `scope` is neither a padded
    /// region code nor a known state name.
    pub fn scope(&self) -> Result<Scope, ReportError> {
        let Some(raw) = &self.scope else {
            return Ok(Scope::National);
        };
        resolve_name(raw)
            .or_else(|| RegionKey::from_str(raw).ok())
            .map(Scope::Region)
            .ok_or_else(|| ReportError::InvalidScope { value: raw.clone() })
    }

    /// Resolves an input path against `base_dir`.
    #[must_use]
    pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

/// Parses a TOML string into a [`ReportDefinition`].
///
/// # Errors
///
/// Returns [`ReportError::Toml`] if the TOML is malformed or missing
/// required fields.
pub fn parse_report_toml(toml_str: &str) -> Result<ReportDefinition, ReportError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Reads a report definition from a file.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be read or parsed.
pub fn load_report_file(path: &Path) -> Result<ReportDefinition, ReportError> {
    let text = std::fs::read_to_string(path)?;
    parse_report_toml(&text)
}
