//! Report pipeline: load → aggregate → rate → rank/scale.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use incidencia_aggregate::compare::{ComparisonRow, RegionChange, compare_periods, compare_regions};
use incidencia_aggregate::series::{TrendPoint, annual_totals, national_series};
use incidencia_aggregate::shares::sex_shares;
use incidencia_aggregate::{AggregateError, AggregateQuery, CategoryFilter, Grouping, aggregate};
use incidencia_incidence_models::{AggregatedCount, IncidentRecord, Metric, PopulationRecord};
use incidencia_loader::Encoding;
use incidencia_loader::incidents::{
    Granularity, IncidentLayout, IncidentLoadOptions, SecondaryColumn, load_incidents,
};
use incidencia_loader::population::{
    StatePopulationOptions, load_municipal_population, load_state_population,
};
use incidencia_loader::timeseries::load_timeseries;
use incidencia_rank::{Ranking, rank};
use incidencia_rates::join::attach_population;
use incidencia_rates::scale::ChoroplethScale;
use incidencia_rates::stats::{DescriptiveStats, FiniteRates, descriptive_stats};
use incidencia_rates::trend::{AnnualRate, annual_rates, national_population};
use incidencia_rates::{Exclusion, JoinPolicy, PercentChange, national_rate};
use incidencia_region_models::RegionKey;
use incidencia_region_models::directory::RegionDirectory;
use serde::Serialize;

use crate::ReportError;
use crate::definition::{IncidentFormat, ReportDefinition, ReportKind, WideLayout};

/// Data a report runs on, already loaded and validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportInputs {
    pub incidents: Vec<IncidentRecord>,
    pub population: Vec<PopulationRecord>,
    /// Labels for municipalities; states are labelled from the catalog.
    pub directory: RegionDirectory,
}

/// Result of one report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutput {
    pub id: String,
    pub name: String,
    pub kind: ReportKind,
    pub year: i32,
    /// One section per category union (ranking kinds).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<CategorySection>,
    /// Per-category comparison rows (period comparisons).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparison: Vec<ComparisonRow>,
    /// Per-region changes of each category union (region comparisons).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<RegionChanges>,
    /// National rate per year of each category union (national trends).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trend: Vec<CategoryTrend>,
    /// Monthly national series of each category union (monthly series).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<CategorySeries>,
}

/// Rates, ranking and summaries of one category union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub category: String,
    pub national: NationalSummary,
    pub ranking: Ranking,
    /// Regions whose rate is undefined (zero or missing population).
    pub undefined: Vec<Exclusion>,
    /// Summary of the defined rates, before the ranking threshold.
    pub stats: Option<DescriptiveStats>,
    /// Non-finite rates left out of `stats`.
    pub dropped: usize,
    /// Zero rates left out of `stats`, the scale and the map.
    pub zero_rates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ChoroplethScale>,
    /// Bucket of every mapped region.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub map: Vec<MapCell>,
    /// Breakdown shares per region (victim reports).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<ShareSummary>,
}

/// Country-wide figures shown alongside a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NationalSummary {
    /// Sum of every regional total.
    pub total: u64,
    pub population: Option<f64>,
    /// `None` when no national population is known.
    pub rate: Option<f64>,
}

/// One region of a choropleth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapCell {
    pub region: RegionKey,
    pub label: String,
    pub rate: f64,
    pub bucket: usize,
}

/// Breakdown shares of one region, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSummary {
    pub region: RegionKey,
    pub label: String,
    pub total: u64,
    /// `None` when the total is zero.
    pub shares: Option<BTreeMap<String, f64>>,
}

/// Per-region changes of one category union, largest increase first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionChanges {
    pub category: String,
    pub first_year: i32,
    pub second_year: i32,
    pub rows: Vec<RegionChangeRow>,
}

/// A [`RegionChange`] with its display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionChangeRow {
    pub region: RegionKey,
    pub label: String,
    pub first: u64,
    pub second: u64,
    pub diff: i64,
    pub change: PercentChange,
}

/// National rate per year of one category union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    /// Sum of every year's total.
    pub cumulative_total: u64,
    pub years: Vec<AnnualRate>,
}

/// Monthly national series of one category union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<TrendPoint>,
}

/// Loads the inputs a definition names, relative to `base_dir`.
///
/// # Errors
///
/// Returns [`ReportError::MissingInput`] if a required input is not
/// configured and [`ReportError::Load`] if a file cannot be loaded.
pub fn load_inputs(def: &ReportDefinition, base_dir: &Path) -> Result<ReportInputs, ReportError> {
    let incidents_path = ReportDefinition::resolve_path(base_dir, &def.inputs.incidents);

    let incidents = match def.inputs.incidents_format {
        IncidentFormat::Timeseries => load_timeseries(File::open(&incidents_path)?)?,
        IncidentFormat::Wide => {
            let layout = def.wide_layout();
            let options = IncidentLoadOptions {
                level: def.level,
                secondary: (layout == WideLayout::Victims).then_some(SecondaryColumn::Sex),
                granularity: if def.needs_months() {
                    Granularity::Monthly
                } else {
                    Granularity::Annual
                },
                encoding: Encoding::Latin1,
            };
            let layout = match layout {
                WideLayout::State => IncidentLayout::State,
                WideLayout::Municipal => IncidentLayout::Municipal,
                WideLayout::Victims => IncidentLayout::Victims,
            };
            load_incidents(&incidents_path, layout, &options)?
        }
    };

    if !def.kind.needs_population() {
        return Ok(ReportInputs {
            incidents,
            ..ReportInputs::default()
        });
    }

    let population_path = def
        .inputs
        .population
        .as_ref()
        .map(|path| ReportDefinition::resolve_path(base_dir, path))
        .ok_or_else(|| ReportError::MissingInput {
            report: def.id.clone(),
            input: "population",
        })?;

    let (mut population, directory) = if def.kind.is_municipal() {
        let table = load_municipal_population(File::open(&population_path)?, def.population_year())?;
        (table.records, table.directory)
    } else {
        let options = StatePopulationOptions {
            sum_duplicates: def.inputs.population_sum_rows,
            ..StatePopulationOptions::default()
        };
        (
            load_state_population(File::open(&population_path)?, &options)?,
            RegionDirectory::new(),
        )
    };

    if let Some(path) = &def.inputs.national_population {
        let path = ReportDefinition::resolve_path(base_dir, path);
        let national = load_state_population(File::open(&path)?, &StatePopulationOptions::default())?;
        population.extend(national.into_iter().filter(|record| record.region.is_national()));
    }

    log::info!(
        "Loaded {} incident records and {} population values for '{}'",
        incidents.len(),
        population.len(),
        def.id
    );

    Ok(ReportInputs {
        incidents,
        population,
        directory,
    })
}

/// Runs a report over already loaded inputs.
///
/// Regions without a population do not stop the run: they are listed
/// among a section's undefined rates.
///
/// # Errors
///
/// Returns [`ReportError`] if a category matches no records, nothing is
/// left to rank, or the scale cannot be built.
pub fn run_report(
    def: &ReportDefinition,
    inputs: &ReportInputs,
) -> Result<ReportOutput, ReportError> {
    log::info!("Running report '{}' ({})", def.id, def.kind);

    let mut output = ReportOutput {
        id: def.id.clone(),
        name: def.name.clone(),
        kind: def.kind,
        year: def.year,
        sections: Vec::new(),
        comparison: Vec::new(),
        changes: Vec::new(),
        trend: Vec::new(),
        series: Vec::new(),
    };

    match def.kind {
        ReportKind::PeriodComparison => {
            output.comparison = compare_periods(
                &inputs.incidents,
                &def.period_filter(def.compare_year()),
                &def.period_filter(def.year),
                def.scope()?,
            )?;
        }
        ReportKind::RegionComparison => {
            for categories in def.category_filters() {
                output.changes.push(region_changes(def, inputs, &categories)?);
            }
        }
        ReportKind::NationalTrend => {
            for categories in def.category_filters() {
                output.trend.push(category_trend(def, inputs, &categories)?);
            }
        }
        ReportKind::MonthlySeries => {
            for categories in def.category_filters() {
                output.series.push(category_series(def, inputs, &categories)?);
            }
        }
        ReportKind::StateRanking
        | ReportKind::MunicipalRanking
        | ReportKind::MunicipalChoropleth
        | ReportKind::VictimRanking => {
            for categories in def.category_filters() {
                output.sections.push(run_section(def, inputs, categories)?);
            }
        }
    }

    Ok(output)
}

fn run_section(
    def: &ReportDefinition,
    inputs: &ReportInputs,
    categories: CategoryFilter,
) -> Result<CategorySection, ReportError> {
    let query = AggregateQuery {
        period: def.period_filter(def.year),
        categories,
        grouping: if def.kind.is_municipal() {
            Grouping::Region
        } else {
            Grouping::State
        },
        include_national: false,
        pivot: def.kind == ReportKind::VictimRanking,
    };
    let counts = aggregate(&inputs.incidents, &query)?;
    let category = query.categories.label().to_string();
    let year = def.population_year();

    let national = national_summary(&counts, &inputs.population, year);
    let table = attach_population(&counts, &inputs.population, year, JoinPolicy::default());

    let (described, zeros): (Vec<_>, Vec<_>) = table
        .rates
        .iter()
        .partition(|rate| !def.scale.exclude_zero || rate.total > 0);
    let zero_rates = zeros.len();
    if zero_rates > 0 {
        log::info!("{zero_rates} zero rates left out of the statistics for '{category}'");
    }

    let (finite, dropped) = FiniteRates::filter(described.iter().map(|rate| rate.rate));
    if dropped > 0 {
        log::warn!("{dropped} non-finite rates left out of the statistics for '{category}'");
    }
    let stats = if finite.is_empty() {
        None
    } else {
        Some(descriptive_stats(&finite)?)
    };

    let options = def.ranking.options();
    let ranking = match options.metric {
        Metric::Rate => rank(&table.rates, &options, &inputs.directory)?,
        Metric::Total => rank(&table.joined, &options, &inputs.directory)?,
    };

    let (scale, map) = if def.has_map() {
        let scale = ChoroplethScale::build(&finite, def.scale.edges, def.scale.upper_percentile)?;
        let map = described
            .iter()
            .filter_map(|rate| {
                scale.bucket_of(rate.rate).map(|bucket| MapCell {
                    region: rate.region,
                    label: inputs.directory.label(rate.region, def.ranking.label_style),
                    rate: rate.rate,
                    bucket,
                })
            })
            .collect();
        (Some(scale), map)
    } else {
        (None, Vec::new())
    };

    let shares = if def.kind == ReportKind::VictimRanking {
        sex_shares(&counts)
            .into_iter()
            .map(|row| ShareSummary {
                region: row.region,
                label: inputs.directory.label(row.region, def.ranking.label_style),
                total: row.total,
                shares: row.shares.ok(),
            })
            .collect()
    } else {
        Vec::new()
    };

    log::info!(
        "'{category}': {} ranked, {} undefined, {} below threshold",
        ranking.entries.len(),
        table.exclusions.len(),
        ranking.exclusions.len()
    );

    Ok(CategorySection {
        category,
        national,
        ranking,
        undefined: table.exclusions,
        stats,
        dropped,
        zero_rates,
        scale,
        map,
        shares,
    })
}

fn region_changes(
    def: &ReportDefinition,
    inputs: &ReportInputs,
    categories: &CategoryFilter,
) -> Result<RegionChanges, ReportError> {
    let first_year = def.compare_year();
    let rows = compare_regions(
        &inputs.incidents,
        &def.period_filter(first_year),
        &def.period_filter(def.year),
        categories,
    )?
    .into_iter()
    .map(|change: RegionChange| RegionChangeRow {
        region: change.region,
        label: inputs.directory.label(change.region, def.ranking.label_style),
        first: change.first,
        second: change.second,
        diff: change.diff,
        change: change.change,
    })
    .collect();

    Ok(RegionChanges {
        category: categories.label().to_string(),
        first_year,
        second_year: def.year,
        rows,
    })
}

fn category_trend(
    def: &ReportDefinition,
    inputs: &ReportInputs,
    categories: &CategoryFilter,
) -> Result<CategoryTrend, ReportError> {
    let mut totals = annual_totals(&inputs.incidents, categories);
    totals.retain(|&year, _| year <= def.year && def.first_year.is_none_or(|first| year >= first));
    if totals.is_empty() {
        return Err(AggregateError::Empty {
            category: categories.label().to_string(),
            year: def.year,
        }
        .into());
    }

    let years = annual_rates(&totals, &inputs.population);
    Ok(CategoryTrend {
        category: categories.label().to_string(),
        cumulative_total: years.iter().map(|year| year.total).sum(),
        years,
    })
}

fn category_series(
    def: &ReportDefinition,
    inputs: &ReportInputs,
    categories: &CategoryFilter,
) -> Result<CategorySeries, ReportError> {
    let points = national_series(
        &inputs.incidents,
        categories,
        def.series_end(),
        def.series.window,
        def.series.tail(),
    );
    if points.is_empty() {
        return Err(AggregateError::Empty {
            category: categories.label().to_string(),
            year: def.year,
        }
        .into());
    }

    Ok(CategorySeries {
        category: categories.label().to_string(),
        points,
    })
}

/// National total and rate. The national population is the national row
/// of the population table when present, else the sum of every regional
/// population of the year.
fn national_summary(
    counts: &[AggregatedCount],
    population: &[PopulationRecord],
    year: i32,
) -> NationalSummary {
    let total = counts.iter().map(|count| count.total).sum();
    let national_population = national_population(population, year);

    NationalSummary {
        total,
        population: national_population,
        rate: national_population.and_then(|population| national_rate(counts, population).ok()),
    }
}
