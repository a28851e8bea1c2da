#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Config-driven incidence reports.
//!
//! A report definition (TOML) picks the inputs, categories, year and
//! ranking policy; [`pipeline::run_report`] runs
//! load → aggregate → rate → rank/scale and returns a typed table that
//! [`output`] serializes as CSV or JSON for an external renderer.

pub mod definition;
pub mod output;
pub mod pipeline;
pub mod registry;

pub use definition::{ReportDefinition, ReportKind, parse_report_toml};
pub use pipeline::{ReportInputs, ReportOutput, load_inputs, run_report};
pub use registry::{all_reports, find_report};

use incidencia_aggregate::AggregateError;
use incidencia_loader::LoadError;
use incidencia_rank::RankError;
use incidencia_rates::scale::ScaleError;
use incidencia_rates::stats::StatsError;

/// Errors that can occur while building or writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// An input file could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// No records matched a category or period.
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Nothing was left to rank.
    #[error("Ranking error: {0}")]
    Rank(#[from] RankError),

    /// The choropleth scale could not be built.
    #[error("Scale error: {0}")]
    Scale(#[from] ScaleError),

    /// Descriptive statistics could not be computed.
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// I/O error (file read or write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A report definition is malformed.
    #[error("Invalid report definition: {0}")]
    Toml(#[from] toml::de::Error),

    /// No built-in report has the given id and no such file exists.
    #[error("Unknown report: {id}")]
    UnknownReport {
        /// The requested id or path.
        id: String,
    },

    /// The report kind needs an input the definition does not name.
    #[error("Report '{report}' needs a {input} input")]
    MissingInput {
        /// Report id.
        report: String,
        /// Missing input.
        input: &'static str,
    },

    /// A comparison scope is neither a region code nor a state name.
    #[error("Invalid scope '{value}'")]
    InvalidScope {
        /// The configured scope.
        value: String,
    },

    /// A series mixes layouts that no single file format can hold.
    #[error("Unsupported series: {message}")]
    UnsupportedSeries {
        /// What is wrong with the series.
        message: String,
    },
}
