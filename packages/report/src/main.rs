#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for running incidence rate reports.
//!
//! `run` executes a built-in or file-based report definition and writes the
//! ranked table as CSV or JSON for an external renderer. `timeseries`
//! converts a wide SESNSP extract into the long series other reports read.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use incidencia_aggregate::series::to_timeseries;
use incidencia_incidence_models::CategoryLevel;
use incidencia_loader::incidents::{
    Granularity, IncidentLayout, IncidentLoadOptions, load_incidents,
};
use incidencia_report::output::{write_csv, write_json, write_map_csv, write_timeseries_csv};
use incidencia_report::{all_reports, find_report, load_inputs, run_report};
use strum_macros::{Display, EnumString};

#[derive(Parser)]
#[command(name = "incidencia_report", about = "Crime incidence rate reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in reports
    List,
    /// Run a report
    Run {
        /// Built-in report id or path to a report TOML file.
        report: String,

        /// Directory the report's input paths are relative to.
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format ("csv" or "json").
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// Also write the choropleth buckets of the first section as CSV.
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Convert a wide extract into a long-format series
    Timeseries {
        /// Wide SESNSP extract (Latin-1).
        input: PathBuf,

        /// Output CSV file.
        output: PathBuf,

        /// Extract layout ("state", "municipal" or "victims").
        #[arg(long, default_value = "state")]
        layout: SeriesLayout,

        /// Classification column used as category ("type" or "subtype").
        #[arg(long, default_value = "subtype")]
        level: CategoryLevel,
    },
}

#[derive(Debug, Clone, Copy, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum SeriesLayout {
    State,
    Municipal,
    Victims,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_reports(),
        Commands::Run {
            report,
            base_dir,
            output,
            format,
            map,
        } => run(&report, &base_dir, output.as_deref(), format, map.as_deref())?,
        Commands::Timeseries {
            input,
            output,
            layout,
            level,
        } => timeseries(&input, &output, layout, level)?,
    }

    Ok(())
}

fn list_reports() {
    println!("{:<28} {:<22} NAME", "ID", "KIND");
    println!("{}", "-".repeat(80));
    for report in all_reports() {
        println!("{:<28} {:<22} {}", report.id, report.kind.as_ref(), report.name);
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, std::io::Error> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn run(
    report: &str,
    base_dir: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    map: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let definition = find_report(report)?;
    let inputs = load_inputs(&definition, base_dir)?;
    let result = run_report(&definition, &inputs)?;

    let mut writer = open_output(output)?;
    match format {
        OutputFormat::Csv => write_csv(&result, &mut writer)?,
        OutputFormat::Json => write_json(&result, &mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = map {
        match result.sections.first() {
            Some(section) if section.scale.is_some() => {
                write_map_csv(section, BufWriter::new(File::create(path)?))?;
                log::info!("Wrote {} map cells to {}", section.map.len(), path.display());
            }
            _ => log::warn!("Report '{}' has no choropleth scale; no map written", result.id),
        }
    }

    log::info!(
        "Report '{}' done: {} sections, {} comparison rows",
        result.id,
        result.sections.len(),
        result.comparison.len()
    );

    Ok(())
}

fn timeseries(
    input: &Path,
    output: &Path,
    layout: SeriesLayout,
    level: CategoryLevel,
) -> Result<(), Box<dyn std::error::Error>> {
    let (layout, granularity) = match layout {
        SeriesLayout::State => (IncidentLayout::State, Granularity::Monthly),
        SeriesLayout::Municipal => (IncidentLayout::Municipal, Granularity::Annual),
        SeriesLayout::Victims => (IncidentLayout::Victims, Granularity::Monthly),
    };
    let options = IncidentLoadOptions {
        level,
        granularity,
        ..IncidentLoadOptions::default()
    };

    let records = load_incidents(input, layout, &options)?;
    let points = to_timeseries(&records);
    write_timeseries_csv(&points, BufWriter::new(File::create(output)?))?;

    log::info!("Wrote {} series points to {}", points.len(), output.display());
    Ok(())
}
