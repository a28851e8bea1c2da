//! Population tables.
//!
//! Two shapes are supported: the wide annual table (one row per region
//! name, one column per year) and the municipal long table keyed by
//! separate state and municipality code columns.

use std::collections::BTreeMap;
use std::io::Read;

use incidencia_incidence_models::PopulationRecord;
use incidencia_region_models::directory::RegionDirectory;
use incidencia_region_models::states::{resolve_name, state_name};
use incidencia_region_models::{MunicipalityCode, RegionKey};

use crate::schema::Schema;
use crate::{Encoding, LoadError, csv_reader, line_of, read_text};

/// Options for [`load_state_population`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePopulationOptions {
    /// Column holding the region name. Defaults to the first column.
    pub name_column: Option<String>,
    /// Sum rows that share a region instead of rejecting them. Needed for
    /// tables broken down by sex or age, which repeat each state.
    pub sum_duplicates: bool,
    /// Source encoding.
    pub encoding: Encoding,
}

/// Municipal population rows plus the `"Municipio, Entidad"` labels they
/// carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MunicipalPopulation {
    /// One record per municipality (and year, when the table has one).
    pub records: Vec<PopulationRecord>,
    /// Display labels for every municipality in the table.
    pub directory: RegionDirectory,
}

/// Municipal table columns.
pub const STATE_CODE: &str = "clave_entidad";
/// Municipal table columns.
pub const MUNICIPALITY_CODE: &str = "clave_municipio";
/// Municipal table columns.
pub const STATE_NAME: &str = "entidad";
/// Municipal table columns.
pub const MUNICIPALITY_NAME: &str = "municipio";
/// Municipal table columns.
pub const POPULATION: &str = "poblacion";
/// Optional year column of the municipal table.
pub const YEAR: &str = "año";

fn is_year_header(name: &str) -> Option<i32> {
    let name = name.trim();
    if name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit()) {
        name.parse().ok()
    } else {
        None
    }
}

fn insert_population(
    values: &mut BTreeMap<(RegionKey, i32), f64>,
    region: RegionKey,
    year: i32,
    population: f64,
    sum_duplicates: bool,
) -> Result<(), LoadError> {
    match values.get_mut(&(region, year)) {
        Some(existing) if sum_duplicates => {
            *existing += population;
            Ok(())
        }
        Some(_) => Err(LoadError::DuplicatePopulation { region, year }),
        None => {
            values.insert((region, year), population);
            Ok(())
        }
    }
}

fn into_records(values: BTreeMap<(RegionKey, i32), f64>) -> Vec<PopulationRecord> {
    values
        .into_iter()
        .map(|((region, year), population)| PopulationRecord {
            region,
            year,
            population,
        })
        .collect()
}

/// Parses the wide annual population table.
///
/// Every four-digit header is a year column; other columns besides the
/// name column are ignored. Names resolve through the state alias table,
/// and `"Estados Unidos Mexicanos"` maps to the national pseudo-region.
///
/// # Errors
///
/// Returns [`LoadError::UnknownRegion`] for a name the alias table does not
/// know, [`LoadError::DuplicatePopulation`] for a repeated region (unless
/// `sum_duplicates`), and [`LoadError::MalformedRow`] for a bad value.
pub fn parse_state_population(
    text: &str,
    options: &StatePopulationOptions,
) -> Result<Vec<PopulationRecord>, LoadError> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();

    let name_column = match &options.name_column {
        Some(name) => name.clone(),
        None => headers
            .get(0)
            .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
            .ok_or_else(|| LoadError::MissingColumn {
                column: "region name".to_string(),
            })?,
    };
    let schema = Schema::resolve(&headers, &[name_column.as_str()])?;

    let year_columns: Vec<(String, i32)> = headers
        .iter()
        .filter_map(|name| is_year_header(name).map(|year| (name.trim().to_string(), year)))
        .collect();

    let mut values = BTreeMap::new();

    for row in reader.records() {
        let row = row?;
        let name = schema.field(&row, &name_column)?;
        let region = resolve_name(name).ok_or_else(|| LoadError::UnknownRegion {
            line: line_of(&row),
            name: name.to_string(),
        })?;

        for (column, year) in &year_columns {
            let population = schema.population(&row, column)?;
            insert_population(&mut values, region, *year, population, options.sum_duplicates)?;
        }
    }

    let records = into_records(values);
    log::debug!(
        "Parsed {} state population values across {} years",
        records.len(),
        year_columns.len()
    );

    Ok(records)
}

/// Loads the wide annual population table.
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_state_population(
    reader: impl Read,
    options: &StatePopulationOptions,
) -> Result<Vec<PopulationRecord>, LoadError> {
    let text = read_text(reader, options.encoding)?;
    parse_state_population(&text, options)
}

/// Parses the municipal long population table.
///
/// Tables without an `año` column are assigned `default_year`.
///
/// # Errors
///
/// Returns [`LoadError::InvalidRegionCode`] for bad codes,
/// [`LoadError::DuplicatePopulation`] for a repeated municipality and year,
/// and [`LoadError::MalformedRow`] for a bad population value.
pub fn parse_municipal_population(
    text: &str,
    default_year: i32,
) -> Result<MunicipalPopulation, LoadError> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();
    let schema = Schema::resolve(
        &headers,
        &[STATE_CODE, MUNICIPALITY_CODE, MUNICIPALITY_NAME, POPULATION],
    )?;
    let has_year = schema.has(YEAR);
    let has_state_name = schema.has(STATE_NAME);

    let mut values = BTreeMap::new();
    let mut directory = RegionDirectory::new();

    for row in reader.records() {
        let row = row?;
        let state = schema.field(&row, STATE_CODE)?;
        let municipality = schema.field(&row, MUNICIPALITY_CODE)?;
        let code = MunicipalityCode::from_parts(state, municipality).map_err(|source| {
            LoadError::InvalidRegionCode {
                line: line_of(&row),
                column: MUNICIPALITY_CODE.to_string(),
                source,
            }
        })?;
        let region = RegionKey::Municipality(code);

        let year = if has_year {
            schema.year(&row, YEAR)?
        } else {
            default_year
        };
        let population = schema.population(&row, POPULATION)?;
        insert_population(&mut values, region, year, population, false)?;

        let municipality_name = schema.field(&row, MUNICIPALITY_NAME)?;
        let state_label = if has_state_name {
            schema.field(&row, STATE_NAME)?.to_string()
        } else {
            state_name(code.state()).to_string()
        };
        directory.insert(region, format!("{municipality_name}, {state_label}"));
    }

    let records = into_records(values);
    log::debug!("Parsed {} municipal population values", records.len());

    Ok(MunicipalPopulation { records, directory })
}

/// Loads the municipal long population table (UTF-8).
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_municipal_population(
    reader: impl Read,
    default_year: i32,
) -> Result<MunicipalPopulation, LoadError> {
    let text = read_text(reader, Encoding::Utf8)?;
    parse_municipal_population(&text, default_year)
}
