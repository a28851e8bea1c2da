//! SESNSP incidence extracts in their published wide layout.
//!
//! Each published row holds one year, one region, one crime classification
//! and twelve monthly columns (`Enero`..`Diciembre`). Rows are expanded into
//! one [`IncidentRecord`] per month, or summed into a single annual record
//! when [`Granularity::Annual`] is requested.

use std::io::Read;
use std::path::Path;

use incidencia_incidence_models::{CategoryLevel, IncidentRecord, Month, Period};

use crate::schema::Schema;
use crate::{Encoding, LoadError, csv_reader, read_file, read_text};

/// `Año` column.
pub const YEAR: &str = "Año";
/// Two-digit state code column.
pub const STATE_CODE: &str = "Clave_Ent";
/// State name column.
pub const STATE_NAME: &str = "Entidad";
/// Five-digit municipality code column.
pub const MUNICIPALITY_CODE: &str = "Cve. Municipio";
/// Municipality name column.
pub const MUNICIPALITY_NAME: &str = "Municipio";
/// Crime type column.
pub const CRIME_TYPE: &str = "Tipo de delito";
/// Crime subtype column.
pub const CRIME_SUBTYPE: &str = "Subtipo de delito";
/// Modality column (e.g. "Con violencia").
pub const MODALITY: &str = "Modalidad";
/// Victim sex column (victims extract only).
pub const SEX: &str = "Sexo";
/// Victim age range column (victims extract only).
pub const AGE_RANGE: &str = "Rango de edad";

/// Which published extract a file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentLayout {
    /// State-level incidence (`Clave_Ent`).
    State,
    /// Municipal incidence (`Cve. Municipio`).
    Municipal,
    /// State-level victims (`Clave_Ent`, `Sexo`, `Rango de edad`).
    Victims,
}

impl IncidentLayout {
    fn region_column(self) -> &'static str {
        match self {
            Self::State | Self::Victims => STATE_CODE,
            Self::Municipal => MUNICIPALITY_CODE,
        }
    }
}

/// Column used as the secondary (pivot) dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryColumn {
    /// `Modalidad`.
    Modality,
    /// `Sexo`.
    Sex,
    /// `Rango de edad`.
    AgeRange,
}

impl SecondaryColumn {
    /// Header name of the column.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Modality => MODALITY,
            Self::Sex => SEX,
            Self::AgeRange => AGE_RANGE,
        }
    }
}

/// Time granularity of the emitted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    /// One record per month column.
    #[default]
    Monthly,
    /// One record per row, summing the twelve months.
    Annual,
}

/// Options for [`parse_incidents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentLoadOptions {
    /// Classification column used as the category.
    pub level: CategoryLevel,
    /// Optional secondary dimension to keep on each record.
    pub secondary: Option<SecondaryColumn>,
    /// Monthly or annual records.
    pub granularity: Granularity,
    /// Source encoding; the published extracts are Latin-1.
    pub encoding: Encoding,
}

impl Default for IncidentLoadOptions {
    fn default() -> Self {
        Self {
            level: CategoryLevel::Subtype,
            secondary: None,
            granularity: Granularity::Monthly,
            encoding: Encoding::Latin1,
        }
    }
}

fn category_column(level: CategoryLevel) -> &'static str {
    match level {
        CategoryLevel::Type => CRIME_TYPE,
        CategoryLevel::Subtype => CRIME_SUBTYPE,
    }
}

/// Parses an already-decoded wide extract.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if a required column is absent,
/// [`LoadError::MalformedRow`] for a non-numeric year or count, and
/// [`LoadError::InvalidRegionCode`] for a bad region code.
pub fn parse_incidents(
    text: &str,
    layout: IncidentLayout,
    options: &IncidentLoadOptions,
) -> Result<Vec<IncidentRecord>, LoadError> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();

    let region_column = layout.region_column();
    let category_column = category_column(options.level);
    let secondary_column = options.secondary.map(SecondaryColumn::column);

    let mut required = vec![YEAR, region_column, category_column];
    required.extend(secondary_column);
    required.extend(Month::all().iter().map(Month::as_ref));
    let schema = Schema::resolve(&headers, &required)?;

    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let year = schema.year(&row, YEAR)?;
        let region = match layout {
            IncidentLayout::State | IncidentLayout::Victims => schema.state(&row, region_column)?,
            IncidentLayout::Municipal => schema.municipality(&row, region_column)?,
        };
        let category = schema.field(&row, category_column)?.to_string();
        let secondary = secondary_column
            .map(|column| schema.field(&row, column).map(str::to_string))
            .transpose()?;

        match options.granularity {
            Granularity::Monthly => {
                for month in Month::all() {
                    records.push(IncidentRecord {
                        period: Period::YearMonth {
                            year,
                            month: *month,
                        },
                        region,
                        category: category.clone(),
                        secondary: secondary.clone(),
                        count: schema.count(&row, month.as_ref())?,
                    });
                }
            }
            Granularity::Annual => {
                let mut count = 0u64;
                for month in Month::all() {
                    count += schema.count(&row, month.as_ref())?;
                }
                records.push(IncidentRecord {
                    period: Period::Year(year),
                    region,
                    category,
                    secondary,
                    count,
                });
            }
        }
    }

    log::debug!("Parsed {} incident records ({layout:?})", records.len());

    Ok(records)
}

/// Loads a state-level incidence extract.
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_state_incidents(
    reader: impl Read,
    options: &IncidentLoadOptions,
) -> Result<Vec<IncidentRecord>, LoadError> {
    let text = read_text(reader, options.encoding)?;
    parse_incidents(&text, IncidentLayout::State, options)
}

/// Loads a municipal incidence extract.
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_municipal_incidents(
    reader: impl Read,
    options: &IncidentLoadOptions,
) -> Result<Vec<IncidentRecord>, LoadError> {
    let text = read_text(reader, options.encoding)?;
    parse_incidents(&text, IncidentLayout::Municipal, options)
}

/// Loads a state-level victims extract. The secondary dimension defaults
/// to `Sexo` when the options leave it unset.
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_victim_incidents(
    reader: impl Read,
    options: &IncidentLoadOptions,
) -> Result<Vec<IncidentRecord>, LoadError> {
    let options = IncidentLoadOptions {
        secondary: options.secondary.or(Some(SecondaryColumn::Sex)),
        ..*options
    };
    let text = read_text(reader, options.encoding)?;
    parse_incidents(&text, IncidentLayout::Victims, &options)
}

/// Reads and parses a wide extract from disk.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed.
pub fn load_incidents(
    path: &Path,
    layout: IncidentLayout,
    options: &IncidentLoadOptions,
) -> Result<Vec<IncidentRecord>, LoadError> {
    let text = read_file(path, options.encoding)?;
    let records = parse_incidents(&text, layout, options)?;
    log::info!("Loaded {} incident records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: &str =
        "Enero,Febrero,Marzo,Abril,Mayo,Junio,Julio,Agosto,Septiembre,Octubre,Noviembre,Diciembre";

    fn state_extract(rows: &[&str]) -> String {
        let mut text = format!(
            "Año,Clave_Ent,Entidad,Bien jurídico afectado,Tipo de delito,Subtipo de delito,Modalidad,{MONTHS}\n"
        );
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn expands_months_and_pads_state_codes() {
        let text = state_extract(&[
            "2023,9,Ciudad de México,El patrimonio,Robo,Robo a negocio,Con violencia,1,2,3,4,5,6,7,8,9,10,11,\"1,200\"",
        ]);
        let records =
            parse_incidents(&text, IncidentLayout::State, &IncidentLoadOptions::default()).unwrap();

        assert_eq!(records.len(), 12);
        assert_eq!(records[0].region.code(), "09");
        assert_eq!(records[0].category, "Robo a negocio");
        assert_eq!(
            records[0].period,
            Period::YearMonth {
                year: 2023,
                month: Month::January
            }
        );
        assert_eq!(records[11].count, 1200);
        assert!(records.iter().all(|r| r.secondary.is_none()));
    }

    #[test]
    fn annual_granularity_sums_months() {
        let text = state_extract(&[
            "2023,9,Ciudad de México,El patrimonio,Robo,Robo a negocio,Con violencia,1,1,1,1,1,1,1,1,1,1,,",
        ]);
        let options = IncidentLoadOptions {
            level: CategoryLevel::Type,
            secondary: Some(SecondaryColumn::Modality),
            granularity: Granularity::Annual,
            ..IncidentLoadOptions::default()
        };
        let records = parse_incidents(&text, IncidentLayout::State, &options).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period, Period::Year(2023));
        assert_eq!(records[0].category, "Robo");
        assert_eq!(records[0].secondary.as_deref(), Some("Con violencia"));
        assert_eq!(records[0].count, 10);
    }

    #[test]
    fn municipal_codes_keep_five_digits() {
        let text = format!(
            "Año,Clave_Ent,Entidad,Cve. Municipio,Municipio,Bien jurídico afectado,Tipo de delito,Subtipo de delito,Modalidad,{MONTHS}\n\
             2023,1,Aguascalientes,1001,Aguascalientes,El patrimonio,Extorsión,Extorsión,Extorsión,0,0,0,0,0,0,0,0,0,0,0,3\n"
        );
        let options = IncidentLoadOptions {
            granularity: Granularity::Annual,
            ..IncidentLoadOptions::default()
        };
        let records = parse_incidents(&text, IncidentLayout::Municipal, &options).unwrap();
        assert_eq!(records[0].region.code(), "01001");
        assert_eq!(records[0].count, 3);
    }

    #[test]
    fn victims_keep_sex_dimension() {
        let text = format!(
            "Año,Clave_Ent,Entidad,Bien jurídico afectado,Tipo de delito,Subtipo de delito,Modalidad,Sexo,Rango de edad,{MONTHS}\n\
             2023,2,Baja California,La vida y la Integridad corporal,Homicidio,Homicidio doloso,Con arma de fuego,Mujer,Adultos (18 y más),1,0,0,0,0,0,0,0,0,0,0,0\n"
        );
        let options = IncidentLoadOptions {
            secondary: Some(SecondaryColumn::Sex),
            granularity: Granularity::Annual,
            ..IncidentLoadOptions::default()
        };
        let records = parse_incidents(&text, IncidentLayout::Victims, &options).unwrap();
        assert_eq!(records[0].secondary.as_deref(), Some("Mujer"));
    }

    #[test]
    fn victim_loader_defaults_to_sex_and_reads_latin1() {
        let header = format!(
            "A\u{f1}o,Clave_Ent,Entidad,Tipo de delito,Subtipo de delito,Modalidad,Sexo,Rango de edad,{MONTHS}\n\
             2023,15,M\u{e9}xico,Homicidio,Feminicidio,Con arma blanca,Mujer,No identificado,0,0,1,0,0,0,0,0,0,0,0,0\n"
        );
        // Re-encode as ISO-8859-1: every char in this fixture is below U+0100.
        let bytes: Vec<u8> = header.chars().map(|c| u8::try_from(u32::from(c)).unwrap()).collect();
        let options = IncidentLoadOptions {
            granularity: Granularity::Annual,
            ..IncidentLoadOptions::default()
        };
        let records = load_victim_incidents(bytes.as_slice(), &options).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region.code(), "15");
        assert_eq!(records[0].secondary.as_deref(), Some("Mujer"));
        assert_eq!(records[0].count, 1);
    }

    #[test]
    fn missing_month_column_is_schema_error() {
        let text = "Año,Clave_Ent,Subtipo de delito,Enero\n2023,9,Robo a negocio,1\n";
        let err = parse_incidents(text, IncidentLayout::State, &IncidentLoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column } if column == "Febrero"));
    }

    #[test]
    fn non_numeric_count_is_malformed_row() {
        let text = state_extract(&[
            "2023,9,Ciudad de México,El patrimonio,Robo,Robo a negocio,Con violencia,1,2,x,4,5,6,7,8,9,10,11,12",
        ]);
        let err = parse_incidents(&text, IncidentLayout::State, &IncidentLoadOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedRow { line: 2, column, value } if column == "Marzo" && value == "x"
        ));
    }

    #[test]
    fn invalid_state_code_is_reported() {
        let text = state_extract(&[
            "2023,40,Ciudad de México,El patrimonio,Robo,Robo a negocio,Con violencia,1,2,3,4,5,6,7,8,9,10,11,12",
        ]);
        let err = parse_incidents(&text, IncidentLayout::State, &IncidentLoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidRegionCode { .. }));
    }
}
