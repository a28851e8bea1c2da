//! Long-format time series written by the `timeseries` subcommand.
//!
//! Two layouts exist: the monthly state series
//! (`isodate,entidad,delito[,modalidad],total`) and the annual municipal
//! series (`año,cve_municipio,delito,total`). The layout is picked from the
//! header row.

use std::io::Read;

use chrono::{Datelike, NaiveDate};
use incidencia_incidence_models::{IncidentRecord, Month, Period};
use incidencia_region_models::states::resolve_name;

use crate::schema::{Schema, malformed};
use crate::{Encoding, LoadError, csv_reader, line_of, read_text};

pub const ISODATE: &str = "isodate";
pub const STATE: &str = "entidad";
pub const MUNICIPALITY: &str = "cve_municipio";
pub const YEAR: &str = "año";
pub const CATEGORY: &str = "delito";
pub const MODALITY: &str = "modalidad";
pub const TOTAL: &str = "total";

/// Date format of the `isodate` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a long-format series.
///
/// Rows of the monthly layout whose `entidad` is `"Nacional"` become
/// [`RegionKey::National`](incidencia_region_models::RegionKey::National)
/// records, so a series file round-trips including its national totals.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if the header matches neither
/// layout, [`LoadError::UnknownRegion`] for an unrecognized `entidad`, and
/// [`LoadError::MalformedRow`] for a bad date or total.
pub fn parse_timeseries(text: &str) -> Result<Vec<IncidentRecord>, LoadError> {
    let mut reader = csv_reader(text);
    let headers = reader.headers()?.clone();

    let monthly = headers.iter().any(|h| h.trim() == ISODATE);
    let schema = if monthly {
        Schema::resolve(&headers, &[ISODATE, STATE, CATEGORY, TOTAL])?
    } else {
        Schema::resolve(&headers, &[YEAR, MUNICIPALITY, CATEGORY, TOTAL])?
    };
    let has_modality = schema.has(MODALITY);

    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;

        let (period, region) = if monthly {
            let raw = schema.field(&row, ISODATE)?;
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| malformed(&row, ISODATE, raw))?;
            let month =
                Month::from_number(date.month()).ok_or_else(|| malformed(&row, ISODATE, raw))?;

            let name = schema.field(&row, STATE)?;
            let region = resolve_name(name).ok_or_else(|| LoadError::UnknownRegion {
                line: line_of(&row),
                name: name.to_string(),
            })?;

            (
                Period::YearMonth {
                    year: date.year(),
                    month,
                },
                region,
            )
        } else {
            (
                Period::Year(schema.year(&row, YEAR)?),
                schema.municipality(&row, MUNICIPALITY)?,
            )
        };

        let secondary = if has_modality {
            Some(schema.field(&row, MODALITY)?.to_string())
        } else {
            None
        };

        records.push(IncidentRecord {
            period,
            region,
            category: schema.field(&row, CATEGORY)?.to_string(),
            secondary,
            count: schema.count(&row, TOTAL)?,
        });
    }

    log::debug!(
        "Parsed {} {} series points",
        records.len(),
        if monthly { "monthly" } else { "annual" }
    );

    Ok(records)
}

/// Loads a long-format series (UTF-8).
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read or parsed.
pub fn load_timeseries(reader: impl Read) -> Result<Vec<IncidentRecord>, LoadError> {
    let text = read_text(reader, Encoding::Utf8)?;
    parse_timeseries(&text)
}

#[cfg(test)]
mod tests {
    use incidencia_region_models::RegionKey;

    use super::*;

    #[test]
    fn monthly_series_with_national_rows() {
        let text = "isodate,entidad,delito,total\n\
                    2023-01-01,Nacional,Robo a negocio,\"1,500\"\n\
                    2023-01-01,Ciudad de México,Robo a negocio,150\n";
        let records = parse_timeseries(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region, RegionKey::National);
        assert_eq!(records[0].count, 1500);
        assert_eq!(records[1].region.code(), "09");
        assert_eq!(
            records[1].period,
            Period::YearMonth {
                year: 2023,
                month: Month::January
            }
        );
    }

    #[test]
    fn modality_column_becomes_secondary() {
        let text = "isodate,entidad,delito,modalidad,total\n\
                    2023-02-01,Jalisco,Robo de vehículo automotor,Con violencia,12\n";
        let records = parse_timeseries(text).unwrap();
        assert_eq!(records[0].secondary.as_deref(), Some("Con violencia"));
    }

    #[test]
    fn annual_municipal_series() {
        let text = "año,cve_municipio,delito,total\n2022,9015,Extorsión,40\n";
        let records = parse_timeseries(text).unwrap();
        assert_eq!(records[0].period, Period::Year(2022));
        assert_eq!(records[0].region.code(), "09015");
        assert_eq!(records[0].count, 40);
    }

    #[test]
    fn bad_date_is_malformed() {
        let text = "isodate,entidad,delito,total\n2023-13-01,Jalisco,Robo,1\n";
        let err = parse_timeseries(text).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { column, .. } if column == ISODATE));
    }

    #[test]
    fn unknown_state_name_is_an_error() {
        let text = "isodate,entidad,delito,total\n2023-01-01,Gondor,Robo,1\n";
        assert!(matches!(
            parse_timeseries(text),
            Err(LoadError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn unrecognized_layout_reports_missing_column() {
        let text = "fecha,delito,total\n2023-01-01,Robo,1\n";
        assert!(matches!(
            parse_timeseries(text),
            Err(LoadError::MissingColumn { column }) if column == YEAR
        ));
    }
}
