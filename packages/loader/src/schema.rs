//! Header-to-index resolution.
//!
//! Column names are looked up once per file. After that, every field access
//! is by index, and a file missing a required column fails before any row
//! is read.

use std::collections::BTreeMap;

use csv::StringRecord;
use incidencia_region_models::{MunicipalityCode, RegionKey, StateCode};

use crate::numeric::{NumericError, parse_count, parse_population, parse_year};
use crate::{LoadError, line_of};

/// Resolved column positions for one file.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: BTreeMap<String, usize>,
}

impl Schema {
    /// Resolves the given required columns against a header row.
    ///
    /// Header names are trimmed and a leading byte-order mark is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumn`] for the first required column
    /// not present in `headers`.
    pub fn resolve(headers: &StringRecord, required: &[&str]) -> Result<Self, LoadError> {
        let columns: BTreeMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_header(name), i))
            .collect();

        if let Some(missing) = required.iter().find(|name| !columns.contains_key(**name)) {
            return Err(LoadError::MissingColumn {
                column: (*missing).to_string(),
            });
        }

        Ok(Self { columns })
    }

    /// Whether the header row contains `column`.
    #[must_use]
    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Position of `column`, if present.
    #[must_use]
    pub fn index(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    /// Raw value of `column` in `record`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumn`] if the column was not resolved.
    pub fn field<'r>(&self, record: &'r StringRecord, column: &str) -> Result<&'r str, LoadError> {
        let index = self.index(column).ok_or_else(|| LoadError::MissingColumn {
            column: column.to_string(),
        })?;
        Ok(record.get(index).unwrap_or_default().trim())
    }

    /// Parses `column` as an incident count.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedRow`] if the value is not a count.
    pub fn count(&self, record: &StringRecord, column: &str) -> Result<u64, LoadError> {
        let raw = self.field(record, column)?;
        parse_count(raw).map_err(|_: NumericError| malformed(record, column, raw))
    }

    /// Parses `column` as a population value.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedRow`] if the value is not a population.
    pub fn population(&self, record: &StringRecord, column: &str) -> Result<f64, LoadError> {
        let raw = self.field(record, column)?;
        parse_population(raw).map_err(|_| malformed(record, column, raw))
    }

    /// Parses `column` as a year.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedRow`] if the value is not an integer.
    pub fn year(&self, record: &StringRecord, column: &str) -> Result<i32, LoadError> {
        let raw = self.field(record, column)?;
        parse_year(raw).map_err(|_| malformed(record, column, raw))
    }

    /// Parses `column` as a (possibly unpadded) state code.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidRegionCode`] if the code is invalid.
    pub fn state(&self, record: &StringRecord, column: &str) -> Result<RegionKey, LoadError> {
        let raw = self.field(record, column)?;
        StateCode::parse(raw)
            .map(RegionKey::State)
            .map_err(|source| LoadError::InvalidRegionCode {
                line: line_of(record),
                column: column.to_string(),
                source,
            })
    }

    /// Parses `column` as a (possibly unpadded) five-digit municipality
    /// code.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidRegionCode`] if the code is invalid.
    pub fn municipality(
        &self,
        record: &StringRecord,
        column: &str,
    ) -> Result<RegionKey, LoadError> {
        let raw = self.field(record, column)?;
        MunicipalityCode::parse(raw)
            .map(RegionKey::Municipality)
            .map_err(|source| LoadError::InvalidRegionCode {
                line: line_of(record),
                column: column.to_string(),
                source,
            })
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

pub(crate) fn malformed(record: &StringRecord, column: &str, raw: &str) -> LoadError {
    LoadError::MalformedRow {
        line: line_of(record),
        column: column.to_string(),
        value: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn resolves_columns_with_bom_and_padding() {
        let schema = Schema::resolve(&headers(&["\u{feff}Año", " Clave_Ent "]), &["Año", "Clave_Ent"])
            .unwrap();
        assert_eq!(schema.index("Año"), Some(0));
        assert_eq!(schema.index("Clave_Ent"), Some(1));
        assert!(!schema.has("Entidad"));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = Schema::resolve(&headers(&["Año"]), &["Año", "Clave_Ent"]).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column } if column == "Clave_Ent"));
    }

    #[test]
    fn typed_accessors() {
        let schema = Schema::resolve(
            &headers(&["Año", "Clave_Ent", "Cve. Municipio", "Enero"]),
            &["Año"],
        )
        .unwrap();
        let record = StringRecord::from(vec!["2023", "9", "9015", "1,200"]);
        assert_eq!(schema.year(&record, "Año").unwrap(), 2023);
        assert_eq!(schema.state(&record, "Clave_Ent").unwrap().code(), "09");
        assert_eq!(
            schema.municipality(&record, "Cve. Municipio").unwrap().code(),
            "09015"
        );
        assert_eq!(schema.count(&record, "Enero").unwrap(), 1200);
    }

    #[test]
    fn malformed_count_names_column_and_value() {
        let schema = Schema::resolve(&headers(&["Enero"]), &["Enero"]).unwrap();
        let record = StringRecord::from(vec!["doce"]);
        let err = schema.count(&record, "Enero").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedRow { column, value, .. } if column == "Enero" && value == "doce"
        ));
    }
}
