#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loaders for SESNSP incidence extracts and population tables.
//!
//! Every loader resolves its required columns once from the header row,
//! validates each field while building typed records, and returns the
//! first schema or data error instead of skipping rows. Region codes are
//! re-padded on the way in so that joins against boundary data keyed by
//! `CVEGEO` keep working.

pub mod incidents;
pub mod numeric;
pub mod population;
pub mod schema;
pub mod timeseries;

use std::fs;
use std::io::Read;
use std::path::Path;

use incidencia_region_models::{RegionCodeError, RegionKey};

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 input holds bytes that are not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The delimited text could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is not present in the header row.
    #[error("missing required column '{column}'")]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },

    /// A numeric field could not be parsed.
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    MalformedRow {
        /// 1-based line number in the source file.
        line: u64,
        /// Column holding the bad value.
        column: String,
        /// The offending raw value.
        value: String,
    },

    /// A region code column holds an invalid code.
    #[error("line {line}: column '{column}': {source}")]
    InvalidRegionCode {
        /// 1-based line number in the source file.
        line: u64,
        /// Column holding the bad code.
        column: String,
        /// Why the code was rejected.
        source: RegionCodeError,
    },

    /// A region name is not in the alias table.
    #[error("line {line}: unknown region name '{name}'")]
    UnknownRegion {
        /// 1-based line number in the source file.
        line: u64,
        /// The unrecognized name.
        name: String,
    },

    /// Two population values exist for the same region and year.
    #[error("duplicate population for region {region} in {year}")]
    DuplicatePopulation {
        /// Region with more than one value.
        region: RegionKey,
        /// Year with more than one value.
        year: i32,
    },
}

/// Character encoding of a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 (population tables and files this workspace writes).
    #[default]
    Utf8,
    /// ISO-8859-1, used by the SESNSP open-data extracts.
    Latin1,
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so decoding cannot fail.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Reads a whole source into a string using the given encoding.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if reading fails and
/// [`LoadError::Encoding`] if UTF-8 input is not valid UTF-8.
pub fn read_text(mut reader: impl Read, encoding: Encoding) -> Result<String, LoadError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    match encoding {
        Encoding::Latin1 => Ok(decode_latin1(&bytes)),
        Encoding::Utf8 => Ok(String::from_utf8(bytes)?),
    }
}

/// Reads a file from disk using the given encoding.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read and
/// [`LoadError::Encoding`] if it cannot be decoded.
pub fn read_file(path: &Path, encoding: Encoding) -> Result<String, LoadError> {
    log::debug!("Reading {} as {encoding:?}", path.display());
    read_text(fs::File::open(path)?, encoding)
}

/// Builds a CSV reader over already-decoded text.
pub(crate) fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes())
}

/// 1-based line of a record, for error messages.
pub(crate) fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}
