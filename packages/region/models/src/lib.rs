#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region keys for Mexican crime-incidence data.
//!
//! A [`RegionKey`] is either the national pseudo-region, a state (two-digit
//! INEGI code) or a municipality (five-digit code: two-digit state followed
//! by three-digit municipality). Codes are always stored numerically and
//! rendered zero-padded, so a key built from `9` and one built from `"09"`
//! join against the same boundary feature.

pub mod directory;
pub mod states;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label used for the national pseudo-region in every dataset this
/// workspace reads or writes.
pub const NATIONAL_LABEL: &str = "Nacional";

/// Highest valid state code (Zacatecas).
pub const MAX_STATE_CODE: u8 = 32;

/// Errors produced while building a region key from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionCodeError {
    /// The value is not a number.
    #[error("region code '{value}' is not numeric")]
    NotNumeric {
        /// The rejected input.
        value: String,
    },

    /// The state part is outside 1-32.
    #[error("state code {code} is outside 1-32")]
    StateOutOfRange {
        /// The rejected state code.
        code: u32,
    },

    /// The municipality part does not fit in three digits.
    #[error("municipality code {code} does not fit in three digits")]
    MunicipalityOutOfRange {
        /// The rejected municipality code.
        code: u32,
    },

    /// The string has a width that is neither a state nor a municipality.
    #[error("region code '{value}' must be 2 (state) or 5 (municipality) digits")]
    InvalidWidth {
        /// The rejected input.
        value: String,
    },
}

/// Two-digit state code (`01`-`32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateCode(u8);

impl StateCode {
    /// Creates a state code from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError::StateOutOfRange`] unless `1 <= code <= 32`.
    pub fn new(code: u32) -> Result<Self, RegionCodeError> {
        match u8::try_from(code) {
            Ok(value) if (1..=MAX_STATE_CODE).contains(&value) => Ok(Self(value)),
            _ => Err(RegionCodeError::StateOutOfRange { code }),
        }
    }

    /// Parses a state code that may have lost its zero padding (`"9"`,
    /// `"09"`, `" 9 "`).
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError`] if the value is not numeric or out of range.
    pub fn parse(raw: &str) -> Result<Self, RegionCodeError> {
        Self::new(parse_digits(raw)?)
    }

    /// Numeric value of the code.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Five-digit municipality code (`SSMMM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MunicipalityCode {
    state: StateCode,
    municipality: u16,
}

impl MunicipalityCode {
    /// Creates a municipality code from its state and municipality parts.
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError::MunicipalityOutOfRange`] if the
    /// municipality part needs more than three digits.
    pub fn new(state: StateCode, municipality: u32) -> Result<Self, RegionCodeError> {
        match u16::try_from(municipality) {
            Ok(value) if value <= 999 => Ok(Self {
                state,
                municipality: value,
            }),
            _ => Err(RegionCodeError::MunicipalityOutOfRange { code: municipality }),
        }
    }

    /// Parses a combined code that may have lost its leading zero (`"9015"`
    /// becomes `09015`).
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError`] if the value is not numeric or either
    /// part is out of range.
    pub fn parse(raw: &str) -> Result<Self, RegionCodeError> {
        let combined = parse_digits(raw)?;
        Self::new(StateCode::new(combined / 1000)?, combined % 1000)
    }

    /// Builds the code from separate state and municipality columns, as the
    /// population tables store them.
    ///
    /// # Errors
    ///
    /// Returns [`RegionCodeError`] if either part is invalid.
    pub fn from_parts(state: &str, municipality: &str) -> Result<Self, RegionCodeError> {
        Self::new(StateCode::parse(state)?, parse_digits(municipality)?)
    }

    /// The state this municipality belongs to.
    #[must_use]
    pub const fn state(self) -> StateCode {
        self.state
    }

    /// The three-digit municipality part.
    #[must_use]
    pub const fn municipality(self) -> u16 {
        self.municipality
    }
}

impl fmt::Display for MunicipalityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.state, self.municipality)
    }
}

/// Identifies the geographic unit a count or population belongs to.
///
/// The derived ordering puts [`RegionKey::National`] first, then states,
/// then municipalities, each in ascending code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionKey {
    /// The whole country. Never equal to any subnational code.
    National,
    /// A state.
    State(StateCode),
    /// A municipality.
    Municipality(MunicipalityCode),
}

impl RegionKey {
    /// Returns `true` for the national pseudo-region.
    #[must_use]
    pub const fn is_national(self) -> bool {
        matches!(self, Self::National)
    }

    /// The state containing this region, if it is subnational.
    #[must_use]
    pub const fn state(self) -> Option<StateCode> {
        match self {
            Self::National => None,
            Self::State(state) => Some(state),
            Self::Municipality(code) => Some(code.state()),
        }
    }

    /// Fixed-width code as used by geographic boundary files (`CVEGEO`),
    /// or [`NATIONAL_LABEL`] for the national pseudo-region.
    #[must_use]
    pub fn code(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::National => f.write_str(NATIONAL_LABEL),
            Self::State(code) => fmt::Display::fmt(code, f),
            Self::Municipality(code) => fmt::Display::fmt(code, f),
        }
    }
}

impl From<StateCode> for RegionKey {
    fn from(value: StateCode) -> Self {
        Self::State(value)
    }
}

impl From<MunicipalityCode> for RegionKey {
    fn from(value: MunicipalityCode) -> Self {
        Self::Municipality(value)
    }
}

impl FromStr for RegionKey {
    type Err = RegionCodeError;

    /// Parses the canonical padded form produced by [`fmt::Display`].
    ///
    /// Only exact widths are accepted here: unpadded input is ambiguous and
    /// must go through [`StateCode::parse`] or [`MunicipalityCode::parse`],
    /// where the column semantics are known.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(NATIONAL_LABEL) {
            return Ok(Self::National);
        }
        match trimmed.len() {
            2 => StateCode::parse(trimmed).map(Self::State),
            5 => MunicipalityCode::parse(trimmed).map(Self::Municipality),
            _ => Err(RegionCodeError::InvalidWidth {
                value: trimmed.to_string(),
            }),
        }
    }
}

impl Serialize for RegionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RegionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn parse_digits(raw: &str) -> Result<u32, RegionCodeError> {
    let trimmed = raw.trim();
    // Codes read through a float column come back as "9.0".
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegionCodeError::NotNumeric {
            value: raw.to_string(),
        });
    }
    digits.parse().map_err(|_| RegionCodeError::NotNumeric {
        value: raw.to_string(),
    })
}
