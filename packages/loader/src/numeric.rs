//! Numeric field parsing.
//!
//! Published extracts format large numbers with thousands separators
//! (`"1,234"`) and sometimes round-trip integers through float columns
//! (`"12.0"`). Both are accepted; anything else is a malformed field.

/// Why a raw field could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    /// Not a number after stripping separators.
    NotNumeric,
    /// A number, but negative or fractional where a count is expected.
    NotACount,
}

fn strip_separators(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ',').collect()
}

/// Parses an incident count.
///
/// Blank cells are zero: SESNSP leaves months without reports (and months
/// not yet published) empty.
///
/// # Errors
///
/// Returns [`NumericError`] for non-numeric, negative or fractional values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(raw: &str) -> Result<u64, NumericError> {
    let cleaned = strip_separators(raw);
    if cleaned.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = cleaned.parse::<u64>() {
        return Ok(value);
    }

    let value: f64 = cleaned.parse().map_err(|_| NumericError::NotNumeric)?;
    if !value.is_finite() {
        return Err(NumericError::NotNumeric);
    }
    if value < 0.0 || value.fract() != 0.0 || value > 9_007_199_254_740_992.0 {
        return Err(NumericError::NotACount);
    }
    Ok(value as u64)
}

/// Parses a population value. Unlike counts, a blank cell is an error.
///
/// # Errors
///
/// Returns [`NumericError`] for blank, non-numeric, non-finite or negative
/// values.
pub fn parse_population(raw: &str) -> Result<f64, NumericError> {
    let cleaned = strip_separators(raw);
    let value: f64 = cleaned.parse().map_err(|_| NumericError::NotNumeric)?;
    if !value.is_finite() {
        return Err(NumericError::NotNumeric);
    }
    if value < 0.0 {
        return Err(NumericError::NotACount);
    }
    Ok(value)
}

/// Parses a four-digit year column.
///
/// # Errors
///
/// Returns [`NumericError::NotNumeric`] if the value is not an integer.
pub fn parse_year(raw: &str) -> Result<i32, NumericError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    digits.parse().map_err(|_| NumericError::NotNumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_strip_thousands_separators() {
        assert_eq!(parse_count("1,234"), Ok(1234));
        assert_eq!(parse_count(" 12,345,678 "), Ok(12_345_678));
        assert_eq!(parse_count("42"), Ok(42));
    }

    #[test]
    fn blank_count_is_zero() {
        assert_eq!(parse_count(""), Ok(0));
        assert_eq!(parse_count("   "), Ok(0));
    }

    #[test]
    fn float_formatted_counts() {
        assert_eq!(parse_count("12.0"), Ok(12));
        assert_eq!(parse_count("12.5"), Err(NumericError::NotACount));
        assert_eq!(parse_count("-3"), Err(NumericError::NotACount));
    }

    #[test]
    fn garbage_counts_rejected() {
        assert_eq!(parse_count("n/d"), Err(NumericError::NotNumeric));
        assert_eq!(parse_count("NaN"), Err(NumericError::NotNumeric));
    }

    #[test]
    fn population_values() {
        assert_eq!(parse_population("1,000,000"), Ok(1_000_000.0));
        assert_eq!(parse_population("0"), Ok(0.0));
        assert_eq!(parse_population(""), Err(NumericError::NotNumeric));
        assert_eq!(parse_population("-1"), Err(NumericError::NotACount));
        assert_eq!(parse_population("inf"), Err(NumericError::NotNumeric));
    }

    #[test]
    fn years() {
        assert_eq!(parse_year("2023"), Ok(2023));
        assert_eq!(parse_year("2023.0"), Ok(2023));
        assert!(parse_year("dos mil").is_err());
    }
}
