//! Number formatting for labels and table cells.

/// Formats `value` with `decimals` decimal places and `,` thousands
/// separators (`1234.5` with 1 decimal is `"1,234.5"`).
#[must_use]
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = fixed.split_once('.').map_or((fixed.as_str(), None), |(i, f)| {
        (i, Some(f))
    });

    let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    // "-0.0" reads as noise in a table.
    if value < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.insert(0, '-');
    }
    grouped
}

/// Formats a rate with precision that shrinks as the magnitude grows:
/// two decimals below 10, one below 100, none otherwise.
#[must_use]
pub fn format_rate(rate: f64) -> String {
    let magnitude = rate.abs();
    let decimals = if magnitude < 10.0 {
        2
    } else if magnitude < 100.0 {
        1
    } else {
        0
    };
    format_number(rate, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
        assert_eq!(format_number(1234.56, 1), "1,234.6");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-12_345.0, 0), "-12,345");
        assert_eq!(format_number(-0.01, 1), "0.0");
    }

    #[test]
    fn rate_precision_by_magnitude() {
        assert_eq!(format_rate(4.567), "4.57");
        assert_eq!(format_rate(15.0), "15.0");
        assert_eq!(format_rate(1532.4), "1,532");
    }
}
