//! Descriptive statistics over finite rates.

use serde::{Deserialize, Serialize};

/// Errors that can occur while summarizing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    /// No finite values to summarize.
    #[error("no finite values to summarize")]
    Empty,
}

/// Finite values in ascending order.
///
/// The only constructor is [`FiniteRates::filter`], which reports how many
/// values it dropped, so callers cannot silently summarize `NaN`s away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiniteRates {
    sorted: Vec<f64>,
}

impl FiniteRates {
    /// Keeps the finite values of `values` and returns them together with
    /// the number of dropped (`NaN` or infinite) values.
    pub fn filter(values: impl IntoIterator<Item = f64>) -> (Self, usize) {
        let mut dropped = 0;
        let mut sorted: Vec<f64> = values
            .into_iter()
            .filter(|value| {
                let keep = value.is_finite();
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .collect();
        sorted.sort_by(f64::total_cmp);
        (Self { sorted }, dropped)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Whether there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Values in ascending order.
    #[must_use]
    pub fn as_sorted(&self) -> &[f64] {
        &self.sorted
    }

    /// Quantile `q` (0.0-1.0) with linear interpolation between the two
    /// closest ranks. `q` is clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Empty`] if there are no values.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn quantile(&self, q: f64) -> Result<f64, StatsError> {
        let last = self.sorted.len().checked_sub(1).ok_or(StatsError::Empty)?;
        let position = q.clamp(0.0, 1.0) * last as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let low = self.sorted[lower];
        let high = self.sorted[upper];
        Ok((high - low).mul_add(position - lower as f64, low))
    }
}

/// Summary of a distribution of rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); zero for a single value.
    pub stddev: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

/// Summarizes `values`.
///
/// # Errors
///
/// Returns [`StatsError::Empty`] if there are no values.
#[allow(clippy::cast_precision_loss)]
pub fn descriptive_stats(values: &FiniteRates) -> Result<DescriptiveStats, StatsError> {
    let sorted = values.as_sorted();
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Err(StatsError::Empty);
    };

    let count = sorted.len();
    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let stddev = if count > 1 {
        let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (squares / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Ok(DescriptiveStats {
        count,
        mean,
        median: values.quantile(0.5)?,
        stddev,
        p25: values.quantile(0.25)?,
        p75: values.quantile(0.75)?,
        p95: values.quantile(0.95)?,
        min,
        max,
    })
}
