//! Percentile-clipped choropleth scales.
//!
//! A few extreme regions would otherwise flatten the color range for
//! everyone else, so the top edge is a high percentile rather than the
//! maximum, and anything above it falls in the last bucket.

use serde::{Deserialize, Serialize};

use crate::format::format_number;
use crate::stats::{FiniteRates, StatsError};

/// Default upper percentile of a scale.
pub const DEFAULT_UPPER_PERCENTILE: f64 = 0.95;

/// Default number of edges (ticks) of a scale.
pub const DEFAULT_EDGES: usize = 13;

/// Errors that can occur while building a scale.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ScaleError {
    /// A scale needs at least two edges.
    #[error("a scale needs at least 2 edges, got {edges}")]
    TooFewEdges {
        /// Requested edge count.
        edges: usize,
    },

    /// The upper percentile is outside `(0, 1]`.
    #[error("upper percentile {percentile} is outside (0, 1]")]
    InvalidPercentile {
        /// Requested percentile.
        percentile: f64,
    },

    /// No values to build the scale from.
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Equally spaced edges from the minimum to an upper percentile, with
/// display labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethScale {
    /// Edge values in ascending order; the first is the minimum and the
    /// last is the upper percentile.
    pub edges: Vec<f64>,
    /// One label per edge. The last reads `"≥"` followed by the top edge.
    pub labels: Vec<String>,
}

impl ChoroplethScale {
    /// Builds a scale with `edges` ticks between the minimum of `values`
    /// and its `upper_percentile` quantile.
    ///
    /// # Errors
    ///
    /// Returns [`ScaleError::TooFewEdges`] for fewer than two edges,
    /// [`ScaleError::InvalidPercentile`] for a percentile outside `(0, 1]`
    /// and [`ScaleError::Stats`] if `values` is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        values: &FiniteRates,
        edges: usize,
        upper_percentile: f64,
    ) -> Result<Self, ScaleError> {
        if edges < 2 {
            return Err(ScaleError::TooFewEdges { edges });
        }
        if !(upper_percentile > 0.0 && upper_percentile <= 1.0) {
            return Err(ScaleError::InvalidPercentile {
                percentile: upper_percentile,
            });
        }

        let min = values.quantile(0.0)?;
        let top = values.quantile(upper_percentile)?;
        let step = (top - min) / (edges - 1) as f64;

        let mut points: Vec<f64> = (0..edges).map(|i| step.mul_add(i as f64, min)).collect();
        if let Some(last) = points.last_mut() {
            *last = top;
        }

        let mut labels: Vec<String> = points.iter().map(|edge| edge_label(*edge)).collect();
        if let Some(last) = labels.last_mut() {
            *last = format!("≥{}", format_number(top, 0));
        }

        log::trace!("Scale from {min} to {top} with {edges} edges");

        Ok(Self {
            edges: points,
            labels,
        })
    }

    /// Index of the bucket (interval between consecutive edges) holding
    /// `value`. Values below the first edge go to the first bucket and
    /// values at or above the top edge go to the last. `NaN` has no bucket.
    #[must_use]
    pub fn bucket_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let last_bucket = self.edges.len().saturating_sub(2);
        let index = self
            .edges
            .iter()
            .skip(1)
            .position(|edge| value < *edge)
            .unwrap_or(last_bucket);
        Some(index.min(last_bucket))
    }

    /// Number of buckets (one fewer than the number of edges).
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }
}

fn edge_label(edge: f64) -> String {
    if edge >= 10.0 {
        format_number(edge, 0)
    } else {
        format_number(edge, 1)
    }
}
