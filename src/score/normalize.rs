//! Population-relative normalization of raw metrics to 0–100 scores.
//!
//! Unlike a fixed curve, these scores depend on the whole population: the
//! first pass freezes the population statistics for a metric (sorted
//! defined values, min and max), the second pass maps every area through
//! them. Two methods are supported:
//!
//! - **Percentile rank**: `100 × rank / (n − 1)` with 0-based ascending
//!   ranks over the defined values; ties share their average rank.
//! - **Min–max**: `100 × (v − min) / (max − min)`.
//!
//! Degenerate populations (one defined value, or all values equal) score 50
//! under both methods. Missing input always produces missing output.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MetricSpec;
use crate::population::Population;
use crate::stats::sorted_defined;

/// Score assigned when the population gives no spread to scale against.
pub const FLAT_SCORE: f64 = 50.0;

/// Normalization method, selected per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Percentile,
    MinMax,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentile => "percentile",
            Self::MinMax => "min_max",
        }
    }
}

/// Percentile rank of `value` within an ascending slice that contains it.
pub fn percentile_rank(value: f64, sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n <= 1 {
        return FLAT_SCORE;
    }
    let below = sorted.partition_point(|v| *v < value);
    let up_to = sorted.partition_point(|v| *v <= value);
    let ties = up_to - below;
    let rank = below as f64 + ties.saturating_sub(1) as f64 / 2.0;
    100.0 * rank / (n - 1) as f64
}

/// Min–max scaling with the flat-population fallback.
pub fn min_max(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return FLAT_SCORE;
    }
    100.0 * (value - min) / (max - min)
}

/// Population statistics for one metric, frozen before any area is scored.
#[derive(Debug, Clone)]
pub struct FrozenStats {
    method: Method,
    sorted: Vec<f64>,
}

impl FrozenStats {
    pub fn from_values(method: Method, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            method,
            sorted: sorted_defined(values),
        }
    }

    pub fn defined(&self) -> usize {
        self.sorted.len()
    }

    pub fn min(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }

    /// Map one raw value. Undefined and non-finite inputs stay undefined.
    pub fn score(&self, value: Option<f64>) -> Option<f64> {
        let v = value.filter(|v| v.is_finite())?;
        match self.method {
            Method::Percentile => Some(percentile_rank(v, &self.sorted)),
            Method::MinMax => Some(min_max(v, self.min()?, self.max()?)),
        }
    }
}

/// What one configured metric normalization produced, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedMetric {
    pub score: String,
    pub source: String,
    pub method: Method,
    pub invert: bool,
    pub defined: usize,
    pub undefined: usize,
    pub source_min: Option<f64>,
    pub source_max: Option<f64>,
}

/// Normalize every configured metric across the population, in order.
pub fn normalize_population(
    population: &mut Population,
    metrics: &[MetricSpec],
) -> Vec<NormalizedMetric> {
    let mut out = Vec::with_capacity(metrics.len());
    for spec in metrics {
        let stats = FrozenStats::from_values(spec.method, population.values(&spec.source));
        if stats.defined() > 0 && stats.min() == stats.max() {
            debug!(metric = %spec.source, "flat population, scoring {FLAT_SCORE}");
        }

        let mut undefined = 0;
        for area in &mut population.areas {
            let score = stats
                .score(area.value(&spec.source))
                .map(|s| if spec.invert { 100.0 - s } else { s });
            if score.is_none() {
                undefined += 1;
                area.flag(format!("{}: missing {}", spec.score, spec.source));
            }
            area.derived.insert(spec.score.clone(), score);
        }

        info!(
            score = %spec.score,
            method = spec.method.as_str(),
            defined = stats.defined(),
            undefined,
            "normalized metric"
        );
        out.push(NormalizedMetric {
            score: spec.score.clone(),
            source: spec.source.clone(),
            method: spec.method,
            invert: spec.invert,
            defined: stats.defined(),
            undefined,
            source_min: stats.min(),
            source_max: stats.max(),
        });
    }
    out
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
