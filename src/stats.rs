//! Population-level statistics over optionally-defined values.
//!
//! Every helper here skips undefined (`None`) and non-finite entries, so an
//! area with a suppressed cell or a guarded ratio never drags an average
//! toward zero or infinity.

use serde::Serialize;

/// Sorted copy of the defined, finite values.
pub fn sorted_defined(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    let mut out: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Arithmetic mean of the defined values. `None` when nothing is defined:
/// undefined entries are excluded from both numerator and denominator.
pub fn mean_defined(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values.into_iter().flatten().filter(|v| v.is_finite()) {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Quantile of an ascending slice using linear interpolation between the
/// closest ranks. `pct` is on the 0–100 scale and is clamped to it.
pub fn quantile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Per-run summary of one field across the analysed population.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub defined: usize,
    pub undefined: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Summarize a field from its per-area values.
pub fn summarize(name: &str, values: impl IntoIterator<Item = Option<f64>>) -> FieldSummary {
    let values: Vec<Option<f64>> = values.into_iter().collect();
    let sorted = sorted_defined(values.iter().copied());
    FieldSummary {
        name: name.to_string(),
        defined: sorted.len(),
        undefined: values.len() - sorted.len(),
        mean: mean_defined(sorted.iter().copied().map(Some)),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
    }
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod tests;
