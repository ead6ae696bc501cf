//! Composite scoring: one generic weighted sum driven by weight sets.
//!
//! Every composite is `Σ weight_i × derived_i` over its weight set's keys.
//! Composites read only derived scores, so computing them in any order
//! gives the same result. An area missing any input gets an undefined
//! composite and a flag naming what was missing; a missing input is never
//! counted as zero, which would quietly sink sparse-data areas to the
//! bottom of every ranking.

use serde::Serialize;
use tracing::{info, warn};

use super::weights::WeightSet;
use crate::population::{AreaRecord, Population};

/// Composite for one area, or the names of the derived scores it lacked.
pub fn composite_score(area: &AreaRecord, set: &WeightSet) -> Result<f64, Vec<String>> {
    let mut missing = Vec::new();
    let mut sum = 0.0;
    for (score, weight) in &set.weights {
        match area.derived.get(score).copied().flatten() {
            Some(v) => sum += weight * v,
            None => missing.push(score.clone()),
        }
    }
    if missing.is_empty() {
        Ok(sum.clamp(0.0, 100.0))
    } else {
        Err(missing)
    }
}

/// Per-composite outcome across the population.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeSummary {
    pub name: String,
    pub version: u32,
    pub defined: usize,
    pub undefined: usize,
    pub mean: Option<f64>,
}

/// Compute every weight set's composite for every area.
pub fn score_population(population: &mut Population, sets: &[WeightSet]) -> Vec<CompositeSummary> {
    sets.iter()
        .map(|set| score_one(population, set))
        .collect()
}

fn score_one(population: &mut Population, set: &WeightSet) -> CompositeSummary {
    let mut defined = 0usize;
    let mut sum = 0.0;
    for area in &mut population.areas {
        let value = match composite_score(area, set) {
            Ok(v) => {
                defined += 1;
                sum += v;
                Some(v)
            }
            Err(missing) => {
                area.flag(format!(
                    "{}: undefined, missing {}",
                    set.label(),
                    missing.join(", ")
                ));
                None
            }
        };
        area.composite.insert(set.name.clone(), value);
    }

    let undefined = population.len() - defined;
    if undefined > 0 {
        warn!(composite = %set.label(), undefined, "areas without a composite score");
    }
    info!(composite = %set.label(), defined, "scored composite");

    CompositeSummary {
        name: set.name.clone(),
        version: set.version,
        defined,
        undefined,
        mean: (defined > 0).then(|| sum / defined as f64),
    }
}

#[cfg(test)]
#[path = "scoring_test.rs"]
mod tests;
