//! Named, versioned weight sets for composite scores.
//!
//! A weight set maps derived score names to weights in [0, 1] that sum to
//! 1.0. Sets are immutable once loaded: changing a weight changes what the
//! composite means, so it should ship as a new `version`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed drift of a weight sum away from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightSet {
    /// Composite this set produces (e.g. `opportunity_score`).
    pub name: String,
    pub version: u32,
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum WeightSetError {
    #[error("weight set '{name}' has no weights")]
    Empty { name: String },
    #[error("weight set '{name}': weight {weight} for '{score}' is outside [0, 1]")]
    OutOfRange {
        name: String,
        score: String,
        weight: f64,
    },
    #[error("weight set '{name}' v{version}: weights sum to {sum}, expected 1.0")]
    BadSum { name: String, version: u32, sum: f64 },
}

impl WeightSet {
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Check every weight is in [0, 1] and that they sum to 1.0.
    pub fn validate(&self) -> Result<(), WeightSetError> {
        if self.weights.is_empty() {
            return Err(WeightSetError::Empty {
                name: self.name.clone(),
            });
        }
        if let Some((score, weight)) = self
            .weights
            .iter()
            .find(|(_, w)| !(0.0..=1.0).contains(*w))
        {
            return Err(WeightSetError::OutOfRange {
                name: self.name.clone(),
                score: score.clone(),
                weight: *weight,
            });
        }
        let sum = self.total();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightSetError::BadSum {
                name: self.name.clone(),
                version: self.version,
                sum,
            });
        }
        Ok(())
    }

    /// `name@vN`, used in reports and flags.
    pub fn label(&self) -> String {
        format!("{}@v{}", self.name, self.version)
    }
}
