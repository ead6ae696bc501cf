//! Field predicates with absolute or percentile thresholds.
//!
//! Percentile thresholds are resolved once against a population snapshot
//! and then frozen into a plain number; classifying, filtering, or
//! selecting areas afterwards never moves the cut-off.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::population::{AreaRecord, Population};
use crate::stats::{quantile, sorted_defined};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a predicate's right-hand side comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Value(f64),
    /// Percentile (0–100) of the field over the population snapshot.
    Percentile(f64),
}

/// `field op threshold`, as written in the run configuration:
///
/// ```toml
/// { field = "opportunity_score", op = ">=", percentile = 75 }
/// { field = "total_population", op = ">=", value = 100 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PredicateDef")]
pub struct Predicate {
    pub field: String,
    pub op: Op,
    pub threshold: Threshold,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PredicateDef {
    field: String,
    op: Op,
    value: Option<f64>,
    percentile: Option<f64>,
}

impl TryFrom<PredicateDef> for Predicate {
    type Error = String;

    fn try_from(def: PredicateDef) -> Result<Self, Self::Error> {
        let threshold = match (def.value, def.percentile) {
            (Some(v), None) => Threshold::Value(v),
            (None, Some(p)) if (0.0..=100.0).contains(&p) => Threshold::Percentile(p),
            (None, Some(p)) => {
                return Err(format!(
                    "predicate on '{}': percentile {p} is outside 0-100",
                    def.field
                ));
            }
            (Some(_), Some(_)) => {
                return Err(format!(
                    "predicate on '{}': set either `value` or `percentile`, not both",
                    def.field
                ));
            }
            (None, None) => {
                return Err(format!(
                    "predicate on '{}': missing `value` or `percentile`",
                    def.field
                ));
            }
        };
        Ok(Self::new(&def.field, def.op, threshold))
    }
}

impl Predicate {
    pub fn new(field: &str, op: Op, threshold: Threshold) -> Self {
        Self {
            field: field.to_string(),
            op,
            threshold,
        }
    }

    /// Freeze the threshold against `population`. A percentile over a field
    /// with no defined values resolves to `None`, which never matches.
    pub fn resolve(&self, population: &Population) -> ResolvedPredicate {
        let cutoff = match self.threshold {
            Threshold::Value(v) => Some(v),
            Threshold::Percentile(p) => {
                quantile(&sorted_defined(population.values(&self.field)), p)
            }
        };
        ResolvedPredicate {
            field: self.field.clone(),
            op: self.op,
            threshold: self.threshold,
            cutoff,
        }
    }
}

/// A predicate whose threshold is a fixed number for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPredicate {
    pub field: String,
    pub op: Op,
    pub threshold: Threshold,
    pub cutoff: Option<f64>,
}

impl ResolvedPredicate {
    /// False when either the area's field or the cut-off is undefined.
    pub fn matches(&self, area: &AreaRecord) -> bool {
        match (area.value(&self.field), self.cutoff) {
            (Some(v), Some(c)) => self.op.holds(v, c),
            _ => false,
        }
    }
}

/// Every predicate must hold; an empty conjunction is true.
pub fn all_match(predicates: &[ResolvedPredicate], area: &AreaRecord) -> bool {
    predicates.iter().all(|p| p.matches(area))
}

impl fmt::Display for ResolvedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cutoff = match self.cutoff {
            Some(c) => format!("{c:.2}"),
            None => "NA".to_string(),
        };
        match self.threshold {
            Threshold::Value(_) => write!(f, "{} {} {cutoff}", self.field, self.op),
            Threshold::Percentile(p) => {
                write!(f, "{} {} {cutoff} (p{p})", self.field, self.op)
            }
        }
    }
}

#[cfg(test)]
#[path = "predicate_test.rs"]
mod tests;
