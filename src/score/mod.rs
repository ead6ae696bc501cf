//! Metric normalization and weighted composite scoring.

pub mod normalize;
pub mod scoring;
pub mod weights;

pub use normalize::{Method, NormalizedMetric, normalize_population};
pub use scoring::{CompositeSummary, score_population};
pub use weights::{WeightSet, WeightSetError};
