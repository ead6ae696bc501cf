//! Per-area records and the population they form.
//!
//! A record carries four layers of fields: raw metrics from the input
//! tables (plus derived ratios), normalized scores, composites, and tier
//! labels. Undefined values are `None` all the way through; nothing in
//! this crate substitutes zero for a missing value.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::RatioSpec;

/// One geographic statistical area (SA1/SA2 code or similar).
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub area_id: String,
    pub area_name: Option<String>,
    /// Raw metric values; `None` for suppressed or unparseable-as-missing cells.
    pub raw: BTreeMap<String, Option<f64>>,
    /// Normalized component scores on the 0–100 scale.
    pub derived: BTreeMap<String, Option<f64>>,
    /// Weighted composites on the 0–100 scale.
    pub composite: BTreeMap<String, Option<f64>>,
    /// Tier label per classification scheme.
    pub tiers: BTreeMap<String, String>,
    /// Notes explaining why a value came out undefined.
    pub flags: Vec<String>,
}

impl AreaRecord {
    pub fn new(area_id: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            area_name: None,
            raw: BTreeMap::new(),
            derived: BTreeMap::new(),
            composite: BTreeMap::new(),
            tiers: BTreeMap::new(),
            flags: Vec::new(),
        }
    }

    /// Builder-style raw metric insert.
    #[cfg(test)]
    pub fn with_raw(mut self, name: &str, value: Option<f64>) -> Self {
        self.raw.insert(name.to_string(), value);
        self
    }

    /// Look a field up by name: composites shadow derived scores, which
    /// shadow raw metrics. Absent and undefined both read as `None`.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.composite
            .get(field)
            .or_else(|| self.derived.get(field))
            .or_else(|| self.raw.get(field))
            .copied()
            .flatten()
    }

    pub fn tier(&self, scheme: &str) -> Option<&str> {
        self.tiers.get(scheme).map(String::as_str)
    }

    pub fn flag(&mut self, note: impl Into<String>) {
        self.flags.push(note.into());
    }
}

/// The full set of areas in one run, in input order.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub areas: Vec<AreaRecord>,
}

impl Population {
    pub fn new(areas: Vec<AreaRecord>) -> Self {
        Self { areas }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Values of one field across the population, in input order.
    pub fn values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = Option<f64>> + 'a {
        self.areas.iter().map(move |a| a.value(field))
    }
}

/// Guarded ratio: undefined when either side is undefined, the denominator
/// is zero, or the result is not finite.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>, scale: f64) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let r = n / d * scale;
    r.is_finite().then_some(r)
}

/// Add each configured ratio as a raw metric on every area. Returns how
/// many ratio values came out undefined.
pub fn derive_ratios(population: &mut Population, ratios: &[RatioSpec]) -> usize {
    let mut undefined = 0;
    for spec in ratios {
        for area in &mut population.areas {
            let value = ratio(
                area.value(&spec.numerator),
                area.value(&spec.denominator),
                spec.scale,
            );
            if value.is_none() {
                undefined += 1;
                debug!(area = %area.area_id, ratio = %spec.name, "ratio undefined");
                area.flag(format!(
                    "{}: undefined ({} / {})",
                    spec.name, spec.numerator, spec.denominator
                ));
            }
            area.raw.insert(spec.name.clone(), value);
        }
    }
    undefined
}

#[cfg(test)]
#[path = "population_test.rs"]
mod tests;
