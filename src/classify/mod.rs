//! Threshold classification of areas into ordered tiers.
//!
//! A scheme is an ordered list of tiers, each guarded by a conjunction of
//! predicates. All percentile cut-offs for every scheme are frozen against
//! the population before the first area is labelled. Tiers are tried top
//! down and the first full match wins, so overlapping tiers resolve by
//! list order. An area matching nothing gets the scheme's default tier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::population::{AreaRecord, Population};
use crate::predicate::{Predicate, ResolvedPredicate, all_match};

fn default_tier() -> String {
    "none".to_string()
}

/// One tier definition as written in the run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tier {
    pub name: String,
    #[serde(default)]
    pub when: Vec<Predicate>,
}

/// A named, ordered classification scheme.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scheme {
    pub name: String,
    #[serde(default = "default_tier")]
    pub default: String,
    pub tiers: Vec<Tier>,
}

impl Scheme {
    /// Resolve every percentile threshold against `population`.
    pub fn freeze(&self, population: &Population) -> FrozenScheme {
        FrozenScheme {
            name: self.name.clone(),
            default: self.default.clone(),
            tiers: self
                .tiers
                .iter()
                .map(|t| FrozenTier {
                    name: t.name.clone(),
                    when: t.when.iter().map(|p| p.resolve(population)).collect(),
                })
                .collect(),
        }
    }

    /// Tier labels in evaluation order, default last.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiers
            .iter()
            .map(|t| t.name.as_str())
            .chain(std::iter::once(self.default.as_str()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrozenTier {
    pub name: String,
    pub when: Vec<ResolvedPredicate>,
}

/// A scheme whose thresholds are plain numbers for the rest of the run.
#[derive(Debug, Clone, Serialize)]
pub struct FrozenScheme {
    pub name: String,
    pub default: String,
    pub tiers: Vec<FrozenTier>,
}

impl FrozenScheme {
    /// First tier whose every predicate holds, else the default.
    pub fn classify(&self, area: &AreaRecord) -> &str {
        self.tiers
            .iter()
            .find(|t| all_match(&t.when, area))
            .map_or(self.default.as_str(), |t| t.name.as_str())
    }
}

/// A frozen scheme plus how many areas landed in each tier.
#[derive(Debug, Clone, Serialize)]
pub struct SchemeOutcome {
    pub scheme: FrozenScheme,
    /// Tier label -> count, in scheme order with the default last.
    pub counts: Vec<(String, usize)>,
}

/// Freeze every scheme, then label every area.
pub fn classify_population(population: &mut Population, schemes: &[Scheme]) -> Vec<SchemeOutcome> {
    let frozen: Vec<FrozenScheme> = schemes.iter().map(|s| s.freeze(population)).collect();

    let mut outcomes = Vec::with_capacity(frozen.len());
    for (scheme, def) in frozen.into_iter().zip(schemes) {
        let mut tally: BTreeMap<String, usize> = BTreeMap::new();
        for area in &mut population.areas {
            let label = scheme.classify(area).to_string();
            *tally.entry(label.clone()).or_default() += 1;
            area.tiers.insert(scheme.name.clone(), label);
        }
        let counts: Vec<(String, usize)> = def
            .labels()
            .map(|l| (l.to_string(), tally.get(l).copied().unwrap_or(0)))
            .collect();
        info!(scheme = %scheme.name, ?counts, "classified areas");
        outcomes.push(SchemeOutcome { scheme, counts });
    }
    outcomes
}

/// Result of applying the population filters.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub filters: Vec<ResolvedPredicate>,
    pub kept: usize,
    pub removed: usize,
}

/// Keep only the areas for which every filter holds. Thresholds are frozen
/// against the unfiltered population.
pub fn filter_population(
    population: Population,
    filters: &[Predicate],
) -> (Population, FilterOutcome) {
    let resolved: Vec<ResolvedPredicate> = filters.iter().map(|p| p.resolve(&population)).collect();
    let before = population.len();
    let areas: Vec<AreaRecord> = population
        .areas
        .into_iter()
        .filter(|a| all_match(&resolved, a))
        .collect();
    let kept = areas.len();
    (
        Population::new(areas),
        FilterOutcome {
            filters: resolved,
            kept,
            removed: before - kept,
        },
    )
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
