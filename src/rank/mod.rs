//! Ranking and selection of areas by a composite or any other field.
//!
//! Ordering is descending by the sort field, with ties broken by
//! `area_id` ascending so identical inputs always give identical output.
//! Areas whose sort field is undefined cannot be placed and are counted as
//! unranked instead.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::population::Population;
use crate::predicate::{Predicate, ResolvedPredicate, all_match};

/// A named output subset as written in the run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selection {
    pub name: String,
    pub sort_by: String,
    /// Keep at most this many areas after filtering.
    pub top: Option<usize>,
    #[serde(default)]
    pub when: Vec<Predicate>,
    /// Restrict to areas whose tier in `scheme` is one of `tiers`.
    pub scheme: Option<String>,
    #[serde(default)]
    pub tiers: Vec<String>,
}

/// The ranked output of one selection.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked {
    pub name: String,
    pub sort_by: String,
    pub when: Vec<ResolvedPredicate>,
    /// Indices into the population, best first.
    pub rows: Vec<usize>,
    /// Areas that passed every filter, before the `top` cut.
    pub matched: usize,
    /// Areas dropped because their sort field is undefined.
    pub unranked: usize,
}

/// Descending by score, then ascending by id.
pub fn compare_desc(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Indices of every area with a defined `sort_by`, best first, plus the
/// count of areas that had none.
pub fn rank(population: &Population, sort_by: &str) -> (Vec<usize>, usize) {
    let mut keyed: Vec<(usize, f64)> = Vec::with_capacity(population.len());
    let mut unranked = 0;
    for (i, area) in population.areas.iter().enumerate() {
        match area.value(sort_by) {
            Some(v) => keyed.push((i, v)),
            None => unranked += 1,
        }
    }
    keyed.sort_by(|(ia, va), (ib, vb)| {
        compare_desc(
            (*va, &population.areas[*ia].area_id),
            (*vb, &population.areas[*ib].area_id),
        )
    });
    (keyed.into_iter().map(|(i, _)| i).collect(), unranked)
}

/// Rank, filter and truncate. Asking for more than matched returns what
/// matched, with no padding.
pub fn select(population: &Population, selection: &Selection) -> Ranked {
    let when: Vec<ResolvedPredicate> = selection
        .when
        .iter()
        .map(|p| p.resolve(population))
        .collect();
    let (order, unranked) = rank(population, &selection.sort_by);

    let mut rows: Vec<usize> = order
        .into_iter()
        .filter(|&i| {
            let area = &population.areas[i];
            let tier_ok = match &selection.scheme {
                Some(scheme) if !selection.tiers.is_empty() => area
                    .tier(scheme)
                    .is_some_and(|t| selection.tiers.iter().any(|want| want == t)),
                _ => true,
            };
            tier_ok && all_match(&when, area)
        })
        .collect();
    let matched = rows.len();
    if let Some(top) = selection.top {
        rows.truncate(top);
    }

    if unranked > 0 {
        warn!(
            selection = %selection.name,
            sort_by = %selection.sort_by,
            unranked,
            "areas without a sort value left out of ranking"
        );
    }
    info!(selection = %selection.name, matched, kept = rows.len(), "selected areas");

    Ranked {
        name: selection.name.clone(),
        sort_by: selection.sort_by.clone(),
        when,
        rows,
        matched,
        unranked,
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
