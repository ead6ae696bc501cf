use std::path::PathBuf;

use serde::Serialize;

use crate::classify::{FilterOutcome, SchemeOutcome};
use crate::pipeline::{RunOutcome, ScenarioRun};
use crate::rank::Ranked;
use crate::score::{CompositeSummary, NormalizedMetric};
use crate::stats::FieldSummary;

/// Machine-readable run summary printed by `cens run --json`.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub loaded: usize,
    pub orphans: usize,
    pub ratios_undefined: usize,
    pub filter: &'a FilterOutcome,
    pub averages: &'a [FieldSummary],
    pub metrics: &'a [NormalizedMetric],
    pub composites: &'a [CompositeSummary],
    pub schemes: &'a [SchemeOutcome],
    pub selections: Vec<SelectionSummary<'a>>,
    pub scenarios: &'a [ScenarioRun],
    pub outputs: &'a [PathBuf],
}

#[derive(Debug, Serialize)]
pub struct SelectionSummary<'a> {
    pub name: &'a str,
    pub sort_by: &'a str,
    pub matched: usize,
    pub unranked: usize,
    /// Area ids in rank order.
    pub areas: Vec<&'a str>,
}

impl<'a> SelectionSummary<'a> {
    fn new(ranked: &'a Ranked, outcome: &'a RunOutcome) -> Self {
        Self {
            name: &ranked.name,
            sort_by: &ranked.sort_by,
            matched: ranked.matched,
            unranked: ranked.unranked,
            areas: ranked
                .rows
                .iter()
                .map(|&i| outcome.population.areas[i].area_id.as_str())
                .collect(),
        }
    }
}

impl<'a> RunSummary<'a> {
    pub fn new(outcome: &'a RunOutcome, outputs: &'a [PathBuf]) -> Self {
        Self {
            loaded: outcome.loaded,
            orphans: outcome.orphans,
            ratios_undefined: outcome.ratios_undefined,
            filter: &outcome.filter,
            averages: &outcome.averages,
            metrics: &outcome.metrics,
            composites: &outcome.composites,
            schemes: &outcome.schemes,
            selections: outcome
                .selections
                .iter()
                .map(|r| SelectionSummary::new(r, outcome))
                .collect(),
            scenarios: &outcome.scenarios,
            outputs,
        }
    }
}
