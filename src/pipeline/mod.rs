//! End-to-end run: load, derive, filter, normalize, score, classify, select
//! and allocate, then hand everything to the report writer.
//!
//! Each stage sees the whole population before the next one starts. No
//! file is written until every stage has finished and every artifact has
//! been rendered in memory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::allocate::{Allocation, Candidate, allocate};
use crate::classify::{FilterOutcome, SchemeOutcome, classify_population, filter_population};
use crate::config::RunConfig;
use crate::error::Error;
use crate::load::{TableLayout, load_population};
use crate::population::{Population, derive_ratios};
use crate::rank::{Ranked, select};
use crate::report;
use crate::report_helpers;
use crate::score::{CompositeSummary, NormalizedMetric, normalize_population, score_population};
use crate::stats::{FieldSummary, summarize};

/// One scenario's allocation together with where its candidates came from.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub selection: String,
    pub need: String,
    pub allocation: Allocation,
}

/// Everything a run produced, ready for reporting.
#[derive(Debug)]
pub struct RunOutcome {
    pub tables: Vec<PathBuf>,
    /// Areas in the first table.
    pub loaded: usize,
    pub orphans: usize,
    pub ratios_undefined: usize,
    pub filter: FilterOutcome,
    /// The analysed population, after filtering.
    pub population: Population,
    /// Averages of every raw field over the analysed population.
    pub averages: Vec<FieldSummary>,
    pub metrics: Vec<NormalizedMetric>,
    pub composites: Vec<CompositeSummary>,
    pub schemes: Vec<SchemeOutcome>,
    pub selections: Vec<Ranked>,
    pub scenarios: Vec<ScenarioRun>,
}

fn load(config: &RunConfig) -> Result<crate::load::LoadOutcome, Error> {
    let required = config.required_columns();
    let layout = TableLayout {
        id_column: &config.input.id_column,
        name_column: config.input.name_column.as_deref(),
        required: &required,
    };
    Ok(load_population(&config.input.tables, &layout)?)
}

/// Run every stage over the configured inputs.
pub fn execute(config: &RunConfig) -> Result<RunOutcome, Error> {
    let loaded = load(config)?;
    let mut population = loaded.population;
    let loaded_count = population.len();

    let ratios_undefined = derive_ratios(&mut population, &config.ratios);
    if ratios_undefined > 0 {
        info!(undefined = ratios_undefined, "ratio values left undefined");
    }

    let (mut population, filter) = filter_population(population, &config.filters);
    info!(kept = filter.kept, removed = filter.removed, "applied filters");
    if population.is_empty() {
        warn!("no areas left to analyse");
    }

    let averages: Vec<FieldSummary> = config
        .raw_fields()
        .iter()
        .map(|f| summarize(f, population.values(f)))
        .collect();

    let metrics = normalize_population(&mut population, &config.metrics);
    let composites = score_population(&mut population, &config.weight_sets);
    let schemes = classify_population(&mut population, &config.schemes);

    let selections: Vec<Ranked> = config
        .selections
        .iter()
        .map(|s| select(&population, s))
        .collect();

    let mut scenarios = Vec::with_capacity(config.scenarios.len());
    for spec in &config.scenarios {
        // Config validation guarantees the selection exists.
        let Some(ranked) = selections.iter().find(|r| r.name == spec.selection) else {
            continue;
        };
        let candidates: Vec<Candidate> = ranked
            .rows
            .iter()
            .map(|&i| {
                let area = &population.areas[i];
                Candidate {
                    area_id: area.area_id.clone(),
                    need: area.value(&spec.need),
                }
            })
            .collect();
        scenarios.push(ScenarioRun {
            selection: spec.selection.clone(),
            need: spec.need.clone(),
            allocation: allocate(&candidates, &spec.strategy, spec.budget, spec.cost_per_unit),
        });
    }

    Ok(RunOutcome {
        tables: config.input.tables.clone(),
        loaded: loaded_count,
        orphans: loaded.orphans,
        ratios_undefined,
        filter,
        population,
        averages,
        metrics,
        composites,
        schemes,
        selections,
        scenarios,
    })
}

/// `cens run`: execute the config and write every artifact.
pub fn run(config_path: &Path, out: Option<&Path>, json: bool) -> Result<(), Error> {
    let config = RunConfig::load(config_path)?;
    let outcome = execute(&config)?;

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let artifacts = report::build_artifacts(&config, &outcome, &generated_at)?;

    let dir = out.map_or_else(|| config.output.dir.clone(), Path::to_path_buf);
    std::fs::create_dir_all(&dir).map_err(|source| Error::OutputDir {
        path: dir.clone(),
        source,
    })?;
    let written = report::write_artifacts(&dir, &artifacts)?;
    info!(dir = %dir.display(), files = written.len(), "wrote outputs");

    if json {
        report_helpers::print_json_stdout(&report::RunSummary::new(&outcome, &written))?;
    } else {
        report::print_run_summary(&outcome, &written);
    }
    Ok(())
}

/// What `cens check` found without running the pipeline.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub tables: Vec<PathBuf>,
    pub areas: usize,
    pub orphans: usize,
    pub required_columns: Vec<String>,
    /// `(field, producer)` for every computed field.
    pub computed_fields: Vec<(String, &'static str)>,
    pub selections: Vec<String>,
    pub scenarios: Vec<String>,
}

/// `cens check`: validate the config and load the inputs; writes nothing.
pub fn check(config_path: &Path, json: bool) -> Result<(), Error> {
    let config = RunConfig::load(config_path)?;
    let loaded = load(&config)?;

    let report = CheckReport {
        tables: config.input.tables.clone(),
        areas: loaded.population.len(),
        orphans: loaded.orphans,
        required_columns: config.required_columns().into_iter().collect(),
        computed_fields: config.computed_fields().into_iter().collect(),
        selections: config.selections.iter().map(|s| s.name.clone()).collect(),
        scenarios: config.scenarios.iter().map(|s| s.strategy.clone()).collect(),
    };

    if json {
        report_helpers::print_json_stdout(&report)?;
    } else {
        report::print_check(&report);
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
