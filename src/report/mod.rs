//! Run outputs: per-area CSV tables, allocation ledgers, the scenario
//! table and a markdown summary, plus the terminal and JSON views.
//!
//! Every artifact is rendered in memory first; only when all of them are
//! built does anything touch the output directory, and each file is then
//! swapped into place atomically. A `manifest.json` beside the outputs
//! records what the run wrote, so the next run can drop files it no longer
//! produces (a renamed selection or scenario) and leave everything else.

/// JSON run summary.
mod json;
/// `summary.md` rendering.
mod markdown;
/// Area tables shared by `areas.csv` and the selection files.
mod tables;
/// Formatted terminal output.
mod terminal;

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocate::{ledger_csv, scenarios_csv};
use crate::config::RunConfig;
use crate::pipeline::RunOutcome;
use crate::report_helpers::{OutputError, write_atomic};

pub use json::RunSummary;
pub use markdown::summary_markdown;
pub use tables::{Columns, areas_csv, selection_csv};
pub use terminal::{print_check, print_run_summary};

/// One rendered output file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    fn new(file_name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            contents,
        }
    }
}

/// Render every output of a run, in write order.
pub fn build_artifacts(
    config: &RunConfig,
    outcome: &RunOutcome,
    generated_at: &str,
) -> Result<Vec<Artifact>, OutputError> {
    let columns = Columns::from_config(config);
    let mut out = vec![Artifact::new(
        "areas.csv",
        areas_csv(&columns, &outcome.population)?,
    )];

    for ranked in &outcome.selections {
        out.push(Artifact::new(
            format!("{}.csv", ranked.name),
            selection_csv(&columns, &outcome.population, ranked)?,
        ));
    }

    for run in &outcome.scenarios {
        out.push(Artifact::new(
            format!("allocation_{}.csv", run.allocation.summary.strategy),
            ledger_csv(&run.allocation)?,
        ));
    }
    let summaries: Vec<_> = outcome
        .scenarios
        .iter()
        .map(|r| &r.allocation.summary)
        .collect();
    out.push(Artifact::new("scenarios.csv", scenarios_csv(&summaries)?));

    let summary = summary_markdown(config, outcome, generated_at)?;
    out.push(Artifact::new("summary.md", summary.into_bytes()));
    Ok(out)
}

/// File in the output directory listing the previous run's outputs.
pub const MANIFEST: &str = "manifest.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    outputs: Vec<String>,
}

/// The manifest left by the previous run; an absent or unreadable one
/// means nothing is known to be stale.
fn load_manifest(dir: &Path) -> Manifest {
    let path = dir.join(MANIFEST);
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Manifest::default();
    };
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable output manifest");
        Manifest::default()
    })
}

/// Delete outputs of the previous run that this run did not write. Only
/// bare file names listed in the manifest are considered.
fn remove_stale(dir: &Path, previous: &Manifest, current: &BTreeSet<&str>) -> Result<(), OutputError> {
    for name in &previous.outputs {
        let plain = Path::new(name).file_name() == Some(OsStr::new(name));
        if !plain || name == MANIFEST || current.contains(name.as_str()) {
            continue;
        }
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(OutputError::Io { path, source }),
        }
    }
    Ok(())
}

/// Write each artifact into `dir`, returning the paths written, then retire
/// the previous run's leftovers and record the new manifest.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, OutputError> {
    let previous = load_manifest(dir);

    let mut written = Vec::with_capacity(artifacts.len());
    for a in artifacts {
        let path = dir.join(&a.file_name);
        write_atomic(&path, &a.contents)?;
        written.push(path);
    }

    let current: BTreeSet<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    remove_stale(dir, &previous, &current)?;

    let manifest = Manifest {
        outputs: artifacts.iter().map(|a| a.file_name.clone()).collect(),
    };
    write_atomic(&dir.join(MANIFEST), &serde_json::to_vec_pretty(&manifest)?)?;
    Ok(written)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
