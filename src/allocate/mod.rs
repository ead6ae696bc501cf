//! Greedy, budget-capped allocation of units across ranked areas.
//!
//! Walks the candidate list in rank order and funds each area's whole-unit
//! need until the budget can no longer buy a single unit. Money is whole
//! dollars in `u64`, so spend can never exceed the budget through rounding,
//! and re-running a scenario yields byte-identical ledgers.

mod report;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;
use crate::load::read_candidates;
use crate::report_helpers::write_atomic;

pub use report::{ledger_csv, print_json, print_report, scenarios_csv};

/// A budget scenario as written in the run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    /// Strategy name; also names the ledger file.
    pub strategy: String,
    /// Selection providing the ranked candidates.
    pub selection: String,
    /// Field holding each area's need (e.g. dwelling gap).
    pub need: String,
    pub budget: u64,
    pub cost_per_unit: u64,
}

/// One area in rank order with its precomputed need.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub area_id: String,
    pub need: Option<f64>,
}

/// A funded area. Created once per scenario run and never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRecord {
    /// 1-based position in the candidate list.
    pub rank: usize,
    pub area_id: String,
    pub need_units: u64,
    pub units_allocated: u64,
    pub cost_per_unit: u64,
    pub spend: u64,
    pub cumulative_spend: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub strategy: String,
    pub budget: u64,
    pub cost_per_unit: u64,
    pub candidates: usize,
    pub total_demand: u64,
    pub total_units: u64,
    pub total_spend: u64,
    pub remaining: u64,
    pub areas_funded: usize,
    /// `100 × total_units / total_demand`; undefined when there is no demand.
    pub gap_closed_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub summary: AllocationSummary,
    pub ledger: Vec<AllocationRecord>,
}

/// Whole units an area asks for. Undefined, non-finite, and sub-unit needs
/// ask for nothing; the allocator never invents demand.
pub fn requested_units(need: Option<f64>) -> u64 {
    match need {
        Some(n) if n.is_finite() && n >= 1.0 => n.floor() as u64,
        _ => 0,
    }
}

/// Fund candidates in order until `remaining < cost_per_unit`.
pub fn allocate(
    candidates: &[Candidate],
    strategy: &str,
    budget: u64,
    cost_per_unit: u64,
) -> Allocation {
    let mut remaining = budget;
    let mut cumulative = 0u64;
    let mut total_demand = 0u64;
    let mut ledger = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let requested = requested_units(candidate.need);
        total_demand = total_demand.saturating_add(requested);

        let affordable = remaining.checked_div(cost_per_unit).unwrap_or(0);
        let units = requested.min(affordable);
        if units == 0 {
            continue;
        }
        let spend = units * cost_per_unit;
        remaining -= spend;
        cumulative += spend;
        ledger.push(AllocationRecord {
            rank: i + 1,
            area_id: candidate.area_id.clone(),
            need_units: requested,
            units_allocated: units,
            cost_per_unit,
            spend,
            cumulative_spend: cumulative,
        });
    }

    let total_units: u64 = ledger.iter().map(|r| r.units_allocated).sum();
    let gap_closed_pct = (total_demand > 0).then(|| 100.0 * total_units as f64 / total_demand as f64);

    info!(
        strategy,
        total_units,
        total_spend = cumulative,
        areas_funded = ledger.len(),
        "allocated scenario budget"
    );

    Allocation {
        summary: AllocationSummary {
            strategy: strategy.to_string(),
            budget,
            cost_per_unit,
            candidates: candidates.len(),
            total_demand,
            total_units,
            total_spend: cumulative,
            remaining,
            areas_funded: ledger.len(),
            gap_closed_pct,
        },
        ledger,
    }
}

/// Options for the standalone `allocate` command.
pub struct AllocateArgs<'a> {
    pub csv: &'a Path,
    pub id_column: &'a str,
    pub need: &'a str,
    pub strategy: &'a str,
    pub budget: u64,
    pub cost_per_unit: u64,
    pub out: Option<&'a Path>,
    pub json: bool,
}

/// Allocate over a ranked CSV taken in row order.
pub fn run(args: &AllocateArgs) -> Result<(), Error> {
    let candidates = read_candidates(args.csv, args.id_column, args.need)?;
    let allocation = allocate(&candidates, args.strategy, args.budget, args.cost_per_unit);

    if let Some(out) = args.out {
        write_atomic(out, &ledger_csv(&allocation)?)?;
    }

    if args.json {
        print_json(&allocation)?;
    } else {
        print_report(&allocation);
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
