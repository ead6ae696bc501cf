use serde::Serialize;

use super::{Allocation, AllocationSummary};
use crate::report_helpers::{self, OutputError, fmt_opt, format_thousands};

/// Ledger as CSV: one row per funded area, in rank order.
pub fn ledger_csv(allocation: &Allocation) -> Result<Vec<u8>, OutputError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if allocation.ledger.is_empty() {
        wtr.write_record([
            "rank",
            "area_id",
            "need_units",
            "units_allocated",
            "cost_per_unit",
            "spend",
            "cumulative_spend",
        ])?;
    }
    for record in &allocation.ledger {
        wtr.serialize(record)?;
    }
    report_helpers::finish_csv(wtr)
}

/// One row per scenario.
pub fn scenarios_csv(summaries: &[&AllocationSummary]) -> Result<Vec<u8>, OutputError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "budget",
        "strategy",
        "dwellings_delivered",
        "areas_funded",
        "cost_per_unit",
        "gap_closed_pct",
    ])?;
    for s in summaries {
        wtr.write_record([
            s.budget.to_string(),
            s.strategy.clone(),
            s.total_units.to_string(),
            s.areas_funded.to_string(),
            s.cost_per_unit.to_string(),
            fmt_opt(s.gap_closed_pct, 2),
        ])?;
    }
    report_helpers::finish_csv(wtr)
}

/// Print the scenario summary and its ledger as a formatted table.
pub fn print_report(allocation: &Allocation) {
    let s = &allocation.summary;
    let separator = report_helpers::separator(72);

    println!("Scenario: {}", s.strategy);
    println!("{separator}");
    println!(" Budget:          ${}", format_thousands(s.budget));
    println!(" Cost per unit:   ${}", format_thousands(s.cost_per_unit));
    println!(" Candidates:      {}", s.candidates);
    println!(" Total demand:    {} units", format_thousands(s.total_demand));
    println!(" Units delivered: {}", format_thousands(s.total_units));
    println!(" Total spend:     ${}", format_thousands(s.total_spend));
    println!(" Remaining:       ${}", format_thousands(s.remaining));
    println!(" Areas funded:    {}", s.areas_funded);
    println!(" Gap closed:      {}%", fmt_opt(s.gap_closed_pct, 1));
    println!("{separator}");

    if allocation.ledger.is_empty() {
        return;
    }

    let id_width = allocation
        .ledger
        .iter()
        .map(|r| r.area_id.len())
        .max()
        .unwrap_or(7)
        .clamp(7, 24);
    println!(
        " {:>5}  {:<id_width$}  {:>8}  {:>8}  {:>18}",
        "Rank", "Area", "Need", "Units", "Cumulative $"
    );
    println!("{separator}");
    for r in &allocation.ledger {
        println!(
            " {:>5}  {:<id_width$}  {:>8}  {:>8}  {:>18}",
            r.rank,
            r.area_id,
            r.need_units,
            r.units_allocated,
            format_thousands(r.cumulative_spend),
        );
    }
    println!("{separator}");
}

#[derive(Serialize)]
struct JsonAllocation<'a> {
    summary: &'a AllocationSummary,
    ledger: &'a [super::AllocationRecord],
}

pub fn print_json(allocation: &Allocation) -> Result<(), serde_json::Error> {
    report_helpers::print_json_stdout(&JsonAllocation {
        summary: &allocation.summary,
        ledger: &allocation.ledger,
    })
}
