use std::path::PathBuf;

use crate::pipeline::{CheckReport, RunOutcome};
use crate::report_helpers::{self, fmt_opt, format_thousands};

/// Print a run overview: population, tiers, selection heads and scenarios.
pub fn print_run_summary(outcome: &RunOutcome, written: &[PathBuf]) {
    let separator = report_helpers::separator(66);

    println!("Census Area Run");
    println!("{separator}");
    println!(" Areas loaded:    {}", outcome.loaded);
    println!(" Filtered out:    {}", outcome.filter.removed);
    println!(" Analysed:        {}", outcome.filter.kept);
    if outcome.orphans > 0 {
        println!(" Orphan rows:     {}", outcome.orphans);
    }
    println!("{separator}");

    if !outcome.composites.is_empty() {
        println!(
            " {:<28} {:>8} {:>10} {:>8}",
            "Composite", "Defined", "Undefined", "Mean"
        );
        println!("{separator}");
        for c in &outcome.composites {
            println!(
                " {:<28} {:>8} {:>10} {:>8}",
                format!("{}@v{}", c.name, c.version),
                c.defined,
                c.undefined,
                fmt_opt(c.mean, 1)
            );
        }
        println!("{separator}");
    }

    for s in &outcome.schemes {
        let counts: Vec<String> = s.counts.iter().map(|(t, n)| format!("{t} {n}")).collect();
        println!(" {}: {}", s.scheme.name, counts.join(", "));
    }
    if !outcome.schemes.is_empty() {
        println!("{separator}");
    }

    for ranked in &outcome.selections {
        let head: Vec<&str> = ranked
            .rows
            .iter()
            .take(5)
            .map(|&i| outcome.population.areas[i].area_id.as_str())
            .collect();
        println!(
            " {} ({} of {} by {}): {}",
            ranked.name,
            ranked.rows.len(),
            ranked.matched,
            ranked.sort_by,
            if head.is_empty() {
                "-".to_string()
            } else {
                head.join(", ")
            }
        );
    }
    if !outcome.selections.is_empty() {
        println!("{separator}");
    }

    if !outcome.scenarios.is_empty() {
        println!(
            " {:<18} {:>10} {:>8} {:>18} {:>8}",
            "Scenario", "Units", "Areas", "Spend $", "Gap %"
        );
        println!("{separator}");
        for run in &outcome.scenarios {
            let s = &run.allocation.summary;
            println!(
                " {:<18} {:>10} {:>8} {:>18} {:>8}",
                s.strategy,
                format_thousands(s.total_units),
                s.areas_funded,
                format_thousands(s.total_spend),
                fmt_opt(s.gap_closed_pct, 1)
            );
        }
        println!("{separator}");
    }

    println!(" Wrote {} files:", written.len());
    for path in written {
        println!("   {}", path.display());
    }
}

/// Print what `cens check` found.
pub fn print_check(report: &CheckReport) {
    let separator = report_helpers::separator(66);

    println!("Config Check");
    println!("{separator}");
    for t in &report.tables {
        println!(" Table:           {}", t.display());
    }
    println!(" Areas:           {}", report.areas);
    if report.orphans > 0 {
        println!(" Orphan rows:     {}", report.orphans);
    }
    println!("{separator}");
    println!(" Required columns ({}):", report.required_columns.len());
    for c in &report.required_columns {
        println!("   {c}");
    }
    println!(" Computed fields ({}):", report.computed_fields.len());
    for (field, producer) in &report.computed_fields {
        println!("   {field:<30} {producer}");
    }
    if !report.selections.is_empty() {
        println!(" Selections:      {}", report.selections.join(", "));
    }
    if !report.scenarios.is_empty() {
        println!(" Scenarios:       {}", report.scenarios.join(", "));
    }
    println!("{separator}");
}
