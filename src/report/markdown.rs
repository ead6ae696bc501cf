use std::fmt::Write;

use crate::config::RunConfig;
use crate::pipeline::RunOutcome;
use crate::report_helpers::{UNDEFINED, fmt_opt, format_thousands};

/// Escape backslashes and pipe characters so markdown tables render
/// correctly. Backslashes must be escaped first to avoid double-escaping.
pub(super) fn escape_md(s: &str) -> String {
    s.replace('\\', "\\\\").replace('|', "\\|")
}

/// Format "top N of M" or just "N" when not truncated.
pub(super) fn top_of(shown: usize, total: usize) -> String {
    if shown < total {
        format!("top {shown} of {total}")
    } else {
        format!("{total}")
    }
}

/// Render `summary.md`.
pub fn summary_markdown(
    config: &RunConfig,
    outcome: &RunOutcome,
    generated_at: &str,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let population = &outcome.population;

    writeln!(out, "# Census Area Summary")?;
    writeln!(out)?;
    writeln!(out, "**Generated:** {generated_at}")?;
    writeln!(out)?;
    writeln!(out, "**Input tables:**")?;
    writeln!(out)?;
    for t in &outcome.tables {
        writeln!(out, "- `{}`", t.display())?;
    }

    // --- Population ---
    writeln!(out)?;
    writeln!(out, "## Population")?;
    writeln!(out)?;
    writeln!(out, "| Stage | Areas |")?;
    writeln!(out, "|-------|------:|")?;
    writeln!(out, "| Loaded | {} |", outcome.loaded)?;
    writeln!(out, "| Filtered out | {} |", outcome.filter.removed)?;
    writeln!(out, "| Analysed | {} |", outcome.filter.kept)?;
    if outcome.orphans > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "{} rows in joined tables matched no area and were ignored.",
            outcome.orphans
        )?;
    }
    if !outcome.filter.filters.is_empty() {
        writeln!(out)?;
        writeln!(out, "Filters (all must hold):")?;
        writeln!(out)?;
        for f in &outcome.filter.filters {
            writeln!(out, "- `{f}`")?;
        }
    }

    // --- Averages ---
    writeln!(out)?;
    writeln!(out, "## Population Averages")?;
    writeln!(out)?;
    if outcome.averages.is_empty() {
        writeln!(out, "No data.")?;
    } else {
        writeln!(out, "Undefined values are left out of every average.")?;
        writeln!(out)?;
        writeln!(out, "| Field | Defined | Undefined | Mean | Min | Max |")?;
        writeln!(out, "|-------|--------:|----------:|-----:|----:|----:|")?;
        for a in &outcome.averages {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                escape_md(&a.name),
                a.defined,
                a.undefined,
                fmt_opt(a.mean, 2),
                fmt_opt(a.min, 2),
                fmt_opt(a.max, 2)
            )?;
        }
    }

    // --- Normalized scores ---
    if !outcome.metrics.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Normalized Scores")?;
        writeln!(out)?;
        writeln!(out, "| Score | Source | Method | Inverted | Defined | Undefined |")?;
        writeln!(out, "|-------|--------|--------|----------|--------:|----------:|")?;
        for m in &outcome.metrics {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                escape_md(&m.score),
                escape_md(&m.source),
                m.method.as_str(),
                if m.invert { "yes" } else { "no" },
                m.defined,
                m.undefined
            )?;
        }
    }

    // --- Weight sets ---
    if !config.weight_sets.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Weight Sets")?;
        for (set, summary) in config.weight_sets.iter().zip(&outcome.composites) {
            writeln!(out)?;
            writeln!(out, "### {}", escape_md(&set.label()))?;
            writeln!(out)?;
            writeln!(out, "| Score | Weight |")?;
            writeln!(out, "|-------|-------:|")?;
            for (score, weight) in &set.weights {
                writeln!(out, "| {} | {weight:.2} |", escape_md(score))?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "Defined for {} areas, undefined for {}; mean {}.",
                summary.defined,
                summary.undefined,
                fmt_opt(summary.mean, 2)
            )?;
        }
    }

    // --- Thresholds and tiers ---
    if !outcome.schemes.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Classification")?;
        writeln!(out)?;
        writeln!(
            out,
            "Percentile thresholds are frozen against the analysed population before any area is labelled."
        )?;
        for s in &outcome.schemes {
            writeln!(out)?;
            writeln!(out, "### {}", escape_md(&s.scheme.name))?;
            writeln!(out)?;
            writeln!(out, "| Tier | Conditions | Areas |")?;
            writeln!(out, "|------|------------|------:|")?;
            for (label, count) in &s.counts {
                let conditions = match s.scheme.tiers.iter().find(|t| &t.name == label) {
                    Some(t) if t.when.is_empty() => "always".to_string(),
                    Some(t) => t
                        .when
                        .iter()
                        .map(|p| format!("`{p}`"))
                        .collect::<Vec<_>>()
                        .join(" and "),
                    None => "otherwise".to_string(),
                };
                writeln!(
                    out,
                    "| {} | {} | {count} |",
                    escape_md(label),
                    escape_md(&conditions)
                )?;
            }
        }
    }

    // --- Selections ---
    for ranked in &outcome.selections {
        let show = config.output.top.min(ranked.rows.len());
        writeln!(out)?;
        writeln!(
            out,
            "## {} ({}, by {} desc)",
            escape_md(&ranked.name),
            top_of(show, ranked.matched),
            escape_md(&ranked.sort_by)
        )?;
        writeln!(out)?;
        for p in &ranked.when {
            writeln!(out, "- `{p}`")?;
        }
        if !ranked.when.is_empty() {
            writeln!(out)?;
        }
        if ranked.unranked > 0 {
            writeln!(
                out,
                "{} areas have no {} and are not ranked.",
                ranked.unranked,
                escape_md(&ranked.sort_by)
            )?;
            writeln!(out)?;
        }
        if show == 0 {
            writeln!(out, "No areas selected.")?;
            continue;
        }
        writeln!(out, "| Rank | Area | Name | {} |", escape_md(&ranked.sort_by))?;
        writeln!(out, "|-----:|------|------|------:|")?;
        for (pos, &i) in ranked.rows[..show].iter().enumerate() {
            let area = &population.areas[i];
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                pos + 1,
                escape_md(&area.area_id),
                escape_md(area.area_name.as_deref().unwrap_or("")),
                fmt_opt(area.value(&ranked.sort_by), 2)
            )?;
        }
    }

    // --- Scenarios ---
    if !outcome.scenarios.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Budget Scenarios")?;
        writeln!(out)?;
        writeln!(
            out,
            "| Strategy | Selection | Budget | Cost/unit | Units | Areas funded | Spend | Remaining | Gap closed |"
        )?;
        writeln!(
            out,
            "|----------|-----------|-------:|----------:|------:|-------------:|------:|----------:|-----------:|"
        )?;
        for run in &outcome.scenarios {
            let s = &run.allocation.summary;
            let gap = match s.gap_closed_pct {
                Some(p) => format!("{p:.1}%"),
                None => UNDEFINED.to_string(),
            };
            writeln!(
                out,
                "| {} | {} | ${} | ${} | {} | {} | ${} | ${} | {gap} |",
                escape_md(&s.strategy),
                escape_md(&run.selection),
                format_thousands(s.budget),
                format_thousands(s.cost_per_unit),
                format_thousands(s.total_units),
                s.areas_funded,
                format_thousands(s.total_spend),
                format_thousands(s.remaining)
            )?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_md_no_special_chars() {
        assert_eq!(escape_md("Bondi Beach"), "Bondi Beach");
    }

    #[test]
    fn escape_md_pipe() {
        assert_eq!(escape_md("a|b"), "a\\|b");
    }

    #[test]
    fn escape_md_backslash_and_pipe() {
        assert_eq!(escape_md("x\\|y"), "x\\\\\\|y");
    }

    #[test]
    fn top_of_truncated() {
        assert_eq!(top_of(5, 20), "top 5 of 20");
    }

    #[test]
    fn top_of_not_truncated() {
        assert_eq!(top_of(3, 3), "3");
    }
}
