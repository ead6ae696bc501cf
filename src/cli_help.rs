//! Long help text constants for CLI subcommands.

/// `cens run`: the pipeline and the config file layout.
pub const RUN: &str = "\
Run the full pipeline described by a TOML config and write its outputs.

Stages, each over the whole population before the next starts:
  load       first table defines the areas; later tables join on the id
  ratios     numerator / denominator x scale; undefined on a zero denominator
  filters    drop areas failing any filter predicate
  metrics    normalize to 0-100 by percentile rank or min-max
  composites weighted sums of metric scores (weights sum to 1)
  schemes    ordered tiers; first tier whose predicates all hold wins
  selections rank by a field, descending, ties by area id
  scenarios  fund ranked areas' need until the budget runs out

Config sections:
  [input]            tables, id_column (default area_id), name_column
  [[ratios]]         name, numerator, denominator, scale
  [[filters]]        field, op (> >= < <=), value | percentile
  [[metrics]]        source, score, method (percentile | min_max), invert
  [[weight_sets]]    name, version, weights = { score = weight, ... }
  [[schemes]]        name, default, [[schemes.tiers]] name, when = [...]
  [[selections]]     name, sort_by, top, when, scheme, tiers
  [[scenarios]]      strategy, selection, need, budget, cost_per_unit
  [output]           dir (default out), top (rows per selection in summary)

Outputs: areas.csv, <selection>.csv, allocation_<strategy>.csv,
scenarios.csv and summary.md, plus manifest.json listing them; files a
previous run wrote that this run does not are removed. Undefined values are
written as NA.";

/// `cens allocate`: standalone greedy allocation.
pub const ALLOCATE: &str = "\
Allocate a budget over a ranked CSV, taking rows in file order.

Each area asks for floor(need) whole units. Areas are funded in order with
min(requested, floor(remaining / cost_per_unit)) units until the remaining
budget cannot buy a single unit. Areas with an undefined need ask for
nothing. Money is whole dollars.";
