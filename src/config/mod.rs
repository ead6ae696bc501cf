//! Run configuration: one TOML file describing inputs, derived fields,
//! scoring, classification, selections and budget scenarios.
//!
//! Relative paths resolve against the directory holding the config file.
//! Everything is validated up front so a bad config fails before any table
//! is read.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocate::ScenarioSpec;
use crate::classify::Scheme;
use crate::predicate::Predicate;
use crate::rank::Selection;
use crate::score::{Method, WeightSet, WeightSetError};

/// Output file stems the report writer reserves for itself.
const RESERVED_STEMS: [&str; 3] = ["areas", "scenarios", "summary"];

/// Column headers the area tables write around the configured fields.
const TABLE_COLUMNS: [&str; 4] = ["rank", "area_id", "area_name", "flags"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("[input] lists no tables")]
    NoTables,
    #[error("duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("'{name}' names both a {first} and a {second}")]
    Collision {
        name: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("{stage} refers to '{field}', which is not computed until later")]
    ForwardReference { stage: String, field: String },
    #[error("ratio '{name}': scale must be a finite, non-zero number")]
    BadScale { name: String },
    #[error(transparent)]
    WeightSet(#[from] WeightSetError),
    #[error("weight set '{set}' weighs '{score}', which no metric produces")]
    UnknownScore { set: String, score: String },
    #[error("scheme '{scheme}': default tier '{tier}' is also a listed tier")]
    DefaultShadowsTier { scheme: String, tier: String },
    #[error("selection '{selection}' uses unknown scheme '{scheme}'")]
    UnknownScheme { selection: String, scheme: String },
    #[error("selection '{selection}': scheme '{scheme}' has no tier '{tier}'")]
    UnknownTier {
        selection: String,
        scheme: String,
        tier: String,
    },
    #[error("selection '{selection}' lists tiers but no scheme")]
    TiersWithoutScheme { selection: String },
    #[error("scenario '{scenario}' uses unknown selection '{selection}'")]
    UnknownSelection { scenario: String, selection: String },
    #[error("scenario '{scenario}': cost_per_unit must be at least 1")]
    ZeroCost { scenario: String },
    #[error("'{name}' cannot be used as an output file name")]
    BadFileName { name: String },
}

/// Where the per-area tables live and how rows are keyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub tables: Vec<PathBuf>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    pub name_column: Option<String>,
}

fn default_id_column() -> String {
    "area_id".to_string()
}

/// `name = numerator / denominator × scale`, added as a raw metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatioSpec {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// Normalize `source` into the 0–100 score `score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricSpec {
    pub source: String,
    pub score: String,
    #[serde(default = "default_method")]
    pub method: Method,
    /// Score `100 − s`, for metrics where lower is better.
    #[serde(default)]
    pub invert: bool,
}

fn default_method() -> Method {
    Method::Percentile
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Rows per selection shown in the summary.
    #[serde(default = "default_summary_top")]
    pub top: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_summary_top() -> usize {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            top: default_summary_top(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub ratios: Vec<RatioSpec>,
    #[serde(default)]
    pub filters: Vec<Predicate>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub weight_sets: Vec<WeightSet>,
    #[serde(default)]
    pub schemes: Vec<Scheme>,
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_file_stem(name: &str) -> Result<(), ConfigError> {
    let safe = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !safe || RESERVED_STEMS.contains(&name) || name.starts_with("allocation_") {
        return Err(ConfigError::BadFileName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl RunConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse and validate config text as if read from `path`; relative
    /// paths resolve against its directory.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or(Path::new(""));
        config.input.tables = config
            .input
            .tables
            .iter()
            .map(|t| resolve(base, t))
            .collect();
        config.output.dir = resolve(base, &config.output.dir);
        config.validate()?;
        Ok(config)
    }

    /// Names produced by the pipeline itself, mapped to what produces them.
    pub fn computed_fields(&self) -> BTreeMap<String, &'static str> {
        let mut out = BTreeMap::new();
        for r in &self.ratios {
            out.insert(r.name.clone(), "ratio");
        }
        for m in &self.metrics {
            out.insert(m.score.clone(), "metric");
        }
        for w in &self.weight_sets {
            out.insert(w.name.clone(), "weight set");
        }
        out
    }

    /// Every field name the run reads, computed or not.
    fn referenced_fields(&self) -> BTreeSet<&str> {
        let mut out: BTreeSet<&str> = BTreeSet::new();
        for r in &self.ratios {
            out.insert(&r.numerator);
            out.insert(&r.denominator);
        }
        out.extend(self.filters.iter().map(|p| p.field.as_str()));
        out.extend(self.metrics.iter().map(|m| m.source.as_str()));
        for s in &self.schemes {
            for t in &s.tiers {
                out.extend(t.when.iter().map(|p| p.field.as_str()));
            }
        }
        for s in &self.selections {
            out.insert(&s.sort_by);
            out.extend(s.when.iter().map(|p| p.field.as_str()));
        }
        out.extend(self.scenarios.iter().map(|s| s.need.as_str()));
        out
    }

    /// Columns that must exist in some input table: every referenced field
    /// the pipeline does not compute.
    pub fn required_columns(&self) -> BTreeSet<String> {
        let computed = self.computed_fields();
        self.referenced_fields()
            .into_iter()
            .filter(|f| !computed.contains_key(*f))
            .map(str::to_string)
            .collect()
    }

    /// Raw fields written to the area tables: input columns, then ratios.
    pub fn raw_fields(&self) -> Vec<String> {
        let mut out: Vec<String> = self.required_columns().into_iter().collect();
        out.extend(self.ratios.iter().map(|r| r.name.clone()));
        out
    }

    pub fn score_fields(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.score.clone()).collect()
    }

    pub fn composite_fields(&self) -> Vec<String> {
        self.weight_sets.iter().map(|w| w.name.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }

        check_unique("ratio", self.ratios.iter().map(|r| r.name.as_str()))?;
        check_unique("metric score", self.metrics.iter().map(|m| m.score.as_str()))?;
        check_unique("weight set", self.weight_sets.iter().map(|w| w.name.as_str()))?;
        check_unique("scheme", self.schemes.iter().map(|s| s.name.as_str()))?;
        check_unique("selection", self.selections.iter().map(|s| s.name.as_str()))?;
        check_unique("scenario", self.scenarios.iter().map(|s| s.strategy.as_str()))?;
        for scheme in &self.schemes {
            check_unique("tier", scheme.tiers.iter().map(|t| t.name.as_str()))?;
        }

        self.check_collisions()?;
        self.check_stage_order()?;

        for r in &self.ratios {
            if !r.scale.is_finite() || r.scale == 0.0 {
                return Err(ConfigError::BadScale {
                    name: r.name.clone(),
                });
            }
        }

        let scores: HashSet<&str> = self.metrics.iter().map(|m| m.score.as_str()).collect();
        for set in &self.weight_sets {
            set.validate()?;
            if let Some(score) = set.weights.keys().find(|k| !scores.contains(k.as_str())) {
                return Err(ConfigError::UnknownScore {
                    set: set.name.clone(),
                    score: score.clone(),
                });
            }
        }

        for scheme in &self.schemes {
            if scheme.tiers.iter().any(|t| t.name == scheme.default) {
                return Err(ConfigError::DefaultShadowsTier {
                    scheme: scheme.name.clone(),
                    tier: scheme.default.clone(),
                });
            }
        }

        for sel in &self.selections {
            check_file_stem(&sel.name)?;
            self.check_selection_tiers(sel)?;
        }

        let selections: HashSet<&str> = self.selections.iter().map(|s| s.name.as_str()).collect();
        for scenario in &self.scenarios {
            check_file_stem(&scenario.strategy)?;
            if !selections.contains(scenario.selection.as_str()) {
                return Err(ConfigError::UnknownSelection {
                    scenario: scenario.strategy.clone(),
                    selection: scenario.selection.clone(),
                });
            }
            if scenario.cost_per_unit == 0 {
                return Err(ConfigError::ZeroCost {
                    scenario: scenario.strategy.clone(),
                });
            }
        }
        Ok(())
    }

    /// Every column of the area tables must be unique: computed fields,
    /// scheme names, required inputs and the fixed row headers.
    fn check_collisions(&self) -> Result<(), ConfigError> {
        let collision = |name: &str, first, second| ConfigError::Collision {
            name: name.to_string(),
            first,
            second,
        };

        let mut owners: BTreeMap<&str, &'static str> = BTreeMap::new();
        let named = self
            .ratios
            .iter()
            .map(|r| (r.name.as_str(), "ratio"))
            .chain(self.metrics.iter().map(|m| (m.score.as_str(), "metric")))
            .chain(self.weight_sets.iter().map(|w| (w.name.as_str(), "weight set")))
            .chain(self.schemes.iter().map(|s| (s.name.as_str(), "scheme")));
        for (name, kind) in named {
            if let Some(first) = owners.insert(name, kind) {
                return Err(collision(name, first, kind));
            }
        }
        for key in [Some(&self.input.id_column), self.input.name_column.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(kind) = owners.get(key.as_str()) {
                return Err(collision(key, "key column", *kind));
            }
        }
        for header in TABLE_COLUMNS {
            if let Some(kind) = owners.get(header) {
                return Err(collision(header, "table header", *kind));
            }
        }

        for column in self.required_columns() {
            if TABLE_COLUMNS.contains(&column.as_str()) {
                return Err(collision(&column, "table header", "required column"));
            }
            if let Some(kind) = owners.get(column.as_str()) {
                return Err(collision(&column, "required column", *kind));
            }
        }
        Ok(())
    }

    /// Ratios, filters and metric sources run before scoring, so they may
    /// only read input columns and ratios defined earlier.
    fn check_stage_order(&self) -> Result<(), ConfigError> {
        let later: HashSet<&str> = self
            .metrics
            .iter()
            .map(|m| m.score.as_str())
            .chain(self.weight_sets.iter().map(|w| w.name.as_str()))
            .collect();
        let forward = |stage: String, field: &str| ConfigError::ForwardReference {
            stage,
            field: field.to_string(),
        };

        let ratio_names: Vec<&str> = self.ratios.iter().map(|r| r.name.as_str()).collect();
        for (i, r) in self.ratios.iter().enumerate() {
            for operand in [&r.numerator, &r.denominator] {
                let not_yet = ratio_names[i..].contains(&operand.as_str());
                if not_yet || later.contains(operand.as_str()) {
                    return Err(forward(format!("ratio '{}'", r.name), operand));
                }
            }
        }
        if let Some(p) = self.filters.iter().find(|p| later.contains(p.field.as_str())) {
            return Err(forward("filter".to_string(), &p.field));
        }
        if let Some(m) = self.metrics.iter().find(|m| later.contains(m.source.as_str())) {
            return Err(forward(format!("metric '{}'", m.score), &m.source));
        }
        Ok(())
    }

    fn check_selection_tiers(&self, sel: &Selection) -> Result<(), ConfigError> {
        let Some(scheme_name) = &sel.scheme else {
            if sel.tiers.is_empty() {
                return Ok(());
            }
            return Err(ConfigError::TiersWithoutScheme {
                selection: sel.name.clone(),
            });
        };
        let scheme = self
            .schemes
            .iter()
            .find(|s| &s.name == scheme_name)
            .ok_or_else(|| ConfigError::UnknownScheme {
                selection: sel.name.clone(),
                scheme: scheme_name.clone(),
            })?;
        let labels: HashSet<&str> = scheme.labels().collect();
        if let Some(tier) = sel.tiers.iter().find(|t| !labels.contains(t.as_str())) {
            return Err(ConfigError::UnknownTier {
                selection: sel.name.clone(),
                scheme: scheme_name.clone(),
                tier: tier.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
