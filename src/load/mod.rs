//! Loading per-area census tables from delimited text.
//!
//! The first table fixes the population and its order; later tables are
//! left-joined on the area identifier. Only the columns the run actually
//! needs are parsed, so wide ABS tables with text columns load fine as
//! long as the referenced ones are numeric.
//!
//! Structural problems (unreadable file, missing id or required column,
//! duplicate ids, garbage in a numeric cell) abort the load. Suppressed or
//! blank cells are not errors: they load as undefined.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::allocate::Candidate;
use crate::population::{AreaRecord, Population};

/// Cell contents treated as a missing value (case-insensitive). `np` and
/// `..` are the ABS "not published" markers.
const MISSING_MARKERS: [&str; 7] = ["", "na", "nan", "np", "..", "-", "null"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no input tables configured")]
    NoTables,
    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: missing id column '{column}'")]
    MissingIdColumn { path: PathBuf, column: String },
    #[error("required column '{column}' not found in any input table")]
    MissingColumn { column: String },
    #[error("{path}: line {line}: empty area id")]
    EmptyAreaId { path: PathBuf, line: u64 },
    #[error("{path}: line {line}: duplicate area id '{area_id}'")]
    DuplicateArea {
        path: PathBuf,
        line: u64,
        area_id: String,
    },
    #[error("{path}: line {line}, column '{column}': '{value}' is not a number")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

/// Parse one cell: `Ok(None)` for missing markers and non-finite numbers,
/// an error for anything else that is not a number.
pub fn parse_cell(raw: &str) -> Result<Option<f64>, ParseFloatError> {
    let trimmed = raw.trim();
    if MISSING_MARKERS
        .iter()
        .any(|m| trimmed.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    let v: f64 = trimmed.parse()?;
    Ok(v.is_finite().then_some(v))
}

/// Column layout shared by every input table.
#[derive(Debug, Clone)]
pub struct TableLayout<'a> {
    pub id_column: &'a str,
    pub name_column: Option<&'a str>,
    pub required: &'a BTreeSet<String>,
}

/// Loaded population plus join diagnostics.
#[derive(Debug)]
pub struct LoadOutcome {
    pub population: Population,
    /// Rows in later tables whose area is not in the first table.
    pub orphans: usize,
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// Load and join every table into one population.
pub fn load_population(tables: &[PathBuf], layout: &TableLayout) -> Result<LoadOutcome, LoadError> {
    if tables.is_empty() {
        return Err(LoadError::NoTables);
    }

    let mut areas: Vec<AreaRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut claimed: BTreeSet<String> = BTreeSet::new();
    let mut orphans = 0usize;

    for (t, path) in tables.iter().enumerate() {
        let mut reader = open(path)?;
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv {
                path: path.clone(),
                source,
            })?
            .clone();
        let id_idx =
            column_index(&headers, layout.id_column).ok_or_else(|| LoadError::MissingIdColumn {
                path: path.clone(),
                column: layout.id_column.to_string(),
            })?;
        let name_idx = layout.name_column.and_then(|c| column_index(&headers, c));

        // A required column is read from the first table that has it.
        let columns: Vec<(String, usize)> = layout
            .required
            .iter()
            .filter(|c| !claimed.contains(*c))
            .filter_map(|c| column_index(&headers, c).map(|i| (c.clone(), i)))
            .collect();
        claimed.extend(columns.iter().map(|(c, _)| c.clone()));

        let mut seen: HashSet<String> = HashSet::new();
        let mut rows = 0usize;
        for record in reader.records() {
            let record = record.map_err(|source| LoadError::Csv {
                path: path.clone(),
                source,
            })?;
            let line = line_of(&record);
            let area_id = record.get(id_idx).unwrap_or("").to_string();
            if area_id.is_empty() {
                return Err(LoadError::EmptyAreaId {
                    path: path.clone(),
                    line,
                });
            }
            if !seen.insert(area_id.clone()) {
                return Err(LoadError::DuplicateArea {
                    path: path.clone(),
                    line,
                    area_id,
                });
            }
            rows += 1;

            let slot = if t == 0 {
                index.insert(area_id.clone(), areas.len());
                areas.push(AreaRecord::new(area_id.clone()));
                areas.len() - 1
            } else {
                match index.get(&area_id) {
                    Some(&i) => i,
                    None => {
                        orphans += 1;
                        continue;
                    }
                }
            };
            let area = &mut areas[slot];

            if area.area_name.is_none() {
                area.area_name = name_idx
                    .and_then(|i| record.get(i))
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
            }
            for (column, i) in &columns {
                let raw = record.get(*i).unwrap_or("");
                let value = parse_cell(raw).map_err(|_| LoadError::InvalidValue {
                    path: path.clone(),
                    line,
                    column: column.clone(),
                    value: raw.to_string(),
                })?;
                area.raw.insert(column.clone(), value);
            }
        }

        // Areas this later table never mentions keep its columns undefined.
        if t > 0 && !columns.is_empty() {
            for area in areas.iter_mut().filter(|a| !seen.contains(&a.area_id)) {
                area.flag(format!("absent from {}", path.display()));
            }
        }
        info!(table = %path.display(), rows, columns = columns.len(), "loaded table");
    }

    if let Some(column) = layout.required.iter().find(|c| !claimed.contains(*c)) {
        return Err(LoadError::MissingColumn {
            column: column.clone(),
        });
    }
    if orphans > 0 {
        warn!(orphans, "rows in joined tables with no matching area were ignored");
    }

    Ok(LoadOutcome {
        population: Population::new(areas),
        orphans,
    })
}

/// Read a ranked CSV in row order as allocation candidates.
pub fn read_candidates(path: &Path, id_column: &str, need: &str) -> Result<Vec<Candidate>, LoadError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let id_idx = column_index(&headers, id_column).ok_or_else(|| LoadError::MissingIdColumn {
        path: path.to_path_buf(),
        column: id_column.to_string(),
    })?;
    let need_idx = column_index(&headers, need).ok_or_else(|| LoadError::MissingColumn {
        column: need.to_string(),
    })?;

    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line_of(&record);
        let area_id = record.get(id_idx).unwrap_or("");
        if area_id.is_empty() {
            return Err(LoadError::EmptyAreaId {
                path: path.to_path_buf(),
                line,
            });
        }
        if !seen.insert(area_id.to_string()) {
            return Err(LoadError::DuplicateArea {
                path: path.to_path_buf(),
                line,
                area_id: area_id.to_string(),
            });
        }
        let raw = record.get(need_idx).unwrap_or("");
        let value = parse_cell(raw).map_err(|_| LoadError::InvalidValue {
            path: path.to_path_buf(),
            line,
            column: need.to_string(),
            value: raw.to_string(),
        })?;
        out.push(Candidate {
            area_id: area_id.to_string(),
            need: value,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
