use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Literal written for undefined values in CSV and markdown output.
pub const UNDEFINED: &str = "NA";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot move finished output into {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Flush(#[source] std::io::Error),
    #[error("report formatting failed")]
    Format(#[from] std::fmt::Error),
    #[error("output manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Print a horizontal separator of box-drawing chars.
pub fn separator(width: usize) -> String {
    "\u{2500}".repeat(width)
}

/// Serialize to pretty JSON and print to stdout.
pub fn print_json_stdout(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format an integer with thousand separators (e.g. 1234567 → "1,234,567").
pub fn format_thousands(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Fixed-precision number, or `NA` when undefined.
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => UNDEFINED.to_string(),
    }
}

/// Shortest round-trip representation, or `NA` when undefined.
pub fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNDEFINED.to_string(),
    }
}

/// Flush an in-memory CSV writer and hand back its bytes.
pub fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, OutputError> {
    wtr.into_inner()
        .map_err(|e| OutputError::Flush(e.into_error()))
}

/// Write `contents` to `path` all-or-nothing: a temporary file in the same
/// directory is filled and then renamed over the target, so readers see
/// either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|source| OutputError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "report_helpers_test.rs"]
mod tests;
