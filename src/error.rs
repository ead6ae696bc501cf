use thiserror::Error;

use crate::config::ConfigError;
use crate::load::LoadError;
use crate::report_helpers::OutputError;
use crate::telemetry::TelemetryError;

/// Anything that aborts a command.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
