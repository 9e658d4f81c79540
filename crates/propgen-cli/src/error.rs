use std::io;
use std::path::PathBuf;

use propgen_core::{ConfigError, ExitStatus, GenerateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("{0}")]
    Usage(String),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("invalid snapshot path {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },
    #[error("glob error: {0}")]
    Glob(String),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CliError::PathNotFound(_) => ExitStatus::PathNotFound,
            CliError::Usage(_) => ExitStatus::Usage,
            CliError::Write { .. } => ExitStatus::GenerationFailed,
            _ => ExitStatus::Failure,
        }
    }
}
