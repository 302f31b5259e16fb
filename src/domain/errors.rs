//! Domain errors for the DMAIC convergence tracker.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Domain-level errors that can occur while tracking convergence.
///
/// None of these are fatal to a pipeline run: the scanner, scorer and change
/// detector catch them at their public entry points and degrade the computed
/// result instead.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Serialization error in {path}: {message}")]
    Serialization { path: PathBuf, message: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Wrap a JSON error with the file it was read from or written to.
    pub fn serialization(path: impl AsRef<Path>, err: &serde_json::Error) -> Self {
        Self::Serialization {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for DomainError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}
