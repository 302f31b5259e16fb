//! JSON file adapters.
//!
//! Every state file is pretty-printed UTF-8 JSON. Writes go to a sibling
//! temporary file first and are renamed into place, so a reader never sees a
//! half-written history.

pub mod change_state_repository;
pub mod convergence_history_repository;
pub mod hash_history_repository;

pub use change_state_repository::JsonChangeStateRepository;
pub use convergence_history_repository::JsonConvergenceHistoryRepository;
pub use hash_history_repository::JsonHashHistoryRepository;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};

/// Read and parse a JSON file. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> DomainResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(DomainError::io(path, &err)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|err| DomainError::serialization(path, &err))
}

/// Load an append-only history for rewriting. A history that no longer parses
/// is discarded so the next write replaces it.
pub fn read_history_for_append<T: DeserializeOwned>(path: &Path) -> DomainResult<Vec<T>> {
    match read_json(path) {
        Ok(history) => Ok(history.unwrap_or_default()),
        Err(err @ DomainError::Serialization { .. }) => {
            warn!(path = %path.display(), error = %err, "history unreadable, starting a new one");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> DomainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| DomainError::io(parent, &err))?;
    }

    let mut body =
        serde_json::to_string_pretty(value).map_err(|err| DomainError::serialization(path, &err))?;
    body.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|err| DomainError::io(&tmp, &err))?;
    fs::rename(&tmp, path).map_err(|err| DomainError::io(path, &err))
}
