//! JSON-file hash snapshot history.

use std::path::{Path, PathBuf};

use super::{read_history_for_append, read_json, write_json};
use crate::domain::errors::DomainResult;
use crate::domain::models::HashSnapshot;
use crate::domain::ports::HashHistoryRepository;

/// Hash history stored as a JSON array of `{timestamp, iteration, hashes}`.
#[derive(Debug, Clone)]
pub struct JsonHashHistoryRepository {
    path: PathBuf,
}

impl JsonHashHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HashHistoryRepository for JsonHashHistoryRepository {
    fn load_all(&self) -> DomainResult<Vec<HashSnapshot>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn append(&self, snapshot: &HashSnapshot) -> DomainResult<()> {
        let mut history = read_history_for_append(&self.path)?;
        history.push(snapshot.clone());
        write_json(&self.path, &history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FileHash;
    use std::collections::BTreeMap;

    #[test]
    fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonHashHistoryRepository::new(dir.path().join("hash_history.json"));
        assert_eq!(repo.count().unwrap(), 0);

        for iteration in 1..=3 {
            let hashes = BTreeMap::from([(
                "main.py".to_string(),
                FileHash::Digest(format!("{iteration:064x}")),
            )]);
            repo.append(&HashSnapshot::new(iteration, hashes)).unwrap();
        }

        let history = repo.load_all().unwrap();
        let iterations: Vec<u64> = history.iter().map(|s| s.iteration).collect();
        assert_eq!(iterations, vec![1, 2, 3]);
    }

    #[test]
    fn test_error_hashes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonHashHistoryRepository::new(dir.path().join("hash_history.json"));
        let hashes = BTreeMap::from([(
            "locked.py".to_string(),
            FileHash::Error("permission denied".to_string()),
        )]);
        repo.append(&HashSnapshot::new(1, hashes)).unwrap();

        let reloaded = repo.load_all().unwrap();
        assert!(reloaded[0].hashes["locked.py"].is_error());
    }

    #[test]
    fn test_append_replaces_malformed_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hash_history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let repo = JsonHashHistoryRepository::new(path.clone());
        assert!(repo.load_all().is_err());

        repo.append(&HashSnapshot::new(1, BTreeMap::new())).unwrap();
        repo.append(&HashSnapshot::new(2, BTreeMap::new())).unwrap();

        let iterations: Vec<u64> = repo.load_all().unwrap().iter().map(|s| s.iteration).collect();
        assert_eq!(iterations, vec![1, 2]);
    }
}
