//! JSON-file state for the background change detector.

use std::path::PathBuf;

use super::{read_json, write_json};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ChangeRecord, MtimeSnapshot};
use crate::domain::ports::ChangeStateRepository;

/// Flat `{path: mtime}` snapshot file plus a `{timestamp, total_changes, changes}` file.
#[derive(Debug, Clone)]
pub struct JsonChangeStateRepository {
    snapshot_path: PathBuf,
    changes_path: PathBuf,
}

impl JsonChangeStateRepository {
    pub fn new(snapshot_path: impl Into<PathBuf>, changes_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            changes_path: changes_path.into(),
        }
    }
}

impl ChangeStateRepository for JsonChangeStateRepository {
    fn load_snapshot(&self) -> DomainResult<Option<MtimeSnapshot>> {
        read_json(&self.snapshot_path)
    }

    fn save_snapshot(&self, snapshot: &MtimeSnapshot) -> DomainResult<()> {
        write_json(&self.snapshot_path, snapshot)
    }

    fn load_changes(&self) -> DomainResult<Option<ChangeRecord>> {
        read_json(&self.changes_path)
    }

    fn save_changes(&self, record: &ChangeRecord) -> DomainResult<()> {
        write_json(&self.changes_path, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ChangeEntry, ChangeType};

    #[test]
    fn test_changes_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let changes_path = dir.path().join("background_changes.json");
        let repo = JsonChangeStateRepository::new(dir.path().join("snap.json"), &changes_path);

        assert!(repo.load_changes().unwrap().is_none());

        let record = ChangeRecord::new(vec![ChangeEntry {
            path: "src/app.py".to_string(),
            change_type: ChangeType::Added,
        }]);
        repo.save_changes(&record).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&changes_path).unwrap()).unwrap();
        assert_eq!(raw["total_changes"], 1);
        assert_eq!(raw["changes"][0]["type"], "added");
        assert_eq!(repo.load_changes().unwrap(), Some(record));
    }

    #[test]
    fn test_snapshot_is_flat_object() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("background_snapshot.json");
        let repo = JsonChangeStateRepository::new(&snapshot_path, dir.path().join("c.json"));

        let snapshot = MtimeSnapshot::from([("src/a.py".to_string(), 1_700_000_000.25)]);
        repo.save_snapshot(&snapshot).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"src/a.py": 1_700_000_000.25}));
        assert_eq!(repo.load_snapshot().unwrap(), Some(snapshot));
    }
}
