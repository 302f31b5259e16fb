//! Modification-time snapshots and the diffs the background detector records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relative path to last-seen modification time, in seconds since the epoch.
pub type MtimeSnapshot = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

/// The most recent non-empty diff between two mtime snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub timestamp: DateTime<Utc>,
    pub total_changes: usize,
    pub changes: Vec<ChangeEntry>,
}

impl ChangeRecord {
    pub fn new(changes: Vec<ChangeEntry>) -> Self {
        Self {
            timestamp: Utc::now(),
            total_changes: changes.len(),
            changes,
        }
    }

    pub fn summary(&self) -> ChangeSummary {
        let count = |kind: ChangeType| self.changes.iter().filter(|c| c.change_type == kind).count();
        ChangeSummary {
            total: self.total_changes,
            added: count(ChangeType::Added),
            modified: count(ChangeType::Modified),
            deleted: count(ChangeType::Deleted),
            last_changed_at: Some(self.timestamp),
        }
    }
}

/// Counts per change type for the end-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total: usize,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub last_changed_at: Option<DateTime<Utc>>,
}

/// Diff two mtime snapshots.
///
/// A path is modified only when its mtime moved by more than `tolerance_secs`.
/// Deletions are reported only when `detect_deletions` is set; a walk that was
/// cut short cannot tell a missing file from one it never reached.
pub fn diff_snapshots(
    previous: &MtimeSnapshot,
    current: &MtimeSnapshot,
    tolerance_secs: f64,
    detect_deletions: bool,
) -> Vec<ChangeEntry> {
    let mut changes: Vec<ChangeEntry> = current
        .iter()
        .filter_map(|(path, mtime)| {
            let change_type = match previous.get(path) {
                None => ChangeType::Added,
                Some(old) if (mtime - old).abs() > tolerance_secs => ChangeType::Modified,
                Some(_) => return None,
            };
            Some(ChangeEntry {
                path: path.clone(),
                change_type,
            })
        })
        .collect();

    if detect_deletions {
        changes.extend(
            previous
                .keys()
                .filter(|path| !current.contains_key(*path))
                .map(|path| ChangeEntry {
                    path: path.clone(),
                    change_type: ChangeType::Deleted,
                }),
        );
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, f64)]) -> MtimeSnapshot {
        entries.iter().map(|(p, t)| ((*p).to_string(), *t)).collect()
    }

    #[test]
    fn test_diff_classifies_changes() {
        let previous = snapshot(&[("a.py", 100.0), ("b.py", 100.0), ("c.py", 100.0)]);
        let current = snapshot(&[("a.py", 100.0), ("b.py", 105.0), ("d.py", 1.0)]);

        let changes = diff_snapshots(&previous, &current, 1.0, true);
        assert_eq!(
            changes,
            vec![
                ChangeEntry { path: "b.py".into(), change_type: ChangeType::Modified },
                ChangeEntry { path: "d.py".into(), change_type: ChangeType::Added },
                ChangeEntry { path: "c.py".into(), change_type: ChangeType::Deleted },
            ]
        );
    }

    #[test]
    fn test_diff_ignores_jitter_within_tolerance() {
        let previous = snapshot(&[("a.py", 100.0)]);
        let current = snapshot(&[("a.py", 100.9)]);
        assert!(diff_snapshots(&previous, &current, 1.0, true).is_empty());

        let exactly_one = snapshot(&[("a.py", 101.0)]);
        assert!(diff_snapshots(&previous, &exactly_one, 1.0, true).is_empty());
    }

    #[test]
    fn test_diff_without_deletions() {
        let previous = snapshot(&[("a.py", 1.0), ("b.py", 1.0)]);
        let current = snapshot(&[("a.py", 1.0)]);
        assert!(diff_snapshots(&previous, &current, 1.0, false).is_empty());
    }

    #[test]
    fn test_record_summary_counts() {
        let record = ChangeRecord::new(vec![
            ChangeEntry { path: "a".into(), change_type: ChangeType::Added },
            ChangeEntry { path: "b".into(), change_type: ChangeType::Added },
            ChangeEntry { path: "c".into(), change_type: ChangeType::Deleted },
        ]);
        let summary = record.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.modified, 0);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.last_changed_at, Some(record.timestamp));
    }

    #[test]
    fn test_change_entry_json_uses_type_key() {
        let entry = ChangeEntry { path: "src/x.py".into(), change_type: ChangeType::Modified };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"path": "src/x.py", "type": "modified"}));
    }
}
