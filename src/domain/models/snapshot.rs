//! Content-hash snapshots of a tracked file set.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const ERROR_PREFIX: &str = "ERROR: ";

/// Hash of a single file.
///
/// Serialized as the bare hex digest, or as `"ERROR: <reason>"` when the file
/// could not be read. An errored hash never matches anything, itself included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileHash {
    Digest(String),
    Error(String),
}

impl FileHash {
    /// True iff both hashes are valid digests with the same value.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Digest(a), Self::Digest(b)) => a == b,
            _ => false,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(hex) => f.write_str(hex),
            Self::Error(reason) => write!(f, "{ERROR_PREFIX}{reason}"),
        }
    }
}

impl From<String> for FileHash {
    fn from(raw: String) -> Self {
        raw.strip_prefix(ERROR_PREFIX)
            .map_or_else(|| Self::Digest(raw.clone()), |reason| Self::Error(reason.to_string()))
    }
}

impl Serialize for FileHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// All file hashes taken during one scanner run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashSnapshot {
    pub timestamp: DateTime<Utc>,
    pub iteration: u64,
    /// Relative path (forward slashes) to hash. Paths are unique by construction.
    pub hashes: BTreeMap<String, FileHash>,
}

impl HashSnapshot {
    pub fn new(iteration: u64, hashes: BTreeMap<String, FileHash>) -> Self {
        Self {
            timestamp: Utc::now(),
            iteration,
            hashes,
        }
    }

    /// Number of paths in `self` whose hash matches the same path in `baseline`.
    pub fn stable_against(&self, baseline: &Self) -> usize {
        self.hashes
            .iter()
            .filter(|(path, hash)| {
                baseline
                    .hashes
                    .get(*path)
                    .is_some_and(|previous| hash.matches(previous))
            })
            .count()
    }
}
