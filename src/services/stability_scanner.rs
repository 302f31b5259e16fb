//! File stability scanner.
//!
//! Hashes the tracked file set on every run, appends the snapshot to the
//! history, and counts how many files are byte-identical to the snapshot
//! `baseline_window` runs back (the current run counts as the first of the
//! window). With fewer snapshots than the window, nothing is stable.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::models::{FileHash, HashSnapshot, ScannerConfig, StabilityRatio};
use crate::domain::ports::HashHistoryRepository;

/// Files are hashed in chunks of this many bytes.
pub const HASH_CHUNK_SIZE: usize = 8192;

/// Result of one scanner run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub iteration: u64,
    pub total_files: usize,
    pub stable_files: usize,
    pub errored_files: usize,
    /// Iteration of the snapshot compared against, if one existed.
    pub baseline_iteration: Option<u64>,
}

impl ScanOutcome {
    pub const fn ratio(&self) -> StabilityRatio {
        StabilityRatio::new(self.stable_files as u64, self.total_files as u64)
    }

    pub fn stability_pct(&self) -> f64 {
        self.ratio().percentage()
    }
}

/// SHA-256 of a file's contents as lowercase hex.
///
/// Read failures produce [`FileHash::Error`] rather than an error.
pub fn hash_file(path: &Path) -> FileHash {
    match digest_file(path) {
        Ok(hex) => FileHash::Digest(hex),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to hash file");
            FileHash::Error(err.to_string())
        }
    }
}

fn digest_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Relative path with forward slashes, independent of the host separator.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Hashes a tracked file set and scores it against the history.
pub struct FileStabilityScanner<R>
where
    R: HashHistoryRepository,
{
    history: Arc<R>,
    config: ScannerConfig,
}

impl<R> FileStabilityScanner<R>
where
    R: HashHistoryRepository,
{
    pub fn new(history: Arc<R>, config: ScannerConfig) -> Self {
        Self { history, config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.config
            .exclude
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| relative.contains(pattern.as_str()))
    }

    fn is_tracked(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|tracked| tracked.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Hash every tracked, non-excluded file under `root`.
    ///
    /// Exclusion is plain substring containment on the path relative to
    /// `root`. Directories that match are not descended into.
    pub fn collect_hashes(&self, root: &Path) -> BTreeMap<String, FileHash> {
        let mut hashes = BTreeMap::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                relative_key(root, entry.path()).is_none_or(|rel| !self.is_excluded(&rel))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_tracked(entry.path()) {
                continue;
            }

            if let Some(key) = relative_key(root, entry.path()) {
                hashes.insert(key, hash_file(entry.path()));
            }
        }

        debug!(root = %root.display(), files = hashes.len(), "collected file hashes");
        hashes
    }

    /// Run the scanner once: hash, append the snapshot, compare to baseline.
    ///
    /// History read or write failures are logged and treated as an empty
    /// history; they never abort the run.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let mut history = self.history.load_all().unwrap_or_else(|err| {
            warn!(error = %err, "hash history unreadable, starting from empty history");
            Vec::new()
        });

        let iteration = history.len() as u64 + 1;
        let snapshot = HashSnapshot::new(iteration, self.collect_hashes(root));

        if let Err(err) = self.history.append(&snapshot) {
            warn!(error = %err, iteration, "failed to persist hash snapshot");
        }
        history.push(snapshot);

        let window = self.config.baseline_window.max(1);
        let current = &history[history.len() - 1];
        let baseline = history
            .len()
            .checked_sub(window)
            .map(|index| &history[index]);

        let stable_files = baseline.map_or(0, |b| current.stable_against(b));
        let outcome = ScanOutcome {
            iteration,
            total_files: current.hashes.len(),
            stable_files,
            errored_files: current.hashes.values().filter(|h| h.is_error()).count(),
            baseline_iteration: baseline.map(|b| b.iteration),
        };

        info!(
            iteration,
            total_files = outcome.total_files,
            stable_files = outcome.stable_files,
            errored_files = outcome.errored_files,
            baseline = ?outcome.baseline_iteration,
            "file stability scan complete"
        );

        outcome
    }
}
