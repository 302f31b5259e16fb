//! Background change detector.
//!
//! Polls a small set of directories for modification-time changes while a
//! long pipeline runs:
//! - Diffs each walk against the previous mtime snapshot (added, modified, deleted)
//! - Overwrites the snapshot every poll and the changes file when a poll found changes
//! - Sleeps in short ticks so a stop request is honored promptly
//!
//! Each poll cycle is best-effort. A failing cycle is logged and the loop
//! carries on with the next interval.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::stability_scanner::relative_key;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    diff_snapshots, ChangeDetectorConfig, ChangeEntry, ChangeRecord, ChangeSummary, MtimeSnapshot,
};
use crate::domain::ports::ChangeStateRepository;

/// Smallest sleep tick; a zero tick would spin.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Lifecycle state of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorState {
    Stopped,
    Running,
}

/// Counters maintained by the poll loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectorStatus {
    /// Whether a poll loop is currently alive.
    pub running: bool,
    /// Poll loops spawned over the detector's lifetime.
    pub loops_started: u64,
    pub completed_polls: u64,
    pub failed_polls: u64,
    pub last_poll_at: Option<DateTime<Utc>>,
    /// Changes found by the most recent successful poll.
    pub last_change_count: usize,
}

/// Everything one poll cycle needs, shareable with the blocking pool.
struct PollContext<R> {
    root: PathBuf,
    config: ChangeDetectorConfig,
    repo: Arc<R>,
}

impl<R> PollContext<R>
where
    R: ChangeStateRepository,
{
    fn is_ignored(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .ignored_extensions
                    .iter()
                    .any(|ignored| ignored.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Walk the watched directories. Returns the snapshot and whether the
    /// file cap cut the walk short.
    fn walk(&self) -> (MtimeSnapshot, bool) {
        let mut snapshot = MtimeSnapshot::new();

        for dir in &self.config.watch_dirs {
            let base = self.root.join(dir);
            if !base.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&base).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        debug!(error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || self.is_ignored(entry.path()) {
                    continue;
                }

                if snapshot.len() >= self.config.max_files {
                    warn!(
                        max_files = self.config.max_files,
                        "file cap reached, remaining files skipped this poll"
                    );
                    return (snapshot, true);
                }

                let mtime = entry
                    .metadata()
                    .ok()
                    .and_then(|meta| meta.modified().ok())
                    .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                    .map(|since_epoch| since_epoch.as_secs_f64());

                match (mtime, relative_key(&self.root, entry.path())) {
                    (Some(mtime), Some(key)) => {
                        snapshot.insert(key, mtime);
                    }
                    _ => debug!(path = %entry.path().display(), "could not stat file"),
                }
            }
        }

        (snapshot, false)
    }

    fn poll(&self) -> DomainResult<Vec<ChangeEntry>> {
        let previous = self.repo.load_snapshot().unwrap_or_else(|err| {
            warn!(error = %err, "previous mtime snapshot unreadable, treating as absent");
            None
        });
        let previous = previous.unwrap_or_default();

        let (mut current, truncated) = self.walk();
        let changes = diff_snapshots(
            &previous,
            &current,
            self.config.mtime_tolerance_secs,
            !truncated,
        );

        if truncated {
            // Keep unvisited paths so they are not reported as added next poll.
            for (path, mtime) in &previous {
                current.entry(path.clone()).or_insert(*mtime);
            }
        }

        self.repo.save_snapshot(&current)?;
        if !changes.is_empty() {
            self.repo.save_changes(&ChangeRecord::new(changes.clone()))?;
        }

        Ok(changes)
    }
}

/// Summarize the last recorded diff; all zeros when none exists yet.
pub fn summarize_changes<R>(repo: &R) -> ChangeSummary
where
    R: ChangeStateRepository + ?Sized,
{
    match repo.load_changes() {
        Ok(Some(record)) => record.summary(),
        Ok(None) => ChangeSummary::default(),
        Err(err) => {
            warn!(error = %err, "changes file unreadable");
            ChangeSummary::default()
        }
    }
}

/// Background mtime poller with a Stopped/Running lifecycle.
pub struct ChangeDetector<R>
where
    R: ChangeStateRepository + 'static,
{
    context: Arc<PollContext<R>>,
    stop_flag: Arc<AtomicBool>,
    status: Arc<RwLock<DetectorStatus>>,
    handle: Option<JoinHandle<()>>,
}

impl<R> ChangeDetector<R>
where
    R: ChangeStateRepository + 'static,
{
    pub fn new(root: impl Into<PathBuf>, config: ChangeDetectorConfig, repo: Arc<R>) -> Self {
        Self {
            context: Arc::new(PollContext {
                root: root.into(),
                config,
                repo,
            }),
            stop_flag: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(DetectorStatus::default())),
            handle: None,
        }
    }

    pub fn state(&self) -> DetectorState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => DetectorState::Running,
            _ => DetectorState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == DetectorState::Running
    }

    /// Spawn the poll loop on the current Tokio runtime.
    ///
    /// Returns `false` without doing anything if a loop is already running or
    /// there is no runtime to spawn on.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("change detector already running");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(error = %err, "no Tokio runtime, change detector not started");
                return false;
            }
        };

        self.stop_flag.store(false, Ordering::Release);
        let context = Arc::clone(&self.context);
        let stop_flag = Arc::clone(&self.stop_flag);
        let status = Arc::clone(&self.status);

        self.handle = Some(runtime.spawn(run_loop(context, stop_flag, status)));
        info!(
            root = %self.context.root.display(),
            interval_secs = self.context.config.interval_secs,
            "change detector started"
        );
        true
    }

    /// Request the loop to stop and wait for it, up to the join timeout.
    ///
    /// A loop that does not exit in time is aborted. The detector is always
    /// Stopped afterwards; calling this when never started is a no-op.
    pub async fn stop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        self.stop_flag.store(true, Ordering::Release);
        let timeout = self.context.config.join_timeout();

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => info!("change detector stopped"),
            Ok(Err(err)) => warn!(error = %err, "change detector loop ended abnormally"),
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "change detector did not stop in time, aborting");
                handle.abort();
            }
        }

        self.status.write().await.running = false;
    }

    /// Run a single poll cycle on the calling thread.
    pub fn poll_once(&self) -> DomainResult<Vec<ChangeEntry>> {
        self.context.poll()
    }

    /// Counts from the last recorded diff.
    pub fn summary(&self) -> ChangeSummary {
        summarize_changes(self.context.repo.as_ref())
    }

    pub async fn status(&self) -> DetectorStatus {
        self.status.read().await.clone()
    }
}

impl<R> Drop for ChangeDetector<R>
where
    R: ChangeStateRepository + 'static,
{
    fn drop(&mut self) {
        // Detached loops would otherwise outlive the detector.
        self.stop_flag.store(true, Ordering::Release);
    }
}

/// Poll loop: poll, then sleep `interval` in `tick` steps, until stopped.
async fn run_loop<R>(
    context: Arc<PollContext<R>>,
    stop_flag: Arc<AtomicBool>,
    status: Arc<RwLock<DetectorStatus>>,
) where
    R: ChangeStateRepository + 'static,
{
    {
        let mut status = status.write().await;
        status.running = true;
        status.loops_started += 1;
    }

    let interval = context.config.interval();
    let tick = context.config.tick().max(MIN_TICK);

    'poll: loop {
        if stop_flag.load(Ordering::Acquire) {
            break;
        }

        let cycle = Arc::clone(&context);
        let result = tokio::task::spawn_blocking(move || cycle.poll())
            .await
            .map_err(DomainError::from)
            .and_then(|polled| polled);

        {
            let mut status = status.write().await;
            match result {
                Ok(changes) => {
                    status.completed_polls += 1;
                    status.last_poll_at = Some(Utc::now());
                    status.last_change_count = changes.len();
                    if changes.is_empty() {
                        debug!("no filesystem changes");
                    } else {
                        info!(changes = changes.len(), "filesystem changes detected");
                    }
                }
                Err(err) => {
                    status.failed_polls += 1;
                    warn!(error = %err, "change detection poll failed");
                }
            }
        }

        let mut waited = Duration::ZERO;
        while waited < interval {
            if stop_flag.load(Ordering::Acquire) {
                break 'poll;
            }
            tokio::time::sleep(tick).await;
            waited += tick;
        }
    }

    status.write().await.running = false;
}
