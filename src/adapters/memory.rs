//! In-memory repositories.
//!
//! Used by tests and by callers that want scoring without touching disk.

use std::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChangeRecord, ConvergenceMetrics, HashSnapshot, MtimeSnapshot};
use crate::domain::ports::{
    ChangeStateRepository, ConvergenceHistoryRepository, HashHistoryRepository,
};

fn poisoned<T>(_: std::sync::PoisonError<T>) -> DomainError {
    DomainError::ValidationFailed("in-memory repository lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryHashHistoryRepository {
    snapshots: Mutex<Vec<HashSnapshot>>,
}

impl InMemoryHashHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashHistoryRepository for InMemoryHashHistoryRepository {
    fn load_all(&self) -> DomainResult<Vec<HashSnapshot>> {
        Ok(self.snapshots.lock().map_err(poisoned)?.clone())
    }

    fn append(&self, snapshot: &HashSnapshot) -> DomainResult<()> {
        self.snapshots.lock().map_err(poisoned)?.push(snapshot.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConvergenceHistoryRepository {
    records: Mutex<Vec<ConvergenceMetrics>>,
}

impl InMemoryConvergenceHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConvergenceHistoryRepository for InMemoryConvergenceHistoryRepository {
    fn load_all(&self) -> DomainResult<Vec<ConvergenceMetrics>> {
        Ok(self.records.lock().map_err(poisoned)?.clone())
    }

    fn append(&self, record: &ConvergenceMetrics) -> DomainResult<()> {
        self.records.lock().map_err(poisoned)?.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryChangeStateRepository {
    snapshot: Mutex<Option<MtimeSnapshot>>,
    changes: Mutex<Option<ChangeRecord>>,
}

impl InMemoryChangeStateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeStateRepository for InMemoryChangeStateRepository {
    fn load_snapshot(&self) -> DomainResult<Option<MtimeSnapshot>> {
        Ok(self.snapshot.lock().map_err(poisoned)?.clone())
    }

    fn save_snapshot(&self, snapshot: &MtimeSnapshot) -> DomainResult<()> {
        *self.snapshot.lock().map_err(poisoned)? = Some(snapshot.clone());
        Ok(())
    }

    fn load_changes(&self) -> DomainResult<Option<ChangeRecord>> {
        Ok(self.changes.lock().map_err(poisoned)?.clone())
    }

    fn save_changes(&self, record: &ChangeRecord) -> DomainResult<()> {
        *self.changes.lock().map_err(poisoned)? = Some(record.clone());
        Ok(())
    }
}
