//! Hash snapshot history port.

use crate::domain::errors::DomainResult;
use crate::domain::models::HashSnapshot;

/// Append-only store of hash snapshots, oldest first.
pub trait HashHistoryRepository: Send + Sync {
    /// Load every snapshot. A store that does not exist yet is empty.
    fn load_all(&self) -> DomainResult<Vec<HashSnapshot>>;

    /// Append a snapshot to the end of the history.
    fn append(&self, snapshot: &HashSnapshot) -> DomainResult<()>;

    /// Number of snapshots recorded so far.
    fn count(&self) -> DomainResult<usize> {
        Ok(self.load_all()?.len())
    }
}
