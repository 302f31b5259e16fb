//! Convergence record history port.

use crate::domain::errors::DomainResult;
use crate::domain::models::ConvergenceMetrics;

/// Append-only store of convergence records, oldest first.
pub trait ConvergenceHistoryRepository: Send + Sync {
    /// Load every record. A store that does not exist yet is empty.
    fn load_all(&self) -> DomainResult<Vec<ConvergenceMetrics>>;

    /// Append a record to the end of the history.
    fn append(&self, record: &ConvergenceMetrics) -> DomainResult<()>;

    /// Most recent record, if any.
    fn latest(&self) -> DomainResult<Option<ConvergenceMetrics>> {
        Ok(self.load_all()?.pop())
    }
}
