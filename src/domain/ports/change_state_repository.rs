//! Change detector state port.

use crate::domain::errors::DomainResult;
use crate::domain::models::{ChangeRecord, MtimeSnapshot};

/// Storage for the background detector's last snapshot and last diff.
///
/// Both values are overwritten in place; no history is kept.
pub trait ChangeStateRepository: Send + Sync {
    fn load_snapshot(&self) -> DomainResult<Option<MtimeSnapshot>>;

    fn save_snapshot(&self, snapshot: &MtimeSnapshot) -> DomainResult<()>;

    fn load_changes(&self) -> DomainResult<Option<ChangeRecord>>;

    fn save_changes(&self, record: &ChangeRecord) -> DomainResult<()>;
}
