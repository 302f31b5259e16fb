//! JSON-file convergence record history.

use std::path::PathBuf;

use super::{read_history_for_append, read_json, write_json};
use crate::domain::errors::DomainResult;
use crate::domain::models::ConvergenceMetrics;
use crate::domain::ports::ConvergenceHistoryRepository;

#[derive(Debug, Clone)]
pub struct JsonConvergenceHistoryRepository {
    path: PathBuf,
}

impl JsonConvergenceHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConvergenceHistoryRepository for JsonConvergenceHistoryRepository {
    fn load_all(&self) -> DomainResult<Vec<ConvergenceMetrics>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn append(&self, record: &ConvergenceMetrics) -> DomainResult<()> {
        let mut history = read_history_for_append(&self.path)?;
        history.push(record.clone());
        write_json(&self.path, &history)
    }
}
