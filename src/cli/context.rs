//! Wiring from configuration to JSON-backed services.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::{
    JsonChangeStateRepository, JsonConvergenceHistoryRepository, JsonHashHistoryRepository,
};
use crate::domain::models::{AgentRoster, ChangeDetectorConfig, Config};
use crate::services::{
    ChangeDetector, ConvergencePipeline, ConvergenceScorer, FileStabilityScanner,
};

pub type JsonPipeline = ConvergencePipeline<
    JsonHashHistoryRepository,
    JsonConvergenceHistoryRepository,
    JsonChangeStateRepository,
>;

/// Project root plus the effective configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    /// Config file the workspace was loaded from.
    pub config_path: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: Config, config_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config,
            config_path: config_path.into(),
        }
    }

    /// State directory; a relative `state_dir` is taken from the root.
    pub fn state_dir(&self) -> PathBuf {
        resolve(&self.root, &self.config.state_dir)
    }

    fn state_config(&self) -> Config {
        Config {
            state_dir: self.state_dir(),
            ..self.config.clone()
        }
    }

    pub fn hash_history(&self) -> Arc<JsonHashHistoryRepository> {
        Arc::new(JsonHashHistoryRepository::new(
            self.state_config().hash_history_path(),
        ))
    }

    pub fn convergence_history(&self) -> Arc<JsonConvergenceHistoryRepository> {
        Arc::new(JsonConvergenceHistoryRepository::new(
            self.state_config().convergence_history_path(),
        ))
    }

    pub fn change_state(&self) -> Arc<JsonChangeStateRepository> {
        let config = self.state_config();
        Arc::new(JsonChangeStateRepository::new(
            config.background_snapshot_path(),
            config.background_changes_path(),
        ))
    }

    pub fn scanner(&self) -> FileStabilityScanner<JsonHashHistoryRepository> {
        FileStabilityScanner::new(self.hash_history(), self.config.scanner.clone())
    }

    pub fn scorer(&self) -> ConvergenceScorer {
        ConvergenceScorer::new(self.config.convergence_calculation.clone())
    }

    pub fn pipeline(&self) -> JsonPipeline {
        ConvergencePipeline::new(
            &self.root,
            self.scanner(),
            self.scorer(),
            self.convergence_history(),
            self.change_state(),
            AgentRoster::from_config(&self.config.agents),
        )
    }

    pub fn change_detector(
        &self,
        config: ChangeDetectorConfig,
    ) -> ChangeDetector<JsonChangeStateRepository> {
        ChangeDetector::new(&self.root, config, self.change_state())
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::HashHistoryRepository;

    #[test]
    fn test_relative_state_dir_is_under_root() {
        let workspace = Workspace::new("/project", Config::default(), "/project/.dmaic/config.yaml");
        assert_eq!(workspace.state_dir(), PathBuf::from("/project/.dmaic"));
    }

    #[test]
    fn test_absolute_state_dir_is_kept() {
        let config = Config {
            state_dir: PathBuf::from("/var/lib/dmaic"),
            ..Config::default()
        };
        let workspace = Workspace::new("/project", config, "config.yaml");
        assert_eq!(workspace.state_dir(), PathBuf::from("/var/lib/dmaic"));
        assert_eq!(
            workspace.hash_history().path(),
            Path::new("/var/lib/dmaic/hash_history.json")
        );
    }

    #[test]
    fn test_scan_writes_into_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "a").unwrap();
        let workspace = Workspace::new(dir.path(), Config::default(), dir.path().join(".dmaic/config.yaml"));

        let outcome = workspace.scanner().scan(dir.path());
        assert_eq!(outcome.total_files, 1);
        assert!(dir.path().join(".dmaic/hash_history.json").is_file());
        assert_eq!(workspace.hash_history().count().unwrap(), 1);
    }
}
