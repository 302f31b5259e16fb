//! dmaic - Convergence tracking for iterative improvement pipelines
//!
//! A pipeline that runs Define, Measure, Analyze, Improve and Control phases
//! over and over needs to know when another run stops paying off. This crate
//! answers that with three pieces:
//!
//! - **File Stability Scanner**: hashes the tracked file set every run and
//!   counts files unchanged since the run two iterations back
//! - **Convergence Scorer**: folds file, test and metric stability, knowledge
//!   growth and regressions into one weighted score with a maturity level
//! - **Background Change Detector**: polls watched directories for mtime
//!   changes while a long run is in progress
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and repository ports
//! - **Adapters** (`adapters`): JSON-file and in-memory repositories
//! - **Service Layer** (`services`): scanner, scorer, detector, pipeline and gate
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): the `dmaic` command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dmaic::adapters::JsonHashHistoryRepository;
//! use dmaic::domain::models::ScannerConfig;
//! use dmaic::services::FileStabilityScanner;
//!
//! let history = Arc::new(JsonHashHistoryRepository::new(".dmaic/hash_history.json"));
//! let scanner = FileStabilityScanner::new(history, ScannerConfig::default());
//! let outcome = scanner.scan(std::path::Path::new("."));
//! println!("{}/{} files stable", outcome.stable_files, outcome.total_files);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AgentRoster, Config, ConvergenceInputs, ConvergenceMetrics, DmaicPhase, MaturityLevel,
    StabilityRatio,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ChangeDetector, ConvergencePipeline, ConvergenceScorer, FileStabilityScanner, GateVerdict,
};
