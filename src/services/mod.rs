//! Service layer
//!
//! - `stability_scanner`: content-hash file stability against a prior snapshot
//! - `convergence_scorer`: weighted score, maturity level, trend
//! - `change_detector`: background mtime polling with cooperative stop
//! - `convergence_pipeline`: one in-process iteration across the DMAIC agents
//! - `convergence_gate`: converged / not converged verdict on the latest record

pub mod change_detector;
pub mod convergence_gate;
pub mod convergence_pipeline;
pub mod convergence_scorer;
pub mod stability_scanner;

pub use change_detector::{summarize_changes, ChangeDetector, DetectorState, DetectorStatus};
pub use convergence_gate::{check_convergence, GateVerdict};
pub use convergence_pipeline::{ConvergencePipeline, IterationReport, PipelineInputs};
pub use convergence_scorer::ConvergenceScorer;
pub use stability_scanner::{hash_file, FileStabilityScanner, ScanOutcome, HASH_CHUNK_SIZE};
