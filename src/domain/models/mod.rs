pub mod agent;
pub mod change;
pub mod config;
pub mod convergence;
pub mod snapshot;

pub use agent::{Agent, AgentConfig, AgentOutcome, AgentRoster, AgentState, DmaicPhase};
pub use change::{
    diff_snapshots, ChangeEntry, ChangeRecord, ChangeSummary, ChangeType, MtimeSnapshot,
};
pub use config::{
    ChangeDetectorConfig, Config, ConvergenceCalculationConfig, LoggingConfig,
    MaturityThresholds, ScannerConfig, ScoreWeights,
};
pub use convergence::{
    ConvergenceInputs, ConvergenceMetrics, ConvergenceTrend, MaturityLevel, StabilityRatio,
};
pub use snapshot::{FileHash, HashSnapshot};
