use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::agent::{default_roster, AgentConfig};

/// Main configuration structure for the convergence tracker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding the hash, convergence and change-detector state files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Weights and thresholds for the convergence score
    #[serde(default)]
    pub convergence_calculation: ConvergenceCalculationConfig,

    /// File stability scanner configuration
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Background change detector configuration
    #[serde(default)]
    pub change_detector: ChangeDetectorConfig,

    /// DMAIC phase agents and whether each one is enabled
    #[serde(default = "default_roster")]
    pub agents: Vec<AgentConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".dmaic")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            convergence_calculation: ConvergenceCalculationConfig::default(),
            scanner: ScannerConfig::default(),
            change_detector: ChangeDetectorConfig::default(),
            agents: default_roster(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Path of the append-only hash snapshot history.
    pub fn hash_history_path(&self) -> PathBuf {
        self.state_dir.join("hash_history.json")
    }

    /// Path of the append-only convergence metrics history.
    pub fn convergence_history_path(&self) -> PathBuf {
        self.state_dir.join("convergence_history.json")
    }

    /// Path of the change detector's mtime snapshot.
    pub fn background_snapshot_path(&self) -> PathBuf {
        self.state_dir.join("background_snapshot.json")
    }

    /// Path of the change detector's most recent diff.
    pub fn background_changes_path(&self) -> PathBuf {
        self.state_dir.join("background_changes.json")
    }
}

/// `convergence_calculation` section of the YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceCalculationConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub thresholds: MaturityThresholds,
}

/// Per-dimension weights. They must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ScoreWeights {
    #[serde(default = "default_file_stability_weight")]
    pub file_stability: f64,

    #[serde(default = "default_test_stability_weight")]
    pub test_stability: f64,

    #[serde(default = "default_metric_stability_weight")]
    pub metric_stability: f64,

    #[serde(default = "default_knowledge_growth_weight")]
    pub knowledge_growth: f64,

    #[serde(default = "default_zero_regressions_weight")]
    pub zero_regressions: f64,
}

const fn default_file_stability_weight() -> f64 {
    0.30
}

const fn default_test_stability_weight() -> f64 {
    0.25
}

const fn default_metric_stability_weight() -> f64 {
    0.20
}

const fn default_knowledge_growth_weight() -> f64 {
    0.15
}

const fn default_zero_regressions_weight() -> f64 {
    0.10
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            file_stability: default_file_stability_weight(),
            test_stability: default_test_stability_weight(),
            metric_stability: default_metric_stability_weight(),
            knowledge_growth: default_knowledge_growth_weight(),
            zero_regressions: default_zero_regressions_weight(),
        }
    }
}

impl ScoreWeights {
    /// Sum of all five weights.
    pub fn total(&self) -> f64 {
        self.file_stability
            + self.test_stability
            + self.metric_stability
            + self.knowledge_growth
            + self.zero_regressions
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.file_stability,
            self.test_stability,
            self.metric_stability,
            self.knowledge_growth,
            self.zero_regressions,
        ]
    }

    /// True when any weight is negative or not finite.
    pub fn has_invalid_component(&self) -> bool {
        self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0)
    }
}

/// Score thresholds for the maturity step function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct MaturityThresholds {
    #[serde(default = "default_converged_threshold")]
    pub converged: f64,

    #[serde(default = "default_stable_threshold")]
    pub stable: f64,

    #[serde(default = "default_developing_threshold")]
    pub developing: f64,
}

const fn default_converged_threshold() -> f64 {
    95.0
}

const fn default_stable_threshold() -> f64 {
    85.0
}

const fn default_developing_threshold() -> f64 {
    70.0
}

impl Default for MaturityThresholds {
    fn default() -> Self {
        Self {
            converged: default_converged_threshold(),
            stable: default_stable_threshold(),
            developing: default_developing_threshold(),
        }
    }
}

/// File stability scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ScannerConfig {
    /// Tracked file extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Path substrings that exclude a file from tracking
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// How many snapshots (the current one included) the baseline lies back
    #[serde(default = "default_baseline_window")]
    pub baseline_window: usize,
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_exclude() -> Vec<String> {
    ["__pycache__", ".venv", "venv", "node_modules", ".git", "output", "target"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_baseline_window() -> usize {
    3
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: default_exclude(),
            baseline_window: default_baseline_window(),
        }
    }
}

/// Background change detector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ChangeDetectorConfig {
    /// Seconds between polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Granularity of the interruptible sleep, in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Bounded wait for the poll loop to exit on stop
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,

    /// Directories (relative to the root) that are walked on each poll
    #[serde(default = "default_watch_dirs")]
    pub watch_dirs: Vec<String>,

    /// Extensions that are never recorded
    #[serde(default = "default_ignored_extensions")]
    pub ignored_extensions: Vec<String>,

    /// Maximum number of files visited per poll
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Minimum mtime difference, in seconds, that counts as a modification
    #[serde(default = "default_mtime_tolerance_secs")]
    pub mtime_tolerance_secs: f64,
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_tick_ms() -> u64 {
    1000
}

const fn default_join_timeout_secs() -> u64 {
    5
}

fn default_watch_dirs() -> Vec<String> {
    ["src", "tests", "scripts", "config", "docs"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_ignored_extensions() -> Vec<String> {
    [
        "pyc", "pyo", "so", "o", "a", "dll", "exe", "png", "jpg", "jpeg", "gif", "pdf", "zip",
        "gz",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

const fn default_max_files() -> usize {
    10_000
}

const fn default_mtime_tolerance_secs() -> f64 {
    1.0
}

impl Default for ChangeDetectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            tick_ms: default_tick_ms(),
            join_timeout_secs: default_join_timeout_secs(),
            watch_dirs: default_watch_dirs(),
            ignored_extensions: default_ignored_extensions(),
            max_files: default_max_files(),
            mtime_tolerance_secs: default_mtime_tolerance_secs(),
        }
    }
}

impl ChangeDetectorConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub const fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
