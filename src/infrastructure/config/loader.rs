use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{
    ChangeDetectorConfig, Config, ConvergenceCalculationConfig, LoggingConfig, ScannerConfig,
};

/// Default project configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".dmaic/config.yaml";

/// Allowed deviation of the weight sum from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Configuration error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Unreadable(String),

    #[error("Invalid weights: must sum to 1.0, got {0}")]
    InvalidWeightSum(f64),

    #[error("Invalid weights: every weight must be a finite, non-negative number")]
    InvalidWeight,

    #[error(
        "Invalid thresholds: expected converged ({converged}) >= stable ({stable}) >= developing ({developing})"
    )]
    ThresholdsNotDescending {
        converged: f64,
        stable: f64,
        developing: f64,
    },

    #[error("Invalid threshold: {0}. Must be between 0 and 100")]
    ThresholdOutOfRange(f64),

    #[error("Invalid baseline_window: {0}. Must be at least 1")]
    InvalidBaselineWindow(usize),

    #[error("Scanner extensions cannot be empty")]
    EmptyExtensions,

    #[error("Invalid change detector setting: {0}")]
    InvalidDetector(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build the layered figment.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The config file (`.dmaic/config.yaml` unless `path` is given)
    /// 3. `local.yaml` next to it (optional developer overrides)
    /// 4. Environment variables (DMAIC_* prefix, `__` for nesting)
    pub fn figment(path: Option<&Path>) -> Figment {
        let config_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), Path::to_path_buf);
        let local_path = config_path
            .parent()
            .map_or_else(|| PathBuf::from("local.yaml"), |dir| dir.join("local.yaml"));

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_path))
            .merge(Yaml::file(local_path))
            .merge(Env::prefixed("DMAIC_").split("__"))
    }

    /// Load and validate configuration from the default location.
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment(None)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration without ever failing.
    ///
    /// An unreadable or malformed configuration yields the defaults. A section
    /// that fails validation is replaced by its defaults while valid sections
    /// are kept. Every fallback that was applied is returned so the caller can
    /// report it once logging is up.
    pub fn load_or_default(path: Option<&Path>) -> (Config, Vec<ConfigError>) {
        match Self::figment(path).extract::<Config>() {
            Ok(mut config) => {
                let fallbacks = Self::repair(&mut config);
                (config, fallbacks)
            }
            Err(err) => (
                Config::default(),
                vec![ConfigError::Unreadable(err.to_string())],
            ),
        }
    }

    /// Reset every invalid section to its defaults.
    fn repair(config: &mut Config) -> Vec<ConfigError> {
        let mut fallbacks = Vec::new();

        if let Err(err) = Self::validate_calculation(&config.convergence_calculation) {
            config.convergence_calculation = ConvergenceCalculationConfig::default();
            fallbacks.push(err);
        }
        if let Err(err) = Self::validate_scanner(&config.scanner) {
            config.scanner = ScannerConfig::default();
            fallbacks.push(err);
        }
        if let Err(err) = Self::validate_detector(&config.change_detector) {
            config.change_detector = ChangeDetectorConfig::default();
            fallbacks.push(err);
        }
        if let Err(err) = Self::validate_logging(&config.logging) {
            config.logging = LoggingConfig::default();
            fallbacks.push(err);
        }

        fallbacks
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_calculation(&config.convergence_calculation)?;
        Self::validate_scanner(&config.scanner)?;
        Self::validate_detector(&config.change_detector)?;
        Self::validate_logging(&config.logging)?;

        if config.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "state_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Weights must be non-negative and sum to 1.0; thresholds must lie in
    /// [0, 100] and be in descending order.
    pub fn validate_calculation(calculation: &ConvergenceCalculationConfig) -> Result<(), ConfigError> {
        let weights = &calculation.weights;
        if weights.has_invalid_component() {
            return Err(ConfigError::InvalidWeight);
        }

        let total = weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeightSum(total));
        }

        let t = &calculation.thresholds;
        for threshold in [t.converged, t.stable, t.developing] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ConfigError::ThresholdOutOfRange(threshold));
            }
        }

        if t.converged < t.stable || t.stable < t.developing {
            return Err(ConfigError::ThresholdsNotDescending {
                converged: t.converged,
                stable: t.stable,
                developing: t.developing,
            });
        }

        Ok(())
    }

    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.baseline_window == 0 {
            return Err(ConfigError::InvalidBaselineWindow(scanner.baseline_window));
        }
        if scanner.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::EmptyExtensions);
        }
        Ok(())
    }

    fn validate_detector(detector: &ChangeDetectorConfig) -> Result<(), ConfigError> {
        if detector.interval_secs == 0 {
            return Err(ConfigError::InvalidDetector(
                "interval_secs must be at least 1".to_string(),
            ));
        }
        if detector.tick_ms == 0 {
            return Err(ConfigError::InvalidDetector(
                "tick_ms must be at least 1".to_string(),
            ));
        }
        if detector.max_files == 0 {
            return Err(ConfigError::InvalidDetector(
                "max_files must be at least 1".to_string(),
            ));
        }
        if !detector.mtime_tolerance_secs.is_finite() || detector.mtime_tolerance_secs < 0.0 {
            return Err(ConfigError::InvalidDetector(format!(
                "mtime_tolerance_secs must be non-negative, got {}",
                detector.mtime_tolerance_secs
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(logging.rotation.clone()));
        }

        Ok(())
    }

    /// Write the default configuration as YAML.
    ///
    /// Returns `false` without touching the file if it exists and `force` is not set.
    pub fn write_default(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(&Config::default())
            .context("Failed to serialize default configuration")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{MaturityThresholds, ScoreWeights};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        let weights = config.convergence_calculation.weights;
        assert!((weights.file_stability - 0.30).abs() < f64::EPSILON);
        assert!((weights.zero_regressions - 0.10).abs() < f64::EPSILON);
        assert!((config.convergence_calculation.thresholds.converged - 95.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_load_from_file() {
        let file = yaml_file(
            r"
convergence_calculation:
  weights:
    file_stability: 0.4
    test_stability: 0.2
    metric_stability: 0.2
    knowledge_growth: 0.1
    zero_regressions: 0.1
  thresholds:
    converged: 90.0
    stable: 80.0
    developing: 60.0
",
        );

        let config = ConfigLoader::load_from_file(file.path()).expect("config should load");
        assert!((config.convergence_calculation.weights.file_stability - 0.4).abs() < f64::EPSILON);
        assert!((config.convergence_calculation.thresholds.developing - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_file_rejects_bad_weights() {
        let file = yaml_file(
            r"
convergence_calculation:
  weights:
    file_stability: 0.9
",
        );
        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_validate_weight_sum() {
        let calculation = ConvergenceCalculationConfig {
            weights: ScoreWeights {
                file_stability: 0.5,
                ..ScoreWeights::default()
            },
            ..Default::default()
        };
        match ConfigLoader::validate_calculation(&calculation) {
            Err(ConfigError::InvalidWeightSum(total)) => assert!((total - 1.2).abs() < 1e-9),
            other => panic!("Expected InvalidWeightSum, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_negative_weight() {
        let calculation = ConvergenceCalculationConfig {
            weights: ScoreWeights {
                file_stability: -0.1,
                test_stability: 0.65,
                ..ScoreWeights::default()
            },
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::validate_calculation(&calculation),
            Err(ConfigError::InvalidWeight)
        );
    }

    #[test]
    fn test_validate_thresholds_order() {
        let calculation = ConvergenceCalculationConfig {
            thresholds: MaturityThresholds {
                converged: 80.0,
                stable: 85.0,
                developing: 70.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate_calculation(&calculation),
            Err(ConfigError::ThresholdsNotDescending { .. })
        ));
    }

    #[test]
    fn test_validate_threshold_range() {
        let calculation = ConvergenceCalculationConfig {
            thresholds: MaturityThresholds {
                converged: 120.0,
                ..MaturityThresholds::default()
            },
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::validate_calculation(&calculation),
            Err(ConfigError::ThresholdOutOfRange(120.0))
        );
    }

    #[test]
    fn test_validate_zero_baseline_window() {
        let mut config = Config::default();
        config.scanner.baseline_window = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBaselineWindow(0))
        );
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_zero_tick() {
        let mut config = Config::default();
        config.change_detector.tick_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDetector(_))
        ));
    }

    #[test]
    fn test_lenient_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        temp_env::with_var_unset("DMAIC_STATE_DIR", || {
            let (config, fallbacks) = ConfigLoader::load_or_default(Some(&path));
            assert!(fallbacks.is_empty());
            assert_eq!(
                config.convergence_calculation,
                ConvergenceCalculationConfig::default()
            );
        });
    }

    #[test]
    fn test_lenient_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "convergence_calculation: [not, a, map]\n").unwrap();

        temp_env::with_var_unset("DMAIC_STATE_DIR", || {
            let (config, fallbacks) = ConfigLoader::load_or_default(Some(&path));
            assert_eq!(config, Config::default());
            assert!(matches!(fallbacks.as_slice(), [ConfigError::Unreadable(_)]));
        });
    }

    #[test]
    fn test_lenient_invalid_section_falls_back_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r"
convergence_calculation:
  weights:
    file_stability: 0.9
scanner:
  extensions: [rs]
",
        )
        .unwrap();

        temp_env::with_var_unset("DMAIC_STATE_DIR", || {
            let (config, fallbacks) = ConfigLoader::load_or_default(Some(&path));
            assert_eq!(
                config.convergence_calculation,
                ConvergenceCalculationConfig::default()
            );
            assert_eq!(config.scanner.extensions, vec!["rs"]);
            assert_eq!(fallbacks.len(), 1);
            assert!(matches!(fallbacks[0], ConfigError::InvalidWeightSum(_)));
        });
    }

    #[test]
    fn test_local_override_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "logging:\n  level: info\n  format: json\n").unwrap();
        std::fs::write(dir.path().join("local.yaml"), "logging:\n  level: debug\n").unwrap();

        temp_env::with_var_unset("DMAIC_LOGGING__LEVEL", || {
            let (config, _) = ConfigLoader::load_or_default(Some(&path));
            assert_eq!(config.logging.level, "debug", "Override should win");
            assert_eq!(config.logging.format, "json", "Base value should persist");
        });
    }

    #[test]
    fn test_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        temp_env::with_vars(
            [
                ("DMAIC_CONVERGENCE_CALCULATION__THRESHOLDS__CONVERGED", Some("90.0")),
                ("DMAIC_STATE_DIR", Some("/tmp/dmaic-state")),
            ],
            || {
                let (config, fallbacks) = ConfigLoader::load_or_default(Some(&path));
                assert!(fallbacks.is_empty());
                assert!(
                    (config.convergence_calculation.thresholds.converged - 90.0).abs()
                        < f64::EPSILON
                );
                assert_eq!(config.state_dir, PathBuf::from("/tmp/dmaic-state"));
            },
        );
    }

    #[test]
    fn test_write_default_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".dmaic").join("config.yaml");

        assert!(ConfigLoader::write_default(&path, false).unwrap());
        std::fs::write(&path, "state_dir: custom\n").unwrap();
        assert!(!ConfigLoader::write_default(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "state_dir: custom\n");

        assert!(ConfigLoader::write_default(&path, true).unwrap());
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config, Config::default());
    }
}
