//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading with an optional `local.yaml` override
//! - Environment variable overrides (`DMAIC_` prefix)
//! - Strict validation, or per-section fallback to defaults

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, DEFAULT_CONFIG_PATH};
