//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//!
//! Storage adapters satisfying the domain ports live in `crate::adapters`.

pub mod config;
pub mod logging;
