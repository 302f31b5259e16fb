//! Domain layer for the DMAIC convergence tracker
//!
//! This module contains the core models, the repository ports the services
//! depend on, and the domain error type.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
