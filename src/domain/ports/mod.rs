//! Port trait definitions (Hexagonal Architecture)
//!
//! Persistence interfaces the services depend on:
//! - HashHistoryRepository: append-only content-hash snapshots
//! - ConvergenceHistoryRepository: append-only convergence records
//! - ChangeStateRepository: the change detector's mtime snapshot and last diff
//!
//! The JSON file adapters live in `crate::adapters::json`; in-memory
//! implementations for tests live in `crate::adapters::memory`.

pub mod change_state_repository;
pub mod convergence_history_repository;
pub mod hash_history_repository;

pub use change_state_repository::ChangeStateRepository;
pub use convergence_history_repository::ConvergenceHistoryRepository;
pub use hash_history_repository::HashHistoryRepository;
