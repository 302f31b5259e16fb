//! Persistence adapters implementing the domain ports.

pub mod json;
pub mod memory;

pub use json::{
    JsonChangeStateRepository, JsonConvergenceHistoryRepository, JsonHashHistoryRepository,
};
pub use memory::{
    InMemoryChangeStateRepository, InMemoryConvergenceHistoryRepository,
    InMemoryHashHistoryRepository,
};
