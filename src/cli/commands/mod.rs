//! CLI command implementations.

pub mod analyze;
pub mod changes;
pub mod check;
pub mod history;
pub mod init;
pub mod scan;
pub mod watch;
