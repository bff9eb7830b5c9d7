//! Engine module: hashing, memory watchdog, CLI, progress helpers.

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod memory;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use hashing::{full_hash, prefix_hash};
pub use memory::{check_memory, memory_used_percent};
pub use progress::SnapshotBar;
pub use tools::*;
