pub mod autosave;
pub mod config;
pub mod config_file;
pub mod logger;

pub use autosave::{autosave_filename, save_scan_result};
pub use config::*;
pub use logger::setup_logging;
