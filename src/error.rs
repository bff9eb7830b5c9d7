//! Error kinds for scan and link jobs.
//!
//! Per-file and per-pair kinds are counted and logged where they occur and
//! never abort a job; the fatal kinds terminate the pipeline and fail the
//! job with a populated error string.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CoreError {
    /// A path (scan root, or a linked original) does not exist.
    PathNotFound(PathBuf),
    /// A scan root or file is not readable.
    PermissionDenied(PathBuf),
    /// Per-file I/O failure; the file is dropped from consideration.
    Io { path: PathBuf, source: io::Error },
    /// Hard link creation crossed a filesystem boundary (per-pair).
    CrossDevice {
        original: PathBuf,
        duplicate: PathBuf,
    },
    /// System memory use crossed the abort threshold.
    OutOfMemory { used_percent: f64 },
    /// The job observed a cancel request. Terminal but not an error.
    Cancelled,
    /// A caller broke an API precondition (e.g. linking a non-dry-run scan).
    InvariantViolation(String),
}

impl CoreError {
    /// Map a per-path `io::Error` to the matching kind.
    pub fn from_io(path: &Path, err: io::Error) -> CoreError {
        match err.kind() {
            io::ErrorKind::NotFound => CoreError::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::PathNotFound(p) => write!(f, "path not found: {}", p.display()),
            CoreError::PermissionDenied(p) => write!(f, "permission denied: {}", p.display()),
            CoreError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            CoreError::CrossDevice {
                original,
                duplicate,
            } => write!(
                f,
                "cannot hard link across devices: {} -> {}",
                duplicate.display(),
                original.display()
            ),
            CoreError::OutOfMemory { used_percent } => write!(
                f,
                "memory usage at {used_percent:.0}% of system memory, aborting"
            ),
            CoreError::Cancelled => write!(f, "cancelled by user"),
            CoreError::InvariantViolation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
