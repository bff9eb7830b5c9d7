//! Path, filter, and formatting utilities.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

/// Human-readable byte count on the 1024 ladder ("5.00 Bytes", "1.50 MB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    format!("{:.2} {}", value, UNITS[idx])
}

/// Normalize ignore extensions: leading dot ensured, lowercased, blanks
/// dropped.
pub fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty() && e != ".")
        .map(|e| {
            if e.starts_with('.') {
                e
            } else {
                format!(".{e}")
            }
        })
        .collect()
}

/// Case-insensitive suffix match against normalized extensions.
pub fn has_ignored_ext(path: &Path, ignore_exts: &[String]) -> bool {
    if ignore_exts.is_empty() {
        return false;
    }
    let lower = path.to_string_lossy().to_lowercase();
    ignore_exts.iter().any(|ext| lower.ends_with(ext.as_str()))
}

/// Basename match for directories pruned from the walk.
pub fn is_ignored_dir(name: &OsStr, ignore_dirs: &[String]) -> bool {
    match name.to_str() {
        Some(n) => ignore_dirs.iter().any(|d| d == n),
        None => false,
    }
}

/// Canonicalize scan roots up front. Every root must be an existing,
/// readable directory; anything else fails the job before it starts.
pub fn check_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, CoreError> {
    if roots.is_empty() {
        return Err(CoreError::InvariantViolation(
            "at least one scan root is required".to_string(),
        ));
    }
    roots
        .iter()
        .map(|root| {
            let canonical = root
                .canonicalize()
                .map_err(|e| CoreError::from_io(root, e))?;
            if !canonical.is_dir() {
                return Err(CoreError::InvariantViolation(format!(
                    "scan root is not a directory: {}",
                    root.display()
                )));
            }
            Ok(canonical)
        })
        .collect()
}

/// True if the process is running with effective uid 0 (e.g. via sudo).
#[cfg(unix)]
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

/// Setup Ctrl+C handler and return a shared boolean indicating if the user
/// has requested cancellation.
pub fn setup_ctrlc_handler() -> Result<Arc<AtomicBool>> {
    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);

    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;
    Ok(cancel_requested)
}
