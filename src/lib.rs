//! Dupelink: duplicate file finder with hard/soft link rewriting.
//!
//! The core is a multi-phase pipeline (walk → size grouping → prefix hash →
//! full hash → class analysis → optional link rewrite → verification)
//! wrapped by a [`JobRegistry`] that external callers submit to and poll.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod types;
pub mod utils;

pub use error::CoreError;
pub use registry::{JobOutcome, JobRegistry};

/// Re-export types for API
pub use types::*;

/// Run one scan synchronously and return its result.
///
/// Convenience wrapper over [`JobRegistry`] for callers that do not need
/// progress polling or cancellation. Dry-run raw classes are discarded with
/// the throwaway registry; use a registry directly when a link operation
/// should follow.
pub fn scan(request: &ScanRequest) -> anyhow::Result<ScanResult> {
    let registry = JobRegistry::new();
    let scan_id = registry.submit_scan(request.clone())?;
    registry.wait(&scan_id);
    match registry.result(&scan_id) {
        JobOutcome::Scan(result) => Ok(result),
        _ => anyhow::bail!("scan {scan_id} produced no result"),
    }
}
