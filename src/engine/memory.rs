//! System memory watchdog for long scans.

use log::warn;
use sysinfo::System;

use crate::error::CoreError;
use crate::utils::config::MemoryConsts;

/// Percent of system memory currently in use.
pub fn memory_used_percent() -> f64 {
    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return 0.0;
    }
    (sys.used_memory() as f64 / total as f64) * 100.0
}

/// Warn above the soft threshold; error out above the abort threshold so a
/// runaway scan cannot take the machine down with it.
pub fn check_memory(job_id: &str) -> Result<f64, CoreError> {
    let pct = memory_used_percent();
    if pct > MemoryConsts::ABORT_PERCENT {
        return Err(CoreError::OutOfMemory { used_percent: pct });
    }
    if pct > MemoryConsts::WARN_PERCENT {
        warn!("[{job_id}] high memory usage ({pct:.0}%), efficiency may decrease");
    }
    Ok(pct)
}
