//! Write the finished scan result next to the scanned tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::ScanResult;

/// Autosave file name for a finished scan.
pub fn autosave_filename(scan_id: &str) -> String {
    format!("scan_results_{scan_id}.json")
}

fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan_results.json".to_string());
    final_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Serialize `result` as pretty JSON into `dir`, writing a temp sibling and
/// renaming it over the final name so readers never see a partial file.
/// Returns the final path.
pub fn save_scan_result(result: &ScanResult, dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        anyhow::bail!(
            "autosave: output directory {} does not exist or is not accessible",
            dir.display()
        );
    }
    let final_path = dir.join(autosave_filename(&result.scan_id));
    let temp_path = temp_path_for(&final_path);

    let json = serde_json::to_string_pretty(result).context("serialize scan result")?;
    fs::write(&temp_path, json)
        .with_context(|| format!("write temp results to {}", temp_path.display()))?;
    fs::rename(&temp_path, &final_path).with_context(|| {
        format!(
            "rename temp results to final path ({} -> {})",
            temp_path.display(),
            final_path.display()
        )
    })?;
    Ok(final_path)
}
