//! Load `.dupelink.toml` from the first scan root (CLI only). Lib callers
//! inject settings through `ScanRequest` directly.

use serde::Deserialize;
use std::path::Path;

use crate::types::ScanRequest;

#[derive(Debug, Deserialize)]
pub(crate) struct DupelinkToml {
    #[serde(default)]
    scan: ScanSection,
}

#[derive(Debug, Default, Deserialize)]
struct ScanSection {
    ignore_dirs: Option<Vec<String>>,
    ignore_exts: Option<Vec<String>>,
    min_file_size: Option<u64>,
    save_auto: Option<bool>,
    verbose: Option<bool>,
}

/// Load `.dupelink.toml` from `dir` if present. Returns None if the file is
/// missing or unreadable. CLI only.
pub(crate) fn load_dupelink_toml(dir: &Path) -> Option<DupelinkToml> {
    let path = dir.join(".dupelink.toml");
    let s = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

impl DupelinkToml {
    /// Verbose default from the file, when set.
    pub(crate) fn verbose(&self) -> Option<bool> {
        self.scan.verbose
    }
}

/// Overwrite request field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $request:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $request.$field = v;
        }
    };
}

/// Apply file config to a request (only fields present in the file). Call
/// before applying CLI flags so flags win.
pub(crate) fn apply_file_to_request(file: &DupelinkToml, request: &mut ScanRequest) {
    let scan = &file.scan;
    if let Some(ref dirs) = scan.ignore_dirs {
        request.ignore_dirs = dirs.clone();
    }
    if let Some(ref exts) = scan.ignore_exts {
        request.ignore_exts = exts.clone();
    }
    apply_file_opt!(scan, request, min_file_size);
    apply_file_opt!(scan, request, save_auto);
}
