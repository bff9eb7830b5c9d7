//! Root walking: enumerate candidate regular files with size, inode, device.

use log::{debug, warn};
use std::collections::HashSet;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::engine::memory::check_memory;
use crate::engine::tools::{has_ignored_ext, is_ignored_dir};
use crate::error::CoreError;
use crate::pipeline::context::JobHandle;
use crate::types::FileEntry;
use crate::utils::config::{MemoryConsts, ProgressConsts};

/// Filters applied during the walk, pre-normalized by the orchestrator.
pub struct WalkFilters<'a> {
    /// Directory basenames pruned from descent.
    pub ignore_dirs: &'a [String],
    /// Lowercased, dot-prefixed extension suffixes.
    pub ignore_exts: &'a [String],
    /// Files below this never become candidates. 0 disables.
    pub min_file_size: u64,
}

pub struct WalkOutput {
    /// Candidate entries: regular files at or above the size floor.
    pub entries: Vec<FileEntry>,
    /// Candidate files counted exactly once across all roots.
    pub files_found: u64,
    /// Total bytes of those files; becomes the result's `before_size`.
    pub bytes_scanned: u64,
    /// Entries skipped because they could not be read.
    pub skipped: u64,
}

/// Walk each root depth-first without following symlinks, collecting one
/// [`FileEntry`] per acceptable regular file. Roots are visited in order;
/// a path reachable from two overlapping roots is emitted once.
///
/// Per-entry read errors are warnings; an unreadable root fails the walk.
pub fn walk_roots(
    roots: &[PathBuf],
    filters: &WalkFilters,
    handle: &JobHandle,
    job_id: &str,
) -> Result<WalkOutput, CoreError> {
    let mut out = WalkOutput {
        entries: Vec::new(),
        files_found: 0,
        bytes_scanned: 0,
        skipped: 0,
    };
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for root in roots {
        walk_one_root(root, filters, handle, job_id, &mut seen, &mut out)?;
    }

    handle.set_total(out.files_found);
    handle.advance_to(out.files_found);
    handle.set_detail("directory scan complete".to_string());
    debug!(
        "[{job_id}] walk done: {} files, {} candidates, {} skipped",
        out.files_found,
        out.entries.len(),
        out.skipped
    );
    Ok(out)
}

fn walk_one_root(
    root: &Path,
    filters: &WalkFilters,
    handle: &JobHandle,
    job_id: &str,
    seen: &mut HashSet<PathBuf>,
    out: &mut WalkOutput,
) -> Result<(), CoreError> {
    let ignore_dirs = filters.ignore_dirs;
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_ignored_dir(e.file_name(), ignore_dirs)));

    for outcome in walker {
        handle.checkpoint()?;
        let entry = match outcome {
            Ok(entry) => entry,
            Err(err) => {
                // An unreadable root means the whole job cannot proceed.
                if err.depth() == 0 {
                    let io_err = std::io::Error::from(err);
                    return Err(CoreError::from_io(root, io_err));
                }
                warn!("[{job_id}] cannot access path: {err}");
                out.skipped += 1;
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_symlink() || !file_type.is_file() {
            continue;
        }
        if has_ignored_ext(entry.path(), filters.ignore_exts) {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                warn!("[{job_id}] cannot stat {}: {err}", entry.path().display());
                out.skipped += 1;
                continue;
            }
        };

        let size = meta.len();
        if size == 0 || size < filters.min_file_size {
            continue;
        }
        let path = entry.into_path();
        // Count after the dedup gate so a file reachable from two
        // overlapping roots contributes to the totals exactly once.
        if !seen.insert(path.clone()) {
            continue;
        }
        out.files_found += 1;
        out.bytes_scanned += size;
        handle.advance_to(out.files_found);

        if out.files_found % ProgressConsts::WALK_DETAIL_INTERVAL == 0 {
            let dir = path.parent().unwrap_or(root);
            handle.set_detail(format!(
                "found {} files, scanning {}",
                out.files_found,
                dir.display()
            ));
        }
        if out.files_found % MemoryConsts::CHECK_INTERVAL_FILES == 0 {
            check_memory(job_id)?;
        }

        let mtime_ns = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as i64);
        out.entries.push(FileEntry {
            path,
            size,
            inode: meta.ino(),
            device: meta.dev(),
            mtime_ns,
        });
    }
    Ok(())
}
