//! Link rewrite: replace duplicate files with hard or symbolic links.
//!
//! Single-threaded on purpose: the filesystem is the serialization point
//! and no two writes may overlap. Per-pair failures are counted and logged;
//! the loop never aborts the job.

use log::{error, info, warn};
use std::path::Path;

use crate::error::CoreError;
use crate::pipeline::context::JobHandle;
use crate::types::{AnalyzedClass, LinkType, Phase};
use crate::utils::config::ProgressConsts;

#[derive(Debug, Default)]
pub struct LinkStats {
    pub files_linked: usize,
    pub files_failed: usize,
}

/// Classes eligible for rewriting, in report order: two or more members
/// that do not all share one inode, optionally restricted to
/// `selected` indices into the full sorted class list.
pub fn linkable_classes<'a>(
    classes: &'a [AnalyzedClass],
    selected: Option<&[u32]>,
) -> Vec<&'a AnalyzedClass> {
    classes
        .iter()
        .enumerate()
        .filter(|(idx, class)| {
            !class.already_linked
                && selected.is_none_or(|sel| sel.contains(&(*idx as u32)))
        })
        .map(|(_, class)| class)
        .collect()
}

/// Rewrite every duplicate in `classes` as a link to its class's first
/// member. Cancel/pause are honored between classes.
pub fn link_classes(
    classes: &[&AnalyzedClass],
    link_type: LinkType,
    handle: &JobHandle,
    op_id: &str,
) -> Result<LinkStats, CoreError> {
    let total_pairs: u64 = classes.iter().map(|c| c.members.len() as u64 - 1).sum();
    handle.begin_phase(Phase::Linking, total_pairs);
    info!(
        "[{op_id}] {} {} sets ({} links)",
        link_type.op_name(),
        classes.len(),
        total_pairs
    );

    let mut stats = LinkStats::default();
    let mut attempted: u64 = 0;
    for class in classes {
        handle.checkpoint()?;
        let original = &class.members[0].path;
        for duplicate in &class.members[1..] {
            attempted += 1;
            match link_pair(original, &duplicate.path, link_type) {
                Ok(()) => stats.files_linked += 1,
                Err(err) => {
                    stats.files_failed += 1;
                    error!(
                        "[{op_id}] failed to link {} -> {}: {err}",
                        duplicate.path.display(),
                        original.display()
                    );
                }
            }
            if attempted % ProgressConsts::LINK_PAIR_INTERVAL == 0 || attempted == total_pairs {
                handle.advance_to(attempted);
                handle.set_detail(format!(
                    "{} {attempted}/{total_pairs}",
                    link_type.op_name()
                ));
            }
        }
    }

    info!(
        "[{op_id}] {} complete: linked {}, failed {}",
        link_type.op_name(),
        stats.files_linked,
        stats.files_failed
    );
    Ok(stats)
}

/// Replace one duplicate with a link to `original`: unlink, then link. A
/// duplicate already gone is a warning, not a failure; a missing original
/// fails the pair.
fn link_pair(original: &Path, duplicate: &Path, link_type: LinkType) -> Result<(), CoreError> {
    if !original.exists() {
        return Err(CoreError::PathNotFound(original.to_path_buf()));
    }
    // symlink_metadata also sees broken symlinks sitting at the path.
    match std::fs::symlink_metadata(duplicate) {
        Ok(_) => {
            std::fs::remove_file(duplicate).map_err(|e| CoreError::from_io(duplicate, e))?;
        }
        Err(_) => {
            warn!(
                "duplicate did not exist before linking: {}",
                duplicate.display()
            );
        }
    }
    let result = match link_type {
        LinkType::Hard => std::fs::hard_link(original, duplicate),
        LinkType::Soft => std::os::unix::fs::symlink(original, duplicate),
    };
    result.map_err(|err| {
        if err.raw_os_error() == Some(libc::EXDEV) {
            CoreError::CrossDevice {
                original: original.to_path_buf(),
                duplicate: duplicate.to_path_buf(),
            }
        } else {
            CoreError::from_io(duplicate, err)
        }
    })
}
