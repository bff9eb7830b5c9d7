//! Read-only verification of created links.

use log::warn;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::error::CoreError;
use crate::pipeline::context::JobHandle;
use crate::types::{AnalyzedClass, LinkType, Phase};
use crate::utils::config::ProgressConsts;

#[derive(Debug, Default)]
pub struct VerifyStats {
    pub files_verified: usize,
    pub verification_failed: usize,
}

/// Confirm each rewritten duplicate resolves to its class original: by
/// inode for hard links, by canonicalized target for soft links. Never
/// modifies the filesystem.
pub fn verify_classes(
    classes: &[&AnalyzedClass],
    link_type: LinkType,
    handle: &JobHandle,
    op_id: &str,
) -> Result<VerifyStats, CoreError> {
    let total_pairs: u64 = classes.iter().map(|c| c.members.len() as u64 - 1).sum();
    handle.begin_phase(Phase::Verifying, total_pairs);

    let mut stats = VerifyStats::default();
    let mut processed: u64 = 0;
    for class in classes {
        handle.checkpoint()?;
        let original = &class.members[0].path;
        let original_inode = match std::fs::metadata(original) {
            Ok(meta) => Some(meta.ino()),
            Err(err) => {
                warn!(
                    "[{op_id}] verify: cannot stat original {}: {err}",
                    original.display()
                );
                None
            }
        };

        for duplicate in &class.members[1..] {
            processed += 1;
            let ok = match (link_type, original_inode) {
                // Original gone: every link in the set fails verification.
                (_, None) => false,
                (LinkType::Hard, Some(inode)) => verify_hard(inode, &duplicate.path, op_id),
                (LinkType::Soft, Some(_)) => verify_soft(original, &duplicate.path, op_id),
            };
            if ok {
                stats.files_verified += 1;
            } else {
                stats.verification_failed += 1;
            }
            if processed % ProgressConsts::LINK_PAIR_INTERVAL == 0 || processed == total_pairs {
                handle.advance_to(processed);
                handle.set_detail(format!("verifying {processed}/{total_pairs}"));
            }
        }
    }
    Ok(stats)
}

/// A hard link must exist, be a regular file (not a symlink), and share the
/// original's inode.
fn verify_hard(original_inode: u64, duplicate: &Path, op_id: &str) -> bool {
    match std::fs::symlink_metadata(duplicate) {
        Ok(meta) => {
            let ok = meta.file_type().is_file() && meta.ino() == original_inode;
            if !ok {
                warn!(
                    "[{op_id}] verify failed (inode/type mismatch): {}",
                    duplicate.display()
                );
            }
            ok
        }
        Err(_) => {
            warn!("[{op_id}] verify failed (missing): {}", duplicate.display());
            false
        }
    }
}

/// A soft link must be a symlink whose target, resolved against the link's
/// directory, canonicalizes to the canonicalized original.
fn verify_soft(original: &Path, duplicate: &Path, op_id: &str) -> bool {
    let meta = match std::fs::symlink_metadata(duplicate) {
        Ok(meta) => meta,
        Err(_) => {
            warn!("[{op_id}] verify failed (missing): {}", duplicate.display());
            return false;
        }
    };
    if !meta.file_type().is_symlink() {
        warn!(
            "[{op_id}] verify failed (not a link): {}",
            duplicate.display()
        );
        return false;
    }
    let target = match std::fs::read_link(duplicate) {
        Ok(target) => target,
        Err(_) => return false,
    };
    let resolved = if target.is_absolute() {
        target
    } else {
        duplicate
            .parent()
            .unwrap_or(Path::new("."))
            .join(target)
    };
    match (resolved.canonicalize(), original.canonicalize()) {
        (Ok(a), Ok(b)) => {
            let ok = a == b;
            if !ok {
                warn!(
                    "[{op_id}] verify failed (target mismatch): {}",
                    duplicate.display()
                );
            }
            ok
        }
        _ => false,
    }
}
