//! Class validation, already-linked detection, and savings accounting.

use log::warn;
use rayon::prelude::*;
use std::collections::HashSet;
use std::os::unix::fs::MetadataExt;

use crate::error::CoreError;
use crate::pipeline::buckets::RawClass;
use crate::pipeline::context::JobHandle;
use crate::types::{AnalyzedClass, ClassMember, Phase};

/// Analyzed classes plus their aggregates.
pub struct ClassReport {
    pub classes: Vec<AnalyzedClass>,
    pub total_sets: usize,
    pub already_linked_sets: usize,
    pub potential_savings: u64,
}

/// Revalidate every candidate class against the live filesystem and put the
/// survivors in a stable order.
///
/// Members are re-`lstat`ed: anything that vanished or stopped being a
/// regular file during the scan is dropped, and a class keeping fewer than
/// two members is discarded. A class whose members all share one inode is
/// flagged `already_linked` and contributes no savings. Members sort by
/// path (the first becomes the link original) and classes sort by their
/// first member's path, so results and selection indices are reproducible.
pub fn analyze_classes(raw: Vec<RawClass>, handle: &JobHandle) -> Result<ClassReport, CoreError> {
    handle.begin_phase(Phase::Analyzing, raw.len() as u64);
    handle.checkpoint()?;

    let mut classes: Vec<AnalyzedClass> = raw.into_par_iter().filter_map(revalidate_class).collect();
    classes.sort_by(|a, b| a.members[0].path.cmp(&b.members[0].path));

    handle.checkpoint()?;
    handle.advance_to(classes.len() as u64);

    let total_sets = classes.len();
    let already_linked_sets = classes.iter().filter(|c| c.already_linked).count();
    let potential_savings = classes.iter().map(AnalyzedClass::savings).sum();

    Ok(ClassReport {
        classes,
        total_sets,
        already_linked_sets,
        potential_savings,
    })
}

fn revalidate_class(raw: RawClass) -> Option<AnalyzedClass> {
    let mut members = Vec::with_capacity(raw.members.len());
    let mut inodes: HashSet<u64> = HashSet::new();

    for entry in raw.members {
        let meta = match std::fs::symlink_metadata(&entry.path) {
            Ok(meta) => meta,
            Err(err) => {
                warn!("cannot stat {} during analysis: {err}", entry.path.display());
                continue;
            }
        };
        if !meta.file_type().is_file() {
            warn!(
                "skipping {} during analysis: no longer a regular file",
                entry.path.display()
            );
            continue;
        }
        inodes.insert(meta.ino());
        members.push(ClassMember {
            path: entry.path,
            inode: meta.ino(),
            hash: raw.hash,
        });
    }

    if members.len() < 2 {
        return None;
    }
    members.sort_by(|a, b| a.path.cmp(&b.path));
    Some(AnalyzedClass {
        device: raw.device,
        size: raw.size,
        hash: raw.hash,
        members,
        already_linked: inodes.len() == 1,
    })
}
