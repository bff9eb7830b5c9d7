//! Candidate bucketing between pipeline stages.
//!
//! Each stage folds its survivors into finer-keyed buckets and drops
//! singletons: a file alone in its bucket cannot have a duplicate. Device
//! is always part of the key so no class ever spans filesystems.

use std::collections::HashMap;
use std::hash::Hash;

use crate::pipeline::hash_pool::HashedEntry;
use crate::types::FileEntry;

/// A surviving `(device, size, full_hash)` group, two or more members.
pub struct RawClass {
    pub device: u64,
    pub size: u64,
    pub hash: u64,
    pub members: Vec<FileEntry>,
}

fn retain_multi<K: Eq + Hash, V>(map: HashMap<K, Vec<V>>) -> Vec<(K, Vec<V>)> {
    map.into_iter().filter(|(_, v)| v.len() >= 2).collect()
}

/// Fold walker output into `(device, size)` buckets; singletons dropped.
pub fn group_by_size(entries: Vec<FileEntry>) -> Vec<Vec<FileEntry>> {
    let mut by_size: HashMap<(u64, u64), Vec<FileEntry>> = HashMap::new();
    for entry in entries {
        by_size
            .entry((entry.device, entry.size))
            .or_default()
            .push(entry);
    }
    retain_multi(by_size).into_iter().map(|(_, v)| v).collect()
}

/// Fold prefix-hashed survivors into `(device, size, prefix_hash)` buckets;
/// singletons dropped. The prefix hash itself is not carried further.
pub fn group_by_prefix(hashed: Vec<HashedEntry>) -> Vec<Vec<FileEntry>> {
    let mut by_prefix: HashMap<(u64, u64, u64), Vec<FileEntry>> = HashMap::new();
    for HashedEntry { entry, hash } in hashed {
        by_prefix
            .entry((entry.device, entry.size, hash))
            .or_default()
            .push(entry);
    }
    retain_multi(by_prefix)
        .into_iter()
        .map(|(_, v)| v)
        .collect()
}

/// Fold fully-hashed survivors into `(device, size, full_hash)` equivalence
/// groups; singletons dropped, hash kept for reporting.
pub fn group_by_content(hashed: Vec<HashedEntry>) -> Vec<RawClass> {
    let mut by_hash: HashMap<(u64, u64, u64), Vec<FileEntry>> = HashMap::new();
    for HashedEntry { entry, hash } in hashed {
        by_hash
            .entry((entry.device, entry.size, hash))
            .or_default()
            .push(entry);
    }
    retain_multi(by_hash)
        .into_iter()
        .map(|((device, size, hash), members)| RawClass {
            device,
            size,
            hash,
            members,
        })
        .collect()
}
