//! Bounded worker pool for the prefix and full hash stages.
//!
//! Topology: a feeder thread pushes entries into a bounded channel, `W`
//! workers hash and send results back, and the calling thread folds results
//! and owns the progress counter. Workers observe cancel/pause between
//! files, never mid-read.

use crossbeam_channel::{Receiver, Sender, bounded};
use log::warn;
use std::io;
use std::path::Path;
use std::thread::{self, JoinHandle};

use crate::error::CoreError;
use crate::pipeline::context::JobHandle;
use crate::types::FileEntry;
use crate::utils::config::WorkerLimits;

/// A file together with the digest one stage computed for it.
pub struct HashedEntry {
    pub entry: FileEntry,
    pub hash: u64,
}

/// Output of one hash stage: survivors plus the count of files dropped on
/// read errors.
pub struct HashStageOutput {
    pub hashed: Vec<HashedEntry>,
    pub failed: u64,
}

/// Fan `entries` out to `workers` threads running `hash_fn`. Files that
/// fail to hash are dropped with a warning; the group they came from
/// survives if at least two members remain. Completion order inside a
/// bucket is irrelevant, so results are folded as they arrive.
pub fn run_hash_stage(
    entries: Vec<FileEntry>,
    workers: usize,
    handle: &JobHandle,
    progress_interval: u64,
    label: &str,
    hash_fn: fn(&Path) -> io::Result<u64>,
) -> Result<HashStageOutput, CoreError> {
    let total = entries.len() as u64;
    let (task_tx, task_rx) = bounded::<FileEntry>(WorkerLimits::CHANNEL_CAP);
    let (result_tx, result_rx) = bounded::<(FileEntry, io::Result<u64>)>(WorkerLimits::CHANNEL_CAP);

    let worker_handles: Vec<JoinHandle<()>> = (0..workers.max(1))
        .map(|_| {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let worker_handle = handle.clone();
            thread::spawn(move || hash_worker_loop(task_rx, result_tx, worker_handle, hash_fn))
        })
        .collect();
    drop(task_rx);
    drop(result_tx);

    // Feeder thread so this thread can drain results concurrently. Its send
    // fails once all workers are gone, which unblocks a cancelled stage.
    let feeder = thread::spawn(move || {
        for entry in entries {
            if task_tx.send(entry).is_err() {
                break;
            }
        }
    });

    let mut out = HashStageOutput {
        hashed: Vec::new(),
        failed: 0,
    };
    let mut done: u64 = 0;
    for (entry, result) in result_rx.iter() {
        done += 1;
        match result {
            Ok(hash) => out.hashed.push(HashedEntry { entry, hash }),
            Err(err) => {
                out.failed += 1;
                warn!("could not hash {}: {err}", entry.path.display());
            }
        }
        if done % progress_interval == 0 || done == total {
            handle.advance_to(done);
            handle.set_detail(format!("{label} {done}/{total}"));
        }
    }

    let _ = feeder.join();
    for h in worker_handles {
        let _ = h.join();
    }
    // A cancel observed by the workers surfaces here on the job thread.
    handle.checkpoint()?;
    Ok(out)
}

fn hash_worker_loop(
    task_rx: Receiver<FileEntry>,
    result_tx: Sender<(FileEntry, io::Result<u64>)>,
    handle: JobHandle,
    hash_fn: fn(&Path) -> io::Result<u64>,
) {
    while let Ok(entry) = task_rx.recv() {
        if handle.checkpoint().is_err() {
            break;
        }
        let result = hash_fn(&entry.path);
        if result_tx.send((entry, result)).is_err() {
            break;
        }
    }
}
