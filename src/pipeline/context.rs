//! Shared job control and progress state threaded through the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::CoreError;
use crate::types::{JobStatus, Phase, ProgressSnapshot, percentage};
use crate::utils::config::ControlConsts;

/// Cancel/pause flags shared between the registry and a job's workers.
/// Both are cooperative: workers poll them at unit boundaries, never
/// mid-read of a file.
#[derive(Debug, Default)]
pub struct JobControl {
    cancel: AtomicBool,
    pause: AtomicBool,
}

impl JobControl {
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::Relaxed);
    }

    pub fn request_resume(&self) {
        self.pause.store(false, Ordering::Relaxed);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn pause_requested(&self) -> bool {
        self.pause.load(Ordering::Relaxed)
    }
}

/// Mutable progress record for one job. Workers mutate their own job's
/// record only; the registry takes cheap copies.
#[derive(Debug)]
pub struct JobProgress {
    pub status: JobStatus,
    pub phase: Phase,
    pub total_items: u64,
    pub processed_items: u64,
    pub detail: Option<String>,
}

impl JobProgress {
    fn new() -> Self {
        JobProgress {
            status: JobStatus::Queued,
            phase: Phase::Init,
            total_items: 0,
            processed_items: 0,
            detail: None,
        }
    }
}

/// Handle the pipeline uses to publish progress and honor cancel/pause.
/// Clones share the same underlying record.
#[derive(Clone)]
pub struct JobHandle {
    control: Arc<JobControl>,
    progress: Arc<Mutex<JobProgress>>,
}

impl JobHandle {
    pub fn new() -> Self {
        JobHandle {
            control: Arc::new(JobControl::default()),
            progress: Arc::new(Mutex::new(JobProgress::new())),
        }
    }

    pub fn control(&self) -> &JobControl {
        &self.control
    }

    /// Enter `phase` with a fresh counter.
    pub fn begin_phase(&self, phase: Phase, total: u64) {
        let mut p = self.progress.lock().unwrap();
        p.phase = phase;
        p.total_items = total;
        p.processed_items = 0;
        p.detail = None;
    }

    pub fn set_total(&self, total: u64) {
        self.progress.lock().unwrap().total_items = total;
    }

    pub fn advance_to(&self, processed: u64) {
        self.progress.lock().unwrap().processed_items = processed;
    }

    pub fn set_detail(&self, detail: String) {
        self.progress.lock().unwrap().detail = Some(detail);
    }

    pub fn set_status(&self, status: JobStatus) {
        self.progress.lock().unwrap().status = status;
    }

    /// Point-in-time copy. A requested-but-unobserved cancel surfaces as
    /// `cancelling` so callers see the request immediately.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let p = self.progress.lock().unwrap();
        let cancel_requested = self.control.cancel_requested();
        let status = if cancel_requested && !p.status.is_terminal() {
            JobStatus::Cancelling
        } else {
            p.status
        };
        ProgressSnapshot {
            status,
            phase: p.phase,
            total_items: p.total_items,
            processed_items: p.processed_items,
            percentage: percentage(status, p.phase, p.processed_items, p.total_items),
            paused: self.control.pause_requested() && !p.status.is_terminal(),
            cancel_requested,
            detail: p.detail.clone(),
        }
    }

    /// Cooperative cancel/pause point. Blocks while paused, sleeping with a
    /// small backoff; errors with [`CoreError::Cancelled`] on cancel.
    pub fn checkpoint(&self) -> Result<(), CoreError> {
        if self.control.cancel_requested() {
            return Err(CoreError::Cancelled);
        }
        if self.control.pause_requested() {
            self.set_status(JobStatus::Paused);
            while self.control.pause_requested() {
                if self.control.cancel_requested() {
                    return Err(CoreError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(ControlConsts::PAUSE_BACKOFF_MS));
            }
            self.set_status(JobStatus::Running);
        }
        Ok(())
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}
