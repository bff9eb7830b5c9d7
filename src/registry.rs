//! In-memory registry of scan and link jobs.
//!
//! The registry is the only part of the core visible to external
//! collaborators (CLI, HTTP surface, tests). Each job record carries its
//! own control flags and progress lock, so snapshots are cheap copies and
//! workers only ever touch their own record.

use anyhow::Result;
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::CoreError;
use crate::pipeline::context::JobHandle;
use crate::pipeline::orchestrator::{run_link_job, run_scan_job};
use crate::types::{
    AnalyzedClass, JobStatus, LinkRequest, LinkResult, ProgressSnapshot, ScanRequest, ScanResult,
};

/// What `result()` hands back for a job id.
#[derive(Debug)]
pub enum JobOutcome {
    Scan(ScanResult),
    Link(LinkResult),
    /// The job exists but has not reached a terminal state.
    Pending,
    NotFound,
}

/// Result and retained classes of a finished scan. Raw classes live here,
/// not in the serializable result, and are consumed by the first link job.
struct ScanCompletion {
    result: Option<ScanResult>,
    raw_classes: Option<Vec<AnalyzedClass>>,
}

struct ScanRecord {
    handle: JobHandle,
    completion: Arc<Mutex<ScanCompletion>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct LinkRecord {
    handle: JobHandle,
    result: Arc<Mutex<Option<LinkResult>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

enum Job {
    Scan(Arc<ScanRecord>),
    Link(Arc<LinkRecord>),
}

impl Job {
    fn handle(&self) -> &JobHandle {
        match self {
            Job::Scan(rec) => &rec.handle,
            Job::Link(rec) => &rec.handle,
        }
    }
}

/// Process-wide job registry. Share it behind an `Arc` between the
/// submitting side and any pollers.
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Job>>,
    seq: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        JobRegistry {
            jobs: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    fn next_id(&self, kind: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{kind}-{millis:x}-{seq:04}")
    }

    /// Queue a scan job on a background thread; returns its id immediately.
    pub fn submit_scan(&self, request: ScanRequest) -> Result<String> {
        let scan_id = self.next_id("scan");
        let handle = JobHandle::new();
        let completion = Arc::new(Mutex::new(ScanCompletion {
            result: None,
            raw_classes: None,
        }));
        let record = Arc::new(ScanRecord {
            handle: handle.clone(),
            completion: Arc::clone(&completion),
            worker: Mutex::new(None),
        });
        self.jobs
            .lock()
            .unwrap()
            .insert(scan_id.clone(), Job::Scan(Arc::clone(&record)));
        info!("queued scan {scan_id} for {:?}", request.roots);

        let id = scan_id.clone();
        let worker = thread::Builder::new()
            .name(format!("scan-{scan_id}"))
            .spawn(move || {
                let output = run_scan_job(&id, &request, &handle);
                let status = output.status;
                {
                    let mut done = completion.lock().unwrap();
                    done.result = Some(output.result);
                    done.raw_classes = output.raw_classes;
                }
                handle.set_status(status);
            })?;
        *record.worker.lock().unwrap() = Some(worker);
        Ok(scan_id)
    }

    /// Queue a link job against a completed dry-run scan. Takes the scan's
    /// retained classes, so a second submission for the same scan fails.
    pub fn submit_link(&self, request: &LinkRequest) -> Result<String> {
        let scan_record = match self.jobs.lock().unwrap().get(&request.scan_id) {
            Some(Job::Scan(rec)) => Arc::clone(rec),
            _ => {
                return Err(CoreError::InvariantViolation(format!(
                    "scan {} not found",
                    request.scan_id
                ))
                .into());
            }
        };
        if scan_record.handle.snapshot().status != JobStatus::Done {
            return Err(CoreError::InvariantViolation(
                "linking requires a completed scan".to_string(),
            )
            .into());
        }

        let classes = {
            let mut done = scan_record.completion.lock().unwrap();
            let is_dry_run = done
                .result
                .as_ref()
                .is_some_and(|r| r.summary.is_dry_run);
            if !is_dry_run {
                return Err(CoreError::InvariantViolation(
                    "linking is only possible for a dry-run scan".to_string(),
                )
                .into());
            }
            match done.raw_classes.take() {
                Some(classes) => classes,
                None => {
                    return Err(CoreError::InvariantViolation(
                        "scan classes missing or linking already attempted".to_string(),
                    )
                    .into());
                }
            }
        };
        if classes.iter().all(|c| c.already_linked) {
            // Hand the classes back so the scan stays consistent.
            scan_record.completion.lock().unwrap().raw_classes = Some(classes);
            return Err(CoreError::InvariantViolation(
                "no linkable duplicate sets in the original scan".to_string(),
            )
            .into());
        }
        if let Some(result) = scan_record.completion.lock().unwrap().result.as_mut() {
            result.raw_classes_retained = false;
        }

        let link_id = self.next_id("link");
        let handle = JobHandle::new();
        let link_result = Arc::new(Mutex::new(None));
        let record = Arc::new(LinkRecord {
            handle: handle.clone(),
            result: Arc::clone(&link_result),
            worker: Mutex::new(None),
        });
        self.jobs
            .lock()
            .unwrap()
            .insert(link_id.clone(), Job::Link(Arc::clone(&record)));
        info!(
            "queued link {link_id} for scan {} (type {})",
            request.scan_id,
            request.link_type.as_str()
        );

        let id = link_id.clone();
        let link_type = request.link_type;
        let selected = request.selected_indices.clone();
        let scan_completion = Arc::clone(&scan_record.completion);
        let worker = thread::Builder::new()
            .name(format!("link-{link_id}"))
            .spawn(move || {
                let (status, result) =
                    run_link_job(&id, &classes, link_type, selected.as_deref(), &handle);
                *link_result.lock().unwrap() = Some(result);
                handle.set_status(status);
                if status == JobStatus::Done
                    && let Some(scan_result) = scan_completion.lock().unwrap().result.as_mut()
                {
                    scan_result.summary.action_taken.push_str(" (Linking performed.)");
                }
            })?;
        *record.worker.lock().unwrap() = Some(worker);
        Ok(link_id)
    }

    /// Point-in-time view of a job. O(1); safe to poll from any thread.
    pub fn snapshot(&self, job_id: &str) -> Option<ProgressSnapshot> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .map(|job| job.handle().snapshot())
    }

    /// Final result once a job is terminal, `Pending` before that.
    pub fn result(&self, job_id: &str) -> JobOutcome {
        let job = {
            let jobs = self.jobs.lock().unwrap();
            match jobs.get(job_id) {
                Some(Job::Scan(rec)) => Job::Scan(Arc::clone(rec)),
                Some(Job::Link(rec)) => Job::Link(Arc::clone(rec)),
                None => return JobOutcome::NotFound,
            }
        };
        if !job.handle().snapshot().status.is_terminal() {
            return JobOutcome::Pending;
        }
        match job {
            Job::Scan(rec) => match rec.completion.lock().unwrap().result.clone() {
                Some(result) => JobOutcome::Scan(result),
                None => JobOutcome::Pending,
            },
            Job::Link(rec) => match rec.result.lock().unwrap().clone() {
                Some(result) => JobOutcome::Link(result),
                None => JobOutcome::Pending,
            },
        }
    }

    /// Cooperative cancel; the job observes it at its next checkpoint.
    pub fn request_cancel(&self, job_id: &str) -> bool {
        self.with_handle(job_id, |h| h.control().request_cancel())
    }

    pub fn request_pause(&self, job_id: &str) -> bool {
        self.with_handle(job_id, |h| h.control().request_pause())
    }

    pub fn request_resume(&self, job_id: &str) -> bool {
        self.with_handle(job_id, |h| h.control().request_resume())
    }

    fn with_handle(&self, job_id: &str, f: impl FnOnce(&JobHandle)) -> bool {
        match self.jobs.lock().unwrap().get(job_id) {
            Some(job) => {
                f(job.handle());
                true
            }
            None => false,
        }
    }

    /// Block until the job's worker thread exits. Returns false for an
    /// unknown job or one already waited on.
    pub fn wait(&self, job_id: &str) -> bool {
        let worker = {
            let jobs = self.jobs.lock().unwrap();
            match jobs.get(job_id) {
                Some(Job::Scan(rec)) => rec.worker.lock().unwrap().take(),
                Some(Job::Link(rec)) => rec.worker.lock().unwrap().take(),
                None => None,
            }
        };
        match worker {
            Some(handle) => handle.join().is_ok(),
            None => false,
        }
    }

    /// Drop every terminal job (and its retained classes). Running jobs are
    /// untouched.
    pub fn clear(&self) {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|_, job| !job.handle().snapshot().status.is_terminal());
        info!("cleared {} finished jobs from the registry", before - jobs.len());
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
