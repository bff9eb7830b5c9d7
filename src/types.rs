//! Public types for the dupelink API and pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Metadata for a single candidate file, from one `lstat`.
///
/// `(device, inode)` is the filesystem identity: two entries sharing both
/// are the same on-disk object (hard links of each other).
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub inode: u64,
    pub device: u64,
    /// Modification time in nanoseconds since epoch, when available.
    pub mtime_ns: Option<i64>,
}

/// Kind of link written over a duplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Hard,
    Soft,
}

impl LinkType {
    /// Human name used in log lines and summary strings.
    pub fn op_name(&self) -> &'static str {
        match self {
            LinkType::Hard => "Hardlinking",
            LinkType::Soft => "Softlinking",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Hard => "hard",
            LinkType::Soft => "soft",
        }
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hard" => Ok(LinkType::Hard),
            "soft" => Ok(LinkType::Soft),
            other => Err(format!("invalid link type {other:?} (use 'hard' or 'soft')")),
        }
    }
}

/// Lifecycle of a scan or link job. Terminal states are absorbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Paused,
    Cancelling,
    Done,
    Error,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Error | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Cancelling => "cancelling",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// Pipeline stage a job is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "finding files")]
    Walking,
    #[serde(rename = "pre-hashing")]
    PrefixHash,
    #[serde(rename = "full hashing")]
    FullHash,
    #[serde(rename = "analyzing")]
    Analyzing,
    #[serde(rename = "linking")]
    Linking,
    #[serde(rename = "verifying")]
    Verifying,
    #[serde(rename = "complete")]
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Walking => "finding files",
            Phase::PrefixHash => "pre-hashing",
            Phase::FullHash => "full hashing",
            Phase::Analyzing => "analyzing",
            Phase::Linking => "linking",
            Phase::Verifying => "verifying",
            Phase::Complete => "complete",
        }
    }
}

/// A scan submission: where to look and how.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Absolute directories to scan. At least one.
    pub roots: Vec<PathBuf>,
    /// Report only; retain raw classes for a later link operation.
    #[serde(default)]
    pub dry_run: bool,
    /// Link duplicates during the scan (ignored when `dry_run`).
    #[serde(default)]
    pub link_type: Option<LinkType>,
    /// Write `scan_results_<id>.json` to the first root on completion.
    #[serde(default)]
    pub save_auto: bool,
    /// Directory basenames pruned from the walk.
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    /// File extensions skipped, with or without a leading dot, any case.
    #[serde(default)]
    pub ignore_exts: Vec<String>,
    /// Files smaller than this are not duplicate candidates. 0 disables.
    #[serde(default)]
    pub min_file_size: u64,
}

impl ScanRequest {
    /// Dry-run request over `roots` with default filters.
    pub fn dry_run(roots: Vec<PathBuf>) -> Self {
        ScanRequest {
            roots,
            dry_run: true,
            link_type: None,
            save_auto: false,
            ignore_dirs: Vec::new(),
            ignore_exts: Vec::new(),
            min_file_size: 0,
        }
    }
}

/// A link submission against a completed dry-run scan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkRequest {
    pub scan_id: String,
    pub link_type: LinkType,
    /// Indices into the scan's sorted class list; `None` links everything.
    #[serde(default)]
    pub selected_indices: Option<Vec<u32>>,
}

/// Cheap point-in-time view of a job, safe to poll while workers run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    pub phase: Phase,
    pub total_items: u64,
    pub processed_items: u64,
    /// 0..=100 per the percentage rule (see [`percentage`]).
    pub percentage: u8,
    pub paused: bool,
    pub cancel_requested: bool,
    /// Human-readable status line (current directory, "x/y" counters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Progress percentage: 0 while queued or initializing, 100 once terminal,
/// otherwise `round(100 * min(processed, total) / total)` with 0 for an
/// unknown total.
pub fn percentage(status: JobStatus, phase: Phase, processed: u64, total: u64) -> u8 {
    if status.is_terminal() {
        return 100;
    }
    if status == JobStatus::Queued || phase == Phase::Init {
        return 0;
    }
    if total == 0 {
        return 0;
    }
    let processed = processed.min(total);
    ((processed * 100 + total / 2) / total) as u8
}

/// One validated member of an equivalence class.
#[derive(Clone, Debug)]
pub struct ClassMember {
    pub path: PathBuf,
    pub inode: u64,
    /// Full-content hash shared by the whole class.
    pub hash: u64,
}

/// A set of files with equal `(device, size, full_hash)`, revalidated and
/// path-sorted. Member order is stable: the first member is the keeper for
/// link operations, and the position of a class in the sorted class list is
/// the index used by `LinkRequest::selected_indices`.
#[derive(Clone, Debug)]
pub struct AnalyzedClass {
    pub device: u64,
    pub size: u64,
    pub hash: u64,
    pub members: Vec<ClassMember>,
    /// All members share one inode; nothing to rewrite.
    pub already_linked: bool,
}

impl AnalyzedClass {
    /// Bytes reclaimed by linking every duplicate to the first member.
    pub fn savings(&self) -> u64 {
        if self.already_linked {
            0
        } else {
            self.size * (self.members.len() as u64 - 1)
        }
    }
}

/// One file inside a reported duplicate set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DuplicateFile {
    pub path: PathBuf,
    pub inode: u64,
    /// Full-content hash as a hex string.
    pub hash: String,
    pub already_linked: bool,
}

/// Element of a reported duplicate set: a leading size label followed by
/// the member files, matching the on-the-wire result shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DuplicateEntry {
    Size(String),
    File(DuplicateFile),
}

pub type DuplicateSet = Vec<DuplicateEntry>;

/// Aggregate numbers for a finished scan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_path: String,
    pub before_size: u64,
    pub after_size: u64,
    pub potential_savings: u64,
    pub total_sets_found: usize,
    pub sets_already_linked: usize,
    pub is_dry_run: bool,
    pub duration_seconds: f64,
    pub action_taken: String,
    pub files_linked: usize,
    pub files_failed: usize,
}

/// Final result of a scan job. Serializable; this is also the autosave
/// file content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: String,
    pub summary: ScanSummary,
    pub duplicates: Vec<DuplicateSet>,
    pub error: Option<String>,
    /// Raw classes are held by the registry for a later link operation.
    pub raw_classes_retained: bool,
}

/// Space reclaimed by a link operation, or "uncertain" when verification
/// failed for any pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpaceSaved {
    Bytes(u64),
    Uncertain(String),
}

impl SpaceSaved {
    pub fn uncertain() -> Self {
        SpaceSaved::Uncertain("uncertain".to_string())
    }
}

/// Final result of a link job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    pub summary: String,
    pub files_linked: usize,
    pub files_failed: usize,
    pub files_verified: usize,
    pub verification_failed: usize,
    pub space_saved: SpaceSaved,
    pub error: Option<String>,
}
