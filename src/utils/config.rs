//! Application configuration constants.
//! Tuning and thresholds in one place.

// ---- Hashing ----

/// Hashing I/O sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// Bytes of file head covered by the prefix pass.
    pub const PREFIX_LEN: usize = 4096;
    /// Chunk size for streaming full-content hashing (bytes). Peak memory
    /// per hash worker is one chunk.
    pub const READ_CHUNK_SIZE: usize = 64 * 1024;
}

// ---- Progress cadence ----

/// How often each stage publishes progress, in processed items.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Walk: publish the current directory every N files found.
    pub const WALK_DETAIL_INTERVAL: u64 = 100;
    /// Prefix-hash stage progress interval.
    pub const PREFIX_HASH_INTERVAL: u64 = 100;
    /// Full-hash stage progress interval.
    pub const FULL_HASH_INTERVAL: u64 = 10;
    /// Link and verify stages: publish every N pairs.
    pub const LINK_PAIR_INTERVAL: u64 = 10;
    /// CLI snapshot poll cadence (ms).
    pub const POLL_INTERVAL_MS: u64 = 100;
}

// ---- Cooperative control ----

/// Pause/cancel polling tuning.
pub struct ControlConsts;

impl ControlConsts {
    /// Sleep between pause-flag polls while a worker is held at a checkpoint (ms).
    pub const PAUSE_BACKOFF_MS: u64 = 50;
}

// ---- Memory watchdog ----

/// System memory thresholds (percent in use).
pub struct MemoryConsts;

impl MemoryConsts {
    /// Above this, log a warning and keep going.
    pub const WARN_PERCENT: f64 = 80.0;
    /// Above this, abort the scan.
    pub const ABORT_PERCENT: f64 = 95.0;
    /// Check memory every N files during the walk.
    pub const CHECK_INTERVAL_FILES: u64 = 1000;
}

// ---- Worker pool ----

/// Sizing for the prefix/full hash worker pools.
pub struct WorkerLimits;

impl WorkerLimits {
    /// Bounded channel capacity between the feeder and the hash workers.
    pub const CHANNEL_CAP: usize = 4096;

    /// Pool size: half the available threads, at least one. Hashing is
    /// CPU-bound; the other half keeps the feeder and fold loop responsive.
    pub fn hash_workers() -> usize {
        (rayon::current_num_threads() / 2).max(1)
    }
}
