//! CLI command handler: run a scan through the registry and print results.

use anyhow::Result;
use log::{info, warn};
use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::SnapshotBar;
use crate::engine::tools::{format_bytes, running_as_root, setup_ctrlc_handler};
use crate::registry::{JobOutcome, JobRegistry};
use crate::types::{DuplicateEntry, JobStatus, ScanRequest, ScanResult};
use crate::utils::config::ProgressConsts;
use crate::utils::config_file::{DupelinkToml, apply_file_to_request, load_dupelink_toml};
use crate::utils::setup_logging;

/// Build the request: file config first, CLI flags overwrite when passed.
fn setup_request(cli: &Cli, file: Option<&DupelinkToml>) -> ScanRequest {
    let mut request = ScanRequest {
        roots: cli.roots.clone(),
        dry_run: cli.dry_run || cli.link.is_none(),
        link_type: cli.link,
        save_auto: false,
        ignore_dirs: Vec::new(),
        ignore_exts: Vec::new(),
        min_file_size: 1,
    };
    if let Some(file) = file {
        apply_file_to_request(file, &mut request);
    }
    if !cli.ignore_dirs.is_empty() {
        request.ignore_dirs = cli.ignore_dirs.clone();
    }
    if !cli.ignore_exts.is_empty() {
        request.ignore_exts = cli.ignore_exts.clone();
    }
    if let Some(min) = cli.min_size {
        request.min_file_size = min;
    }
    if cli.save {
        request.save_auto = true;
    }
    request
}

/// Run one scan (optionally linking inline) and map the outcome to an exit
/// code: 0 clean, 1 finished with per-file failures, 2 fatal.
pub fn handle_run(cli: &Cli) -> Result<i32> {
    let file = cli.roots.first().and_then(|r| load_dupelink_toml(r));
    let verbose = cli.verbose || file.as_ref().and_then(|f| f.verbose()).unwrap_or(false);
    setup_logging(verbose);

    if running_as_root() {
        info!("Running as root. Links will be created with root ownership.");
    }
    let request = setup_request(cli, file.as_ref());
    if request.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NO CHANGES WILL BE APPLIED TO THE FILESYSTEM.");
    }

    let registry = JobRegistry::new();
    let ctrlc_flag = setup_ctrlc_handler()?;
    let scan_id = registry.submit_scan(request)?;

    let mut bar = verbose.then(SnapshotBar::new);
    let mut cancel_sent = false;
    loop {
        if ctrlc_flag.load(Ordering::Relaxed) && !cancel_sent {
            warn!("cancel requested, stopping at the next checkpoint");
            registry.request_cancel(&scan_id);
            cancel_sent = true;
        }
        let Some(snap) = registry.snapshot(&scan_id) else {
            break;
        };
        if let Some(bar) = bar.as_mut() {
            bar.render(&snap);
        }
        if snap.status.is_terminal() {
            break;
        }
        std::thread::sleep(Duration::from_millis(ProgressConsts::POLL_INTERVAL_MS));
    }
    registry.wait(&scan_id);

    let status = registry
        .snapshot(&scan_id)
        .map(|s| s.status)
        .unwrap_or(JobStatus::Error);
    match registry.result(&scan_id) {
        JobOutcome::Scan(result) => {
            report_scan(&result);
            Ok(exit_code(status, &result))
        }
        _ => {
            warn!("scan {scan_id} finished without a result");
            Ok(2)
        }
    }
}

fn report_scan(result: &ScanResult) {
    let summary = &result.summary;
    info!("{}", summary.action_taken);
    info!(
        "Before: {} | After: {} | Potential savings: {}",
        format_bytes(summary.before_size),
        format_bytes(summary.after_size),
        format_bytes(summary.potential_savings)
    );
    if let Some(err) = &result.error {
        warn!("{err}");
    }
    if !result.duplicates.is_empty() {
        print_duplicate_sets(result);
    }
}

fn print_duplicate_sets(result: &ScanResult) {
    let mut out = std::io::stdout().lock();
    for set in &result.duplicates {
        for entry in set {
            match entry {
                DuplicateEntry::Size(label) => {
                    let _ = writeln!(out, "{label}");
                }
                DuplicateEntry::File(file) => {
                    let suffix = if file.already_linked {
                        "  (already linked)"
                    } else {
                        ""
                    };
                    let _ = writeln!(out, "    {}{suffix}", file.path.display());
                }
            }
        }
        let _ = writeln!(out);
    }
}

fn exit_code(status: JobStatus, result: &ScanResult) -> i32 {
    match status {
        JobStatus::Done if result.error.is_none() && result.summary.files_failed == 0 => 0,
        JobStatus::Done => 1,
        JobStatus::Cancelled => 1,
        _ => 2,
    }
}
