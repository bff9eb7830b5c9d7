//! Scan and link job execution: the pipeline phases wired end to end.
//!
//! Walk → size buckets → prefix hash → full hash → analyze, then either
//! stop (dry run, raw classes retained) or link inline. A registry-submitted
//! link job replays the retained classes through link + verify.

use log::{info, warn};
use std::time::Instant;

use crate::engine::hashing::{full_hash, prefix_hash};
use crate::engine::tools::{check_roots, format_bytes, normalize_extensions};
use crate::error::CoreError;
use crate::pipeline::analyze::analyze_classes;
use crate::pipeline::buckets::{group_by_content, group_by_prefix, group_by_size};
use crate::pipeline::context::JobHandle;
use crate::pipeline::hash_pool::run_hash_stage;
use crate::pipeline::link::{link_classes, linkable_classes};
use crate::pipeline::verify::verify_classes;
use crate::pipeline::walk::{WalkFilters, walk_roots};
use crate::types::{
    AnalyzedClass, DuplicateEntry, DuplicateFile, DuplicateSet, JobStatus, LinkResult, LinkType,
    Phase, ScanRequest, ScanResult, ScanSummary, SpaceSaved,
};
use crate::utils::config::{ProgressConsts, WorkerLimits};
use crate::utils::save_scan_result;

/// What a finished scan job leaves behind: the final status, the result to
/// publish, and (dry runs only) the raw classes a link job may consume.
pub struct ScanJobOutput {
    pub status: JobStatus,
    pub result: ScanResult,
    pub raw_classes: Option<Vec<AnalyzedClass>>,
}

/// Run a whole scan job. Never panics across the job boundary: fatal errors
/// and cancellation are folded into the returned status/result.
pub fn run_scan_job(scan_id: &str, request: &ScanRequest, handle: &JobHandle) -> ScanJobOutput {
    handle.set_status(JobStatus::Running);
    handle.begin_phase(Phase::Init, 0);
    let started = Instant::now();
    info!(
        "[{scan_id}] starting scan: roots={:?}, dry_run={}, link_type={:?}",
        request.roots, request.dry_run, request.link_type
    );

    match scan_pipeline(scan_id, request, handle, started) {
        Ok(output) => output,
        Err(CoreError::Cancelled) => {
            info!("[{scan_id}] scan cancelled");
            ScanJobOutput {
                status: JobStatus::Cancelled,
                result: ScanResult {
                    scan_id: scan_id.to_string(),
                    summary: ScanSummary {
                        action_taken: "Scan cancelled.".to_string(),
                        is_dry_run: request.dry_run,
                        ..ScanSummary::default()
                    },
                    duplicates: Vec::new(),
                    error: None,
                    raw_classes_retained: false,
                },
                raw_classes: None,
            }
        }
        Err(err) => {
            log::error!("[{scan_id}] scan failed: {err}");
            ScanJobOutput {
                status: JobStatus::Error,
                result: ScanResult {
                    scan_id: scan_id.to_string(),
                    summary: ScanSummary {
                        is_dry_run: request.dry_run,
                        ..ScanSummary::default()
                    },
                    duplicates: Vec::new(),
                    error: Some(err.to_string()),
                    raw_classes_retained: false,
                },
                raw_classes: None,
            }
        }
    }
}

fn scan_pipeline(
    scan_id: &str,
    request: &ScanRequest,
    handle: &JobHandle,
    started: Instant,
) -> Result<ScanJobOutput, CoreError> {
    let roots = check_roots(&request.roots)?;
    let ignore_exts = normalize_extensions(&request.ignore_exts);
    let filters = WalkFilters {
        ignore_dirs: &request.ignore_dirs,
        ignore_exts: &ignore_exts,
        min_file_size: request.min_file_size,
    };

    // Phase 1: discovery. Total is unknown until the walk completes.
    handle.begin_phase(Phase::Walking, 0);
    let walk = walk_roots(&roots, &filters, handle, scan_id)?;
    info!(
        "[{scan_id}] found {} files ({})",
        walk.files_found,
        format_bytes(walk.bytes_scanned)
    );

    // Phase 1.5: size grouping, then the cheap prefix pass over survivors.
    let candidates: Vec<_> = group_by_size(walk.entries).into_iter().flatten().collect();
    let workers = WorkerLimits::hash_workers();
    handle.begin_phase(Phase::PrefixHash, candidates.len() as u64);
    info!(
        "[{scan_id}] quick-checking {} files with {workers} workers",
        candidates.len()
    );
    let prefix_out = run_hash_stage(
        candidates,
        workers,
        handle,
        ProgressConsts::PREFIX_HASH_INTERVAL,
        "quick check",
        prefix_hash,
    )?;

    // Phase 2: full hash of everything the prefix pass could not separate.
    let survivors: Vec<_> = group_by_prefix(prefix_out.hashed)
        .into_iter()
        .flatten()
        .collect();
    handle.begin_phase(Phase::FullHash, survivors.len() as u64);
    info!("[{scan_id}] deep-checking {} candidates", survivors.len());
    let full_out = run_hash_stage(
        survivors,
        workers,
        handle,
        ProgressConsts::FULL_HASH_INTERVAL,
        "deep check",
        full_hash,
    )?;

    // Phase 3: equivalence classes, revalidated and ordered.
    let report = analyze_classes(group_by_content(full_out.hashed), handle)?;
    let before_size = walk.bytes_scanned;
    let after_size = before_size - report.potential_savings;
    info!(
        "[{scan_id}] analysis complete: {} sets, {} already linked, potential savings {}",
        report.total_sets,
        report.already_linked_sets,
        format_bytes(report.potential_savings)
    );

    let mut summary = ScanSummary {
        scan_path: scan_path_display(&roots),
        before_size,
        after_size,
        potential_savings: report.potential_savings,
        total_sets_found: report.total_sets,
        sets_already_linked: report.already_linked_sets,
        is_dry_run: request.dry_run,
        duration_seconds: 0.0,
        action_taken: String::new(),
        files_linked: 0,
        files_failed: 0,
    };
    let mut error: Option<String> = None;

    // Phase 4: inline linking unless this is a dry run.
    let sets_to_link = report.total_sets - report.already_linked_sets;
    if !request.dry_run && sets_to_link > 0 {
        if let Some(link_type) = request.link_type {
            let targets = linkable_classes(&report.classes, None);
            let stats = link_classes(&targets, link_type, handle, scan_id)?;
            summary.files_linked = stats.files_linked;
            summary.files_failed = stats.files_failed;
            summary.action_taken = format!(
                "{} complete. Linked: {}, Failed: {}.",
                link_type.op_name(),
                stats.files_linked,
                stats.files_failed
            );
            if stats.files_failed > 0 {
                error = Some(format!(
                    "{} completed with {} errors.",
                    link_type.op_name(),
                    stats.files_failed
                ));
            }
        }
    }

    if summary.action_taken.is_empty() {
        summary.action_taken = default_action_taken(request.dry_run, &report, sets_to_link);
    }
    let scan_failures = walk.skipped + prefix_out.failed + full_out.failed;
    if error.is_none() && scan_failures > 0 {
        error = Some(format!(
            "Scan completed with {scan_failures} unreadable files."
        ));
    }
    summary.duration_seconds = started.elapsed().as_secs_f64();

    let retain = request.dry_run && !report.classes.is_empty();
    let result = ScanResult {
        scan_id: scan_id.to_string(),
        summary,
        duplicates: format_duplicates(&report.classes),
        error,
        raw_classes_retained: retain,
    };

    if request.save_auto && result.error.is_none() {
        match save_scan_result(&result, &roots[0]) {
            Ok(path) => info!("[{scan_id}] autosaved results to {}", path.display()),
            Err(err) => warn!("[{scan_id}] autosave failed: {err:#}"),
        }
    }

    handle.begin_phase(Phase::Complete, 0);
    info!(
        "[{scan_id}] scan finished in {:.2}s: {}",
        result.summary.duration_seconds, result.summary.action_taken
    );
    Ok(ScanJobOutput {
        status: JobStatus::Done,
        raw_classes: retain.then_some(report.classes),
        result,
    })
}

fn scan_path_display(roots: &[std::path::PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn default_action_taken(
    dry_run: bool,
    report: &crate::pipeline::analyze::ClassReport,
    sets_to_link: usize,
) -> String {
    if dry_run {
        let already = if report.already_linked_sets > 0 {
            format!(" ({} sets already linked)", report.already_linked_sets)
        } else {
            String::new()
        };
        let ready = if sets_to_link > 0 {
            format!(" {sets_to_link} sets ready to link.")
        } else {
            " All sets appear linked.".to_string()
        };
        format!(
            "Dry run complete. Found {} sets{already}. Potential savings: {}.{ready}",
            report.total_sets,
            format_bytes(report.potential_savings)
        )
    } else if report.total_sets == 0 {
        "Scan complete. No duplicates found.".to_string()
    } else {
        format!(
            "Scan complete. Found {} duplicate sets, all already appear linked. No action taken.",
            report.total_sets
        )
    }
}

/// The reported shape of a class: a leading size label, then the members
/// with their hex hash and already-linked flag.
pub fn format_duplicates(classes: &[AnalyzedClass]) -> Vec<DuplicateSet> {
    classes
        .iter()
        .map(|class| {
            let mut set: DuplicateSet =
                vec![DuplicateEntry::Size(format!("Size: {}", format_bytes(class.size)))];
            set.extend(class.members.iter().map(|member| {
                DuplicateEntry::File(DuplicateFile {
                    path: member.path.clone(),
                    inode: member.inode,
                    hash: format!("{:016x}", member.hash),
                    already_linked: class.already_linked,
                })
            }));
            set
        })
        .collect()
}

/// Run a whole link job over classes retained by a dry-run scan.
pub fn run_link_job(
    op_id: &str,
    classes: &[AnalyzedClass],
    link_type: LinkType,
    selected_indices: Option<&[u32]>,
    handle: &JobHandle,
) -> (JobStatus, LinkResult) {
    handle.set_status(JobStatus::Running);
    info!(
        "[{op_id}] link job started: type={}, {} retained classes",
        link_type.as_str(),
        classes.len()
    );

    match link_pipeline(op_id, classes, link_type, selected_indices, handle) {
        Ok(result) => (JobStatus::Done, result),
        Err(CoreError::Cancelled) => {
            info!("[{op_id}] link job cancelled");
            (
                JobStatus::Cancelled,
                LinkResult {
                    summary: "Linking cancelled.".to_string(),
                    files_linked: 0,
                    files_failed: 0,
                    files_verified: 0,
                    verification_failed: 0,
                    space_saved: SpaceSaved::Bytes(0),
                    error: None,
                },
            )
        }
        Err(err) => {
            log::error!("[{op_id}] link job failed: {err}");
            (
                JobStatus::Error,
                LinkResult {
                    summary: "Linking failed.".to_string(),
                    files_linked: 0,
                    files_failed: 0,
                    files_verified: 0,
                    verification_failed: 0,
                    space_saved: SpaceSaved::Bytes(0),
                    error: Some(err.to_string()),
                },
            )
        }
    }
}

fn link_pipeline(
    op_id: &str,
    classes: &[AnalyzedClass],
    link_type: LinkType,
    selected_indices: Option<&[u32]>,
    handle: &JobHandle,
) -> Result<LinkResult, CoreError> {
    let targets = linkable_classes(classes, selected_indices);
    let stats = link_classes(&targets, link_type, handle, op_id)?;
    let verify = verify_classes(&targets, link_type, handle, op_id)?;
    info!(
        "[{op_id}] verification complete: {} OK, {} failed/missing",
        verify.files_verified, verify.verification_failed
    );

    let savings: u64 = targets.iter().map(|c| c.savings()).sum();
    let space_saved = if verify.verification_failed == 0 {
        SpaceSaved::Bytes(savings)
    } else {
        SpaceSaved::uncertain()
    };
    let link_error = (stats.files_failed > 0).then(|| {
        format!(
            "{} had {} errors.",
            link_type.op_name(),
            stats.files_failed
        )
    });
    let verify_error = (verify.verification_failed > 0).then(|| {
        format!(
            "Verification failed for {} items.",
            verify.verification_failed
        )
    });

    handle.begin_phase(Phase::Complete, 0);
    Ok(LinkResult {
        summary: format!(
            "{} complete. Linked: {}, Failed: {}. Verification: {} OK, {} Failed/Missing.",
            link_type.op_name(),
            stats.files_linked,
            stats.files_failed,
            verify.files_verified,
            verify.verification_failed
        ),
        files_linked: stats.files_linked,
        files_failed: stats.files_failed,
        files_verified: verify.files_verified,
        verification_failed: verify.verification_failed,
        space_saved,
        error: link_error.or(verify_error),
    })
}
