use dupelink::engine::{format_bytes, has_ignored_ext, is_ignored_dir, normalize_extensions};
use dupelink::{
    DuplicateEntry, DuplicateFile, JobStatus, LinkType, Phase, ScanRequest, ScanResult,
    ScanSummary, SpaceSaved, percentage,
};
use std::ffi::OsStr;
use std::path::PathBuf;

// --- format_bytes ---

#[test]
fn test_format_bytes_zero() {
    assert_eq!(format_bytes(0), "0 Bytes");
}

#[test]
fn test_format_bytes_small() {
    assert_eq!(format_bytes(5), "5.00 Bytes");
    assert_eq!(format_bytes(1023), "1023.00 Bytes");
}

#[test]
fn test_format_bytes_ladder() {
    assert_eq!(format_bytes(1024), "1.00 KB");
    assert_eq!(format_bytes(1536), "1.50 KB");
    assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
}

// --- normalize_extensions ---

#[test]
fn test_normalize_extensions_adds_dot_and_lowercases() {
    let exts = vec!["LOG".to_string(), ".Txt".to_string(), "tar.gz".to_string()];
    assert_eq!(normalize_extensions(&exts), vec![".log", ".txt", ".tar.gz"]);
}

#[test]
fn test_normalize_extensions_drops_blanks() {
    let exts = vec!["  ".to_string(), ".".to_string(), "md".to_string()];
    assert_eq!(normalize_extensions(&exts), vec![".md"]);
}

// --- has_ignored_ext ---

#[test]
fn test_has_ignored_ext_case_insensitive() {
    let exts = normalize_extensions(&["log".to_string()]);
    assert!(has_ignored_ext(&PathBuf::from("/a/b/app.log"), &exts));
    assert!(has_ignored_ext(&PathBuf::from("/a/b/APP.LOG"), &exts));
    assert!(!has_ignored_ext(&PathBuf::from("/a/b/app.log.txt"), &exts));
}

#[test]
fn test_has_ignored_ext_empty_list() {
    assert!(!has_ignored_ext(&PathBuf::from("/a/b/app.log"), &[]));
}

// --- is_ignored_dir ---

#[test]
fn test_is_ignored_dir_basename_match() {
    let dirs = vec!["node_modules".to_string()];
    assert!(is_ignored_dir(OsStr::new("node_modules"), &dirs));
    assert!(!is_ignored_dir(OsStr::new("node_module"), &dirs));
    assert!(!is_ignored_dir(OsStr::new("src"), &[]));
}

// --- percentage rule ---

#[test]
fn test_percentage_queued_and_init_are_zero() {
    assert_eq!(percentage(JobStatus::Queued, Phase::Walking, 5, 10), 0);
    assert_eq!(percentage(JobStatus::Running, Phase::Init, 5, 10), 0);
}

#[test]
fn test_percentage_terminal_is_hundred() {
    assert_eq!(percentage(JobStatus::Done, Phase::Complete, 0, 0), 100);
    assert_eq!(percentage(JobStatus::Error, Phase::Walking, 1, 10), 100);
    assert_eq!(percentage(JobStatus::Cancelled, Phase::FullHash, 0, 10), 100);
}

#[test]
fn test_percentage_unknown_total_is_zero() {
    assert_eq!(percentage(JobStatus::Running, Phase::Walking, 42, 0), 0);
}

#[test]
fn test_percentage_rounds_and_clamps() {
    assert_eq!(percentage(JobStatus::Running, Phase::FullHash, 1, 3), 33);
    assert_eq!(percentage(JobStatus::Running, Phase::FullHash, 2, 3), 67);
    // processed beyond total never exceeds 100
    assert_eq!(percentage(JobStatus::Running, Phase::FullHash, 12, 10), 100);
}

// --- statuses and link types ---

#[test]
fn test_job_status_terminality() {
    assert!(JobStatus::Done.is_terminal());
    assert!(JobStatus::Error.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
    assert!(!JobStatus::Paused.is_terminal());
    assert!(!JobStatus::Cancelling.is_terminal());
}

#[test]
fn test_link_type_from_str() {
    assert_eq!("hard".parse::<LinkType>().unwrap(), LinkType::Hard);
    assert_eq!("SOFT".parse::<LinkType>().unwrap(), LinkType::Soft);
    assert!("symlink".parse::<LinkType>().is_err());
}

// --- serde shapes ---

#[test]
fn test_scan_request_defaults_from_minimal_json() {
    let request: ScanRequest = serde_json::from_str(r#"{"roots": ["/tmp/x"]}"#).unwrap();
    assert_eq!(request.roots, vec![PathBuf::from("/tmp/x")]);
    assert!(!request.dry_run);
    assert!(request.link_type.is_none());
    assert!(request.ignore_dirs.is_empty());
    assert_eq!(request.min_file_size, 0);
}

#[test]
fn test_duplicate_set_wire_shape() {
    let set = vec![
        DuplicateEntry::Size("Size: 5.00 Bytes".to_string()),
        DuplicateEntry::File(DuplicateFile {
            path: PathBuf::from("/a/x.txt"),
            inode: 42,
            hash: "00000000deadbeef".to_string(),
            already_linked: false,
        }),
    ];
    let json = serde_json::to_string(&set).unwrap();
    // leading size label stays a bare string, members stay objects
    assert!(json.starts_with(r#"["Size: 5.00 Bytes",{"#));
    let back: Vec<DuplicateEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
}

#[test]
fn test_space_saved_wire_shape() {
    assert_eq!(serde_json::to_string(&SpaceSaved::Bytes(5)).unwrap(), "5");
    assert_eq!(
        serde_json::to_string(&SpaceSaved::uncertain()).unwrap(),
        r#""uncertain""#
    );
}

#[test]
fn test_scan_result_json_round_trip() {
    let result = ScanResult {
        scan_id: "scan-1234-0001".to_string(),
        summary: ScanSummary {
            scan_path: "/tmp/root".to_string(),
            before_size: 10,
            after_size: 5,
            potential_savings: 5,
            total_sets_found: 1,
            sets_already_linked: 0,
            is_dry_run: true,
            duration_seconds: 0.25,
            action_taken: "Dry run complete.".to_string(),
            files_linked: 0,
            files_failed: 0,
        },
        duplicates: vec![vec![
            DuplicateEntry::Size("Size: 5.00 Bytes".to_string()),
            DuplicateEntry::File(DuplicateFile {
                path: PathBuf::from("/tmp/root/a/x.txt"),
                inode: 7,
                hash: "0123456789abcdef".to_string(),
                already_linked: false,
            }),
            DuplicateEntry::File(DuplicateFile {
                path: PathBuf::from("/tmp/root/b/y.txt"),
                inode: 8,
                hash: "0123456789abcdef".to_string(),
                already_linked: false,
            }),
        ]],
        error: None,
        raw_classes_retained: true,
    };
    let json = serde_json::to_string_pretty(&result).unwrap();
    let back: ScanResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
