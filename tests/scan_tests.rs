//! End-to-end scan scenarios on scratch trees.

use dupelink::{DuplicateEntry, ScanRequest, ScanResult, scan};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn dry_run_request(root: &Path) -> ScanRequest {
    ScanRequest::dry_run(vec![root.to_path_buf()])
}

/// Member paths of one reported set, in report order.
fn set_paths(set: &[DuplicateEntry]) -> Vec<PathBuf> {
    set.iter()
        .filter_map(|entry| match entry {
            DuplicateEntry::File(file) => Some(file.path.clone()),
            DuplicateEntry::Size(_) => None,
        })
        .collect()
}

fn canonical(root: &Path, rel: &str) -> PathBuf {
    root.canonicalize().unwrap().join(rel)
}

// --- basic duplicate detection ---

#[test]
fn test_two_identical_files_in_sibling_dirs() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a/x.txt", b"hello");
    write_file(dir.path(), "b/y.txt", b"hello");

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert!(result.error.is_none());
    assert_eq!(result.summary.total_sets_found, 1);
    assert_eq!(result.summary.sets_already_linked, 0);
    assert_eq!(result.summary.potential_savings, 5);
    assert!(result.raw_classes_retained);

    // members sorted ascending by path
    let paths = set_paths(&result.duplicates[0]);
    assert_eq!(
        paths,
        vec![canonical(dir.path(), "a/x.txt"), canonical(dir.path(), "b/y.txt")]
    );
}

#[test]
fn test_already_hardlinked_pair() {
    let dir = TempDir::new().unwrap();
    let x = write_file(dir.path(), "x", b"hello");
    fs::hard_link(&x, dir.path().join("y")).unwrap();

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 1);
    assert_eq!(result.summary.sets_already_linked, 1);
    assert_eq!(result.summary.potential_savings, 0);
    assert_eq!(result.summary.before_size, result.summary.after_size);
}

#[test]
fn test_same_size_divergence_past_prefix_window() {
    let dir = TempDir::new().unwrap();
    // identical through the 4096-byte prefix, different afterwards
    let mut a = vec![b'a'; 4100];
    let b = a.clone();
    a[4099] = b'z';
    write_file(dir.path(), "x.bin", &a);
    write_file(dir.path(), "y.bin", &b);

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 0);
}

#[test]
fn test_same_size_divergence_inside_prefix_window() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "x.bin", &[b'a'; 512]);
    write_file(dir.path(), "y.bin", &[b'b'; 512]);

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 0);
}

// --- boundary behaviors ---

#[test]
fn test_min_file_size_boundary_inclusive() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "x", b"0123456789");
    write_file(dir.path(), "y", b"0123456789");

    let mut request = dry_run_request(dir.path());
    request.min_file_size = 10;
    assert_eq!(scan(&request).unwrap().summary.total_sets_found, 1);

    request.min_file_size = 11;
    assert_eq!(scan(&request).unwrap().summary.total_sets_found, 0);
}

#[test]
fn test_zero_byte_files_never_candidates() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "x", b"");
    write_file(dir.path(), "y", b"");

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 0);
}

#[test]
fn test_empty_root() {
    let dir = TempDir::new().unwrap();
    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert!(result.error.is_none());
    assert_eq!(result.summary.total_sets_found, 0);
    assert!(!result.raw_classes_retained);
}

#[test]
fn test_single_file_root() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "only.txt", b"alone");
    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 0);
}

#[test]
fn test_missing_root_fails_scan() {
    let result = scan(&ScanRequest::dry_run(vec![PathBuf::from(
        "/no/such/dupelink/root",
    )]))
    .unwrap();
    assert!(result.error.is_some());
    assert_eq!(result.summary.total_sets_found, 0);
}

// --- ignore filters ---

#[test]
fn test_ignore_extensions_case_insensitive() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a/x.txt", b"hello");
    write_file(dir.path(), "b/y.txt", b"hello");
    write_file(dir.path(), "b/z.LOG", b"hello");

    // with or without a leading dot
    for ext in [".log", "log"] {
        let mut request = dry_run_request(dir.path());
        request.ignore_exts = vec![ext.to_string()];
        let result = scan(&request).unwrap();
        assert_eq!(result.summary.total_sets_found, 1);
        let paths = set_paths(&result.duplicates[0]);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.to_string_lossy().ends_with(".txt")));
    }
}

#[test]
fn test_ignore_dirs_prune_descent() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "x.txt", b"hello");
    write_file(dir.path(), "node_modules/y.txt", b"hello");

    let mut request = dry_run_request(dir.path());
    request.ignore_dirs = vec!["node_modules".to_string()];
    let result = scan(&request).unwrap();
    assert_eq!(result.summary.total_sets_found, 0);
}

#[test]
fn test_symlinks_in_tree_are_skipped() {
    let dir = TempDir::new().unwrap();
    let x = write_file(dir.path(), "x.txt", b"hello");
    write_file(dir.path(), "y.txt", b"hello");
    std::os::unix::fs::symlink(&x, dir.path().join("z.txt")).unwrap();

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 1);
    assert_eq!(set_paths(&result.duplicates[0]).len(), 2);
}

// --- multiple roots ---

#[test]
fn test_duplicates_across_roots() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    write_file(dir_a.path(), "x.txt", b"shared content");
    write_file(dir_b.path(), "y.txt", b"shared content");

    let request = ScanRequest::dry_run(vec![
        dir_a.path().to_path_buf(),
        dir_b.path().to_path_buf(),
    ]);
    let result = scan(&request).unwrap();
    assert_eq!(result.summary.total_sets_found, 1);
}

#[test]
fn test_overlapping_roots_emit_each_file_once() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "sub/x.txt", b"hello");
    write_file(dir.path(), "sub/y.txt", b"hello");

    let request = ScanRequest::dry_run(vec![
        dir.path().to_path_buf(),
        dir.path().join("sub"),
    ]);
    let result = scan(&request).unwrap();
    assert_eq!(result.summary.total_sets_found, 1);
    assert_eq!(set_paths(&result.duplicates[0]).len(), 2);
    // counters dedup too: two 5-byte files, not double-counted per root
    assert_eq!(result.summary.before_size, 10);
    assert_eq!(result.summary.potential_savings, 5);
    assert_eq!(result.summary.after_size, 5);
}

// --- accounting and ordering ---

#[test]
fn test_size_accounting() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.bin", b"0123456789");
    write_file(dir.path(), "b.bin", b"0123456789");
    write_file(dir.path(), "unique", b"1234567");

    let result = scan(&dry_run_request(dir.path())).unwrap();
    let summary = &result.summary;
    assert_eq!(summary.before_size, 27);
    assert_eq!(summary.potential_savings, 10);
    assert_eq!(summary.after_size, summary.before_size - summary.potential_savings);
}

#[test]
fn test_sets_sorted_by_first_member_path() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "c/one", b"duplicate pair one");
    write_file(dir.path(), "d/one", b"duplicate pair one");
    write_file(dir.path(), "a/two", b"pair two");
    write_file(dir.path(), "b/two", b"pair two");

    let result = scan(&dry_run_request(dir.path())).unwrap();
    assert_eq!(result.summary.total_sets_found, 2);
    assert_eq!(
        set_paths(&result.duplicates[0])[0],
        canonical(dir.path(), "a/two")
    );
    assert_eq!(
        set_paths(&result.duplicates[1])[0],
        canonical(dir.path(), "c/one")
    );
}

#[test]
fn test_non_dry_run_without_link_type_retains_nothing() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "x", b"hello");
    write_file(dir.path(), "y", b"hello");

    let mut request = dry_run_request(dir.path());
    request.dry_run = false;
    let result = scan(&request).unwrap();
    assert_eq!(result.summary.total_sets_found, 1);
    assert!(!result.raw_classes_retained);
    assert_eq!(result.summary.files_linked, 0);
}

// --- autosave ---

#[test]
fn test_autosave_round_trips() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a/x.txt", b"hello");
    write_file(dir.path(), "b/y.txt", b"hello");

    let mut request = dry_run_request(dir.path());
    request.save_auto = true;
    let result = scan(&request).unwrap();

    let saved_path = dir
        .path()
        .join(format!("scan_results_{}.json", result.scan_id));
    let saved: ScanResult =
        serde_json::from_str(&fs::read_to_string(&saved_path).unwrap()).unwrap();
    assert_eq!(saved, result);
}

// --- inline linking during a non-dry-run scan ---

#[test]
fn test_inline_hard_link_during_scan() {
    use std::os::unix::fs::MetadataExt;

    let dir = TempDir::new().unwrap();
    let x = write_file(dir.path(), "a/x.txt", b"hello");
    let y = write_file(dir.path(), "b/y.txt", b"hello");

    let mut request = dry_run_request(dir.path());
    request.dry_run = false;
    request.link_type = Some(dupelink::LinkType::Hard);
    let result = scan(&request).unwrap();

    assert_eq!(result.summary.files_linked, 1);
    assert_eq!(result.summary.files_failed, 0);
    assert!(result.error.is_none());
    assert_eq!(
        fs::metadata(&x).unwrap().ino(),
        fs::metadata(&y).unwrap().ino()
    );
    assert_eq!(fs::read(&y).unwrap(), b"hello");
}
