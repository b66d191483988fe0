use std::collections::HashSet;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_mtime};
use synckit_mirror::{
    SpecIgnorePatterns, SyncSettings, build_snapshot, parse_ignore_list, plan_cycle, run_cycle,
};
use tempfile::TempDir;

struct MirrorFixture {
    tmp: TempDir,
    src: PathBuf,
    dst: PathBuf,
}

impl MirrorFixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(&src).expect("mkdir src");
        std::fs::create_dir_all(&dst).expect("mkdir dst");
        Self { tmp, src, dst }
    }

    fn settings(&self, patterns: &[&str]) -> SyncSettings {
        SyncSettings::new(
            &self.src,
            &self.dst,
            SpecIgnorePatterns::new(patterns.iter().copied()),
        )
    }
}

fn write_text(path: &Path, txt: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, txt).expect("write text");
}

fn snapshot_paths(root: &Path) -> HashSet<String> {
    build_snapshot(root)
        .expect("snapshot")
        .entries
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn mtime_ms(path: &Path) -> i64 {
    let meta = std::fs::metadata(path).expect("metadata");
    let file_time = FileTime::from_last_modification_time(&meta);
    file_time.unix_seconds() * 1000 + i64::from(file_time.nanoseconds() / 1_000_000)
}

#[test]
fn new_file_is_copied_with_content_and_mtime() {
    let fx = MirrorFixture::new();
    write_text(&fx.src.join("a.txt"), "hello");
    set_file_mtime(fx.src.join("a.txt"), FileTime::from_unix_time(1_600_000_000, 5_000_000))
        .expect("mtime");

    let report = run_cycle(&fx.settings(&[])).expect("cycle");
    assert_eq!(report.cnt_added, 1);
    assert_eq!(report.error_count(), 0);
    assert_eq!(std::fs::read_to_string(fx.dst.join("a.txt")).expect("read"), "hello");
    assert_eq!(mtime_ms(&fx.dst.join("a.txt")), 1_600_000_000_005);
}

#[test]
fn orphan_file_is_removed() {
    let fx = MirrorFixture::new();
    write_text(&fx.dst.join("old.txt"), "old");

    let report = run_cycle(&fx.settings(&[])).expect("cycle");
    assert_eq!(report.cnt_deleted, 1);
    assert!(!fx.dst.join("old.txt").exists());
}

#[test]
fn ignored_file_is_never_copied() {
    let fx = MirrorFixture::new();
    write_text(&fx.src.join(".DS_Store"), "finder");
    write_text(&fx.src.join("keep.txt"), "k");
    let settings = SyncSettings::new(
        &fx.src,
        &fx.dst,
        SpecIgnorePatterns::new(parse_ignore_list("[.DS_Store]")),
    );

    for _ in 0..3 {
        run_cycle(&settings).expect("cycle");
        assert!(!fx.dst.join(".DS_Store").exists());
    }
    assert!(fx.dst.join("keep.txt").exists());
}

#[test]
fn ignored_target_entries_are_kept() {
    let fx = MirrorFixture::new();
    write_text(&fx.dst.join("build/out.o"), "o");
    write_text(&fx.dst.join("debug.log"), "l");

    run_cycle(&fx.settings(&["build", "*.log"])).expect("cycle");
    assert!(fx.dst.join("build/out.o").exists());
    assert!(fx.dst.join("debug.log").exists());
}

#[test]
fn content_change_without_mtime_change_is_not_copied() {
    let fx = MirrorFixture::new();
    let path_src = fx.src.join("a.txt");
    write_text(&path_src, "v1");
    set_file_mtime(&path_src, FileTime::from_unix_time(1_600_000_000, 0)).expect("mtime");
    run_cycle(&fx.settings(&[])).expect("first cycle");

    write_text(&path_src, "v2");
    set_file_mtime(&path_src, FileTime::from_unix_time(1_600_000_000, 0)).expect("mtime");
    let report = run_cycle(&fx.settings(&[])).expect("second cycle");

    assert!(!report.has_changes());
    assert_eq!(std::fs::read_to_string(fx.dst.join("a.txt")).expect("read"), "v1");
}

#[test]
fn empty_source_directory_is_created_with_mtime() {
    let fx = MirrorFixture::new();
    std::fs::create_dir_all(fx.src.join("sub")).expect("mkdir sub");
    set_file_mtime(fx.src.join("sub"), FileTime::from_unix_time(1_500_000_000, 0)).expect("mtime");

    run_cycle(&fx.settings(&[])).expect("cycle");
    assert!(fx.dst.join("sub").is_dir());
    assert_eq!(mtime_ms(&fx.dst.join("sub")), 1_500_000_000_000);
}

#[test]
fn second_cycle_on_nested_tree_has_empty_plan() {
    let fx = MirrorFixture::new();
    write_text(&fx.src.join("a/b/c.txt"), "c");
    write_text(&fx.src.join("a/d.txt"), "d");
    write_text(&fx.src.join("e.txt"), "e");
    std::fs::create_dir_all(fx.src.join("a/empty")).expect("mkdir empty");
    write_text(&fx.dst.join("a/stale/x.txt"), "x");
    write_text(&fx.dst.join("e.txt"), "older e");
    set_file_mtime(fx.dst.join("e.txt"), FileTime::from_unix_time(1_000, 0)).expect("mtime");

    let settings = fx.settings(&[]);
    let report = run_cycle(&settings).expect("cycle");
    assert_eq!(report.error_count(), 0);

    assert!(plan_cycle(&settings).expect("plan").is_empty());
    assert_eq!(snapshot_paths(&fx.src), snapshot_paths(&fx.dst));
    assert_eq!(std::fs::read_to_string(fx.dst.join("e.txt")).expect("read"), "e");
}

#[test]
fn modified_source_file_is_overwritten() {
    let fx = MirrorFixture::new();
    let path_src = fx.src.join("doc.txt");
    write_text(&path_src, "first");
    set_file_mtime(&path_src, FileTime::from_unix_time(1_600_000_000, 0)).expect("mtime");
    run_cycle(&fx.settings(&[])).expect("first cycle");

    write_text(&path_src, "second");
    set_file_mtime(&path_src, FileTime::from_unix_time(1_600_000_100, 0)).expect("mtime");
    let report = run_cycle(&fx.settings(&[])).expect("second cycle");

    assert_eq!(report.cnt_added, 1);
    assert_eq!(report.cnt_deleted, 0);
    assert_eq!(std::fs::read_to_string(fx.dst.join("doc.txt")).expect("read"), "second");
    assert_eq!(mtime_ms(&fx.dst.join("doc.txt")), 1_600_000_100_000);
}

#[test]
fn directory_with_ignored_children_stays_in_target() {
    let fx = MirrorFixture::new();
    write_text(&fx.dst.join("gone/.DS_Store"), "x");
    write_text(&fx.dst.join("gone/a.txt"), "a");

    let report = run_cycle(&fx.settings(&[".DS_Store"])).expect("cycle");
    assert_eq!(report.cnt_deleted, 1);
    assert_eq!(report.cnt_skipped, 1);
    assert!(fx.dst.join("gone/.DS_Store").exists());
    assert!(!fx.dst.join("gone/a.txt").exists());
}

#[cfg(unix)]
#[test]
fn target_symlink_is_removed_without_touching_what_it_points_at() {
    use std::os::unix::fs::symlink;

    let fx = MirrorFixture::new();
    let outside = fx.tmp.path().join("outside");
    write_text(&outside.join("precious.txt"), "keep me");
    symlink(&outside, fx.dst.join("link")).expect("dir symlink");
    symlink(outside.join("precious.txt"), fx.dst.join("file_link")).expect("file symlink");

    let settings = fx.settings(&[]);
    let report = run_cycle(&settings).expect("cycle");

    assert_eq!(report.cnt_scanned_dst, 2);
    assert_eq!(report.cnt_deleted, 2);
    assert_eq!(report.error_count(), 0);
    assert_eq!(
        std::fs::read_to_string(outside.join("precious.txt")).expect("read"),
        "keep me"
    );
    assert!(std::fs::symlink_metadata(fx.dst.join("link")).is_err());
    assert!(plan_cycle(&settings).expect("plan").is_empty());
}

#[cfg(unix)]
#[test]
fn source_file_replaces_target_symlink_of_same_name() {
    use std::os::unix::fs::symlink;

    let fx = MirrorFixture::new();
    let outside = fx.tmp.path().join("outside.txt");
    write_text(&outside, "outside");
    write_text(&fx.src.join("a.txt"), "inside");
    symlink(&outside, fx.dst.join("a.txt")).expect("symlink");

    let settings = fx.settings(&[]);
    let report = run_cycle(&settings).expect("cycle");

    assert_eq!(report.error_count(), 0);
    assert_eq!(std::fs::read_to_string(&outside).expect("read"), "outside");
    assert_eq!(std::fs::read_to_string(fx.dst.join("a.txt")).expect("read"), "inside");
    assert!(plan_cycle(&settings).expect("plan").is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_names_are_left_alone_on_both_sides() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = MirrorFixture::new();
    let name_odd = OsStr::from_bytes(b"caf\xe9.txt");
    write_text(&fx.src.join(name_odd), "src");
    write_text(&fx.dst.join(OsStr::from_bytes(b"old\xff.txt")), "dst");
    write_text(&fx.src.join("plain.txt"), "p");

    let settings = fx.settings(&[]);
    let report = run_cycle(&settings).expect("cycle");

    assert_eq!(report.error_count(), 0);
    assert_eq!(report.cnt_added, 1);
    assert_eq!(report.cnt_deleted, 0);
    assert_eq!(report.warning_count(), 2);
    assert!(fx.dst.join("plain.txt").exists());
    assert!(fx.dst.join(OsStr::from_bytes(b"old\xff.txt")).exists());
    assert!(plan_cycle(&settings).expect("plan").is_empty());
}
