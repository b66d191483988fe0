//! Full-tree enumeration of one root into a [`SpecSnapshot`].

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::spec::{EnumSymlinkStrategy, Result, SpecEntry, SpecSnapshot, SyncError};
use crate::util::{mtime_ms_from_metadata, relative_slash_path};

#[derive(Debug)]
struct SpecChildEntry {
    path_child: PathBuf,
    name_child: String,
    meta_child: fs::Metadata,
}

#[derive(Debug)]
struct SpecSnapshotContext {
    path_dir_root: PathBuf,
    rule_symlink: EnumSymlinkStrategy,
    set_visited_dirs: HashSet<(u64, u64)>,
    snapshot: SpecSnapshot,
}

/// Recursively enumerate `dir_root`, following symlinks.
///
/// Every directory yields one entry and is descended into; every file yields
/// one entry. Siblings are visited in name order and a directory always
/// precedes its children.
///
/// Returns [`SyncError::Traversal`] when the root or any subdirectory cannot
/// be listed: a partial snapshot would turn unlisted entries into bogus
/// deletions, so the whole snapshot is discarded.
pub fn build_snapshot<P: AsRef<Path>>(dir_root: P) -> Result<SpecSnapshot> {
    build_snapshot_with(dir_root, EnumSymlinkStrategy::FollowSymlinks)
}

/// [`build_snapshot`] with an explicit symlink policy.
///
/// With [`EnumSymlinkStrategy::ListSymlinks`] a link is one file entry carrying
/// the link's own modification time, so whatever it points at is never part
/// of the snapshot. Target roots are snapshotted this way.
///
/// Names that are not valid UTF-8 cannot be carried as entry paths; they are
/// skipped with a warning.
pub fn build_snapshot_with<P: AsRef<Path>>(
    dir_root: P,
    rule_symlink: EnumSymlinkStrategy,
) -> Result<SpecSnapshot> {
    let path_dir_root = dir_root.as_ref().to_path_buf();
    let mut spec_snap_ctx = SpecSnapshotContext {
        path_dir_root: path_dir_root.clone(),
        rule_symlink,
        set_visited_dirs: HashSet::new(),
        snapshot: SpecSnapshot::default(),
    };

    if let Ok(meta_root) = fs::metadata(&path_dir_root) {
        mark_visited(&meta_root, &mut spec_snap_ctx);
    }
    walk_directory(&path_dir_root, &mut spec_snap_ctx)?;
    Ok(spec_snap_ctx.snapshot)
}

/// Returns `false` when the directory was already visited (symlink loop).
fn mark_visited(meta_dir: &fs::Metadata, spec_snap_ctx: &mut SpecSnapshotContext) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        spec_snap_ctx
            .set_visited_dirs
            .insert((meta_dir.dev(), meta_dir.ino()))
    }
    #[cfg(not(unix))]
    {
        let _ = (meta_dir, spec_snap_ctx);
        true
    }
}

fn read_child_metadata(path_child: &Path, rule_symlink: EnumSymlinkStrategy) -> io::Result<fs::Metadata> {
    match rule_symlink {
        EnumSymlinkStrategy::FollowSymlinks => fs::metadata(path_child),
        EnumSymlinkStrategy::ListSymlinks => fs::symlink_metadata(path_child),
    }
}

fn walk_directory(path_dir: &Path, spec_snap_ctx: &mut SpecSnapshotContext) -> Result<()> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| SyncError::Traversal {
        path: path_dir.to_path_buf(),
        source: e,
    })?;

    let mut l_children: Vec<SpecChildEntry> = Vec::new();
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| SyncError::Traversal {
            path: path_dir.to_path_buf(),
            source: e,
        })?;
        let path_child = entry.path();
        let Some(name_child) = entry.file_name().to_str().map(str::to_string) else {
            spec_snap_ctx.snapshot.warnings.push(format!(
                "Non UTF-8 name skipped: {}",
                path_child.display()
            ));
            continue;
        };

        let meta_child = match read_child_metadata(&path_child, spec_snap_ctx.rule_symlink) {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let c_warning = if fs::symlink_metadata(&path_child).is_ok() {
                    format!("Broken symlink skipped: {}", path_child.display())
                } else {
                    format!("Entry vanished during listing: {}", path_child.display())
                };
                spec_snap_ctx.snapshot.warnings.push(c_warning);
                continue;
            }
            Err(e) => {
                return Err(SyncError::Traversal {
                    path: path_child,
                    source: e,
                });
            }
        };

        l_children.push(SpecChildEntry {
            path_child,
            name_child,
            meta_child,
        });
    }
    l_children.sort_by(|a, b| a.name_child.cmp(&b.name_child));

    for spec_child in l_children {
        let Some(path_rel) = relative_slash_path(&spec_child.path_child, &spec_snap_ctx.path_dir_root)
        else {
            continue;
        };
        let mtime_ms = mtime_ms_from_metadata(&spec_child.meta_child);
        let file_type = spec_child.meta_child.file_type();

        if file_type.is_dir() {
            if !mark_visited(&spec_child.meta_child, spec_snap_ctx) {
                spec_snap_ctx.snapshot.warnings.push(format!(
                    "Symlink loop detected: {}",
                    spec_child.path_child.display()
                ));
                continue;
            }
            spec_snap_ctx
                .snapshot
                .entries
                .push(SpecEntry::dir(path_rel, mtime_ms));
            walk_directory(&spec_child.path_child, spec_snap_ctx)?;
        } else if file_type.is_file() || file_type.is_symlink() {
            spec_snap_ctx
                .snapshot
                .entries
                .push(SpecEntry::file(path_rel, mtime_ms));
        } else {
            spec_snap_ctx.snapshot.warnings.push(format!(
                "Special file skipped: {}",
                spec_child.path_child.display()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use filetime::{FileTime, set_file_mtime};

    use super::{build_snapshot, build_snapshot_with};
    use crate::spec::{EnumSymlinkStrategy, SyncError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    #[test]
    fn snapshot_lists_dirs_and_files_in_preorder() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        write_text(&root.join("b.txt"), "b");
        write_text(&root.join("a/x.txt"), "x");
        write_text(&root.join("a/sub/y.txt"), "y");
        std::fs::create_dir_all(root.join("empty")).expect("mkdir empty");

        let snapshot = build_snapshot(root).expect("snapshot");
        let l_paths: Vec<String> = snapshot.entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            l_paths,
            vec!["a/", "a/sub/", "a/sub/y.txt", "a/x.txt", "b.txt", "empty/"]
        );
        assert!(snapshot.warnings.is_empty());
    }

    #[test]
    fn snapshot_records_millisecond_mtime() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("a.txt");
        write_text(&path_file, "a");
        set_file_mtime(&path_file, FileTime::from_unix_time(1_700_000_020, 123_456_789))
            .expect("set mtime");

        let snapshot = build_snapshot(tmp.path()).expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries[0].path, "a.txt");
        assert_eq!(snapshot.entries[0].mtime_ms, 1_700_000_020_123);
        assert!(!snapshot.entries[0].if_is_dir);
    }

    #[test]
    fn snapshot_of_empty_root_is_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let snapshot = build_snapshot(tmp.path()).expect("snapshot");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn snapshot_of_missing_root_is_traversal_failure() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = build_snapshot(tmp.path().join("gone")).expect_err("must fail");
        assert!(matches!(err, SyncError::Traversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn snapshot_follows_symlinks_and_skips_broken_and_loops() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        let outside = tmp.path().join("outside");
        write_text(&outside.join("o.txt"), "o");
        write_text(&root.join("sub/f.txt"), "f");
        symlink(&outside, root.join("linked")).expect("dir symlink");
        symlink(root.join("nowhere"), root.join("broken")).expect("broken symlink");
        symlink(&root, root.join("sub/loop")).expect("loop symlink");

        let snapshot = build_snapshot(&root).expect("snapshot");
        let l_paths: Vec<String> = snapshot.entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(l_paths, vec!["linked/", "linked/o.txt", "sub/", "sub/f.txt"]);
        assert!(snapshot.warnings.iter().any(|w| w.contains("Broken symlink")));
        assert!(snapshot.warnings.iter().any(|w| w.contains("Symlink loop")));
    }

    #[cfg(unix)]
    #[test]
    fn listed_symlinks_are_single_entries() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        let outside = tmp.path().join("outside");
        write_text(&outside.join("o.txt"), "o");
        std::fs::create_dir_all(&root).expect("mkdir root");
        symlink(&outside, root.join("linked")).expect("dir symlink");
        symlink(root.join("nowhere"), root.join("broken")).expect("broken symlink");

        let snapshot =
            build_snapshot_with(&root, EnumSymlinkStrategy::ListSymlinks).expect("snapshot");
        let l_paths: Vec<String> = snapshot.entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(l_paths, vec!["broken", "linked"]);
        assert!(snapshot.warnings.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_skipped_with_warning() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        write_text(&root.join(OsStr::from_bytes(b"caf\xe9.txt")), "c");
        write_text(&root.join("plain.txt"), "p");

        let snapshot = build_snapshot(root).expect("snapshot");
        let l_paths: Vec<String> = snapshot.entries.iter().map(|e| e.to_string()).collect();
        assert_eq!(l_paths, vec!["plain.txt"]);
        assert!(snapshot.warnings.iter().any(|w| w.contains("Non UTF-8")));
    }

    #[cfg(unix)]
    #[test]
    fn snapshot_unreadable_subdirectory_is_traversal_failure() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let locked = tmp.path().join("locked");
        write_text(&locked.join("secret.txt"), "s");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
            .expect("chmod");
        // root bypasses permission bits
        let b_if_bypass = std::fs::read_dir(&locked).is_ok();

        let res = build_snapshot(tmp.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
            .expect("chmod back");

        if b_if_bypass {
            return;
        }
        assert!(matches!(res, Err(SyncError::Traversal { .. })));
    }
}
