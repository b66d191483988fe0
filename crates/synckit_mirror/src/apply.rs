//! Materialization of a [`SpecSyncPlan`] against the target root.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::report::ReportSyncBuilder;
use crate::spec::{SpecEntry, SpecSnapshot, SpecSyncPlan};
use crate::util::{
    is_symlink_item, join_relative, set_mtime_ms, validate_destination_path_safety,
    write_file_content,
};

/// What a single deletion ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDeleteOutcome {
    /// The object was removed.
    Removed,
    /// The object was already gone.
    Missing,
    /// A non-empty directory was left in place (deletion is not recursive).
    KeptNonEmpty,
}

#[derive(Debug)]
struct SpecApplyContext<'a> {
    path_dir_src: &'a Path,
    path_dir_dst: &'a Path,
    builder_sync_report: &'a mut ReportSyncBuilder,
    set_dirs_touched: BTreeSet<String>,
}

/// Create or overwrite one entry of source under `path_dir_dst`.
///
/// Directories are created with their missing ancestors. Files get their
/// ancestors created, then the full source content written over whatever is
/// there. In both cases the target modification time is set to
/// `entry.mtime_ms` last, so the next target snapshot reports the same
/// identity as source.
///
/// Nothing is written through a symlink in the target: a link at the item
/// itself is replaced, a link among its parents is an error.
pub fn apply_addition(entry: &SpecEntry, path_dir_src: &Path, path_dir_dst: &Path) -> io::Result<()> {
    let path_dst = join_relative(path_dir_dst, &entry.path);
    validate_destination_path_safety(&path_dst, path_dir_dst)?;
    if is_symlink_item(&path_dst) {
        fs::remove_file(&path_dst)?;
    }
    if entry.if_is_dir {
        fs::create_dir_all(&path_dst)?;
    } else {
        if let Some(path_parent_dst) = path_dst.parent() {
            fs::create_dir_all(path_parent_dst)?;
        }
        let path_src = join_relative(path_dir_src, &entry.path);
        write_file_content(&path_src, &path_dst)?;
    }
    set_mtime_ms(&path_dst, entry.mtime_ms)
}

/// Remove one entry from `path_dir_dst`.
///
/// Directories are removed only when empty; a refusal because of remaining
/// children is reported as [`EnumDeleteOutcome::KeptNonEmpty`], not an error.
/// A symlink is removed itself, never its target; a path through a symlinked
/// parent is an error.
pub fn apply_deletion(entry: &SpecEntry, path_dir_dst: &Path) -> io::Result<EnumDeleteOutcome> {
    let path_dst = join_relative(path_dir_dst, &entry.path);
    validate_destination_path_safety(&path_dst, path_dir_dst)?;
    let res_remove = match fs::symlink_metadata(&path_dst) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(&path_dst),
        Ok(_) => fs::remove_file(&path_dst),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EnumDeleteOutcome::Missing),
        Err(e) => return Err(e),
    };
    match res_remove {
        Ok(()) => Ok(EnumDeleteOutcome::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EnumDeleteOutcome::Missing),
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
            Ok(EnumDeleteOutcome::KeptNonEmpty)
        }
        Err(e) => Err(e),
    }
}

/// Apply a whole plan, isolating failures per entry.
///
/// Order: deletions deepest first, then additions shallowest first, then
/// directory timestamps are re-stamped from `snapshot_src` deepest first
/// (writing children bumps a directory's modification time). A deletion whose
/// path is re-added with the same kind is left to the overwrite.
pub fn apply_plan(
    plan: &SpecSyncPlan,
    snapshot_src: &SpecSnapshot,
    path_dir_src: &Path,
    path_dir_dst: &Path,
    builder_sync_report: &mut ReportSyncBuilder,
) {
    let mut spec_apply_ctx = SpecApplyContext {
        path_dir_src,
        path_dir_dst,
        builder_sync_report,
        set_dirs_touched: BTreeSet::new(),
    };

    let dict_kind_added: HashMap<&str, bool> = plan
        .to_add
        .iter()
        .map(|e| (e.path.as_str(), e.if_is_dir))
        .collect();

    let mut l_deletions: Vec<&SpecEntry> = plan.to_delete.iter().collect();
    l_deletions.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| b.path.cmp(&a.path)));
    for entry in l_deletions {
        if dict_kind_added.get(entry.path.as_str()) == Some(&entry.if_is_dir) {
            spec_apply_ctx.builder_sync_report.add_skipped(1);
            continue;
        }
        handle_deletion(entry, &mut spec_apply_ctx);
    }

    let mut l_additions: Vec<&SpecEntry> = plan.to_add.iter().collect();
    l_additions.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path.cmp(&b.path)));
    for entry in l_additions {
        handle_addition(entry, &mut spec_apply_ctx);
    }

    restamp_directories(snapshot_src, &mut spec_apply_ctx);
}

fn mark_parent_touched(entry: &SpecEntry, spec_apply_ctx: &mut SpecApplyContext<'_>) {
    if let Some(path_parent) = entry.parent() {
        spec_apply_ctx
            .set_dirs_touched
            .insert(path_parent.to_string());
    }
}

fn handle_deletion(entry: &SpecEntry, spec_apply_ctx: &mut SpecApplyContext<'_>) {
    info!("Deletion detected on '{}'. File deleted", entry.path);
    match apply_deletion(entry, spec_apply_ctx.path_dir_dst) {
        Ok(EnumDeleteOutcome::Removed) => {
            spec_apply_ctx.builder_sync_report.add_deleted();
            mark_parent_touched(entry, spec_apply_ctx);
        }
        Ok(EnumDeleteOutcome::Missing) => {
            spec_apply_ctx.builder_sync_report.add_skipped(1);
        }
        Ok(EnumDeleteOutcome::KeptNonEmpty) => {
            debug!("Directory '{}' not empty, left in place", entry.path);
            spec_apply_ctx.builder_sync_report.add_skipped(1);
        }
        Err(e) => {
            let path_dst = join_relative(spec_apply_ctx.path_dir_dst, &entry.path);
            warn!("Failed to delete {} ({e})", path_dst.display());
            spec_apply_ctx
                .builder_sync_report
                .add_error(path_dst, e.to_string());
        }
    }
}

fn handle_addition(entry: &SpecEntry, spec_apply_ctx: &mut SpecApplyContext<'_>) {
    info!("Change detected on '{}'. File synchronized", entry.path);
    match apply_addition(entry, spec_apply_ctx.path_dir_src, spec_apply_ctx.path_dir_dst) {
        Ok(()) => {
            spec_apply_ctx.builder_sync_report.add_added();
            mark_parent_touched(entry, spec_apply_ctx);
            if entry.if_is_dir {
                spec_apply_ctx.set_dirs_touched.insert(entry.path.clone());
            }
        }
        Err(e) => {
            let path_dst = join_relative(spec_apply_ctx.path_dir_dst, &entry.path);
            warn!(
                "An error occurred while writing {} ({e}). Do you have the correct permissions?",
                path_dst.display()
            );
            spec_apply_ctx
                .builder_sync_report
                .add_error(path_dst, e.to_string());
        }
    }
}

fn restamp_directories(snapshot_src: &SpecSnapshot, spec_apply_ctx: &mut SpecApplyContext<'_>) {
    if spec_apply_ctx.set_dirs_touched.is_empty() {
        return;
    }

    let dict_dirs_src: HashMap<&str, i64> = snapshot_src
        .entries
        .iter()
        .filter(|e| e.if_is_dir)
        .map(|e| (e.path.as_str(), e.mtime_ms))
        .collect();

    let mut l_dirs: Vec<String> = std::mem::take(&mut spec_apply_ctx.set_dirs_touched)
        .into_iter()
        .collect();
    l_dirs.sort_by(|a, b| {
        let n_depth_a = a.split('/').count();
        let n_depth_b = b.split('/').count();
        n_depth_b.cmp(&n_depth_a).then_with(|| b.cmp(a))
    });

    for path_rel in l_dirs {
        let Some(&mtime_ms) = dict_dirs_src.get(path_rel.as_str()) else {
            continue;
        };
        let path_dst: PathBuf = join_relative(spec_apply_ctx.path_dir_dst, &path_rel);
        let b_if_real_dir = fs::symlink_metadata(&path_dst).is_ok_and(|meta| meta.is_dir());
        if !b_if_real_dir
            || validate_destination_path_safety(&path_dst, spec_apply_ctx.path_dir_dst).is_err()
        {
            continue;
        }
        if let Err(e) = set_mtime_ms(&path_dst, mtime_ms) {
            spec_apply_ctx.builder_sync_report.extend_warnings([format!(
                "Failed to restore directory time {} ({e})",
                path_dst.display()
            )]);
        }
    }
}
