use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::spec::{EnumRootRole, Result, SyncError};

////////////////////////////////////////////////////////////////////////////////
// #region Timestamps

pub(crate) fn mtime_ms_from_metadata(meta: &fs::Metadata) -> i64 {
    _mtime_ms_from_file_time(FileTime::from_last_modification_time(meta))
}

fn _mtime_ms_from_file_time(file_time: FileTime) -> i64 {
    file_time.unix_seconds() * 1000 + i64::from(file_time.nanoseconds() / 1_000_000)
}

fn _file_time_from_mtime_ms(mtime_ms: i64) -> FileTime {
    let n_secs = mtime_ms.div_euclid(1000);
    let n_nanos = (mtime_ms.rem_euclid(1000) * 1_000_000) as u32;
    FileTime::from_unix_time(n_secs, n_nanos)
}

/// Set modification time of a file or directory, leaving access time alone.
pub(crate) fn set_mtime_ms(path: &Path, mtime_ms: i64) -> io::Result<()> {
    filetime::set_file_mtime(path, _file_time_from_mtime_ms(mtime_ms))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Join a `/`-separated relative path onto a root using host separators.
pub(crate) fn join_relative(path_root: &Path, path_rel: &str) -> PathBuf {
    let mut path_out = path_root.to_path_buf();
    for part in path_rel.split('/').filter(|p| !p.is_empty()) {
        path_out.push(part);
    }
    path_out
}

/// `/`-separated form of `path` relative to `path_root`, or `None` when the
/// path is outside the root or a component is not valid UTF-8.
pub(crate) fn relative_slash_path(path: &Path, path_root: &Path) -> Option<String> {
    let path_rel = path.strip_prefix(path_root).ok()?;
    let l_parts: Vec<&str> = path_rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<&str>>>()?;
    Some(l_parts.join("/"))
}

pub(crate) fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    absolutize_path(path)
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

pub(crate) fn validate_root(path_root: &Path, role: EnumRootRole) -> Result<()> {
    match fs::metadata(path_root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SyncError::RootNotDirectory {
            role,
            path: path_root.to_path_buf(),
        }),
        Err(_) => Err(SyncError::RootMissing {
            role,
            path: path_root.to_path_buf(),
        }),
    }
}

/// Check both roots exist, are directories and do not contain one another.
pub fn validate_roots(path_dir_src: &Path, path_dir_dst: &Path) -> Result<()> {
    validate_root(path_dir_src, EnumRootRole::Source)?;
    validate_root(path_dir_dst, EnumRootRole::Target)?;
    if is_overlap(path_dir_src, path_dir_dst) {
        return Err(SyncError::RootOverlap {
            source_root: path_dir_src.to_path_buf(),
            target_root: path_dir_dst.to_path_buf(),
        });
    }
    Ok(())
}

/// Reject a target item whose path leaves `path_dir_dst_root` or passes
/// through a symlinked directory below the root.
///
/// The item itself may be a symlink: callers remove links instead of writing
/// or deleting through them.
pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> io::Result<()> {
    let path_dir_dst_root_abs = absolutize_path(path_dir_dst_root);
    let path_dst_item_abs = absolutize_path(path_dst_item);

    let Ok(path_rel) = path_dst_item_abs.strip_prefix(&path_dir_dst_root_abs) else {
        return Err(io::Error::other(format!(
            "Unsafe destination path escapes destination root: {} (root={})",
            path_dst_item.display(),
            path_dir_dst_root.display()
        )));
    };
    let Some(path_parent_rel) = path_rel.parent() else {
        return Ok(());
    };

    let mut path_cursor = path_dir_dst_root_abs.clone();
    for part_rel in path_parent_rel.components() {
        path_cursor.push(part_rel.as_os_str());
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta_cursor) if meta_cursor.file_type().is_symlink() => {
                return Err(io::Error::other(format!(
                    "Unsafe destination path traverses symlink component: {}",
                    path_cursor.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Whether `path` itself is a symlink (not followed).
pub(crate) fn is_symlink_item(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileContent

/// Overwrite `path_file_dst` with the full byte content of `path_file_src`.
///
/// The destination is created when absent and truncated otherwise.
pub(crate) fn write_file_content(path_file_src: &Path, path_file_dst: &Path) -> io::Result<()> {
    let raw_bytes = fs::read(path_file_src)?;
    fs::write(path_file_dst, raw_bytes)?;
    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
