//! Sync data models, scheduler options and top-level error types.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Which side of the mirror a root belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRootRole {
    /// Tree that is read and mirrored from.
    Source,
    /// Tree that is written to.
    Target,
}

impl fmt::Display for EnumRootRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Externally toggled scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSchedulerState {
    /// Ticks keep happening but no cycle body runs.
    Stopped,
    /// Every tick runs one full cycle.
    Running,
}

/// Symlink handling while snapshotting one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSymlinkStrategy {
    /// Resolve links; a link to a directory is listed and descended into.
    FollowSymlinks,
    /// Record each link as one non-directory entry, never descend.
    ListSymlinks,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Entries

/// One filesystem object under a root.
///
/// Identity is `(path, mtime_ms)` only: `if_is_dir` does not take part in
/// equality or hashing, and byte content is never compared.
#[derive(Debug, Clone)]
pub struct SpecEntry {
    /// Root-relative path with `/` separators, no leading slash.
    pub path: String,
    /// Modification time in epoch milliseconds.
    pub mtime_ms: i64,
    /// Whether the object is a directory.
    pub if_is_dir: bool,
}

impl SpecEntry {
    /// File entry.
    pub fn file(path: impl Into<String>, mtime_ms: i64) -> Self {
        Self {
            path: path.into(),
            mtime_ms,
            if_is_dir: false,
        }
    }

    /// Directory entry.
    pub fn dir(path: impl Into<String>, mtime_ms: i64) -> Self {
        Self {
            path: path.into(),
            mtime_ms,
            if_is_dir: true,
        }
    }

    /// Final `/`-delimited segment of `path`.
    pub fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Parent path, or `None` for entries directly under the root.
    pub fn parent(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// Number of path segments (`a` is 1, `a/b` is 2).
    pub fn depth(&self) -> usize {
        self.path.split('/').count()
    }
}

impl PartialEq for SpecEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.mtime_ms == other.mtime_ms
    }
}

impl Eq for SpecEntry {}

impl Hash for SpecEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.mtime_ms.hash(state);
    }
}

impl fmt::Display for SpecEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.if_is_dir {
            write!(f, "{}/", self.path)
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// Entries of one root, in traversal order, taken at one instant.
#[derive(Debug, Clone, Default)]
pub struct SpecSnapshot {
    /// Traversal-ordered entries (a directory precedes its children).
    pub entries: Vec<SpecEntry>,
    /// Non-fatal traversal notes (broken links, loops, vanished children).
    pub warnings: Vec<String>,
}

impl SpecSnapshot {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the root held nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one diff: what to create/overwrite and what to remove in target.
#[derive(Debug, Clone, Default)]
pub struct SpecSyncPlan {
    /// Entries of source to create or overwrite in target.
    pub to_add: Vec<SpecEntry>,
    /// Entries of target to remove.
    pub to_delete: Vec<SpecEntry>,
}

impl SpecSyncPlan {
    /// Whether the plan has nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Fixed polling interval of the scheduler.
pub const N_INTERVAL_MS_DEFAULT: u64 = 1000;

/// Input options for [`crate::schedule::Scheduler::spawn`].
#[derive(Debug, Clone)]
pub struct SpecSchedulerOptions {
    /// Sleep between two ticks.
    pub interval: Duration,
}

impl Default for SpecSchedulerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(N_INTERVAL_MS_DEFAULT),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// One per-entry failure with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSyncError {
    /// Target path that failed.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Errors that stop a run from starting or abandon a whole cycle.
///
/// Per-entry copy/delete failures are not errors at this level: they land in
/// [`crate::report::ReportSync::errors`] and the cycle carries on.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Folder '{}' not found! ({role} root)", path.display())]
    RootMissing { role: EnumRootRole, path: PathBuf },

    #[error("{role} root is not a directory: {}", path.display())]
    RootNotDirectory { role: EnumRootRole, path: PathBuf },

    #[error(
        "Source and target directories overlap: {} <-> {}",
        source_root.display(),
        target_root.display()
    )]
    RootOverlap {
        source_root: PathBuf,
        target_root: PathBuf,
    },

    #[error("Failed to read directory {} ({source})", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A specialized Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
