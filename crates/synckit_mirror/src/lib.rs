//! `synckit_mirror` v1:
//! One-way polling mirror of a source directory tree onto a target tree.
//!
//! Modules:
//! - `spec`     : entries, snapshots, plans, options and errors
//! - `filter`   : ignore patterns and the external list form
//! - `snapshot` : full-tree enumeration of one root
//! - `diff`     : identity-based additions/deletions
//! - `apply`    : copy/delete of a plan against the target
//! - `config`   : shared run configuration handle
//! - `schedule` : one-cycle entry points and the poll thread
//! - `report`   : per-cycle report model
//! - `util`     : shared helper functions

pub mod apply;
pub mod config;
pub mod diff;
pub mod filter;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod spec;
mod util;

pub use apply::{EnumDeleteOutcome, apply_addition, apply_deletion, apply_plan};
pub use config::{RunConfig, SyncSettings};
pub use diff::{additions, deletions, diff_snapshots};
pub use filter::{
    L_IGNORE_DEFAULT, SpecIgnorePatterns, format_ignore_list, is_ignored, parse_ignore_list,
};
pub use report::{ReportSync, ReportSyncBuilder};
pub use schedule::{Scheduler, SchedulerHandle, plan_cycle, run_cycle};
pub use snapshot::{build_snapshot, build_snapshot_with};
pub use spec::{
    EnumRootRole, EnumSchedulerState, EnumSymlinkStrategy, N_INTERVAL_MS_DEFAULT, Result, SpecEntry,
    SpecSchedulerOptions, SpecSnapshot, SpecSyncError, SpecSyncPlan, SyncError,
};
pub use util::validate_roots;
