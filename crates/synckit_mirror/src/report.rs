//! Per-cycle report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SpecSyncError;

/// Aggregate counters and diagnostics for one sync cycle.
#[derive(Debug, Default, Clone)]
pub struct ReportSync {
    /// Entries in the source snapshot.
    pub cnt_scanned_src: u64,
    /// Entries in the target snapshot.
    pub cnt_scanned_dst: u64,
    /// Additions applied (directory created or file written).
    pub cnt_added: u64,
    /// Deletions applied.
    pub cnt_deleted: u64,
    /// Plan items not applied: superseded deletions, non-empty directories,
    /// or everything in a dry run.
    pub cnt_skipped: u64,
    /// Non-fatal warnings collected during traversal/apply.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecSyncError>,
}

impl ReportSync {
    /// Number of collected per-entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether the cycle changed anything in target.
    pub fn has_changes(&self) -> bool {
        self.cnt_added > 0 || self.cnt_deleted > 0
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned_src".to_string(), self.cnt_scanned_src);
        dict_counts.insert("cnt_scanned_dst".to_string(), self.cnt_scanned_dst);
        dict_counts.insert("cnt_added".to_string(), self.cnt_added);
        dict_counts.insert("cnt_deleted".to_string(), self.cnt_deleted);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} scanned_src={} scanned_dst={} added={} deleted={} skipped={} errors={} warnings={}",
            dict_counts["cnt_scanned_src"],
            dict_counts["cnt_scanned_dst"],
            dict_counts["cnt_added"],
            dict_counts["cnt_deleted"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SYNC]"))
    }
}

/// Mutable accumulator for cycle statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSyncBuilder {
    /// See [`ReportSync::cnt_scanned_src`].
    pub cnt_scanned_src: u64,
    /// See [`ReportSync::cnt_scanned_dst`].
    pub cnt_scanned_dst: u64,
    /// See [`ReportSync::cnt_added`].
    pub cnt_added: u64,
    /// See [`ReportSync::cnt_deleted`].
    pub cnt_deleted: u64,
    /// See [`ReportSync::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportSync::errors`].
    pub errors: Vec<SpecSyncError>,
    /// See [`ReportSync::warnings`].
    pub warnings: Vec<String>,
}

impl ReportSyncBuilder {
    /// Record snapshot sizes of both sides.
    pub fn set_scanned(&mut self, cnt_src: usize, cnt_dst: usize) {
        self.cnt_scanned_src = cnt_src as u64;
        self.cnt_scanned_dst = cnt_dst as u64;
    }

    /// Increment added count by one.
    pub fn add_added(&mut self) {
        self.cnt_added += 1;
    }

    /// Increment deleted count by one.
    pub fn add_deleted(&mut self) {
        self.cnt_deleted += 1;
    }

    /// Increment skipped count by `value`.
    pub fn add_skipped(&mut self, value: u64) {
        self.cnt_skipped += value;
    }

    /// Add warning messages.
    pub fn extend_warnings<I: IntoIterator<Item = String>>(&mut self, warnings: I) {
        self.warnings.extend(warnings);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: std::path::PathBuf, exception: String) {
        self.errors.push(SpecSyncError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSync {
        ReportSync {
            cnt_scanned_src: self.cnt_scanned_src,
            cnt_scanned_dst: self.cnt_scanned_dst,
            cnt_added: self.cnt_added,
            cnt_deleted: self.cnt_deleted,
            cnt_skipped: self.cnt_skipped,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}
