//! Identity-based difference between two snapshots.

use std::collections::HashSet;

use crate::filter::SpecIgnorePatterns;
use crate::spec::{SpecEntry, SpecSnapshot, SpecSyncPlan};

/// Entries of `snapshot_a` with no identity-equal entry in `snapshot_b`,
/// minus ignored entries.
///
/// Runs in `O(|a| + |b|)` through a `(path, mtime_ms)` lookup. Output order
/// follows `snapshot_a` but callers must not rely on it.
pub fn additions(
    snapshot_a: &SpecSnapshot,
    snapshot_b: &SpecSnapshot,
    spec_ignore: &SpecIgnorePatterns,
) -> Vec<SpecEntry> {
    let set_identities_b: HashSet<(&str, i64)> = snapshot_b
        .entries
        .iter()
        .map(|e| (e.path.as_str(), e.mtime_ms))
        .collect();

    snapshot_a
        .entries
        .iter()
        .filter(|e| !set_identities_b.contains(&(e.path.as_str(), e.mtime_ms)))
        .filter(|e| !spec_ignore.is_ignored(e))
        .cloned()
        .collect()
}

/// Entries of target with no identity-equal entry in source: `additions`
/// with the snapshots swapped.
pub fn deletions(
    snapshot_src: &SpecSnapshot,
    snapshot_dst: &SpecSnapshot,
    spec_ignore: &SpecIgnorePatterns,
) -> Vec<SpecEntry> {
    additions(snapshot_dst, snapshot_src, spec_ignore)
}

/// Both directions at once.
pub fn diff_snapshots(
    snapshot_src: &SpecSnapshot,
    snapshot_dst: &SpecSnapshot,
    spec_ignore: &SpecIgnorePatterns,
) -> SpecSyncPlan {
    SpecSyncPlan {
        to_add: additions(snapshot_src, snapshot_dst, spec_ignore),
        to_delete: deletions(snapshot_src, snapshot_dst, spec_ignore),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{additions, deletions, diff_snapshots};
    use crate::filter::SpecIgnorePatterns;
    use crate::spec::{SpecEntry, SpecSnapshot};

    fn snap(entries: Vec<SpecEntry>) -> SpecSnapshot {
        SpecSnapshot {
            entries,
            warnings: vec![],
        }
    }

    fn paths(entries: &[SpecEntry]) -> HashSet<String> {
        entries.iter().map(|e| e.path.clone()).collect()
    }

    fn set_of(l_paths: &[&str]) -> HashSet<String> {
        l_paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn additions_are_source_entries_without_identity_match() {
        let src = snap(vec![
            SpecEntry::file("same.txt", 1),
            SpecEntry::file("changed.txt", 2),
            SpecEntry::file("new.txt", 3),
            SpecEntry::dir("dir", 4),
        ]);
        let dst = snap(vec![
            SpecEntry::file("same.txt", 1),
            SpecEntry::file("changed.txt", 1),
            SpecEntry::file("old.txt", 9),
        ]);
        let none = SpecIgnorePatterns::default();

        assert_eq!(
            paths(&additions(&src, &dst, &none)),
            set_of(&["changed.txt", "new.txt", "dir"])
        );
        assert_eq!(
            paths(&deletions(&src, &dst, &none)),
            set_of(&["changed.txt", "old.txt"])
        );
    }

    #[test]
    fn ignored_entries_never_appear_on_either_side() {
        let src = snap(vec![
            SpecEntry::file(".DS_Store", 1),
            SpecEntry::file("logs/app.log", 1),
            SpecEntry::file("keep.txt", 1),
        ]);
        let dst = snap(vec![
            SpecEntry::file("sub/.DS_Store", 5),
            SpecEntry::file("old.log", 5),
            SpecEntry::file("stale.txt", 5),
        ]);
        let spec_ignore = SpecIgnorePatterns::new([".DS_Store", "*.log"]);

        let plan = diff_snapshots(&src, &dst, &spec_ignore);
        assert_eq!(paths(&plan.to_add), set_of(&["keep.txt"]));
        assert_eq!(paths(&plan.to_delete), set_of(&["stale.txt"]));
    }

    #[test]
    fn identical_snapshots_produce_empty_plan() {
        let entries = vec![
            SpecEntry::dir("a", 10),
            SpecEntry::file("a/b.txt", 11),
            SpecEntry::file("c.txt", 12),
        ];
        let plan = diff_snapshots(
            &snap(entries.clone()),
            &snap(entries),
            &SpecIgnorePatterns::default(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn kind_is_not_part_of_identity() {
        let src = snap(vec![SpecEntry::dir("x", 7)]);
        let dst = snap(vec![SpecEntry::file("x", 7)]);
        assert!(diff_snapshots(&src, &dst, &SpecIgnorePatterns::default()).is_empty());
    }

    #[test]
    fn large_snapshots_diff_by_lookup() {
        let src = snap(
            (0..20_000)
                .map(|i| SpecEntry::file(format!("f{i}"), i))
                .collect(),
        );
        let dst = snap(
            (0..20_000)
                .map(|i| SpecEntry::file(format!("f{i}"), if i % 1000 == 0 { -1 } else { i }))
                .collect(),
        );
        let plan = diff_snapshots(&src, &dst, &SpecIgnorePatterns::default());
        assert_eq!(plan.to_add.len(), 20);
        assert_eq!(plan.to_delete.len(), 20);
    }
}
