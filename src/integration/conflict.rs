//! Whole-file conflict prediction between two branches

use super::ConflictRecord;
use crate::vcs::VersionControl;
use tracing::debug;

/// Predicts conflicts by comparing branch tips file by file
pub struct ConflictDetector<'a, V: VersionControl + ?Sized> {
    vcs: &'a V,
}

impl<'a, V: VersionControl + ?Sized> ConflictDetector<'a, V> {
    pub fn new(vcs: &'a V) -> Self {
        Self { vcs }
    }

    /// Files that differ between the tips of `source` and `target`
    ///
    /// Candidates are the files changed on either side since the branches
    /// diverged, source side first. A file missing on one of the two tips is
    /// skipped, so asymmetric adds and deletes are never reported.
    pub fn detect(&self, source: &str, target: &str) -> Vec<ConflictRecord> {
        let mut candidates = self.vcs.changed_files(source, target).or_default();
        for path in self.vcs.changed_files(target, source).or_default() {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }

        let mut conflicts = Vec::new();
        for path in candidates {
            let target_content = self.vcs.file_at(&path, target);
            let source_content = self.vcs.file_at(&path, source);

            let (Some(target_content), Some(source_content)) =
                (target_content.found(), source_content.found())
            else {
                debug!(%path, source, target, "file missing on one side, not a conflict");
                continue;
            };

            if target_content != source_content {
                conflicts.push(ConflictRecord {
                    path,
                    target_content: String::from_utf8_lossy(&target_content).into_owned(),
                    source_content: String::from_utf8_lossy(&source_content).into_owned(),
                });
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::testing::MemoryRepo;
    use std::collections::BTreeSet;

    fn paths(records: &[ConflictRecord]) -> BTreeSet<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn differing_file_is_a_conflict() {
        let repo = MemoryRepo::with_base(&[("a.txt", "base")])
            .branch("main", &[("a.txt", Some("X"))])
            .branch("feature", &[("a.txt", Some("Y"))]);

        let conflicts = ConflictDetector::new(&repo).detect("feature", "main");
        assert_eq!(
            conflicts,
            vec![ConflictRecord {
                path: "a.txt".into(),
                target_content: "X".into(),
                source_content: "Y".into(),
            }]
        );
    }

    #[test]
    fn identical_edits_are_not_conflicts() {
        let repo = MemoryRepo::with_base(&[("a.txt", "base")])
            .branch("main", &[("a.txt", Some("same"))])
            .branch("feature", &[("a.txt", Some("same"))]);

        assert!(ConflictDetector::new(&repo).detect("feature", "main").is_empty());
    }

    #[test]
    fn one_sided_add_or_delete_is_not_a_conflict() {
        let repo = MemoryRepo::with_base(&[("gone.txt", "old")])
            .branch("main", &[])
            .branch("feature", &[("new.txt", Some("hi")), ("gone.txt", None)]);

        assert!(ConflictDetector::new(&repo).detect("feature", "main").is_empty());
    }

    #[test]
    fn detection_is_symmetric() {
        let repo = MemoryRepo::with_base(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")])
            .branch("main", &[("a.txt", Some("main a")), ("c.txt", Some("main c"))])
            .branch(
                "feature",
                &[("a.txt", Some("feature a")), ("b.txt", Some("feature b"))],
            );

        let forward = ConflictDetector::new(&repo).detect("feature", "main");
        let backward = ConflictDetector::new(&repo).detect("main", "feature");
        assert_eq!(paths(&forward), paths(&backward));
        assert_eq!(paths(&forward), BTreeSet::from(["a.txt", "b.txt", "c.txt"]));

        let a_forward = forward.iter().find(|r| r.path == "a.txt").unwrap();
        let a_backward = backward.iter().find(|r| r.path == "a.txt").unwrap();
        assert_eq!(a_forward.target_content, a_backward.source_content);
        assert_eq!(a_forward.source_content, a_backward.target_content);
    }

    #[test]
    fn source_side_changes_come_first() {
        let repo = MemoryRepo::with_base(&[("a.txt", "a"), ("z.txt", "z")])
            .branch("main", &[("a.txt", Some("main a"))])
            .branch("feature", &[("z.txt", Some("feature z"))]);

        let conflicts = ConflictDetector::new(&repo).detect("feature", "main");
        let order: Vec<&str> = conflicts.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(order, vec!["z.txt", "a.txt"]);
    }

    #[test]
    fn backend_failure_yields_no_conflicts() {
        let mut repo = MemoryRepo::with_base(&[("a.txt", "a")])
            .branch("main", &[("a.txt", Some("X"))])
            .branch("feature", &[("a.txt", Some("Y"))]);
        repo.broken = true;

        assert!(ConflictDetector::new(&repo).detect("feature", "main").is_empty());
    }
}
