//! Merge previews and conflict prediction
//!
//! Before an exploration is merged back, the tool shows which files the merge
//! would touch and which of them differ on both sides. The detection is a
//! whole-file textual comparison of the two branch tips: it never consults the
//! merge base, so it reports an upper bound of what git's own merge would flag.

mod conflict;
mod preview;

#[cfg(test)]
mod testing;

pub use conflict::ConflictDetector;
pub use preview::{MergeRejection, preview};

use serde::{Deserialize, Serialize};

/// A file whose contents differ between the two branches of a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Repository-relative path
    pub path: String,

    /// Contents on the branch being merged into
    pub target_content: String,

    /// Contents on the branch being merged
    pub source_content: String,
}

/// What integrating `source` into `target` would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergePreview {
    source: String,
    target: String,
    changed_files: Vec<String>,
    conflicts: Vec<ConflictRecord>,
    has_conflicts: bool,
    is_clean: bool,
}

impl MergePreview {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        changed_files: Vec<String>,
        conflicts: Vec<ConflictRecord>,
    ) -> Self {
        let has_conflicts = !conflicts.is_empty();
        let is_clean = !changed_files.is_empty() && !has_conflicts;
        Self {
            source: source.into(),
            target: target.into(),
            changed_files,
            conflicts,
            has_conflicts,
            is_clean,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Files the merge would bring over from `source`
    pub fn changed_files(&self) -> &[String] {
        &self.changed_files
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        self.has_conflicts
    }

    /// There is something to merge and nothing is predicted to conflict
    ///
    /// `false` both when conflicts exist and when nothing changed at all;
    /// check [`Self::has_changes`] to tell those apart.
    pub fn is_clean(&self) -> bool {
        self.is_clean
    }

    pub fn has_changes(&self) -> bool {
        !self.changed_files.is_empty()
    }
}
