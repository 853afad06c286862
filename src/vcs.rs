//! Version control access for context repositories
//!
//! This module defines the narrow capability set the rest of the crate uses to
//! talk to a version-controlled directory, plus the git implementation of it.
//! Nothing here carries policy: it lists branches, reads files at revisions,
//! diffs, commits and merges, and reports what happened.
//!
//! Read-only calls return [`Lookup`] instead of `Result`. A failed lookup is
//! not an error for the caller (status and preview displays degrade to
//! defaults), but the reason is kept so it can be logged and tested.
//! State-changing calls return [`VcsResult`] and always surface failures.

mod error;
mod git;

pub use error::{Result as VcsResult, VcsError};
pub use git::GitRepository;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Branch name used when the backend cannot tell us anything better
pub const DEFAULT_BRANCH: &str = "main";

/// Outcome of a read-only backend query
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Lookup<T> {
    /// The backend answered
    Found(T),

    /// The backend had no answer; the string says why
    Empty(String),
}

impl<T> Lookup<T> {
    pub fn empty(reason: impl Display) -> Self {
        Lookup::Empty(reason.to_string())
    }

    pub fn from_result<E: Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(e) => Lookup::empty(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Reason the lookup came back empty, if it did
    pub fn reason(&self) -> Option<&str> {
        match self {
            Lookup::Found(_) => None,
            Lookup::Empty(reason) => Some(reason),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Empty(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Empty(reason) => Lookup::Empty(reason),
        }
    }

    /// Take the value, or log the reason and use `fallback`
    pub fn or(self, fallback: T) -> T {
        self.or_else(|| fallback)
    }

    pub fn or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Empty(reason) => {
                tracing::debug!(%reason, "backend lookup empty, using fallback");
                fallback()
            }
        }
    }
}

impl<T: Default> Lookup<T> {
    pub fn or_default(self) -> T {
        self.or_else(T::default)
    }
}

/// Name and email attached to commits made by the tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Which two sides a full diff compares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "revisions")]
pub enum DiffRange {
    /// Working tree against the index (or the index against HEAD when staged)
    WorkingTree,

    /// Working tree against a single revision
    Against(String),

    /// Changes on the second revision since it diverged from the first
    Between(String, String),
}

/// Arguments for [`VersionControl::diff`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSpec {
    pub staged: bool,
    pub range: DiffRange,
}

/// Capability set over one version-controlled directory
///
/// Implementations are bound to a directory at construction time.
pub trait VersionControl {
    /// Name of the checked-out branch
    fn current_branch(&self) -> Lookup<String>;

    /// All local branch names
    fn all_branches(&self) -> Lookup<Vec<String>>;

    /// Paths changed on `source` since it diverged from `target` (three-dot diff)
    fn changed_files(&self, source: &str, target: &str) -> Lookup<Vec<String>>;

    /// Contents of `path` as committed on `branch`
    fn file_at(&self, path: &str, branch: &str) -> Lookup<Vec<u8>>;

    /// Whether the working tree has uncommitted changes
    fn is_dirty(&self, include_untracked: bool) -> Lookup<bool>;

    /// Porcelain status lines, one per changed path
    fn status_lines(&self) -> Lookup<Vec<String>>;

    fn create_branch(&self, name: &str) -> VcsResult<()>;

    fn checkout(&self, branch: &str) -> VcsResult<()>;

    /// Stage everything (including untracked files) and commit
    fn commit_all(&self, message: &str) -> VcsResult<()>;

    /// Merge `source` into the checked-out branch without opening an editor
    fn merge(&self, source: &str) -> VcsResult<()>;

    /// Full patch text for the given range
    fn diff(&self, spec: &DiffSpec) -> VcsResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_only_when_empty() {
        assert_eq!(Lookup::Found("dev".to_string()).or("main".into()), "dev");
        assert_eq!(
            Lookup::<String>::empty("detached").or("main".into()),
            "main"
        );
    }

    #[test]
    fn lookup_keeps_reason() {
        let lookup: Lookup<Vec<String>> = Lookup::from_result(Err::<Vec<String>, _>("boom"));
        assert!(!lookup.is_found());
        assert_eq!(lookup.reason(), Some("boom"));
        assert!(lookup.or_default().is_empty());
    }

    #[test]
    fn genuinely_empty_is_still_found() {
        let lookup = Lookup::Found(Vec::<String>::new());
        assert!(lookup.is_found());
        assert_eq!(lookup.reason(), None);
    }
}
