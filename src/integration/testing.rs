//! In-memory [`VersionControl`] used by the integration unit tests

use crate::vcs::{DiffSpec, Lookup, VcsError, VcsResult, VersionControl};
use std::collections::BTreeMap;

type Files = BTreeMap<String, Vec<u8>>;

/// Branches that all forked from one shared base snapshot
#[derive(Debug, Default)]
pub struct MemoryRepo {
    base: Files,
    branches: BTreeMap<String, Files>,
    pub broken: bool,
}

impl MemoryRepo {
    pub fn with_base(files: &[(&str, &str)]) -> Self {
        Self {
            base: to_files(files),
            ..Self::default()
        }
    }

    /// Add a branch whose tip is the base with `changes` applied (`None` deletes)
    pub fn branch(mut self, name: &str, changes: &[(&str, Option<&str>)]) -> Self {
        let mut files = self.base.clone();
        for (path, content) in changes {
            match content {
                Some(content) => files.insert(path.to_string(), content.as_bytes().to_vec()),
                None => files.remove(*path),
            };
        }
        self.branches.insert(name.to_string(), files);
        self
    }

    fn tip(&self, branch: &str) -> Option<&Files> {
        self.branches.get(branch)
    }
}

fn to_files(files: &[(&str, &str)]) -> Files {
    files
        .iter()
        .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
        .collect()
}

fn unsupported() -> VcsError {
    VcsError::CommandFailed {
        command: "memory".into(),
        stderr: "not supported".into(),
    }
}

impl VersionControl for MemoryRepo {
    fn current_branch(&self) -> Lookup<String> {
        Lookup::empty("no checkout")
    }

    fn all_branches(&self) -> Lookup<Vec<String>> {
        if self.broken {
            return Lookup::empty("broken");
        }
        Lookup::Found(self.branches.keys().cloned().collect())
    }

    fn changed_files(&self, source: &str, target: &str) -> Lookup<Vec<String>> {
        if self.broken {
            return Lookup::empty("broken");
        }
        let (Some(source), Some(_)) = (self.tip(source), self.tip(target)) else {
            return Lookup::empty("unknown revision");
        };

        let mut paths: Vec<String> = source
            .keys()
            .chain(self.base.keys())
            .filter(|path| source.get(*path) != self.base.get(*path))
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        Lookup::Found(paths)
    }

    fn file_at(&self, path: &str, branch: &str) -> Lookup<Vec<u8>> {
        match self.tip(branch).and_then(|files| files.get(path)) {
            Some(content) => Lookup::Found(content.clone()),
            None => Lookup::empty("absent"),
        }
    }

    fn is_dirty(&self, _include_untracked: bool) -> Lookup<bool> {
        Lookup::Found(false)
    }

    fn status_lines(&self) -> Lookup<Vec<String>> {
        Lookup::Found(Vec::new())
    }

    fn create_branch(&self, _name: &str) -> VcsResult<()> {
        Err(unsupported())
    }

    fn checkout(&self, _branch: &str) -> VcsResult<()> {
        Err(unsupported())
    }

    fn commit_all(&self, _message: &str) -> VcsResult<()> {
        Err(unsupported())
    }

    fn merge(&self, _source: &str) -> VcsResult<()> {
        Err(unsupported())
    }

    fn diff(&self, _spec: &DiffSpec) -> VcsResult<String> {
        Err(unsupported())
    }
}
