//! Registry of context repositories
//!
//! The registry is a small TOML document (`ctx.config`) at the project root
//! listing every context repository the tool has created and which one is
//! active. Repository validity is never stored: [`RepositoryRecord`] re-derives
//! it from disk each time it is built.

mod error;
mod store;

pub use error::{PersistenceError, Result as PersistenceResult};
pub use store::{ConfigStore, Fingerprint, Snapshot};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the registry document
pub const CONFIG_FILE_NAME: &str = "ctx.config";

/// Zero-byte file marking a directory as a managed context repository
pub const MARKER_FILE_NAME: &str = ".ctx";

/// How many directories (starting with the current one) are searched for the registry
pub const MAX_ROOT_SEARCH_DEPTH: usize = 10;

/// Persisted registry contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Identifier of the active repository, relative to the project root
    #[serde(rename = "active_ctx", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,

    /// Every registered repository, in registration order
    #[serde(rename = "discovered_ctx", default)]
    pub discovered: Vec<String>,
}

impl RegistryConfig {
    /// Drop duplicate entries and make sure the active entry is registered
    pub fn normalized(mut self) -> Self {
        let mut seen: Vec<String> = Vec::with_capacity(self.discovered.len());
        for name in self.discovered.drain(..) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        self.discovered = seen;

        if let Some(active) = &self.active
            && !self.discovered.contains(active)
        {
            self.discovered.push(active.clone());
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.discovered.iter().any(|d| d == name)
    }

    /// Add `name` to the discovered list unless it is already there
    pub fn register(&mut self, name: &str) {
        if !self.contains(name) {
            self.discovered.push(name.to_string());
        }
    }

    /// Register `name` and make it the active repository
    pub fn activate(&mut self, name: &str) {
        self.register(name);
        self.active = Some(name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

/// A registered repository with its on-disk state freshly checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Identifier as stored in the registry
    pub name: String,

    /// Location relative to the process, i.e. project root joined with the name
    pub path: PathBuf,

    pub absolute_path: PathBuf,

    /// The directory exists
    pub exists: bool,

    /// The directory exists and carries the marker file
    pub is_valid: bool,

    pub is_active: bool,
}

impl RepositoryRecord {
    /// Build a record for `name` under `root`, checking the filesystem now
    pub fn inspect(root: &Path, name: &str, active: Option<&str>) -> Self {
        let path = root.join(name);
        let absolute_path = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
        let exists = path.is_dir();
        let is_valid = exists && path.join(MARKER_FILE_NAME).is_file();

        Self {
            name: name.to_string(),
            path,
            absolute_path,
            exists,
            is_valid,
            is_active: active == Some(name),
        }
    }
}

/// Find the directory holding the registry document
///
/// Looks at `start` and its ancestors, at most [`MAX_ROOT_SEARCH_DEPTH`]
/// directories in total. Falls back to `start` when nothing is found.
pub fn resolve_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .take(MAX_ROOT_SEARCH_DEPTH)
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf())
}
