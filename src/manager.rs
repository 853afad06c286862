//! RepositoryManager - the operations behind every `ctx` command
//!
//! A manager is built from an explicit [`Context`] (project root plus
//! settings) once per invocation. Each operation loads the registry at most
//! once, resolves the active repository from it, binds a [`GitRepository`] to
//! that directory and delegates. Registry writes go through a
//! compare-and-swap save so a concurrent invocation's write is reported
//! rather than overwritten.

mod error;
mod outcome;
mod template;

pub use error::{CtxError, Result};
pub use outcome::{Outcome, Report};
pub use template::{STARTER_FILE_NAME, TemplateError};

use crate::integration::{self, MergePreview};
use crate::registry::{
    ConfigStore, MARKER_FILE_NAME, RegistryConfig, RepositoryRecord, Snapshot,
    resolve_project_root,
};
use crate::settings::Settings;
use crate::vcs::{DiffRange, DiffSpec, GitRepository, VcsError, VersionControl};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Message of the commit made when a repository is created
pub const INITIAL_COMMIT_MESSAGE: &str = "first commit";

/// Everything an invocation needs to know about where it runs
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    settings: Settings,
}

impl Context {
    /// Context for an already-known project root
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    /// Context rooted at the nearest ancestor of `start` holding a registry
    pub fn discover(start: &Path, settings: Settings) -> Self {
        Self::new(resolve_project_root(start), settings)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// One line of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Two-letter status code, trimmed (`M`, `??`, `A`, ...)
    pub code: String,
    pub path: String,
}

impl ChangeEntry {
    pub fn parse(line: &str) -> Self {
        match (line.get(..2), line.get(3..)) {
            (Some(code), Some(path)) => Self {
                code: code.trim().to_string(),
                path: path.to_string(),
            },
            _ => Self {
                code: line.trim().to_string(),
                path: String::new(),
            },
        }
    }
}

/// Snapshot of the active repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    pub repository: RepositoryRecord,
    pub current_branch: String,
    pub branches: Vec<String>,
    pub is_dirty: bool,
    pub changes: Vec<ChangeEntry>,
}

/// Payload of a successful [`RepositoryManager::create_new`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRepository {
    pub directory: PathBuf,
    pub copied_files: Vec<String>,
    /// Identifier stored in the registry
    pub relative_path: String,
}

/// Payload of a successful [`RepositoryManager::perform_integration`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub source: String,
    pub target: String,
}

/// Payload of a successful [`RepositoryManager::diff`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub diff: String,
    pub staged: bool,
    pub branches: Vec<String>,
    pub has_changes: bool,
}

/// Facade over the registry, git and the merge preview engine
#[derive(Debug, Clone)]
pub struct RepositoryManager {
    context: Context,
    store: ConfigStore,
}

impl RepositoryManager {
    pub fn new(context: Context) -> Self {
        let store = ConfigStore::new(context.root());
        Self { context, store }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn settings(&self) -> &Settings {
        &self.context.settings
    }

    fn bind(&self, path: &Path) -> GitRepository {
        GitRepository::open(path).with_identity(self.settings().identity.clone())
    }

    /// The active repository, if the registry names one that is still valid
    pub fn active_repository(&self) -> Option<RepositoryRecord> {
        self.resolve_active(&self.store.load()).ok()
    }

    fn resolve_active(&self, config: &RegistryConfig) -> Result<RepositoryRecord> {
        let name = config.active.as_deref().ok_or(CtxError::NoActiveRepository)?;
        let record = RepositoryRecord::inspect(self.context.root(), name, Some(name));
        if !record.is_valid {
            debug!(name, path = %record.path.display(), "active repository is missing or invalid");
            return Err(CtxError::NoActiveRepository);
        }
        Ok(record)
    }

    fn open_active(&self) -> Result<(RepositoryRecord, GitRepository)> {
        let record = self.resolve_active(&self.store.load())?;
        let repo = self.bind(&record.path);
        Ok((record, repo))
    }

    /// Create, initialise and activate a new context repository at `name`
    ///
    /// Nothing is rolled back on failure: once the directory exists, a later
    /// error leaves it in place, possibly uncommitted and unregistered.
    pub fn create_new(&self, name: &str) -> Result<Outcome<CreatedRepository>> {
        self.store.ensure_exists()?;
        let snapshot = self.store.load_snapshot();

        let directory = self.context.root().join(name);
        if directory.symlink_metadata().is_ok() {
            return Err(CtxError::AlreadyExists { path: directory });
        }
        std::fs::create_dir_all(&directory).map_err(|source| CtxError::Io {
            path: directory.clone(),
            source,
        })?;

        let copied_files =
            template::materialize(self.settings().template_dir.as_deref(), &directory)?;

        let marker = directory.join(MARKER_FILE_NAME);
        std::fs::write(&marker, b"").map_err(|source| CtxError::Io {
            path: marker,
            source,
        })?;

        let repo = GitRepository::init(
            &directory,
            &self.settings().default_branch,
            self.settings().identity.clone(),
        )?;
        repo.commit_all(INITIAL_COMMIT_MESSAGE)?;

        let relative_path = self.registry_name(name, &directory);
        self.activate(snapshot, &relative_path)?;
        info!(name = %relative_path, "created context repository");

        Ok(Outcome::new(
            format!("ctx repository initialized successfully in '{}'", name),
            CreatedRepository {
                directory,
                copied_files,
                relative_path,
            },
        ))
    }

    /// Register `name` as active on top of `snapshot`
    ///
    /// Fails without writing if the document changed since `snapshot` was taken.
    fn activate(&self, snapshot: Snapshot, name: &str) -> Result<()> {
        let mut config = snapshot.config;
        config.activate(name);
        self.store.save_if_unchanged(&config, &snapshot.fingerprint)?;
        Ok(())
    }

    /// Identifier to register for a repository created from `name`
    fn registry_name(&self, name: &str, directory: &Path) -> String {
        let requested = Path::new(name);
        if !requested.is_absolute() {
            return name.trim_end_matches(['/', '\\']).to_string();
        }
        directory
            .strip_prefix(self.context.root())
            .ok()
            .or_else(|| directory.file_name().map(Path::new))
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn status(&self) -> Result<Outcome<RepositoryStatus>> {
        let (record, repo) = self.open_active()?;
        let default_branch = &self.settings().default_branch;

        let current_branch = repo.current_branch().or_else(|| default_branch.clone());
        let branches = repo.all_branches().or_else(|| vec![default_branch.clone()]);
        let is_dirty = repo.is_dirty(true).or(false);
        let changes = if is_dirty {
            repo.status_lines()
                .or_default()
                .iter()
                .map(|line| ChangeEntry::parse(line))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Outcome::new(
            "Status retrieved successfully",
            RepositoryStatus {
                repository: record,
                current_branch,
                branches,
                is_dirty,
                changes,
            },
        ))
    }

    /// Start an exploration: create branch `topic` and switch to it
    pub fn explore(&self, topic: &str) -> Result<Outcome<String>> {
        let (_, repo) = self.open_active()?;
        repo.create_branch(topic)?;
        repo.checkout(topic)?;
        Ok(Outcome::new(
            format!("Started exploring '{}'", topic),
            topic.to_string(),
        ))
    }

    /// Commit every pending change with `message`
    ///
    /// The payload is the committed message, or `None` when there was
    /// nothing to capture.
    pub fn capture(&self, message: &str) -> Result<Outcome<Option<String>>> {
        let (_, repo) = self.open_active()?;
        if !repo.is_dirty(true).or(false) {
            return Ok(Outcome::new("No changes to capture", None));
        }

        repo.commit_all(message)?;
        Ok(Outcome::new(
            format!("Captured: {}", message),
            Some(message.to_string()),
        ))
    }

    /// Preview merging `source` into `target` (default branch when `None`)
    pub fn preview_integration(
        &self,
        source: &str,
        target: Option<&str>,
    ) -> Result<Outcome<MergePreview>> {
        let (_, repo) = self.open_active()?;
        let target = target.unwrap_or(&self.settings().default_branch);
        let preview = integration::preview(&repo, source, target)?;
        Ok(Outcome::new("Merge preview generated", preview))
    }

    /// Check out `target` (default branch when `None`) and merge `source` into it
    ///
    /// A failed merge is not retried or aborted; the working tree is left as
    /// git leaves it.
    pub fn perform_integration(
        &self,
        source: &str,
        target: Option<&str>,
    ) -> Result<Outcome<Integration>> {
        let (_, repo) = self.open_active()?;
        let target = target.unwrap_or(&self.settings().default_branch);

        repo.checkout(target)?;
        repo.merge(source).map_err(|cause| match cause {
            VcsError::UnknownRevision { .. } => CtxError::Vcs(cause),
            cause => CtxError::IntegrationFailed {
                exploration: source.to_string(),
                target: target.to_string(),
                cause,
            },
        })?;

        info!(source, target, "integrated exploration");
        Ok(Outcome::new(
            format!("Successfully merged {} into {}", source, target),
            Integration {
                source: source.to_string(),
                target: target.to_string(),
            },
        ))
    }

    /// Every registered repository with freshly checked state
    pub fn list(&self) -> Result<Outcome<Vec<RepositoryRecord>>> {
        let config = self.store.load();
        if config.is_empty() {
            return Ok(Outcome::new("No ctx repositories found", Vec::new()));
        }

        let records = config
            .discovered
            .iter()
            .map(|name| RepositoryRecord::inspect(self.context.root(), name, config.active.as_deref()))
            .collect();
        Ok(Outcome::new("Repositories listed", records))
    }

    /// Make the registered repository `name` the active one
    pub fn switch(&self, name: &str) -> Result<Outcome<String>> {
        let snapshot = self.store.load_snapshot();
        if !snapshot.config.contains(name) {
            return Err(CtxError::UnknownRepository {
                name: name.to_string(),
                available: snapshot.config.discovered,
            });
        }

        let record = RepositoryRecord::inspect(self.context.root(), name, None);
        if !record.is_valid {
            return Err(CtxError::InvalidRepository {
                name: name.to_string(),
            });
        }

        self.activate(snapshot, name)?;
        info!(name, "switched active repository");

        Ok(Outcome::new(
            format!("Switched to ctx repository: {}", name),
            name.to_string(),
        ))
    }

    /// Patch text for the working tree or between branches
    ///
    /// No branches diffs the working tree (or the index with `staged`), one
    /// diffs the working tree against that branch, two diff the second
    /// against its merge base with the first.
    pub fn diff(&self, staged: bool, branches: &[String]) -> Result<Outcome<DiffReport>> {
        let range = match branches {
            [] => DiffRange::WorkingTree,
            [revision] => DiffRange::Against(revision.clone()),
            [from, to] => DiffRange::Between(from.clone(), to.clone()),
            _ => {
                return Err(CtxError::TooManyArguments {
                    given: branches.len(),
                });
            }
        };

        let (_, repo) = self.open_active()?;
        let diff = match repo.diff(&DiffSpec { staged, range }) {
            Ok(diff) => diff,
            Err(VcsError::UnknownRevision { .. }) => {
                return Err(CtxError::UnknownRevision {
                    available: repo.all_branches().or_default(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Outcome::new(
            "Diff retrieved successfully",
            DiffReport {
                has_changes: !diff.trim().is_empty(),
                diff,
                staged,
                branches: branches.to_vec(),
            },
        ))
    }
}
