//! Tool settings read from the environment
//!
//! These are per-invocation knobs, separate from the registry document:
//!
//! | Variable             | Meaning                                   | Default        |
//! |----------------------|-------------------------------------------|----------------|
//! | `CTX_DEFAULT_BRANCH` | initial branch and default merge target   | `main`         |
//! | `CTX_TEMPLATE_DIR`   | directory of starter files for `ctx new`  | built-in file  |
//! | `CTX_AUTHOR_NAME`    | commit author/committer name              | git config     |
//! | `CTX_AUTHOR_EMAIL`   | commit author/committer email             | git config     |
//! | `CTX_LOG`            | tracing filter directive                  | `warn`         |
//!
//! The identity is only used when both name and email are set.

use crate::vcs::{CommitIdentity, DEFAULT_BRANCH};
use std::path::PathBuf;
use tracing::{debug, warn};

pub const ENV_DEFAULT_BRANCH: &str = "CTX_DEFAULT_BRANCH";
pub const ENV_TEMPLATE_DIR: &str = "CTX_TEMPLATE_DIR";
pub const ENV_AUTHOR_NAME: &str = "CTX_AUTHOR_NAME";
pub const ENV_AUTHOR_EMAIL: &str = "CTX_AUTHOR_EMAIL";
pub const ENV_LOG: &str = "CTX_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Branch created by `git init` and used when no merge target is given
    pub default_branch: String,

    /// Starter files copied into new repositories; `None` uses the built-in template
    pub template_dir: Option<PathBuf>,

    /// Identity passed to git for commits and merges
    pub identity: Option<CommitIdentity>,

    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            template_dir: None,
            identity: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => {
                debug!(name, "setting from environment");
                Some(value.trim().to_string())
            }
            Some(_) => {
                warn!(name, "environment variable is set but empty, ignoring");
                None
            }
            None => None,
        };

        let defaults = Self::default();
        let identity = match (read(ENV_AUTHOR_NAME), read(ENV_AUTHOR_EMAIL)) {
            (Some(name), Some(email)) => Some(CommitIdentity { name, email }),
            (None, None) => None,
            _ => {
                warn!(
                    "only one of {} and {} is set, using git's configured identity",
                    ENV_AUTHOR_NAME, ENV_AUTHOR_EMAIL
                );
                None
            }
        };

        Self {
            default_branch: read(ENV_DEFAULT_BRANCH).unwrap_or(defaults.default_branch),
            template_dir: read(ENV_TEMPLATE_DIR).map(PathBuf::from),
            identity,
            log_filter: read(ENV_LOG).unwrap_or(defaults.log_filter),
        }
    }

    pub fn with_identity(mut self, name: &str, email: &str) -> Self {
        self.identity = Some(CommitIdentity {
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }
}
