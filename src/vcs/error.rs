//! Error types for version control operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by state-changing backend calls
#[derive(Debug, Error)]
pub enum VcsError {
    /// The git binary could not be started at all
    #[error("Failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// git ran and exited non-zero
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// A revision argument did not name anything git knows about
    #[error("Unknown revision in git {command}: {stderr}")]
    UnknownRevision { command: String, stderr: String },

    /// Directory is not a git repository
    /// Names starting with `-` would be parsed by git as options
    #[error("Invalid branch name '{name}'")]
    InvalidBranchName { name: String },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },
}

/// Result type alias using VcsError
pub type Result<T> = std::result::Result<T, VcsError>;

impl VcsError {
    /// Classify a failed invocation from its stderr
    pub(crate) fn from_failure(command: String, stderr: &str) -> Self {
        let stderr = stderr.trim().to_string();
        let lower = stderr.to_lowercase();
        if lower.contains("unknown revision") || lower.contains("bad revision") {
            VcsError::UnknownRevision { command, stderr }
        } else {
            VcsError::CommandFailed { command, stderr }
        }
    }

    /// Rejection of a revision argument before it reaches git
    pub(crate) fn option_like_revision(command: &str, revision: &str) -> Self {
        VcsError::UnknownRevision {
            command: command.to_string(),
            stderr: format!("'{}' is not a revision", revision),
        }
    }
}
