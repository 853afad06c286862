//! Error types for repository management operations

use super::template::TemplateError;
use crate::integration::MergeRejection;
use crate::registry::PersistenceError;
use crate::vcs::VcsError;
use serde_json::{Value, json};
use std::path::PathBuf;
use thiserror::Error;

/// Every way a [`RepositoryManager`](super::RepositoryManager) operation can fail
#[derive(Debug, Error)]
pub enum CtxError {
    /// The registry document could not be written
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("No active ctx repository. Run 'ctx new' or 'ctx switch' first.")]
    NoActiveRepository,

    #[error("ctx repository '{name}' not found in config")]
    UnknownRepository {
        name: String,
        available: Vec<String>,
    },

    /// Registered, but the directory or its marker file is gone
    #[error("ctx repository '{name}' directory is missing or invalid")]
    InvalidRepository { name: String },

    #[error("Directory '{}' already exists", path.display())]
    AlreadyExists { path: PathBuf },

    #[error(transparent)]
    InvalidMergeRequest(#[from] MergeRejection),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// git refused the merge; the working tree may hold a partial merge
    #[error(
        "Merging '{exploration}' into '{target}' failed. Resolve the conflicts manually in the ctx repository: {cause}"
    )]
    IntegrationFailed {
        exploration: String,
        target: String,
        #[source]
        cause: VcsError,
    },

    #[error("Too many branch arguments ({given}). Use 0, 1, or 2 branches.")]
    TooManyArguments { given: usize },

    #[error("Unknown branch or revision specified")]
    UnknownRevision { available: Vec<String> },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Could not create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using CtxError
pub type Result<T> = std::result::Result<T, CtxError>;

impl CtxError {
    /// Structured context a front end can offer alongside the message
    pub fn details(&self) -> Option<Value> {
        match self {
            CtxError::UnknownRepository { available, .. } => {
                Some(json!({ "available_repositories": available }))
            }
            CtxError::UnknownRevision { available } => {
                Some(json!({ "available_branches": available }))
            }
            CtxError::InvalidMergeRequest(rejection) => serde_json::to_value(rejection).ok(),
            _ => None,
        }
    }
}
