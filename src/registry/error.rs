//! Error types for registry persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing the registry document
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Another process rewrote the document between our load and save
    #[error("{path} was changed by another process; nothing was saved")]
    ConcurrentModification { path: PathBuf },
}

/// Result type alias using PersistenceError
pub type Result<T> = std::result::Result<T, PersistenceError>;
