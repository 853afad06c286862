//! ctx - collaborative memory for humans and LLMs
//!
//! This library manages a set of git-backed "context" repositories, tracks
//! which one is active, and layers an explore / capture / integrate workflow
//! over plain branches and commits.
//!
//! # Architecture
//!
//! The library is organized into focused modules:
//!
//! - **registry** - The `ctx.config` document: which repositories exist and which is active
//! - **vcs** - Narrow capability trait over a git directory, plus its git implementation
//! - **integration** - Merge previews and whole-file conflict prediction
//! - **manager** - `RepositoryManager`, the operations behind every command
//! - **settings** - Per-invocation settings read from the environment
//!
//! # Example
//!
//! ```rust,no_run
//! use ctx::{Context, RepositoryManager, Settings};
//!
//! let cwd = std::env::current_dir().expect("Failed to read current directory");
//! let manager = RepositoryManager::new(Context::discover(&cwd, Settings::from_env()));
//!
//! match manager.preview_integration("idea", None) {
//!     Ok(outcome) => {
//!         let preview = outcome.data;
//!         for conflict in preview.conflicts() {
//!             println!("{} differs on both branches", conflict.path);
//!         }
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

pub mod integration;
pub mod manager;
pub mod registry;
pub mod settings;
pub mod vcs;

pub use integration::{ConflictDetector, ConflictRecord, MergePreview, MergeRejection};
pub use manager::{
    ChangeEntry, Context, CreatedRepository, CtxError, DiffReport, Integration, Outcome, Report,
    RepositoryManager, RepositoryStatus,
};
pub use registry::{ConfigStore, PersistenceError, RegistryConfig, RepositoryRecord};
pub use settings::Settings;
pub use vcs::{GitRepository, Lookup, VcsError, VersionControl};
