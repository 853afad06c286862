//! Building a [`MergePreview`] without touching the repository

use super::{ConflictDetector, MergePreview};
use crate::vcs::{DEFAULT_BRANCH, VersionControl};
use serde::Serialize;
use thiserror::Error;

/// Why a merge request was refused before looking at any files
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum MergeRejection {
    #[error("Cannot integrate '{branch}' into itself")]
    SelfMerge { branch: String },

    #[error("Exploration '{branch}' does not exist")]
    UnknownSource {
        branch: String,
        available: Vec<String>,
    },

    #[error("Target branch '{branch}' does not exist")]
    UnknownTarget {
        branch: String,
        available: Vec<String>,
    },
}

/// Preview integrating `source` into `target`
pub fn preview<V: VersionControl + ?Sized>(
    vcs: &V,
    source: &str,
    target: &str,
) -> Result<MergePreview, MergeRejection> {
    if source == target {
        return Err(MergeRejection::SelfMerge {
            branch: source.to_string(),
        });
    }

    let branches = vcs
        .all_branches()
        .or_else(|| vec![DEFAULT_BRANCH.to_string()]);
    if !branches.iter().any(|b| b == source) {
        return Err(MergeRejection::UnknownSource {
            branch: source.to_string(),
            available: branches,
        });
    }
    if !branches.iter().any(|b| b == target) {
        return Err(MergeRejection::UnknownTarget {
            branch: target.to_string(),
            available: branches,
        });
    }

    let changed_files = vcs.changed_files(source, target).or_default();
    let conflicts = ConflictDetector::new(vcs).detect(source, target);
    Ok(MergePreview::new(source, target, changed_files, conflicts))
}
