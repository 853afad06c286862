//! Starter files for new context repositories

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File written when no template directory is configured
pub const STARTER_FILE_NAME: &str = "ctx.txt";

const STARTER_CONTENTS: &str = "\
# Context

What are we working on, and why?

## Goals

## Open questions

## Decisions
";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template directory not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Could not read template directory {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fill `dest` with starter files and return the names written
///
/// With a template directory, every regular file directly inside it is copied
/// (subdirectories are ignored). Without one, a single built-in starter file is
/// written.
pub fn materialize(template_dir: Option<&Path>, dest: &Path) -> Result<Vec<String>, TemplateError> {
    match template_dir {
        Some(dir) => copy_files(dir, dest),
        None => {
            let to = dest.join(STARTER_FILE_NAME);
            std::fs::write(&to, STARTER_CONTENTS).map_err(|source| TemplateError::Copy {
                from: PathBuf::from(STARTER_FILE_NAME),
                to,
                source,
            })?;
            Ok(vec![STARTER_FILE_NAME.to_string()])
        }
    }
}

fn copy_files(dir: &Path, dest: &Path) -> Result<Vec<String>, TemplateError> {
    if !dir.is_dir() {
        return Err(TemplateError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let read_error = |source: std::io::Error| TemplateError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if entry.file_type().map_err(read_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut copied = Vec::with_capacity(files.len());
    for from in files {
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = dest.join(name);
        std::fs::copy(&from, &to).map_err(|source| TemplateError::Copy {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        debug!(file = %name.to_string_lossy(), "copied template file");
        copied.push(name.to_string_lossy().into_owned());
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_template_writes_starter_file() {
        let dest = TempDir::new().unwrap();
        let copied = materialize(None, dest.path()).unwrap();
        assert_eq!(copied, vec![STARTER_FILE_NAME]);
        let text = std::fs::read_to_string(dest.path().join(STARTER_FILE_NAME)).unwrap();
        assert!(text.starts_with("# Context"));
    }

    #[test]
    fn copies_top_level_files_only() {
        let template = TempDir::new().unwrap();
        std::fs::write(template.path().join("b.md"), "b").unwrap();
        std::fs::write(template.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(template.path().join("nested")).unwrap();
        std::fs::write(template.path().join("nested").join("c.txt"), "c").unwrap();

        let dest = TempDir::new().unwrap();
        let copied = materialize(Some(template.path()), dest.path()).unwrap();
        assert_eq!(copied, vec!["a.txt", "b.md"]);
        assert!(!dest.path().join("nested").exists());
        assert_eq!(std::fs::read_to_string(dest.path().join("a.txt")).unwrap(), "a");
    }

    #[test]
    fn missing_template_directory_is_an_error() {
        let dest = TempDir::new().unwrap();
        let err = materialize(Some(&dest.path().join("nope")), dest.path()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
    }
}
