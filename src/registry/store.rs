//! Loading and saving the registry document

use super::error::{PersistenceError, Result};
use super::{CONFIG_FILE_NAME, RegistryConfig, resolve_project_root};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Identity of the registry bytes as they were when loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// No document on disk
    Absent,

    /// Hex SHA-256 of the document bytes
    Digest(String),
}

impl Fingerprint {
    fn of(bytes: Option<&[u8]>) -> Self {
        match bytes {
            None => Fingerprint::Absent,
            Some(bytes) => Fingerprint::Digest(hex::encode(Sha256::digest(bytes))),
        }
    }
}

/// A loaded registry together with the fingerprint of what was read
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub config: RegistryConfig,
    pub fingerprint: Fingerprint,
}

/// Reads and writes `ctx.config` under a project root
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the nearest directory (from `start` upward) holding a registry
    pub fn discover(start: &Path) -> Self {
        Self::new(resolve_project_root(start))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the registry document
    pub fn path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Load the registry, falling back to an empty one on any problem
    pub fn load(&self) -> RegistryConfig {
        self.load_snapshot().config
    }

    /// Load the registry along with a fingerprint for [`Self::save_if_unchanged`]
    pub fn load_snapshot(&self) -> Snapshot {
        let path = self.path();
        let bytes = match read_optional(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "registry unreadable, using empty registry");
                return Snapshot {
                    config: RegistryConfig::default(),
                    fingerprint: Fingerprint::Absent,
                };
            }
        };

        let fingerprint = Fingerprint::of(bytes.as_deref());
        let config = match bytes {
            None => {
                debug!(path = %path.display(), "no registry document");
                RegistryConfig::default()
            }
            Some(bytes) => parse(&path, &bytes),
        };

        Snapshot {
            config,
            fingerprint,
        }
    }

    /// Create an empty registry document unless one already exists
    ///
    /// Returns `true` when the document was created by this call.
    pub fn ensure_exists(&self) -> Result<bool> {
        let path = self.path();
        let contents = toml::to_string(&RegistryConfig::default())?;

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => return Err(PersistenceError::Write { path, source }),
        };

        file.write_all(contents.as_bytes())
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "created registry document");
        Ok(true)
    }

    /// Replace the whole document with `config`
    ///
    /// Writes to a sibling temp file and renames it over the document, so a
    /// reader never sees a half-written registry.
    pub fn save(&self, config: &RegistryConfig) -> Result<()> {
        let path = self.path();
        let contents = toml::to_string(config)?;
        let tmp_path = path.with_file_name(temp_file_name());

        std::fs::write(&tmp_path, contents).map_err(|source| PersistenceError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|source| PersistenceError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "saved registry");
        Ok(())
    }

    /// Save `config` only if the document still matches `expected`
    ///
    /// The check and the write are not atomic with respect to other
    /// processes, but a concurrent write that landed since the load is
    /// detected instead of silently overwritten.
    pub fn save_if_unchanged(&self, config: &RegistryConfig, expected: &Fingerprint) -> Result<()> {
        let path = self.path();
        let current = read_optional(&path).map_err(|source| PersistenceError::Read {
            path: path.clone(),
            source,
        })?;

        if Fingerprint::of(current.as_deref()) != *expected {
            warn!(path = %path.display(), "registry changed since it was loaded");
            return Err(PersistenceError::ConcurrentModification { path });
        }
        self.save(config)
    }
}

/// Per-process temp name, so concurrent saves never share a temp file
fn temp_file_name() -> String {
    format!(".{}.{}.tmp", CONFIG_FILE_NAME, std::process::id())
}

fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse(path: &Path, bytes: &[u8]) -> RegistryConfig {
    let parsed = std::str::from_utf8(bytes)
        .map_err(|e| e.to_string())
        .and_then(|text| toml::from_str::<RegistryConfig>(text).map_err(|e| e.to_string()));

    match parsed {
        Ok(config) => config.normalized(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "registry is not valid, using empty registry");
            RegistryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn missing_document_loads_empty() {
        let (_dir, store) = store();
        let snapshot = store.load_snapshot();
        assert_eq!(snapshot.config, RegistryConfig::default());
        assert_eq!(snapshot.fingerprint, Fingerprint::Absent);
    }

    #[test]
    fn garbage_document_loads_empty() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "active_ctx = [not toml").unwrap();
        assert_eq!(store.load(), RegistryConfig::default());

        std::fs::write(store.path(), [0xff, 0xfe, 0x00]).unwrap();
        assert_eq!(store.load(), RegistryConfig::default());
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            "active_ctx = \"context\"\ndiscovered_ctx = [\"context\"]\ntheme = \"dark\"\n",
        )
        .unwrap();

        let config = store.load();
        assert_eq!(config.active.as_deref(), Some("context"));
        store.save(&config).unwrap();
        let written = std::fs::read_to_string(store.path()).unwrap();
        assert!(!written.contains("theme"));
    }

    #[test]
    fn save_then_load_is_a_fixed_point() {
        let (_dir, store) = store();
        for config in [
            RegistryConfig::default(),
            RegistryConfig {
                active: None,
                discovered: vec!["context".into(), "notes".into()],
            },
            RegistryConfig {
                active: Some("notes".into()),
                discovered: vec!["context".into(), "notes".into()],
            },
        ] {
            store.save(&config).unwrap();
            let loaded = store.load();
            assert_eq!(loaded, config);

            let first = std::fs::read(store.path()).unwrap();
            store.save(&loaded).unwrap();
            assert_eq!(std::fs::read(store.path()).unwrap(), first);
        }
    }

    #[test]
    fn ensure_exists_is_idempotent() {
        let (_dir, store) = store();
        assert!(store.ensure_exists().unwrap());
        let first = std::fs::read(store.path()).unwrap();

        assert!(!store.ensure_exists().unwrap());
        assert_eq!(std::fs::read(store.path()).unwrap(), first);
        assert_eq!(store.load(), RegistryConfig::default());
    }

    #[test]
    fn ensure_exists_never_overwrites() {
        let (_dir, store) = store();
        let mut config = RegistryConfig::default();
        config.activate("context");
        store.save(&config).unwrap();

        assert!(!store.ensure_exists().unwrap());
        assert_eq!(store.load(), config);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let (dir, store) = store();
        store.save(&RegistryConfig::default()).unwrap();
        assert!(!dir.path().join(temp_file_name()).exists());

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(CONFIG_FILE_NAME)]);
    }

    #[test]
    fn temp_file_name_is_per_process() {
        let name = temp_file_name();
        assert!(name.starts_with(".ctx.config."));
        assert!(name.contains(&std::process::id().to_string()));
    }

    #[test]
    fn save_if_unchanged_detects_foreign_write() {
        let (_dir, store) = store();
        store.ensure_exists().unwrap();
        let snapshot = store.load_snapshot();

        let mut theirs = RegistryConfig::default();
        theirs.activate("theirs");
        store.save(&theirs).unwrap();

        let mut ours = snapshot.config.clone();
        ours.activate("ours");
        let err = store
            .save_if_unchanged(&ours, &snapshot.fingerprint)
            .unwrap_err();
        assert!(matches!(err, PersistenceError::ConcurrentModification { .. }));
        assert_eq!(store.load(), theirs);
    }

    #[test]
    fn save_if_unchanged_writes_when_untouched() {
        let (_dir, store) = store();
        let snapshot = store.load_snapshot();
        let mut ours = snapshot.config.clone();
        ours.activate("ours");

        store.save_if_unchanged(&ours, &snapshot.fingerprint).unwrap();
        assert_eq!(store.load(), ours);
    }
}
