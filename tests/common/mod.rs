#![allow(dead_code)]

use ctx::{Context, RepositoryManager, Settings};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A throwaway project root with a manager bound to it
pub struct Project {
    pub dir: TempDir,
    pub manager: RepositoryManager,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let settings = Settings::default().with_identity("ctx tests", "tests@ctx.invalid");
        let manager = RepositoryManager::new(Context::new(dir.path(), settings));
        Self { dir, manager }
    }

    /// Project with a freshly created, active repository named `context`
    pub fn with_repository() -> Self {
        let project = Self::new();
        project
            .manager
            .create_new("context")
            .expect("create_new should succeed");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("ctx.config")
    }

    /// Write `contents` to `file` inside the `context` repository
    pub fn write(&self, file: &str, contents: &str) {
        std::fs::write(self.repo_path("context").join(file), contents).expect("write file");
    }

    pub fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.repo_path("context").join(file)).expect("read file")
    }

    /// Run git inside the `context` repository and return stdout
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.repo_path("context"), args)
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"])
            .trim()
            .parse()
            .expect("commit count")
    }

    /// Write and capture in one step
    pub fn commit_file(&self, file: &str, contents: &str, message: &str) {
        self.write(file, contents);
        self.manager.capture(message).expect("capture should succeed");
    }
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=ctx tests", "-c", "user.email=tests@ctx.invalid"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
