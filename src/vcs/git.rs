//! Git implementation of [`VersionControl`]
//!
//! Branch and blob introspection goes through gix. Anything that touches the
//! working tree or index (commit, checkout, merge) and the three-dot diffs
//! shell out to the `git` binary, which owns those semantics.

use super::error::{Result, VcsError};
use super::{CommitIdentity, DiffRange, DiffSpec, Lookup, VersionControl};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// A git repository rooted at a fixed directory
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
    identity: Option<CommitIdentity>,
}

impl GitRepository {
    /// Bind to an existing repository directory
    ///
    /// No I/O happens here; a directory that is not a repository shows up as
    /// empty lookups and failing commands.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            identity: None,
        }
    }

    /// Initialise a new repository whose first branch is `initial_branch`
    pub fn init(
        path: impl Into<PathBuf>,
        initial_branch: &str,
        identity: Option<CommitIdentity>,
    ) -> Result<Self> {
        let repo = Self::open(path).with_identity(identity);
        repo.run(&["init", "--initial-branch", initial_branch])?;
        info!(path = %repo.path.display(), branch = initial_branch, "initialised git repository");
        Ok(repo)
    }

    /// Use `identity` as author and committer for commits and merges
    pub fn with_identity(mut self, identity: Option<CommitIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run git with `args` in the repository directory and return stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        debug!(path = %self.path.display(), %command, "running git");

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.path);
        if let Some(identity) = &self.identity {
            cmd.arg("-c")
                .arg(format!("user.name={}", identity.name))
                .arg("-c")
                .arg(format!("user.email={}", identity.email));
        }
        let output = cmd
            .args(args)
            .output()
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(VcsError::from_failure(
                command,
                &String::from_utf8_lossy(&output.stderr),
            ))
        }
    }

    fn open_gix(&self) -> Result<gix::Repository> {
        gix::open(&self.path).map_err(|_| VcsError::NotARepository {
            path: self.path.clone(),
        })
    }

    fn local_branches(&self) -> std::result::Result<Vec<String>, String> {
        let repo = self.open_gix().map_err(|e| e.to_string())?;
        let references = repo.references().map_err(|e| e.to_string())?;
        let branches = references.local_branches().map_err(|e| e.to_string())?;

        let mut names = Vec::new();
        for reference in branches {
            let reference = reference.map_err(|e| e.to_string())?;
            names.push(reference.name().shorten().to_string());
        }
        Ok(names)
    }

    /// Blob contents of `path` in the tree of `branch`'s tip commit
    fn blob_at(&self, path: &str, branch: &str) -> std::result::Result<Option<Vec<u8>>, String> {
        let repo = self.open_gix().map_err(|e| e.to_string())?;
        let commit_id = repo
            .rev_parse_single(branch)
            .map_err(|e| format!("Failed to resolve '{}': {}", branch, e))?;

        let commit = repo
            .find_object(commit_id)
            .map_err(|e| e.to_string())?
            .try_into_commit()
            .map_err(|_| format!("'{}' does not point at a commit", branch))?;

        let mut tree = commit
            .tree()
            .map_err(|e| format!("Failed to get tree for '{}': {}", branch, e))?;

        let Some(entry) = tree
            .peel_to_entry_by_path(path)
            .map_err(|e| e.to_string())?
        else {
            return Ok(None);
        };

        let blob = repo.find_object(entry.id()).map_err(|e| e.to_string())?;
        Ok(Some(blob.data.to_vec()))
    }

    fn porcelain(&self, include_untracked: bool) -> Result<Vec<String>> {
        let untracked = if include_untracked {
            "--untracked-files=all"
        } else {
            "--untracked-files=no"
        };
        let stdout = self.run(&["status", "--porcelain", "-z", untracked])?;

        let mut lines = Vec::new();
        let mut entries = stdout.split('\0').filter(|entry| !entry.is_empty());
        while let Some(entry) = entries.next() {
            // Renames and copies are followed by their original path
            if entry.get(..2).is_some_and(|code| code.contains(['R', 'C'])) {
                entries.next();
            }
            lines.push(entry.to_string());
        }
        Ok(lines)
    }
}

/// Refuse caller-supplied revisions that git would parse as options
fn check_revision<'r>(command: &str, revision: &'r str) -> Result<&'r str> {
    if revision.starts_with('-') {
        Err(VcsError::option_like_revision(command, revision))
    } else {
        Ok(revision)
    }
}

/// Split NUL-terminated path output, dropping duplicates
fn split_paths(stdout: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for path in stdout.split('\0').filter(|p| !p.is_empty()) {
        if !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    }
    files
}

impl VersionControl for GitRepository {
    fn current_branch(&self) -> Lookup<String> {
        let repo = match self.open_gix() {
            Ok(repo) => repo,
            Err(e) => return Lookup::empty(e),
        };

        match repo.head() {
            Ok(head) => match head.referent_name() {
                Some(name) => Lookup::Found(name.shorten().to_string()),
                None => Lookup::empty("HEAD is detached"),
            },
            Err(e) => Lookup::empty(format!("Failed to resolve HEAD: {}", e)),
        }
    }

    fn all_branches(&self) -> Lookup<Vec<String>> {
        Lookup::from_result(self.local_branches())
    }

    fn changed_files(&self, source: &str, target: &str) -> Lookup<Vec<String>> {
        let range = match (check_revision("diff", target), check_revision("diff", source)) {
            (Ok(target), Ok(source)) => format!("{}...{}", target, source),
            (Err(e), _) | (_, Err(e)) => return Lookup::empty(e),
        };
        match self.run(&["diff", "--name-only", "-z", "--no-color", &range, "--"]) {
            Ok(stdout) => Lookup::Found(split_paths(&stdout)),
            Err(e) => Lookup::empty(e),
        }
    }

    fn file_at(&self, path: &str, branch: &str) -> Lookup<Vec<u8>> {
        match self.blob_at(path, branch) {
            Ok(Some(data)) => Lookup::Found(data),
            Ok(None) => Lookup::empty(format!("'{}' does not exist on '{}'", path, branch)),
            Err(reason) => Lookup::Empty(reason),
        }
    }

    fn is_dirty(&self, include_untracked: bool) -> Lookup<bool> {
        Lookup::from_result(self.porcelain(include_untracked)).map(|lines| !lines.is_empty())
    }

    fn status_lines(&self) -> Lookup<Vec<String>> {
        Lookup::from_result(self.porcelain(true))
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        if name.starts_with('-') {
            return Err(VcsError::InvalidBranchName {
                name: name.to_string(),
            });
        }
        self.run(&["branch", name])?;
        info!(branch = name, "created branch");
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let branch = check_revision("checkout", branch)?;
        self.run(&["checkout", branch, "--"])?;
        debug!(branch, "checked out");
        Ok(())
    }

    /// Stage everything and commit with `message` exactly as given
    fn commit_all(&self, message: &str) -> Result<()> {
        self.run(&["add", "-A"])?;
        self.run(&[
            "commit",
            "--quiet",
            "--cleanup=verbatim",
            "--allow-empty-message",
            "-m",
            message,
        ])?;
        info!(path = %self.path.display(), "committed all changes");
        Ok(())
    }

    fn merge(&self, source: &str) -> Result<()> {
        let source = check_revision("merge", source)?;
        self.run(&["merge", "--no-edit", source])?;
        info!(source, "merged");
        Ok(())
    }

    fn diff(&self, spec: &DiffSpec) -> Result<String> {
        let mut args: Vec<String> = vec!["diff".into(), "--no-color".into()];
        if spec.staged {
            args.push("--staged".into());
        }
        match &spec.range {
            DiffRange::WorkingTree => {}
            DiffRange::Against(revision) => {
                args.push(check_revision("diff", revision)?.to_string());
            }
            DiffRange::Between(from, to) => {
                let from = check_revision("diff", from)?;
                let to = check_revision("diff", to)?;
                args.push(format!("{}...{}", from, to));
            }
        }
        args.push("--".into());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args)
    }
}
