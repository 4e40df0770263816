//! Git client for the managed repository.
//!
//! The engine talks to version control exclusively through the [`GitClient`]
//! trait; [`ShellGit`] is the single production implementation, backed by
//! the `git` binary via [`crate::exec`]. Tests substitute a scripted double
//! implementing the same trait.

use std::path::{Path, PathBuf};

use crate::error::GitError;
use crate::exec;

/// Working-tree status, grouped the way `git status --porcelain` reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

/// One entry of the commit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// Contract for version-control operations on the managed repository.
///
/// Every operation is fallible; git failures surface as [`GitError`] so the
/// sync layer can record them without aborting a whole synchronization.
pub trait GitClient {
    /// Ensure the repository exists, initialising it when necessary.
    fn init(&self) -> Result<(), GitError>;

    /// Whether the working tree has uncommitted changes.
    fn is_dirty(&self) -> Result<bool, GitError>;

    /// Name of the currently checked-out branch.
    fn current_branch(&self) -> Result<String, GitError>;

    /// Names of the configured remotes.
    fn remotes(&self) -> Result<Vec<String>, GitError>;

    /// Add (or replace) a named remote.
    fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError>;

    /// Remove a named remote.
    fn remove_remote(&self, name: &str) -> Result<(), GitError>;

    /// Stage all changes.
    fn add_all(&self) -> Result<(), GitError>;

    /// Commit staged changes. Returns `false` when there was nothing to
    /// commit, which is not an error.
    fn commit(&self, message: &str, author: Option<&str>) -> Result<bool, GitError>;

    /// Push a branch to a remote.
    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Pull a branch from a remote.
    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Fetch from a remote.
    fn fetch(&self, remote: &str) -> Result<(), GitError>;

    /// Whether the index contains unmerged (conflicted) paths.
    fn has_conflicts(&self) -> Result<bool, GitError>;

    /// Hard-reset the working tree to `reference`.
    fn reset_hard(&self, reference: &str) -> Result<(), GitError>;

    /// Create a branch, optionally checking it out.
    fn create_branch(&self, name: &str, checkout: bool) -> Result<(), GitError>;

    /// Clone `url` into `target`, replacing anything already there.
    fn clone_into(&self, url: &str, target: &Path) -> Result<(), GitError>;

    /// Working-tree status grouped by staged / modified / untracked.
    fn status(&self) -> Result<GitStatus, GitError>;

    /// The most recent commits, newest first.
    fn log(&self, max: usize) -> Result<Vec<CommitInfo>, GitError>;
}

/// [`GitClient`] implementation that shells out to the `git` binary.
#[derive(Debug)]
pub struct ShellGit {
    repo_path: PathBuf,
}

impl ShellGit {
    /// Create a client for the repository at `repo_path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::MissingBinary`] when `git` is not on `PATH`.
    pub fn new(repo_path: PathBuf) -> Result<Self, GitError> {
        if which::which("git").is_err() {
            return Err(GitError::MissingBinary);
        }
        Ok(Self { repo_path })
    }

    #[must_use]
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn run(&self, operation: &str, args: &[&str]) -> Result<exec::ExecResult, GitError> {
        exec::run_in(&self.repo_path, "git", args).map_err(|e| GitError::CommandFailed {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }

    fn run_unchecked(&self, operation: &str, args: &[&str]) -> Result<exec::ExecResult, GitError> {
        exec::run_unchecked_in(&self.repo_path, "git", args).map_err(|e| {
            GitError::CommandFailed {
                operation: operation.to_string(),
                message: e.to_string(),
            }
        })
    }

    fn porcelain(&self) -> Result<String, GitError> {
        Ok(self.run("status", &["status", "--porcelain"])?.stdout)
    }
}

impl GitClient for ShellGit {
    fn init(&self) -> Result<(), GitError> {
        if self.repo_path.join(".git").exists() {
            tracing::debug!("using existing repository at {}", self.repo_path.display());
            return Ok(());
        }
        std::fs::create_dir_all(&self.repo_path).map_err(|e| GitError::CommandFailed {
            operation: "init".to_string(),
            message: e.to_string(),
        })?;
        self.run("init", &["init"])?;
        tracing::info!("initialized git repository at {}", self.repo_path.display());
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool, GitError> {
        Ok(!self.porcelain()?.trim().is_empty())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let out = self.run("branch", &["branch", "--show-current"])?;
        let name = out.stdout.trim();
        if name.is_empty() {
            Ok("main".to_string())
        } else {
            Ok(name.to_string())
        }
    }

    fn remotes(&self) -> Result<Vec<String>, GitError> {
        let out = self.run("remote", &["remote"])?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        // Replace rather than fail when the remote already exists.
        if self.remotes()?.iter().any(|r| r == name) {
            self.run("remote remove", &["remote", "remove", name])?;
        }
        self.run("remote add", &["remote", "add", name, url])?;
        tracing::info!("added remote '{name}': {url}");
        Ok(())
    }

    fn remove_remote(&self, name: &str) -> Result<(), GitError> {
        self.run("remote remove", &["remote", "remove", name])?;
        tracing::info!("removed remote '{name}'");
        Ok(())
    }

    fn add_all(&self) -> Result<(), GitError> {
        self.run("add", &["add", "-A"])?;
        Ok(())
    }

    fn commit(&self, message: &str, author: Option<&str>) -> Result<bool, GitError> {
        let name = author.unwrap_or("dotsync");
        let user_name = format!("user.name={name}");
        let user_email = format!("user.email={name}@localhost");
        let result = self.run_unchecked(
            "commit",
            &[
                "-c",
                &user_name,
                "-c",
                &user_email,
                "commit",
                "-m",
                message,
            ],
        )?;
        if result.success {
            tracing::info!("created commit: {message}");
            return Ok(true);
        }
        if result.stdout.contains("nothing to commit") {
            tracing::debug!("nothing to commit");
            return Ok(false);
        }
        Err(GitError::CommandFailed {
            operation: "commit".to_string(),
            message: if result.stderr.trim().is_empty() {
                result.stdout.trim().to_string()
            } else {
                result.stderr.trim().to_string()
            },
        })
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run("push", &["push", "-u", remote, branch])?;
        tracing::info!("pushed to {remote}/{branch}");
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run("pull", &["pull", remote, branch])?;
        tracing::info!("pulled from {remote}/{branch}");
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.run("fetch", &["fetch", remote])?;
        tracing::debug!("fetched from {remote}");
        Ok(())
    }

    fn has_conflicts(&self) -> Result<bool, GitError> {
        let out = self.porcelain()?;
        Ok(out.lines().any(|line| {
            matches!(
                line.get(..2),
                Some("UU" | "AA" | "DD" | "AU" | "UA" | "DU" | "UD")
            )
        }))
    }

    fn reset_hard(&self, reference: &str) -> Result<(), GitError> {
        self.run("reset", &["reset", "--hard", reference])?;
        tracing::warn!("reset repository to {reference}");
        Ok(())
    }

    fn create_branch(&self, name: &str, checkout: bool) -> Result<(), GitError> {
        if checkout {
            self.run("checkout", &["checkout", "-b", name])?;
        } else {
            self.run("branch", &["branch", name])?;
        }
        tracing::info!("created branch '{name}'");
        Ok(())
    }

    fn clone_into(&self, url: &str, target: &Path) -> Result<(), GitError> {
        if target.exists() {
            crate::fsutil::remove_path(target).map_err(|e| GitError::CommandFailed {
                operation: "clone".to_string(),
                message: e.to_string(),
            })?;
        }
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let target_str = target.to_string_lossy().to_string();
        exec::run_in(parent, "git", &["clone", url, &target_str]).map_err(|e| {
            GitError::CommandFailed {
                operation: "clone".to_string(),
                message: e.to_string(),
            }
        })?;
        tracing::info!("cloned repository from {url} to {}", target.display());
        Ok(())
    }

    fn status(&self) -> Result<GitStatus, GitError> {
        let mut status = GitStatus::default();
        for line in self.porcelain()?.lines() {
            let Some(code) = line.get(..2) else { continue };
            let path = line.get(3..).unwrap_or("").to_string();
            if code == "??" {
                status.untracked.push(path);
                continue;
            }
            let mut chars = code.chars();
            let staged_code = chars.next().unwrap_or(' ');
            let worktree_code = chars.next().unwrap_or(' ');
            if matches!(staged_code, 'A' | 'M' | 'D' | 'R' | 'C') {
                status.staged.push(path.clone());
            }
            if matches!(worktree_code, 'M' | 'D') {
                status.modified.push(path);
            }
        }
        Ok(status)
    }

    fn log(&self, max: usize) -> Result<Vec<CommitInfo>, GitError> {
        let count = format!("-{max}");
        let result = self.run_unchecked("log", &["log", &count, "--pretty=format:%h|%s|%an|%aI"])?;
        if !result.success {
            // Fresh repository with no commits yet.
            return Ok(Vec::new());
        }
        Ok(result
            .stdout
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(4, '|');
                Some(CommitInfo {
                    hash: parts.next()?.to_string(),
                    message: parts.next()?.to_string(),
                    author: parts.next()?.to_string(),
                    date: parts.next()?.to_string(),
                })
            })
            .collect())
    }
}
