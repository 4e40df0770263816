//! Top-level subcommand orchestration.
//!
//! Each submodule exposes a `run(global, opts)` entry point. Handlers open
//! the registry and git client, call into the engine, and translate boolean
//! outcomes into process-level errors via [`anyhow`].

pub mod add;
pub mod clone;
pub mod deploy;
pub mod init;
pub mod list;
pub mod remote;
pub mod remove;
pub mod restore;
pub mod status;
pub mod sync;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};

use crate::cli::GlobalOpts;
use crate::git::ShellGit;
use crate::platform::Platform;
use crate::registry::Registry;

/// Default repository location when `--repo-path` is absent.
#[must_use]
pub fn default_repo_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dotsync")
}

/// Repository path from CLI arguments or the default location.
#[must_use]
pub fn resolve_repo_path(global: &GlobalOpts) -> PathBuf {
    global.repo_path.clone().unwrap_or_else(default_repo_path)
}

/// Shared state produced by the common command setup sequence.
///
/// Opens the registry and git client for an existing repository so each
/// command does not have to repeat the boilerplate.
pub struct CommandSetup {
    pub registry: Registry,
    pub git: ShellGit,
}

impl CommandSetup {
    /// Open the repository named by the CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository has not been initialized, the
    /// git binary is missing, or the registry index cannot be loaded.
    pub fn init(global: &GlobalOpts) -> Result<Self> {
        let registry = open_registry(global)?;
        let git = ShellGit::new(registry.repo_root().to_path_buf())?;
        Ok(Self { registry, git })
    }
}

/// Open the registry for an existing repository.
///
/// # Errors
///
/// Returns an error when the repository has not been initialized or the
/// registry index cannot be loaded.
pub fn open_registry(global: &GlobalOpts) -> Result<Registry> {
    let repo = resolve_repo_path(global);
    if !repo.join(".git").exists() {
        bail!(
            "repository not initialized at {}. Run 'dotsync init' first",
            repo.display()
        );
    }
    Registry::open(repo.clone(), Platform::detect())
        .with_context(|| format!("failed to open registry at {}", repo.display()))
}
