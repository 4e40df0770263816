//! Command: initialize a new dotsync repository.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, InitOpts};
use crate::git::{GitClient, ShellGit};
use crate::platform::Platform;
use crate::registry::Registry;

const DEFAULT_README: &str = "\
# dotsync repository

Managed configuration files. Use the `dotsync` CLI to add, deploy, and
synchronize configurations across machines.
";

const DEFAULT_GITIGNORE: &str = "\
# Local backups are machine-specific
backups/*
!backups/.gitkeep

# Editor droppings
*.swp
.DS_Store
";

/// Run the init command.
///
/// Creates the git repository, the standard directory layout, and an
/// initial commit. Safe to re-run on an existing repository.
///
/// # Errors
///
/// Returns an error when the directory cannot be created or any git
/// operation fails.
pub fn run(global: &GlobalOpts, opts: &InitOpts) -> Result<()> {
    let repo = super::resolve_repo_path(global);
    fs::create_dir_all(&repo)
        .with_context(|| format!("failed to create {}", repo.display()))?;

    let git = ShellGit::new(repo.clone())?;
    git.init()?;

    create_structure(&repo)?;
    Registry::open(repo.clone(), Platform::detect())?;

    git.add_all()?;
    let committed = git.commit("Initialize dotsync repository structure", None)?;
    if committed {
        tracing::info!("created initial commit");
    }

    if let Some(url) = opts.remote_url.as_deref().or(global.remote_url.as_deref()) {
        git.add_remote("origin", url)?;
        tracing::info!("configured remote origin: {url}");
    }

    println!("Initialized dotsync repository at {}", repo.display());
    Ok(())
}

/// Standard directory layout with placeholder files so empty directories
/// survive the commit.
fn create_structure(repo: &Path) -> Result<()> {
    for dir in ["configs", "scripts", "templates", "backups"] {
        let path = repo.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let keep = path.join(".gitkeep");
        if !keep.exists() {
            fs::write(&keep, b"")
                .with_context(|| format!("failed to create {}", keep.display()))?;
        }
    }

    let readme = repo.join("README.md");
    if !readme.exists() {
        fs::write(&readme, DEFAULT_README)
            .with_context(|| format!("failed to create {}", readme.display()))?;
    }

    let gitignore = repo.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, DEFAULT_GITIGNORE)
            .with_context(|| format!("failed to create {}", gitignore.display()))?;
    }
    Ok(())
}
