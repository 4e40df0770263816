//! Command: clone a dotsync repository and deploy its configurations.

use anyhow::{Result, bail};

use crate::cli::{CloneOpts, GlobalOpts};
use crate::git::ShellGit;
use crate::platform::Platform;
use crate::sync;

/// Run the clone command.
///
/// # Errors
///
/// Returns an error when the target already holds a repository, the clone
/// fails, or the cloned registry cannot be opened.
pub fn run(global: &GlobalOpts, opts: &CloneOpts) -> Result<()> {
    let target = opts
        .path
        .clone()
        .unwrap_or_else(|| super::resolve_repo_path(global));

    if target.join(".git").exists() {
        bail!(
            "{} already contains a repository, remove it first",
            target.display()
        );
    }

    let git = ShellGit::new(target.clone())?;
    let deployed = sync::clone_and_deploy(&git, &opts.url, &target, Platform::detect())?;
    println!(
        "Cloned {} into {} and deployed {deployed} configurations",
        opts.url,
        target.display()
    );
    Ok(())
}
