//! Command: restore a configuration to its source location.

use anyhow::{Result, bail};

use crate::cli::{GlobalOpts, RestoreOpts};

/// Run the restore command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or the restore
/// fails.
pub fn run(global: &GlobalOpts, opts: &RestoreOpts) -> Result<()> {
    let mut registry = super::open_registry(global)?;
    if !registry.restore(&opts.name, opts.from_backup) {
        bail!("failed to restore '{}'", opts.name);
    }
    let origin = if opts.from_backup { "backup" } else { "repository" };
    println!("Restored {} from {origin}", opts.name);
    Ok(())
}
