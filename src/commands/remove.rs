//! Command: stop managing a configuration.

use anyhow::{Result, bail};

use crate::cli::{GlobalOpts, RemoveOpts};

/// Run the remove command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or the entry
/// cannot be removed.
pub fn run(global: &GlobalOpts, opts: &RemoveOpts) -> Result<()> {
    let mut registry = super::open_registry(global)?;
    if !registry.remove(&opts.name, opts.keep_files) {
        bail!("failed to remove '{}'", opts.name);
    }
    println!("Removed {}", opts.name);
    Ok(())
}
