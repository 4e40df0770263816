//! Command: refresh repository copies from their live sources.

use anyhow::{Result, bail};

use crate::cli::{GlobalOpts, UpdateOpts};

/// Run the update command.
///
/// # Errors
///
/// Returns an error when neither a name nor `--all` is given, or the
/// update fails.
pub fn run(global: &GlobalOpts, opts: &UpdateOpts) -> Result<()> {
    let mut registry = super::open_registry(global)?;

    match (&opts.name, opts.all) {
        (Some(name), false) => {
            if !registry.update(name) {
                bail!("failed to update '{name}'");
            }
            println!("Updated {name}");
        }
        (None, true) => {
            let changed = registry.update_all();
            if changed.is_empty() {
                println!("All configurations up to date");
            } else {
                println!("Updated {} configurations: {}", changed.len(), changed.join(", "));
            }
        }
        (Some(_), true) => bail!("specify either a configuration name or --all, not both"),
        (None, false) => bail!("specify a configuration name or --all"),
    }
    Ok(())
}
