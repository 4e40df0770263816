//! Command: deploy configurations to their target locations.

use anyhow::{Result, bail};

use crate::cli::{DeployOpts, GlobalOpts};

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error when neither a name nor `--all` is given, or the
/// deployment fails.
pub fn run(global: &GlobalOpts, opts: &DeployOpts) -> Result<()> {
    let mut registry = super::open_registry(global)?;

    match (&opts.name, opts.all) {
        (Some(name), false) => {
            if !registry.deploy(name, opts.force) {
                bail!("failed to deploy '{name}'");
            }
            println!("Deployed {name}");
        }
        (None, true) => {
            let deployed = registry.deploy_all(opts.platform, opts.force);
            println!("Deployed {deployed} configurations");
        }
        (Some(_), true) => bail!("specify either a configuration name or --all, not both"),
        (None, false) => bail!("specify a configuration name or --all"),
    }
    Ok(())
}
