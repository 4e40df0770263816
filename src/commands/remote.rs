//! Command: manage remote repositories.

use anyhow::Result;

use crate::cli::{GlobalOpts, RemoteCommand, RemoteOpts};
use crate::git::GitClient;

/// Run the remote command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or the git
/// operation fails.
pub fn run(global: &GlobalOpts, opts: &RemoteOpts) -> Result<()> {
    let setup = super::CommandSetup::init(global)?;

    match &opts.command {
        RemoteCommand::Add { name, url } => {
            setup.git.add_remote(name, url)?;
            println!("Added remote {name}: {url}");
        }
        RemoteCommand::Remove { name } => {
            setup.git.remove_remote(name)?;
            println!("Removed remote {name}");
        }
        RemoteCommand::List => {
            let remotes = setup.git.remotes()?;
            if remotes.is_empty() {
                println!("No remotes configured");
            } else {
                for remote in remotes {
                    println!("{remote}");
                }
            }
        }
    }
    Ok(())
}
