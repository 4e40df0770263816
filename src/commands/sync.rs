//! Command: synchronize with the remote repository.

use anyhow::{Result, bail};

use crate::cli::{GlobalOpts, SyncOpts};
use crate::sync::{SyncManager, SyncOptions, SyncResult, SyncStatus};

/// Run the sync command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or the
/// synchronization finishes in an error state.
pub fn run(global: &GlobalOpts, opts: &SyncOpts) -> Result<()> {
    let mut setup = super::CommandSetup::init(global)?;
    let mut manager = SyncManager::new(&mut setup.registry, &setup.git);
    manager.set_strategy(opts.strategy);

    let result = if opts.pull_only {
        manager.pull(opts.auto_resolve)
    } else if opts.push_only {
        manager.push(opts.message.as_deref(), false)
    } else {
        manager.sync(&SyncOptions {
            message: opts.message.clone(),
            auto_resolve: opts.auto_resolve,
            ..SyncOptions::default()
        })
    };

    print!("{}", render_result(&result));
    if result.status == SyncStatus::Error {
        bail!("synchronization failed");
    }
    Ok(())
}

fn render_result(result: &SyncResult) -> String {
    let mut out = format!("Sync status: {}\n", result.status);
    if !result.message.is_empty() {
        out.push_str(&format!("{}\n", result.message));
    }
    out.push_str(&format!(
        "Synced: {}, failed: {}\n",
        result.configs_synced, result.configs_failed
    ));
    if !result.conflicts.is_empty() {
        out.push_str("Conflicts:\n");
        for conflict in &result.conflicts {
            out.push_str(&format!("  {conflict}\n"));
        }
    }
    if !result.errors.is_empty() {
        out.push_str("Errors:\n");
        for error in &result.errors {
            out.push_str(&format!("  {error}\n"));
        }
    }
    out
}
