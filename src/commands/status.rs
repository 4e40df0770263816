//! Command: show repository, configuration, and platform status.

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::sync::{SyncManager, SyncOverview};

/// Run the status command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or a git query
/// fails.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut setup = super::CommandSetup::init(global)?;
    let stats = setup.registry.stats();
    let mut manager = SyncManager::new(&mut setup.registry, &setup.git);
    let overview = manager.overview()?;

    print!("{}", render_overview(&overview));
    println!();
    println!("Total configurations: {}", stats.total);
    if let Some(updated) = stats.last_updated {
        println!("Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

fn render_overview(overview: &SyncOverview) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Repository: {}\n",
        overview.repository.path.display()
    ));
    out.push_str(&format!("Branch: {}\n", overview.repository.current_branch));
    out.push_str(&format!(
        "Working tree: {}\n",
        if overview.repository.is_dirty {
            "dirty"
        } else {
            "clean"
        }
    ));
    if overview.repository.remotes.is_empty() {
        out.push_str("Remotes: none\n");
    } else {
        out.push_str(&format!(
            "Remotes: {}\n",
            overview.repository.remotes.join(", ")
        ));
    }
    out.push_str(&format!(
        "Platform: {} (symlinks {})\n",
        overview.platform,
        if overview.can_symlink {
            "supported"
        } else {
            "unsupported"
        }
    ));

    for (status, names) in &overview.configurations {
        if names.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{status} ({}):\n", names.len()));
        for name in names {
            out.push_str(&format!("  {name}\n"));
        }
    }

    if !overview.repository.recent_commits.is_empty() {
        out.push_str("\nRecent commits:\n");
        for commit in &overview.repository.recent_commits {
            out.push_str(&format!("  {} {}\n", commit.hash, commit.message));
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::git::CommitInfo;
    use crate::platform::Os;
    use crate::registry::entry::ConfigStatus;
    use crate::sync::RepoOverview;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn overview_lists_only_non_empty_statuses() {
        let overview = SyncOverview {
            repository: RepoOverview {
                path: PathBuf::from("/repo"),
                is_dirty: false,
                current_branch: "main".to_string(),
                remotes: vec!["origin".to_string()],
                recent_commits: vec![CommitInfo {
                    hash: "abc1234".to_string(),
                    message: "Initialize dotsync repository structure".to_string(),
                    author: "dotsync".to_string(),
                    date: "2026-08-27T10:00:00+00:00".to_string(),
                }],
            },
            configurations: BTreeMap::from([
                (ConfigStatus::Tracked, vec!["bashrc".to_string()]),
                (ConfigStatus::Modified, Vec::new()),
            ]),
            platform: Os::Linux,
            can_symlink: true,
        };

        let rendered = render_overview(&overview);
        assert!(rendered.contains("tracked (1):"));
        assert!(!rendered.contains("modified"));
        assert!(rendered.contains("Working tree: clean"));
        assert!(rendered.contains("abc1234"));
    }
}
