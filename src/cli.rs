use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::platform::Os;
use crate::registry::entry::ConfigStatus;
use crate::sync::ConflictStrategy;

/// Top-level CLI entry point for the dotsync engine.
#[derive(Parser, Debug)]
#[command(
    name = "dotsync",
    about = "Cross-platform dotfiles registry with git synchronization",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to the dotsync repository (default: ~/.dotsync)
    #[arg(long, global = true)]
    pub repo_path: Option<PathBuf>,

    /// Remote repository URL
    #[arg(long, global = true)]
    pub remote_url: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new dotsync repository
    Init(InitOpts),
    /// Add a configuration file or directory to management
    Add(AddOpts),
    /// Stop managing a configuration
    Remove(RemoveOpts),
    /// List managed configurations
    List(ListOpts),
    /// Show configuration and repository status
    Status,
    /// Deploy configuration(s) to their target locations
    Deploy(DeployOpts),
    /// Refresh configuration(s) from their source locations
    Update(UpdateOpts),
    /// Restore a configuration from the repository or its backup
    Restore(RestoreOpts),
    /// Synchronize with the remote repository
    Sync(SyncOpts),
    /// Manage remote repositories
    Remote(RemoteOpts),
    /// Clone a dotsync repository
    Clone(CloneOpts),
    /// Print version information
    Version,
}

/// Options for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// Remote repository URL to configure as origin
    #[arg(long)]
    pub remote_url: Option<String>,
}

/// Options for the `add` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AddOpts {
    /// Path to the configuration file or directory
    pub source_path: PathBuf,

    /// Additional per-platform source path (repeatable)
    #[arg(long = "extra-path", num_args = 2, value_names = ["OS", "PATH"], action = clap::ArgAction::Append)]
    pub extra_paths: Vec<String>,

    /// Custom name for the configuration
    #[arg(long)]
    pub name: Option<String>,

    /// Description of the configuration
    #[arg(long)]
    pub description: Option<String>,

    /// Tag for categorization (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Additional target platforms sharing the same path (repeatable)
    #[arg(long = "platform")]
    pub platforms: Vec<Os>,

    /// Deploy with symlinks instead of file copies
    #[arg(long)]
    pub use_symlink: bool,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Options for the `remove` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoveOpts {
    /// Name of the configuration
    pub name: String,

    /// Keep the repository copy on disk
    #[arg(long)]
    pub keep_files: bool,
}

/// Output format for `list`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Options for the `list` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    /// Filter by platform
    #[arg(long)]
    pub platform: Option<Os>,

    /// Filter by status
    #[arg(long)]
    pub status: Option<ConfigStatus>,

    /// Filter by tag (repeatable, any match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Options for the `deploy` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DeployOpts {
    /// Name of the configuration to deploy
    pub name: Option<String>,

    /// Deploy all configurations
    #[arg(long)]
    pub all: bool,

    /// Target platform (default: current)
    #[arg(long)]
    pub platform: Option<Os>,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

/// Options for the `update` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    /// Name of the configuration to update
    pub name: Option<String>,

    /// Update all configurations
    #[arg(long)]
    pub all: bool,
}

/// Options for the `restore` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RestoreOpts {
    /// Name of the configuration to restore
    pub name: String,

    /// Restore from the original backup instead of the repository copy
    #[arg(long)]
    pub from_backup: bool,
}

/// Options for the `sync` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SyncOpts {
    /// Only pull changes from the remote
    #[arg(long, conflicts_with = "push_only")]
    pub pull_only: bool,

    /// Only push changes to the remote
    #[arg(long)]
    pub push_only: bool,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Automatically resolve conflicts with the configured strategy
    #[arg(long)]
    pub auto_resolve: bool,

    /// Conflict resolution strategy
    #[arg(long, default_value = "manual")]
    pub strategy: ConflictStrategy,
}

/// Options for the `remote` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoteOpts {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

/// Remote management subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RemoteCommand {
    /// Add a remote repository
    Add {
        /// Remote name
        name: String,
        /// Remote URL
        url: String,
    },
    /// Remove a remote repository
    Remove {
        /// Remote name
        name: String,
    },
    /// List remote repositories
    List,
}

/// Options for the `clone` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CloneOpts {
    /// Repository URL to clone
    pub url: String,

    /// Target path (default: the repository path)
    #[arg(long)]
    pub path: Option<PathBuf>,
}
