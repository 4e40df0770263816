//! Cross-platform dotfiles registry and git synchronization engine.
//!
//! Tracks configuration files and directories in a git-backed repository,
//! deploys them per platform with symlinks or copies, and synchronizes the
//! repository with a remote.
//!
//! The public API is organised into four layers:
//!
//! - **[`platform`]** — OS detection, home-directory handling, symlinks
//! - **[`registry`]** — the entry store: add / remove / deploy / update /
//!   restore / status over an on-disk JSON index
//! - **[`sync`]** — push / pull / full-sync workflows over a [`git::GitClient`]
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod git;
pub mod logging;
pub mod platform;
pub mod registry;
pub mod sync;
