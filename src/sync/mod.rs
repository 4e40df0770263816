//! Synchronization coordinator.
//!
//! Composes the [`Registry`] and a [`GitClient`] into push / pull / full
//! sync workflows. Git failures are recorded in the [`SyncResult`] rather
//! than aborting, so one failing entry or remote never crashes the caller.

pub mod mapping;
pub mod template;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;

use crate::fsutil;
use crate::git::{CommitInfo, GitClient};
use crate::platform::{Os, Platform};
use crate::registry::Registry;
use crate::registry::entry::{ConfigStatus, ConfigType};
use mapping::PlatformMappings;

/// Terminal classification of one sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Success,
    Conflict,
    Error,
    NoChanges,
    Partial,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Conflict => "conflict",
            Self::Error => "error",
            Self::NoChanges => "no_changes",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How merge conflicts get resolved during pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    KeepLocal,
    KeepRemote,
    Merge,
    Skip,
    #[default]
    Manual,
}

impl ConflictStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepLocal => "keep_local",
            Self::KeepRemote => "keep_remote",
            Self::Merge => "merge",
            Self::Skip => "skip",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a conflict strategy fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategyError(String);

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized strategy '{}' (expected keep_local, keep_remote, merge, skip, or manual)",
            self.0
        )
    }
}

impl std::error::Error for ParseStrategyError {}

impl FromStr for ConflictStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_local" => Ok(Self::KeepLocal),
            "keep_remote" => Ok(Self::KeepRemote),
            "merge" => Ok(Self::Merge),
            "skip" => Ok(Self::Skip),
            "manual" => Ok(Self::Manual),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Accumulated outcome of one sync operation.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub status: SyncStatus,
    pub message: String,
    pub configs_synced: usize,
    pub configs_failed: usize,
    pub conflicts: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self {
            status: SyncStatus::Success,
            message: String::new(),
            configs_synced: 0,
            configs_failed: 0,
            conflicts: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl SyncResult {
    pub fn add_error(&mut self, scope: &str, error: impl fmt::Display) {
        self.errors.push(format!("{scope}: {error}"));
        self.configs_failed += 1;
    }

    pub fn add_conflict(&mut self, scope: &str, description: &str) {
        self.conflicts.push(format!("{scope}: {description}"));
    }

    pub fn mark_success(&mut self) {
        self.configs_synced += 1;
    }

    /// Fold another result's tallies into this one.
    pub fn absorb(&mut self, other: Self) {
        self.configs_synced += other.configs_synced;
        self.configs_failed += other.configs_failed;
        self.conflicts.extend(other.conflicts);
        self.errors.extend(other.errors);
        if self.message.is_empty() {
            self.message = other.message;
        } else if !other.message.is_empty() {
            self.message = format!("{}; {}", self.message, other.message);
        }
    }

    /// Resolve the terminal status from the accumulated tallies.
    ///
    /// Errors with no successes are an error, errors alongside successes
    /// are partial, conflicts without errors are conflict, nothing at all
    /// is no-changes.
    pub fn finalize(&mut self) {
        self.status = if !self.errors.is_empty() {
            if self.configs_synced > 0 {
                SyncStatus::Partial
            } else {
                SyncStatus::Error
            }
        } else if !self.conflicts.is_empty() {
            SyncStatus::Conflict
        } else if self.configs_synced == 0 {
            SyncStatus::NoChanges
        } else {
            SyncStatus::Success
        };
    }
}

/// Options for [`SyncManager::sync`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub pull_first: bool,
    pub auto_commit: bool,
    pub message: Option<String>,
    pub auto_resolve: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            pull_first: true,
            auto_commit: true,
            message: None,
            auto_resolve: false,
        }
    }
}

/// Snapshot of repository state for status reporting.
#[derive(Debug, Clone)]
pub struct RepoOverview {
    pub path: PathBuf,
    pub is_dirty: bool,
    pub current_branch: String,
    pub remotes: Vec<String>,
    pub recent_commits: Vec<CommitInfo>,
}

/// Combined repository + registry + platform status.
#[derive(Debug, Clone)]
pub struct SyncOverview {
    pub repository: RepoOverview,
    pub configurations: BTreeMap<ConfigStatus, Vec<String>>,
    pub platform: Os,
    pub can_symlink: bool,
}

/// Orchestrates multi-entry synchronization over a registry and a git
/// client.
pub struct SyncManager<'a, G: GitClient> {
    registry: &'a mut Registry,
    git: &'a G,
    strategy: ConflictStrategy,
    mappings: PlatformMappings,
}

impl<'a, G: GitClient> SyncManager<'a, G> {
    pub fn new(registry: &'a mut Registry, git: &'a G) -> Self {
        let mappings = PlatformMappings::load(registry.repo_root());
        Self {
            registry,
            git,
            strategy: ConflictStrategy::default(),
            mappings,
        }
    }

    pub fn set_strategy(&mut self, strategy: ConflictStrategy) {
        self.strategy = strategy;
        tracing::info!("conflict resolution strategy set to {strategy}");
    }

    /// Refresh every entry from its live source, commit, and push to
    /// `origin`.
    ///
    /// A clean working tree without `force` is a no-op. The absence of an
    /// `origin` remote is an error, not a crash.
    pub fn push(&mut self, message: Option<&str>, force: bool) -> SyncResult {
        let mut result = SyncResult::default();
        let platform = self.registry.platform().clone();
        let current = platform.os();

        match self.git.is_dirty() {
            Ok(false) if !force => {
                result.status = SyncStatus::NoChanges;
                result.message = "no local changes to push".to_string();
                return result;
            }
            Ok(_) => {}
            Err(e) => {
                result.add_error("git", e);
                result.finalize();
                return result;
            }
        }

        tracing::info!("updating configurations from source locations");
        let mut changed = Vec::new();
        for name in self.registry.names() {
            let source = self
                .registry
                .get(&name)
                .and_then(|e| e.source_path(current))
                .map(|p| platform.expand_home(p));
            match source {
                Some(source) if source.exists() => {
                    let before = self.registry.get(&name).and_then(|e| e.checksum.clone());
                    if self.registry.update(&name) {
                        result.mark_success();
                        let after = self.registry.get(&name).and_then(|e| e.checksum.clone());
                        if after != before {
                            changed.push(name);
                        }
                    } else {
                        result.add_error(&name, "failed to update from source");
                    }
                }
                _ => tracing::warn!("source path missing for '{name}'"),
            }
        }

        let message = message.map_or_else(|| default_commit_message(current, &changed), String::from);

        if let Err(e) = self.git.add_all() {
            result.add_error("git", e);
            result.finalize();
            return result;
        }

        let author = format!("dotsync-{current}@{}", platform.hostname());
        if let Err(e) = self.git.commit(&message, Some(&author)) {
            result.add_error("git", e);
            result.finalize();
            return result;
        }

        match self.git.remotes() {
            Ok(remotes) if remotes.iter().any(|r| r == "origin") => {
                let branch = match self.git.current_branch() {
                    Ok(branch) => branch,
                    Err(e) => {
                        result.add_error("git", e);
                        result.finalize();
                        return result;
                    }
                };
                match self.git.push("origin", &branch) {
                    Ok(()) => {
                        result.message =
                            format!("pushed {} configurations", result.configs_synced);
                        tracing::info!("{}", result.message);
                    }
                    Err(e) => result.add_error("git", e),
                }
            }
            Ok(_) => result.add_error("git", "no remote repository configured"),
            Err(e) => result.add_error("git", e),
        }

        result.finalize();
        result
    }

    /// Pull from `origin` and deploy everything applicable to this
    /// platform.
    ///
    /// An uncommitted working tree is a hard precondition failure; nothing
    /// is stashed automatically.
    pub fn pull(&mut self, auto_resolve: bool) -> SyncResult {
        let mut result = SyncResult::default();

        match self.git.is_dirty() {
            Ok(true) => {
                result.add_error(
                    "git",
                    "repository has uncommitted changes, commit or stash them first",
                );
                result.finalize();
                return result;
            }
            Ok(false) => {}
            Err(e) => {
                result.add_error("git", e);
                result.finalize();
                return result;
            }
        }

        match self.git.remotes() {
            Ok(remotes) if remotes.iter().any(|r| r == "origin") => {}
            Ok(_) => {
                result.add_error("git", "no remote repository configured");
                result.finalize();
                return result;
            }
            Err(e) => {
                result.add_error("git", e);
                result.finalize();
                return result;
            }
        }

        tracing::info!("fetching changes from remote repository");
        if let Err(e) = self.git.fetch("origin") {
            result.add_error("git", e);
            result.finalize();
            return result;
        }

        let branch = match self.git.current_branch() {
            Ok(branch) => branch,
            Err(e) => {
                result.add_error("git", e);
                result.finalize();
                return result;
            }
        };

        if let Err(pull_err) = self.git.pull("origin", &branch) {
            if self.git.has_conflicts().unwrap_or(false) {
                tracing::warn!("merge conflicts detected");
                if auto_resolve {
                    let resolution = self.resolve_conflicts();
                    result.absorb(resolution);
                } else {
                    result.add_conflict("merge", "merge conflicts detected, manual resolution required");
                    result.message =
                        "merge conflicts detected, manual resolution required".to_string();
                }
            } else {
                result.add_error("git", pull_err);
            }
            result.finalize();
            return result;
        }

        tracing::info!("deploying configurations for current platform");
        let deployed = self.deploy_platform_configs();
        result.configs_synced += deployed;
        result.message = if deployed > 0 {
            format!("pulled and deployed {deployed} configurations")
        } else {
            "no configurations to deploy for current platform".to_string()
        };

        result.finalize();
        result
    }

    /// Full synchronization: pull, then push.
    ///
    /// Unresolved pull conflicts stop the operation before the push so a
    /// half-merged tree is never committed on top of.
    pub fn sync(&mut self, options: &SyncOptions) -> SyncResult {
        let mut result = SyncResult::default();

        if options.pull_first {
            tracing::info!("pulling changes from remote");
            let pull_result = self.pull(options.auto_resolve);
            let pulled_conflict = pull_result.status == SyncStatus::Conflict;
            result.absorb(pull_result);

            if pulled_conflict && !options.auto_resolve {
                result.status = SyncStatus::Conflict;
                result.message =
                    "pull conflicts detected, resolve manually or enable auto-resolve".to_string();
                return result;
            }
        }

        if options.auto_commit {
            tracing::info!("pushing local changes");
            let push_result = self.push(options.message.as_deref(), false);
            result.absorb(push_result);
        }

        result.finalize();
        result
    }

    /// Apply the configured strategy to a conflicted working tree.
    ///
    /// `keep_local` and `keep_remote` hard-reset; `skip`, `merge`, and
    /// `manual` never silently resolve and record the conflict instead.
    pub fn resolve_conflicts(&mut self) -> SyncResult {
        let mut result = SyncResult::default();
        match self.strategy {
            ConflictStrategy::KeepLocal => match self.git.reset_hard("HEAD") {
                Ok(()) => {
                    result.message = "resolved conflicts by keeping local changes".to_string();
                }
                Err(e) => result.add_error("git", e),
            },
            ConflictStrategy::KeepRemote => {
                let target = match self.git.current_branch() {
                    Ok(branch) => format!("origin/{branch}"),
                    Err(e) => {
                        result.add_error("git", e);
                        result.finalize();
                        return result;
                    }
                };
                match self.git.reset_hard(&target) {
                    Ok(()) => {
                        result.message =
                            "resolved conflicts by keeping remote changes".to_string();
                    }
                    Err(e) => result.add_error("git", e),
                }
            }
            ConflictStrategy::Skip => {
                result.add_conflict("merge", "conflicts skipped, manual resolution required");
            }
            ConflictStrategy::Merge | ConflictStrategy::Manual => {
                result.add_conflict("merge", "manual conflict resolution required");
            }
        }
        result.finalize();
        result
    }

    /// Deploy every entry applicable to this platform, remapping paths
    /// across OS boundaries and rendering templates. Returns the number
    /// deployed.
    pub fn deploy_platform_configs(&mut self) -> usize {
        let current = self.registry.platform().os();
        let candidates: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|name| {
                self.registry.get(name).is_some_and(|entry| {
                    entry.supports(current) && self.registry.repo_copy_path(entry).exists()
                })
            })
            .collect();

        let mut deployed = 0;
        for name in candidates {
            if self.deploy_entry(&name) {
                deployed += 1;
                tracing::debug!("deployed {name}");
            }
        }
        deployed
    }

    fn deploy_entry(&mut self, name: &str) -> bool {
        let platform = self.registry.platform().clone();
        let current = platform.os();
        let Some(entry) = self.registry.get(name) else {
            return false;
        };
        let Some(stored) = entry.source_path(current) else {
            return false;
        };
        let source = platform.expand_home(stored);
        let target = self.mappings.map_path(&source, current, &platform);
        let abs_repo = self.registry.repo_copy_path(entry);
        let config_type = entry.config_type;
        let use_symlink = entry.use_symlink;
        let executable = entry.executable;
        let template_vars = entry.template_vars.clone();

        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!("failed to create parent of {}: {e}", target.display());
                return false;
            }
        }

        if config_type == ConfigType::Template {
            return deploy_template(&abs_repo, &target, &platform, &template_vars, executable);
        }

        if let Err(e) = fsutil::remove_path(&target) {
            tracing::error!("failed to clear {}: {e}", target.display());
            return false;
        }

        let ok = if use_symlink && platform.can_symlink() {
            platform.create_symlink(&abs_repo, &target, true)
        } else {
            match fsutil::copy_recursive(&abs_repo, &target) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("failed to deploy {name}: {e}");
                    false
                }
            }
        };
        if ok && executable && target.is_file() {
            if let Err(e) = fsutil::set_executable(&target) {
                tracing::warn!("failed to mark {} executable: {e}", target.display());
            }
        }
        ok
    }

    /// Combined repository, configuration, and platform status.
    ///
    /// # Errors
    ///
    /// Propagates git failures for the core repository queries; the commit
    /// log degrades to empty instead.
    pub fn overview(&mut self) -> Result<SyncOverview, crate::error::GitError> {
        let repository = RepoOverview {
            path: self.registry.repo_root().to_path_buf(),
            is_dirty: self.git.is_dirty()?,
            current_branch: self.git.current_branch()?,
            remotes: self.git.remotes()?,
            recent_commits: self.git.log(5).unwrap_or_else(|e| {
                tracing::debug!("failed to read recent commits: {e}");
                Vec::new()
            }),
        };
        Ok(SyncOverview {
            repository,
            configurations: self.registry.check_status(),
            platform: self.registry.platform().os(),
            can_symlink: self.registry.platform().can_symlink(),
        })
    }

    /// Create a `platform/<os>` branch without checking it out.
    pub fn create_platform_branch(&self, platform: Os) -> bool {
        let branch = format!("platform/{platform}");
        match self.git.create_branch(&branch, false) {
            Ok(()) => {
                tracing::info!("created platform branch: {branch}");
                true
            }
            Err(e) => {
                tracing::error!("failed to create platform branch {branch}: {e}");
                false
            }
        }
    }
}

/// Clone a dotsync repository and deploy its entries for this platform.
///
/// # Errors
///
/// Returns an error when the clone fails or the cloned registry cannot be
/// opened.
pub fn clone_and_deploy<G: GitClient>(
    git: &G,
    url: &str,
    target: &Path,
    platform: Platform,
) -> anyhow::Result<usize> {
    git.clone_into(url, target)?;
    let mut registry = Registry::open(target.to_path_buf(), platform)?;
    let mut manager = SyncManager::new(&mut registry, git);
    let deployed = manager.deploy_platform_configs();
    tracing::info!("cloned repository and deployed {deployed} configurations");
    Ok(deployed)
}

fn default_commit_message(platform: Os, changed: &[String]) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
    if changed.is_empty() {
        return format!("Sync from {platform} ({timestamp})");
    }
    let mut listed = changed.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    if changed.len() > 3 {
        listed.push_str(&format!(" and {} others", changed.len() - 3));
    }
    format!("Update configs on {platform}: {listed} ({timestamp})")
}

fn deploy_template(
    repo_copy: &Path,
    target: &Path,
    platform: &Platform,
    entry_vars: &BTreeMap<String, String>,
    executable: bool,
) -> bool {
    let content = match std::fs::read_to_string(repo_copy) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("failed to read template {}: {e}", repo_copy.display());
            return false;
        }
    };
    let vars = template::merged_vars(platform, entry_vars);
    let rendered = template::render(&content, &vars);
    if let Err(e) = std::fs::write(target, rendered) {
        tracing::error!("failed to write template to {}: {e}", target.display());
        return false;
    }
    if executable {
        if let Err(e) = fsutil::set_executable(target) {
            tracing::warn!("failed to mark {} executable: {e}", target.display());
        }
    }
    true
}
