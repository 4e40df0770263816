//! Configuration registry: the entity store for managed dotfiles.
//!
//! The registry owns the name-to-entry mapping, persists it through
//! [`index::RegistryIndex`], computes content checksums, classifies entry
//! types, and performs the add / remove / deploy / update / restore /
//! status operations.
//!
//! Error policy: public operations return a definite success value (`bool`
//! or a count) and log the reason for any failure. Only index corruption at
//! open time surfaces as a typed error; everything after that is folded
//! into the boolean result so bulk operations can continue past a single
//! failing entry.

pub mod checksum;
pub mod entry;
pub mod index;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::RegistryError;
use crate::fsutil;
use crate::platform::{Os, Platform};
use entry::{ConfigEntry, ConfigStatus, ConfigType};
use index::RegistryIndex;

const SCRIPT_EXTENSIONS: [&str; 6] = ["sh", "bat", "ps1", "py", "rb", "pl"];

/// Options for [`Registry::add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub use_symlink: bool,
    pub force: bool,
}

/// Filter for [`Registry::list`]. An empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub platform: Option<Os>,
    pub tags: Vec<String>,
    pub status: Option<ConfigStatus>,
}

/// One row of [`Registry::list_platform_paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPath {
    pub platform: Os,
    pub path: PathBuf,
    pub exists: bool,
}

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub total: usize,
    pub by_type: BTreeMap<ConfigType, usize>,
    pub by_platform: BTreeMap<Os, usize>,
    pub by_status: BTreeMap<ConfigStatus, usize>,
    pub last_updated: Option<chrono::DateTime<Utc>>,
}

/// The configuration registry for one repository.
#[derive(Debug)]
pub struct Registry {
    repo_root: PathBuf,
    platform: Platform,
    index: RegistryIndex,
}

impl Registry {
    /// Open (or create) the registry rooted at `repo_root`.
    ///
    /// Creates the repository directory layout when missing and loads the
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the layout cannot be created or the
    /// index file is unreadable or corrupt.
    pub fn open(repo_root: PathBuf, platform: Platform) -> Result<Self, RegistryError> {
        for dir in ["configs", "backups", "templates", ".dotsync"] {
            let path = repo_root.join(dir);
            std::fs::create_dir_all(&path).map_err(|source| RegistryError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let index = RegistryIndex::load(&repo_root)?;
        Ok(Self {
            repo_root,
            platform,
            index,
        })
    }

    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigEntry> {
        self.index.configs.get(name)
    }

    /// All entry names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.index.configs.keys().cloned().collect()
    }

    /// Absolute repository copy path for an entry.
    #[must_use]
    pub fn repo_copy_path(&self, entry: &ConfigEntry) -> PathBuf {
        self.repo_root.join(&entry.repo_path)
    }

    /// Track a new configuration.
    ///
    /// At least one of `source_paths` must exist on disk. The content
    /// copied into the repository is the current platform's file when
    /// present, otherwise the first existing path. Returns `false` (with
    /// the reason logged) on any validation or I/O failure.
    pub fn add(&mut self, source_paths: BTreeMap<Os, PathBuf>, options: &AddOptions) -> bool {
        let current = self.platform.os();

        let expanded: BTreeMap<Os, PathBuf> = source_paths
            .iter()
            .map(|(os, path)| (*os, self.platform.normalize_path(path)))
            .collect();
        let existing: BTreeMap<Os, &PathBuf> = expanded
            .iter()
            .filter(|(_, path)| path.exists())
            .map(|(os, path)| (*os, path))
            .collect();
        if existing.is_empty() {
            tracing::error!("no source paths exist");
            return false;
        }

        let name = match &options.name {
            Some(name) => name.clone(),
            None => {
                let Some(current_path) = expanded.get(&current) else {
                    tracing::error!(
                        "cannot derive a name: no source path for {current}, pass one explicitly"
                    );
                    return false;
                };
                match current_path.file_name() {
                    Some(file_name) => file_name.to_string_lossy().to_string(),
                    None => {
                        tracing::error!("cannot derive a name from {}", current_path.display());
                        return false;
                    }
                }
            }
        };

        if self.index.configs.contains_key(&name) && !options.force {
            tracing::error!("configuration '{name}' already exists, use force to overwrite");
            return false;
        }

        // Prefer the current platform's copy when choosing type and content.
        let first_existing = existing
            .get(&current)
            .copied()
            .or_else(|| existing.values().next().copied());
        let Some(first_existing) = first_existing else {
            return false;
        };
        let first_existing = first_existing.clone();
        let config_type = infer_config_type(&first_existing);

        let platforms: Vec<Os> = expanded.keys().copied().collect();
        let repo_path = repo_path_for(&name, config_type, &platforms);

        let mut entry = ConfigEntry {
            name: name.clone(),
            source_paths: expanded
                .iter()
                .map(|(os, path)| (*os, self.platform.contract_home(path)))
                .collect(),
            repo_path: repo_path.clone(),
            config_type,
            platforms,
            current_platform: current,
            status: ConfigStatus::Untracked,
            checksum: None,
            backup_path: None,
            description: options.description.clone(),
            tags: options.tags.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            use_symlink: options.use_symlink,
            executable: fsutil::is_executable(&first_existing),
            template_vars: BTreeMap::new(),
        };

        // Snapshot the live file before anything touches it.
        if let Some(current_path) = expanded.get(&current) {
            if current_path.exists() {
                if let Some(backup) = self.create_backup(current_path, &name) {
                    entry.backup_path = Some(self.platform.contract_home(&backup));
                }
            }
        }

        let source_for_repo = expanded
            .get(&current)
            .filter(|p| p.exists())
            .cloned()
            .unwrap_or(first_existing);
        let abs_repo = self.repo_root.join(&repo_path);
        if let Err(e) = fsutil::replace_with_copy(&source_for_repo, &abs_repo) {
            tracing::error!("failed to copy into repository: {e}");
            return false;
        }

        entry.checksum = Some(checksum::checksum(&abs_repo));
        entry.status = ConfigStatus::Tracked;
        self.index.configs.insert(name.clone(), entry);
        if !self.save() {
            return false;
        }
        tracing::info!("added configuration '{name}' ({config_type})");
        true
    }

    /// Stop tracking a configuration. Unless `keep_files` is set, the
    /// repository copy is deleted too.
    pub fn remove(&mut self, name: &str, keep_files: bool) -> bool {
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        if !keep_files {
            let abs_repo = self.repo_copy_path(entry);
            if let Err(e) = fsutil::remove_path(&abs_repo) {
                tracing::error!("failed to remove repository copy of '{name}': {e}");
                return false;
            }
        }
        self.index.configs.remove(name);
        if !self.save() {
            return false;
        }
        tracing::info!("removed configuration '{name}'");
        true
    }

    /// Deploy one entry to its current-platform location.
    ///
    /// Uses a symlink when the entry asks for one and the platform can
    /// create them, a recursive copy otherwise.
    pub fn deploy(&mut self, name: &str, force: bool) -> bool {
        let current = self.platform.os();
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        if !entry.supports(current) {
            tracing::warn!("configuration '{name}' is not supported on {current}");
            return false;
        }
        let Some(stored) = entry.source_path(current) else {
            tracing::error!("no source path defined for {current}");
            return false;
        };
        let target = self.platform.expand_home(stored);
        if target.exists() && !force {
            tracing::warn!("target already exists: {}, use force to overwrite", target.display());
            return false;
        }

        let abs_repo = self.repo_copy_path(entry);
        let use_symlink = entry.use_symlink;
        let executable = entry.executable;

        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!("failed to create parent of {}: {e}", target.display());
                return false;
            }
        }

        let deployed = if use_symlink && self.platform.can_symlink() {
            self.platform.create_symlink(&abs_repo, &target, force)
        } else {
            match fsutil::replace_with_copy(&abs_repo, &target) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("failed to copy '{name}' to {}: {e}", target.display());
                    false
                }
            }
        };
        if !deployed {
            return false;
        }

        if executable && target.is_file() {
            if let Err(e) = fsutil::set_executable(&target) {
                tracing::warn!("failed to mark {} executable: {e}", target.display());
            }
        }

        if let Some(entry) = self.index.configs.get_mut(name) {
            entry.status = ConfigStatus::Tracked;
            entry.touch();
        }
        if !self.save() {
            return false;
        }
        tracing::info!("deployed configuration '{name}'");
        true
    }

    /// Deploy every entry that supports `platform` (default: current).
    ///
    /// Not atomic: a failing entry is logged and skipped, and the count of
    /// successes is returned.
    pub fn deploy_all(&mut self, platform: Option<Os>, force: bool) -> usize {
        let target = platform.unwrap_or_else(|| self.platform.os());
        let candidates: Vec<String> = self
            .index
            .configs
            .iter()
            .filter(|(_, entry)| entry.supports(target))
            .map(|(name, _)| name.clone())
            .collect();

        let mut deployed = 0;
        for name in candidates {
            if self.deploy(&name, force) {
                deployed += 1;
            }
        }
        tracing::info!(
            "deployed {deployed}/{} configurations for {target}",
            self.index.configs.len()
        );
        deployed
    }

    /// Refresh the repository copy of `name` from its live source.
    ///
    /// A source identical to the stored checksum is a no-op success. A
    /// missing source flips the entry to `missing` and fails.
    pub fn update(&mut self, name: &str) -> bool {
        let current = self.platform.os();
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        let Some(stored) = entry.source_path(current) else {
            tracing::error!("no source path defined for {current}");
            return false;
        };
        let source = self.platform.expand_home(stored);
        let abs_repo = self.repo_copy_path(entry);
        let stored_checksum = entry.checksum.clone();

        if !source.exists() {
            tracing::error!("source path does not exist: {}", source.display());
            if let Some(entry) = self.index.configs.get_mut(name) {
                entry.status = ConfigStatus::Missing;
            }
            self.save();
            return false;
        }

        let current_checksum = checksum::checksum(&source);
        if Some(&current_checksum) == stored_checksum.as_ref() {
            tracing::debug!("configuration '{name}' is up to date");
            return true;
        }

        if abs_repo.exists() {
            self.create_backup(&abs_repo, &format!("{name}_repo"));
        }
        if let Err(e) = fsutil::replace_with_copy(&source, &abs_repo) {
            tracing::error!("failed to copy {} into repository: {e}", source.display());
            return false;
        }

        if let Some(entry) = self.index.configs.get_mut(name) {
            entry.checksum = Some(current_checksum);
            entry.status = ConfigStatus::Tracked;
            entry.touch();
        }
        if !self.save() {
            return false;
        }
        tracing::info!("updated configuration '{name}'");
        true
    }

    /// Refresh every entry from its live source. Returns the names whose
    /// repository copy actually changed.
    pub fn update_all(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for name in self.names() {
            let before = self.get(&name).and_then(|e| e.checksum.clone());
            if self.update(&name) {
                let after = self.get(&name).and_then(|e| e.checksum.clone());
                if before != after {
                    changed.push(name);
                }
            }
        }
        changed
    }

    /// Copy the repository copy (or the original backup) back over the
    /// live source path, replacing it entirely.
    pub fn restore(&mut self, name: &str, from_backup: bool) -> bool {
        let current = self.platform.os();
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        let Some(stored) = entry.source_path(current) else {
            tracing::error!("no source path defined for {current}");
            return false;
        };
        let target = self.platform.expand_home(stored);
        let executable = entry.executable;

        let source = if from_backup {
            let Some(backup) = entry.backup_path.as_ref() else {
                tracing::error!("no backup available for '{name}'");
                return false;
            };
            let backup = self.platform.expand_home(backup);
            if !backup.exists() {
                tracing::error!("no backup available for '{name}'");
                return false;
            }
            backup
        } else {
            let abs_repo = self.repo_copy_path(entry);
            if !abs_repo.exists() {
                tracing::error!("repository copy not found for '{name}'");
                return false;
            }
            abs_repo
        };

        if let Err(e) = fsutil::replace_with_copy(&source, &target) {
            tracing::error!("failed to restore '{name}': {e}");
            return false;
        }
        if executable && target.is_file() {
            if let Err(e) = fsutil::set_executable(&target) {
                tracing::warn!("failed to mark {} executable: {e}", target.display());
            }
        }

        if let Some(entry) = self.index.configs.get_mut(name) {
            entry.status = ConfigStatus::Tracked;
            entry.touch();
        }
        if !self.save() {
            return false;
        }
        tracing::info!(
            "restored configuration '{name}' from {}",
            if from_backup { "backup" } else { "repository" }
        );
        true
    }

    /// Entries matching `filter`, sorted by name.
    #[must_use]
    pub fn list(&self, filter: &ListFilter) -> Vec<&ConfigEntry> {
        self.index
            .configs
            .values()
            .filter(|entry| filter.platform.is_none_or(|p| entry.supports(p)))
            .filter(|entry| {
                filter.tags.is_empty() || filter.tags.iter().any(|t| entry.tags.contains(t))
            })
            .filter(|entry| filter.status.is_none_or(|s| entry.status == s))
            .collect()
    }

    /// Recompute and persist the status of every entry.
    ///
    /// Classification order: a missing current-platform source counts as
    /// `tracked` when another platform still has an existing path (the
    /// content lives elsewhere) and `missing` otherwise; a missing
    /// repository copy is `untracked`; otherwise checksums of source and
    /// repository copy decide `modified` vs `tracked`.
    pub fn check_status(&mut self) -> BTreeMap<ConfigStatus, Vec<String>> {
        let mut report: BTreeMap<ConfigStatus, Vec<String>> = ConfigStatus::ALL
            .iter()
            .map(|s| (*s, Vec::new()))
            .collect();

        let mut updates: Vec<(String, ConfigStatus)> = Vec::new();
        let current = self.platform.os();
        for (name, entry) in &self.index.configs {
            let source = entry
                .source_path(current)
                .map(|p| self.platform.expand_home(p));
            let status = match source {
                Some(source) if source.exists() => {
                    let abs_repo = self.repo_copy_path(entry);
                    if !abs_repo.exists() {
                        ConfigStatus::Untracked
                    } else if checksum::checksum(&source) == checksum::checksum(&abs_repo) {
                        ConfigStatus::Tracked
                    } else {
                        ConfigStatus::Modified
                    }
                }
                _ => {
                    let elsewhere = entry
                        .source_paths
                        .values()
                        .any(|p| self.platform.expand_home(p).exists());
                    if elsewhere {
                        ConfigStatus::Tracked
                    } else {
                        ConfigStatus::Missing
                    }
                }
            };
            updates.push((name.clone(), status));
        }

        for (name, status) in updates {
            if let Some(entry) = self.index.configs.get_mut(&name) {
                entry.status = status;
            }
            if let Some(bucket) = report.get_mut(&status) {
                bucket.push(name);
            }
        }
        self.save();
        report
    }

    /// Add a source path for `platform` to an existing entry.
    pub fn add_platform_path(&mut self, name: &str, platform: Os, path: &Path, force: bool) -> bool {
        let resolved = self.platform.normalize_path(path);
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        if entry.source_paths.contains_key(&platform) && !force {
            tracing::error!(
                "platform {platform} already has a path for '{name}', use force to overwrite"
            );
            return false;
        }
        if !resolved.exists() {
            tracing::error!("source path does not exist: {}", resolved.display());
            return false;
        }

        let contracted = self.platform.contract_home(&resolved);
        if let Some(entry) = self.index.configs.get_mut(name) {
            entry.add_source_path(platform, contracted);
            entry.touch();
        }
        if !self.save() {
            return false;
        }
        tracing::info!("added {platform} path for configuration '{name}': {}", resolved.display());
        true
    }

    /// Remove the source path for `platform` from an existing entry.
    pub fn remove_platform_path(&mut self, name: &str, platform: Os) -> bool {
        let Some(entry) = self.index.configs.get(name) else {
            tracing::error!("configuration '{name}' not found");
            return false;
        };
        if !entry.source_paths.contains_key(&platform) {
            tracing::error!("configuration '{name}' has no path for {platform}");
            return false;
        }
        if let Some(entry) = self.index.configs.get_mut(name) {
            entry.remove_source_path(platform);
            entry.touch();
        }
        if !self.save() {
            return false;
        }
        tracing::info!("removed {platform} path for configuration '{name}'");
        true
    }

    /// Every per-platform path of an entry, with its existence on this
    /// machine. Unknown names yield an empty list.
    #[must_use]
    pub fn list_platform_paths(&self, name: &str) -> Vec<PlatformPath> {
        let Some(entry) = self.index.configs.get(name) else {
            return Vec::new();
        };
        entry
            .source_paths
            .iter()
            .map(|(platform, stored)| {
                let path = self.platform.expand_home(stored);
                let exists = path.exists();
                PlatformPath {
                    platform: *platform,
                    path,
                    exists,
                }
            })
            .collect()
    }

    /// Aggregate counts by type, platform, and status.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.index.configs.len(),
            ..RegistryStats::default()
        };
        for entry in self.index.configs.values() {
            *stats.by_type.entry(entry.config_type).or_insert(0) += 1;
            for platform in &entry.platforms {
                *stats.by_platform.entry(*platform).or_insert(0) += 1;
            }
            *stats.by_status.entry(entry.status).or_insert(0) += 1;
            if stats.last_updated.is_none_or(|t| entry.updated_at > t) {
                stats.last_updated = Some(entry.updated_at);
            }
        }
        stats
    }

    fn save(&mut self) -> bool {
        match self.index.save(self.platform.os()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to save registry index: {e}");
                false
            }
        }
    }

    /// Timestamped snapshot under `backups/`. Failure is logged but never
    /// fatal.
    fn create_backup(&self, source: &Path, name: &str) -> Option<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup = self.repo_root.join("backups").join(format!("{name}_{timestamp}"));
        match fsutil::copy_recursive(source, &backup) {
            Ok(()) => {
                tracing::debug!("created backup: {}", backup.display());
                Some(backup)
            }
            Err(e) => {
                tracing::warn!("failed to back up {}: {e}", source.display());
                None
            }
        }
    }
}

/// Classify a path. First match wins: directory, script extension,
/// executable bit, template markers in readable text, then plain dotfile.
#[must_use]
pub fn infer_config_type(path: &Path) -> ConfigType {
    if path.is_dir() {
        return ConfigType::ConfigDir;
    }
    if !path.is_file() {
        return ConfigType::Dotfile;
    }
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
    {
        return ConfigType::Script;
    }
    if fsutil::is_executable(path) {
        return ConfigType::Binary;
    }
    if let Ok(content) = std::fs::read_to_string(path) {
        if content.contains("{{") && content.contains("}}") {
            return ConfigType::Template;
        }
    }
    ConfigType::Dotfile
}

/// Repository-relative path for an entry: multi-platform entries live under
/// `configs/common/`, single-platform ones under `configs/<os>/`, grouped
/// by type.
fn repo_path_for(name: &str, config_type: ConfigType, platforms: &[Os]) -> PathBuf {
    let scope = if platforms.len() > 1 {
        "common"
    } else {
        platforms.first().map_or("common", |os| os.as_str())
    };
    let safe_name = name.replace(['/', '\\'], "_");
    Path::new("configs")
        .join(scope)
        .join(config_type.repo_subdir())
        .join(safe_name)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_registry(dir: &Path) -> Registry {
        let home = dir.join("home");
        std::fs::create_dir_all(&home).unwrap();
        let platform = Platform::with_values(Os::Linux, home);
        Registry::open(dir.join("repo"), platform).unwrap()
    }

    fn write_home_file(registry: &Registry, rel: &str, content: &[u8]) -> PathBuf {
        let path = registry.platform().home_dir().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn add_simple(registry: &mut Registry, name: &str, rel: &str, content: &[u8]) -> PathBuf {
        let path = write_home_file(registry, rel, content);
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, path.clone());
        let options = AddOptions {
            name: Some(name.to_string()),
            use_symlink: false,
            ..AddOptions::default()
        };
        assert!(registry.add(paths, &options));
        path
    }

    // ----- add -----

    #[test]
    fn add_copies_into_repository_and_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"alias ll='ls -la'");

        let entry = registry.get("bashrc").unwrap();
        assert_eq!(entry.status, ConfigStatus::Tracked);
        assert_eq!(entry.config_type, ConfigType::Dotfile);
        let repo_copy = registry.repo_copy_path(entry);
        assert_eq!(std::fs::read(repo_copy).unwrap(), b"alias ll='ls -la'");
        assert_eq!(
            entry.checksum.as_deref(),
            Some("12049dbcb70830d04702b8d442e5a6b7")
        );
    }

    #[test]
    fn add_fails_when_no_source_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, dir.path().join("home/.nope"));
        let options = AddOptions {
            name: Some("nope".to_string()),
            ..AddOptions::default()
        };
        assert!(!registry.add(paths, &options));
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn add_duplicate_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "gitconfig", ".gitconfig", b"[user]");

        let path = registry.platform().home_dir().join(".gitconfig");
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, path.clone());
        let mut options = AddOptions {
            name: Some("gitconfig".to_string()),
            ..AddOptions::default()
        };
        assert!(!registry.add(paths.clone(), &options));
        options.force = true;
        assert!(registry.add(paths, &options));
    }

    #[test]
    fn add_derives_name_from_current_platform_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let path = write_home_file(&registry, ".vimrc", b"set nocompatible");
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, path);
        assert!(registry.add(paths, &AddOptions::default()));
        assert!(registry.get(".vimrc").is_some());
    }

    #[test]
    fn add_stores_sources_home_relative() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");
        let entry = registry.get("bashrc").unwrap();
        assert_eq!(
            entry.source_path(Os::Linux).unwrap(),
            Path::new("~/.bashrc")
        );
    }

    #[test]
    fn add_creates_backup_of_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"original");
        let entry = registry.get("bashrc").unwrap();
        let backup = registry
            .platform()
            .expand_home(entry.backup_path.as_ref().unwrap());
        assert_eq!(std::fs::read(backup).unwrap(), b"original");
    }

    #[test]
    fn multi_platform_entry_lands_under_common() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let path = write_home_file(&registry, ".profile", b"x");
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, path);
        paths.insert(Os::Macos, registry.platform().home_dir().join(".profile_mac"));
        let options = AddOptions {
            name: Some("profile".to_string()),
            ..AddOptions::default()
        };
        assert!(registry.add(paths, &options));
        let entry = registry.get("profile").unwrap();
        assert!(entry.repo_path.starts_with("configs/common"));
    }

    // ----- remove -----

    #[test]
    fn remove_deletes_repo_copy_unless_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "a", ".a", b"1");
        add_simple(&mut registry, "b", ".b", b"2");

        let a_repo = registry.repo_copy_path(registry.get("a").unwrap());
        let b_repo = registry.repo_copy_path(registry.get("b").unwrap());

        assert!(registry.remove("a", false));
        assert!(!a_repo.exists());

        assert!(registry.remove("b", true));
        assert!(b_repo.exists());
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn remove_unknown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        assert!(!registry.remove("ghost", false));
    }

    // ----- deploy -----

    #[test]
    fn deploy_refuses_existing_target_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"old");
        // The live file still exists, so deploying over it needs force.
        assert!(!registry.deploy("bashrc", false));
        assert!(registry.deploy("bashrc", true));
        assert_eq!(std::fs::read(live).unwrap(), b"old");
    }

    #[test]
    fn deploy_materializes_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"content");
        std::fs::remove_file(&live).unwrap();

        assert!(registry.deploy("bashrc", false));
        assert_eq!(std::fs::read(&live).unwrap(), b"content");
    }

    #[test]
    fn deploy_fails_for_unsupported_platform() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");

        // Reopen the same repository as a windows machine.
        let platform = Platform::with_values(Os::Windows, dir.path().join("home"));
        let mut win = Registry::open(dir.path().join("repo"), platform).unwrap();
        assert!(!win.deploy("bashrc", true));
    }

    #[test]
    fn deploy_all_counts_only_matching_platform() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");
        assert_eq!(registry.deploy_all(Some(Os::Windows), true), 0);
        assert_eq!(registry.deploy_all(None, true), 1);
    }

    // ----- update -----

    #[test]
    fn update_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"v1");

        assert!(registry.update("bashrc"));
        let first = registry.get("bashrc").unwrap().checksum.clone();
        assert!(registry.update("bashrc"));
        let second = registry.get("bashrc").unwrap().checksum.clone();
        assert_eq!(first, second);
        assert_eq!(registry.get("bashrc").unwrap().status, ConfigStatus::Tracked);
    }

    #[test]
    fn update_refreshes_changed_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"v1");
        std::fs::write(&live, b"v2").unwrap();

        assert!(registry.update("bashrc"));
        let entry = registry.get("bashrc").unwrap();
        let repo_copy = registry.repo_copy_path(entry);
        assert_eq!(std::fs::read(repo_copy).unwrap(), b"v2");
    }

    #[test]
    fn update_missing_source_flips_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"v1");
        std::fs::remove_file(&live).unwrap();

        assert!(!registry.update("bashrc"));
        assert_eq!(registry.get("bashrc").unwrap().status, ConfigStatus::Missing);
    }

    #[test]
    fn update_all_reports_changed_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "a", ".a", b"1");
        add_simple(&mut registry, "b", ".b", b"2");
        std::fs::write(&live, b"1-changed").unwrap();

        assert_eq!(registry.update_all(), vec!["a".to_string()]);
    }

    // ----- restore -----

    #[test]
    fn restore_from_repository_replaces_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"canonical");
        std::fs::write(&live, b"drifted").unwrap();

        assert!(registry.restore("bashrc", false));
        assert_eq!(std::fs::read(&live).unwrap(), b"canonical");
    }

    #[test]
    fn restore_from_backup_uses_original_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"original");
        std::fs::write(&live, b"changed").unwrap();
        assert!(registry.update("bashrc"));

        assert!(registry.restore("bashrc", true));
        assert_eq!(std::fs::read(&live).unwrap(), b"original");
    }

    // ----- status -----

    #[test]
    fn status_cycles_between_tracked_and_modified() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"v1");

        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Tracked], vec!["bashrc".to_string()]);

        std::fs::write(&live, b"v2").unwrap();
        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Modified], vec!["bashrc".to_string()]);

        std::fs::write(&live, b"v1").unwrap();
        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Tracked], vec!["bashrc".to_string()]);
    }

    #[test]
    fn status_treats_source_elsewhere_as_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"v1");

        // Claim a macos path pointing at a file that exists here, then drop
        // the linux copy.
        let mac = write_home_file(&registry, ".bash_profile", b"v1");
        assert!(registry.add_platform_path("bashrc", Os::Macos, &mac, false));
        std::fs::remove_file(&live).unwrap();

        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Tracked], vec!["bashrc".to_string()]);
    }

    #[test]
    fn status_reports_missing_when_no_source_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = add_simple(&mut registry, "bashrc", ".bashrc", b"v1");
        std::fs::remove_file(live).unwrap();

        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Missing], vec!["bashrc".to_string()]);
    }

    #[test]
    fn status_reports_untracked_when_repo_copy_gone() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"v1");
        let repo_copy = registry.repo_copy_path(registry.get("bashrc").unwrap());
        std::fs::remove_file(repo_copy).unwrap();

        let report = registry.check_status();
        assert_eq!(report[&ConfigStatus::Untracked], vec!["bashrc".to_string()]);
    }

    // ----- platform paths -----

    #[test]
    fn platform_paths_report_existence_per_platform() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let live = write_home_file(&registry, ".bashrc", b"alias ll='ls -la'");
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, live);
        paths.insert(Os::Macos, registry.platform().home_dir().join(".bash_profile"));
        let options = AddOptions {
            name: Some("shell_config".to_string()),
            ..AddOptions::default()
        };
        assert!(registry.add(paths, &options));

        let rows = registry.list_platform_paths("shell_config");
        assert_eq!(rows.len(), 2);
        let linux = rows.iter().find(|r| r.platform == Os::Linux).unwrap();
        let macos = rows.iter().find(|r| r.platform == Os::Macos).unwrap();
        assert!(linux.exists);
        assert!(!macos.exists);
    }

    #[test]
    fn add_platform_path_validates_existence_and_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");

        let missing = registry.platform().home_dir().join(".absent");
        assert!(!registry.add_platform_path("bashrc", Os::Windows, &missing, false));

        let win = write_home_file(&registry, "_bashrc", b"x");
        assert!(registry.add_platform_path("bashrc", Os::Windows, &win, false));
        // Second add for the same platform needs force.
        assert!(!registry.add_platform_path("bashrc", Os::Windows, &win, false));
        assert!(registry.add_platform_path("bashrc", Os::Windows, &win, true));
    }

    #[test]
    fn remove_platform_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");
        let win = write_home_file(&registry, "_bashrc", b"x");
        assert!(registry.add_platform_path("bashrc", Os::Windows, &win, false));
        assert!(registry.remove_platform_path("bashrc", Os::Windows));
        assert!(!registry.remove_platform_path("bashrc", Os::Windows));
        assert_eq!(registry.get("bashrc").unwrap().platforms, vec![Os::Linux]);
    }

    // ----- list / stats -----

    #[test]
    fn list_filters_by_tag_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        let path = write_home_file(&registry, ".bashrc", b"x");
        let mut paths = BTreeMap::new();
        paths.insert(Os::Linux, path);
        let options = AddOptions {
            name: Some("bashrc".to_string()),
            tags: vec!["shell".to_string()],
            ..AddOptions::default()
        };
        assert!(registry.add(paths, &options));
        add_simple(&mut registry, "vimrc", ".vimrc", b"y");

        let filter = ListFilter {
            tags: vec!["shell".to_string()],
            ..ListFilter::default()
        };
        let hits = registry.list(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "bashrc");

        let filter = ListFilter {
            status: Some(ConfigStatus::Missing),
            ..ListFilter::default()
        };
        assert!(registry.list(&filter).is_empty());
        assert_eq!(registry.list(&ListFilter::default()).len(), 2);
    }

    #[test]
    fn stats_count_by_type_and_platform() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = test_registry(dir.path());
        add_simple(&mut registry, "bashrc", ".bashrc", b"x");
        add_simple(&mut registry, "deploy.sh", "bin/deploy.sh", b"#!/bin/sh\n");

        let stats = registry.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_type[&ConfigType::Dotfile], 1);
        assert_eq!(stats.by_type[&ConfigType::Script], 1);
        assert_eq!(stats.by_platform[&Os::Linux], 2);
        assert!(stats.last_updated.is_some());
    }

    // ----- type inference -----

    #[test]
    fn type_inference_precedence() {
        let dir = tempfile::tempdir().unwrap();

        let subdir = dir.path().join("confdir");
        std::fs::create_dir(&subdir).unwrap();
        assert_eq!(infer_config_type(&subdir), ConfigType::ConfigDir);

        let script = dir.path().join("run.sh");
        std::fs::write(&script, b"#!/bin/sh\n").unwrap();
        assert_eq!(infer_config_type(&script), ConfigType::Script);

        let template = dir.path().join("gitconfig");
        std::fs::write(&template, b"name = {{USER}}\n").unwrap();
        assert_eq!(infer_config_type(&template), ConfigType::Template);

        let plain = dir.path().join("plain");
        std::fs::write(&plain, b"just text\n").unwrap();
        assert_eq!(infer_config_type(&plain), ConfigType::Dotfile);
    }

    #[cfg(unix)]
    #[test]
    fn executable_without_script_extension_is_binary() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, b"\x7fELF").unwrap();
        fsutil::set_executable(&tool).unwrap();
        assert_eq!(infer_config_type(&tool), ConfigType::Binary);
    }

    // ----- persistence -----

    #[test]
    fn registry_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut registry = test_registry(dir.path());
            add_simple(&mut registry, "bashrc", ".bashrc", b"x");
        }
        let home = dir.path().join("home");
        let platform = Platform::with_values(Os::Linux, home);
        let registry = Registry::open(dir.path().join("repo"), platform).unwrap();
        assert!(registry.get("bashrc").is_some());
    }
}
