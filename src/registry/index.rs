//! Durable registry index.
//!
//! The index is a single JSON file under the repository. It is read once
//! when the registry is opened and rewritten wholesale after each mutating
//! operation; there is no partial persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::platform::Os;
use crate::registry::entry::ConfigEntry;

/// Index location relative to the repository root.
pub const INDEX_FILE: &str = ".dotsync/index.json";

const INDEX_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct IndexDocument {
    version: String,
    platform: Os,
    updated_at: DateTime<Utc>,
    configs: BTreeMap<String, serde_json::Value>,
}

/// In-memory view of the index file plus its location on disk.
#[derive(Debug)]
pub struct RegistryIndex {
    path: PathBuf,
    pub configs: BTreeMap<String, ConfigEntry>,
}

impl RegistryIndex {
    /// Load the index at `<repo_root>/.dotsync/index.json`.
    ///
    /// A missing file yields an empty index. Entries that fail to
    /// deserialize are skipped with a warning so one corrupt entry does not
    /// take the whole registry down.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the file cannot be read and
    /// [`RegistryError::InvalidIndex`] when it is not valid index JSON.
    pub fn load(repo_root: &Path) -> Result<Self, RegistryError> {
        let path = repo_root.join(INDEX_FILE);
        if !path.exists() {
            return Ok(Self {
                path,
                configs: BTreeMap::new(),
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document: IndexDocument =
            serde_json::from_str(&raw).map_err(|e| RegistryError::InvalidIndex {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut configs = BTreeMap::new();
        for (name, value) in document.configs {
            match serde_json::from_value::<ConfigEntry>(value) {
                Ok(entry) => {
                    configs.insert(name, entry);
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable entry '{name}': {e}");
                }
            }
        }
        tracing::debug!("loaded {} entries from {}", configs.len(), path.display());
        Ok(Self { path, configs })
    }

    /// Rewrite the index file with the current entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] on filesystem failure and
    /// [`RegistryError::InvalidIndex`] if serialization fails.
    pub fn save(&self, platform: Os) -> Result<(), RegistryError> {
        let document = IndexDocument {
            version: INDEX_VERSION.to_string(),
            platform,
            updated_at: Utc::now(),
            configs: self
                .configs
                .iter()
                .map(|(name, entry)| {
                    serde_json::to_value(entry).map(|value| (name.clone(), value))
                })
                .collect::<Result<_, _>>()
                .map_err(|e| RegistryError::InvalidIndex {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })?,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let json =
            serde_json::to_string_pretty(&document).map_err(|e| RegistryError::InvalidIndex {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        std::fs::write(&self.path, json).map_err(|source| RegistryError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        tracing::debug!("saved {} entries to {}", self.configs.len(), self.path.display());
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::entry::{ConfigStatus, ConfigType};

    fn entry(name: &str) -> ConfigEntry {
        let mut source_paths = BTreeMap::new();
        source_paths.insert(Os::Linux, PathBuf::from(format!("~/.{name}")));
        ConfigEntry {
            name: name.to_string(),
            source_paths,
            repo_path: PathBuf::from(format!("configs/linux/dotfiles/{name}")),
            config_type: ConfigType::Dotfile,
            platforms: vec![Os::Linux],
            current_platform: Os::Linux,
            status: ConfigStatus::Tracked,
            checksum: None,
            backup_path: None,
            description: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            use_symlink: true,
            executable: false,
            template_vars: BTreeMap::new(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::load(dir.path()).unwrap();
        assert!(index.configs.is_empty());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = RegistryIndex::load(dir.path()).unwrap();
        index.configs.insert("vimrc".to_string(), entry("vimrc"));
        index.configs.insert("gitconfig".to_string(), entry("gitconfig"));
        index.save(Os::Linux).unwrap();

        let reloaded = RegistryIndex::load(dir.path()).unwrap();
        assert_eq!(reloaded.configs.len(), 2);
        assert_eq!(reloaded.configs["vimrc"], index.configs["vimrc"]);
    }

    #[test]
    fn saved_document_has_version_and_platform() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::load(dir.path()).unwrap();
        index.save(Os::Macos).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["platform"], "darwin");
        assert!(value["updated_at"].is_string());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let err = RegistryIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIndex { .. }));
    }

    #[test]
    fn unreadable_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = RegistryIndex::load(dir.path()).unwrap();
        index.configs.insert("good".to_string(), entry("good"));
        index.save(Os::Linux).unwrap();

        // Corrupt one entry in place.
        let path = dir.path().join(INDEX_FILE);
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["configs"]["bad"] = serde_json::json!({"name": "bad"});
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let reloaded = RegistryIndex::load(dir.path()).unwrap();
        assert_eq!(reloaded.configs.len(), 1);
        assert!(reloaded.configs.contains_key("good"));
    }
}
