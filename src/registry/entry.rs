//! The configuration entry model and its serialized form.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Os;

/// Kind of configuration, inferred once when the entry is created and never
/// re-inferred afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigType {
    #[serde(rename = "dotfile")]
    Dotfile,
    #[serde(rename = "config_dir")]
    ConfigDir,
    #[serde(rename = "binary")]
    Binary,
    #[serde(rename = "script")]
    Script,
    #[serde(rename = "template")]
    Template,
}

impl ConfigType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dotfile => "dotfile",
            Self::ConfigDir => "config_dir",
            Self::Binary => "binary",
            Self::Script => "script",
            Self::Template => "template",
        }
    }

    /// Subdirectory under the repository config root for this type.
    #[must_use]
    pub const fn repo_subdir(self) -> &'static str {
        match self {
            Self::Dotfile => "dotfiles",
            Self::ConfigDir => "directories",
            Self::Binary => "binaries",
            Self::Script => "scripts",
            Self::Template => "templates",
        }
    }
}

impl std::fmt::Display for ConfigType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached entry state, recomputed by a status scan and persisted between
/// scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigStatus {
    #[serde(rename = "tracked")]
    Tracked,
    #[serde(rename = "modified")]
    Modified,
    #[serde(rename = "missing")]
    Missing,
    #[serde(rename = "conflicted")]
    Conflicted,
    #[serde(rename = "untracked")]
    Untracked,
}

impl ConfigStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tracked => "tracked",
            Self::Modified => "modified",
            Self::Missing => "missing",
            Self::Conflicted => "conflicted",
            Self::Untracked => "untracked",
        }
    }

    /// All statuses, in the order status reports list them.
    pub const ALL: [Self; 5] = [
        Self::Tracked,
        Self::Modified,
        Self::Missing,
        Self::Conflicted,
        Self::Untracked,
    ];
}

impl std::fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a status name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(String);

impl std::fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unrecognized status '{}' (expected tracked, modified, missing, conflicted, or untracked)",
            self.0
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl std::str::FromStr for ConfigStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tracked" => Ok(Self::Tracked),
            "modified" => Ok(Self::Modified),
            "missing" => Ok(Self::Missing),
            "conflicted" => Ok(Self::Conflicted),
            "untracked" => Ok(Self::Untracked),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One managed configuration file or directory.
///
/// Source paths are stored in `~/...` form so the index stays portable
/// across machines; they are expanded against the active home directory at
/// the point of use. The entry exclusively owns its `source_paths` map, and
/// every mutator keeps `platforms` consistent with the map's keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    pub source_paths: BTreeMap<Os, PathBuf>,
    /// Repository copy, relative to the repository root.
    pub repo_path: PathBuf,
    pub config_type: ConfigType,

    pub platforms: Vec<Os>,
    /// OS the entry was created under. A snapshot, not re-derived.
    pub current_platform: Os,

    pub status: ConfigStatus,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub backup_path: Option<PathBuf>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub use_symlink: bool,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub template_vars: BTreeMap<String, String>,
}

impl ConfigEntry {
    /// Stored source path for `platform`, if any.
    #[must_use]
    pub fn source_path(&self, platform: Os) -> Option<&Path> {
        self.source_paths.get(&platform).map(PathBuf::as_path)
    }

    /// Add or replace the source path for a platform, keeping `platforms`
    /// in sync.
    pub fn add_source_path(&mut self, platform: Os, path: PathBuf) {
        self.source_paths.insert(platform, path);
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
    }

    /// Remove the source path for a platform, keeping `platforms` in sync.
    pub fn remove_source_path(&mut self, platform: Os) {
        self.source_paths.remove(&platform);
        self.platforms.retain(|p| *p != platform);
    }

    /// Whether this entry claims support for `platform`.
    #[must_use]
    pub fn supports(&self, platform: Os) -> bool {
        self.platforms.contains(&platform)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
