//! Cross-platform path remapping.
//!
//! Entries recorded on one OS may need to land somewhere else on another,
//! most commonly anything under the generic `~/.config` root. The mapping
//! table knows the structurally-equivalent location per OS; a repository can
//! override or extend it with a `platform_mappings.json` file at its root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::platform::{Os, Platform};

/// Override file name, relative to the repository root.
pub const MAPPINGS_FILE: &str = "platform_mappings.json";

/// Category used for prefix rewriting of generic config-root paths.
const HOME_CONFIG_CATEGORY: &str = "home_config_paths";

type MappingTable = BTreeMap<String, BTreeMap<String, String>>;

/// Per-category, per-OS path patterns.
#[derive(Debug, Clone)]
pub struct PlatformMappings {
    table: MappingTable,
}

impl PlatformMappings {
    /// Built-in defaults merged with the repository's override file.
    ///
    /// A missing or invalid override file is ignored with a warning;
    /// categories present in the override replace the built-in category
    /// wholesale.
    #[must_use]
    pub fn load(repo_root: &Path) -> Self {
        let mut table = builtin_mappings();
        let override_file = repo_root.join(MAPPINGS_FILE);
        if override_file.exists() {
            match read_override(&override_file) {
                Ok(custom) => {
                    for (category, mapping) in custom {
                        table.insert(category, mapping);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "ignoring invalid platform mappings {}: {e}",
                        override_file.display()
                    );
                }
            }
        }
        Self { table }
    }

    /// Pattern for a category on a given OS, if configured.
    #[must_use]
    pub fn pattern(&self, category: &str, os: Os) -> Option<&str> {
        self.table
            .get(category)
            .and_then(|m| m.get(os.as_str()))
            .map(String::as_str)
    }

    /// Rewrite `path` for `target` when it lives under the generic config
    /// root. Paths outside any recognized subtree are returned unchanged.
    #[must_use]
    pub fn map_path(&self, path: &Path, target: Os, platform: &Platform) -> PathBuf {
        let Some(pattern) = self.pattern(HOME_CONFIG_CATEGORY, target) else {
            return path.to_path_buf();
        };
        let generic_root = platform.expand_home(Path::new("~/.config"));
        match path.strip_prefix(&generic_root) {
            Ok(rel) => platform.expand_home(Path::new(pattern)).join(rel),
            Err(_) => path.to_path_buf(),
        }
    }
}

fn builtin_mappings() -> MappingTable {
    let mut table = MappingTable::new();
    table.insert(
        HOME_CONFIG_CATEGORY.to_string(),
        BTreeMap::from([
            ("linux".to_string(), "~/.config".to_string()),
            // Many tools use ~/.config on macOS as well.
            ("darwin".to_string(), "~/.config".to_string()),
            ("windows".to_string(), "~/AppData/Roaming".to_string()),
        ]),
    );
    table.insert(
        "shell_configs".to_string(),
        BTreeMap::from([
            ("linux".to_string(), "~/.bashrc".to_string()),
            ("darwin".to_string(), "~/.bash_profile".to_string()),
            ("windows".to_string(), "~/.bashrc".to_string()),
        ]),
    );
    table.insert(
        "editor_configs".to_string(),
        BTreeMap::from([
            ("linux".to_string(), "~/.config/Code/User".to_string()),
            (
                "darwin".to_string(),
                "~/Library/Application Support/Code/User".to_string(),
            ),
            ("windows".to_string(), "~/AppData/Roaming/Code/User".to_string()),
        ]),
    );
    table
}

fn read_override(path: &Path) -> anyhow::Result<MappingTable> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn linux_platform(home: &Path) -> Platform {
        Platform::with_values(Os::Linux, home.to_path_buf())
    }

    #[test]
    fn builtin_patterns_are_present() {
        let dir = tempfile::tempdir().unwrap();
        let mappings = PlatformMappings::load(dir.path());
        assert_eq!(
            mappings.pattern("home_config_paths", Os::Windows),
            Some("~/AppData/Roaming")
        );
        assert_eq!(
            mappings.pattern("shell_configs", Os::Macos),
            Some("~/.bash_profile")
        );
    }

    #[test]
    fn config_root_paths_are_rewritten_for_windows() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let platform = linux_platform(&home);
        let mappings = PlatformMappings::load(dir.path());

        let original = home.join(".config/nvim/init.vim");
        let mapped = mappings.map_path(&original, Os::Windows, &platform);
        assert_eq!(mapped, home.join("AppData/Roaming/nvim/init.vim"));
    }

    #[test]
    fn paths_outside_config_root_are_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let platform = linux_platform(&home);
        let mappings = PlatformMappings::load(dir.path());

        let original = home.join(".bashrc");
        assert_eq!(mappings.map_path(&original, Os::Windows, &platform), original);
    }

    #[test]
    fn override_file_replaces_category() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MAPPINGS_FILE),
            serde_json::json!({
                "home_config_paths": {
                    "linux": "~/.config",
                    "windows": "~/CustomRoot"
                }
            })
            .to_string(),
        )
        .unwrap();

        let mappings = PlatformMappings::load(dir.path());
        assert_eq!(
            mappings.pattern("home_config_paths", Os::Windows),
            Some("~/CustomRoot")
        );
        // Untouched categories keep their defaults.
        assert_eq!(
            mappings.pattern("shell_configs", Os::Linux),
            Some("~/.bashrc")
        );
    }

    #[test]
    fn invalid_override_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MAPPINGS_FILE), b"not json").unwrap();
        let mappings = PlatformMappings::load(dir.path());
        assert_eq!(
            mappings.pattern("home_config_paths", Os::Linux),
            Some("~/.config")
        );
    }
}
