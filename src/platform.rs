//! Operating-system detection and OS-specific filesystem primitives.
//!
//! [`Platform`] is an explicitly constructed value that gets injected into
//! the registry and sync layers, so tests can substitute a fake home
//! directory or a foreign OS without touching process-global state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Detected operating system.
///
/// The serialized identifiers (`linux`, `darwin`, `windows`, `unknown`) are
/// the string values used as keys in the registry index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Os {
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "darwin", alias = "macos")]
    Macos,
    #[serde(rename = "windows")]
    Windows,
    /// Valid but never deployable.
    #[serde(rename = "unknown")]
    Unknown,
}

impl Os {
    /// The serialized identifier for this OS.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "darwin",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an OS identifier fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOsError(String);

impl fmt::Display for ParseOsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized platform '{}' (expected linux, darwin, windows, or unknown)",
            self.0
        )
    }
}

impl std::error::Error for ParseOsError {}

impl FromStr for Os {
    type Err = ParseOsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseOsError(other.to_string())),
        }
    }
}

/// Platform information and OS-specific filesystem operations.
#[derive(Debug, Clone)]
pub struct Platform {
    os: Os,
    home: PathBuf,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Create a platform with explicit values (for testing).
    #[must_use]
    pub fn with_values(os: Os, home: PathBuf) -> Self {
        Self { os, home }
    }

    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    #[must_use]
    pub fn home_dir(&self) -> &Path {
        &self.home
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::Macos
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Unknown
        }
    }

    /// Contract a path to `~/...` form when it lives under the home
    /// directory. Paths outside the home directory are returned unchanged.
    #[must_use]
    pub fn contract_home(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.home) {
            Ok(rel) => Path::new("~").join(rel),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Expand a leading `~` against this platform's home directory.
    #[must_use]
    pub fn expand_home(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("~") {
            Ok(rel) => self.home.join(rel),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Normalize a path: expand `~`, then simplify Windows UNC prefixes.
    #[must_use]
    pub fn normalize_path(&self, path: &Path) -> PathBuf {
        let expanded = self.expand_home(path);
        dunce::simplified(&expanded).to_path_buf()
    }

    /// Named per-OS configuration directory (`config`, `cache`, `bin`).
    ///
    /// Unrecognized names fall back to the generic config directory.
    #[must_use]
    pub fn config_dir(&self, name: &str) -> PathBuf {
        let home = &self.home;
        match (self.os, name) {
            (Os::Windows, "config") => home.join("AppData").join("Roaming"),
            (Os::Windows, "cache") => home.join("AppData").join("Local").join("Temp"),
            (Os::Windows, "bin") => home.join("bin"),
            (Os::Macos, "cache") => home.join("Library").join("Caches"),
            (Os::Linux, "cache") => home.join(".cache"),
            (_, "bin") => home.join(".local").join("bin"),
            // Many tools use ~/.config on macOS as well.
            _ => home.join(".config"),
        }
    }

    /// Whether this platform can create symbolic links.
    ///
    /// Unix always can. On Windows symlink creation needs developer mode or
    /// elevation, so the check is an actual probe in the temp directory.
    #[must_use]
    pub fn can_symlink(&self) -> bool {
        match self.os {
            Os::Linux | Os::Macos => true,
            Os::Windows => probe_windows_symlink(),
            Os::Unknown => false,
        }
    }

    /// Create a symlink at `target` pointing to `source`.
    ///
    /// When `force` is set, an existing file, link, or directory at `target`
    /// is removed first. Falls back to a recursive copy when the platform
    /// cannot create symlinks. Returns `false` on failure (the reason is
    /// logged), matching the detector contract used by the registry.
    pub fn create_symlink(&self, source: &Path, target: &Path, force: bool) -> bool {
        if force && target.symlink_metadata().is_ok() {
            if let Err(e) = crate::fsutil::remove_path(target) {
                tracing::error!("failed to remove existing target {}: {e}", target.display());
                return false;
            }
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::error!("failed to create parent of {}: {e}", target.display());
                return false;
            }
        }

        if !self.can_symlink() {
            // No symlink capability: materialize a copy instead.
            return match crate::fsutil::copy_recursive(source, target) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        "copy fallback {} -> {} failed: {e}",
                        source.display(),
                        target.display()
                    );
                    false
                }
            };
        }

        match symlink(source, target) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "failed to create symlink {} -> {}: {e}",
                    target.display(),
                    source.display()
                );
                false
            }
        }
    }

    /// Hostname of this machine, from the environment.
    #[must_use]
    pub fn hostname(&self) -> String {
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .unwrap_or_else(|_| "localhost".to_string())
    }

    /// Login name of the current user, from the environment.
    #[must_use]
    pub fn username(&self) -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "user".to_string())
    }
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, target)
    } else {
        std::os::windows::fs::symlink_file(source, target)
    }
}

#[cfg(not(any(unix, windows)))]
fn symlink(_source: &Path, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

/// Probe whether the current process may create symlinks on Windows.
#[cfg(windows)]
fn probe_windows_symlink() -> bool {
    let dir = std::env::temp_dir();
    let src = dir.join(format!("dotsync-probe-src-{}", std::process::id()));
    let dst = dir.join(format!("dotsync-probe-dst-{}", std::process::id()));
    if std::fs::write(&src, b"").is_err() {
        return false;
    }
    let ok = std::os::windows::fs::symlink_file(&src, &dst).is_ok();
    let _ = std::fs::remove_file(&dst);
    let _ = std::fs::remove_file(&src);
    ok
}

#[cfg(not(windows))]
fn probe_windows_symlink() -> bool {
    false
}
