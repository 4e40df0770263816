// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed fake home and repository so each
// integration test runs in an isolated environment without touching the real
// user profile.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use dotsync_cli::platform::{Os, Platform};
use dotsync_cli::registry::{AddOptions, Registry};

/// An isolated environment with a fake home directory and a repository
/// root, both inside one [`tempfile::TempDir`].
pub struct TestEnv {
    pub dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home dir");
        Self { dir }
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    pub fn repo(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    /// A Linux platform rooted at the fake home directory.
    pub fn platform(&self) -> Platform {
        Platform::with_values(Os::Linux, self.home())
    }

    pub fn registry(&self) -> Registry {
        Registry::open(self.repo(), self.platform()).expect("open registry")
    }

    /// Write a file under the fake home directory and return its path.
    pub fn write_home_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.home().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write home file");
        path
    }
}

/// Track a single-platform configuration by name, deploying with copies so
/// assertions can read plain files.
pub fn add_config(registry: &mut Registry, name: &str, path: &Path) -> bool {
    let mut paths = BTreeMap::new();
    paths.insert(Os::Linux, path.to_path_buf());
    let options = AddOptions {
        name: Some(name.to_string()),
        use_symlink: false,
        ..AddOptions::default()
    };
    registry.add(paths, &options)
}

/// Run a git command in `dir`, panicking on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
