//! Command: add a configuration to management.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::cli::{AddOpts, GlobalOpts};
use crate::platform::Os;
use crate::registry::AddOptions;

/// Run the add command.
///
/// The primary path is recorded for the current platform (plus any extra
/// `--platform` targets sharing it); `--extra-path OS PATH` pairs record
/// platform-specific locations.
///
/// # Errors
///
/// Returns an error when the repository is not initialized, an OS
/// identifier does not parse, or the registry rejects the addition.
pub fn run(global: &GlobalOpts, opts: &AddOpts) -> Result<()> {
    let mut registry = super::open_registry(global)?;
    let current = registry.platform().os();

    let mut paths: BTreeMap<Os, PathBuf> = BTreeMap::new();
    paths.insert(current, opts.source_path.clone());
    for platform in &opts.platforms {
        paths.entry(*platform).or_insert_with(|| opts.source_path.clone());
    }
    for pair in opts.extra_paths.chunks(2) {
        let [os, path] = pair else {
            bail!("--extra-path requires an OS and a path");
        };
        let os: Os = os.parse()?;
        paths.insert(os, PathBuf::from(path));
    }

    let options = AddOptions {
        name: opts.name.clone(),
        description: opts.description.clone(),
        tags: opts.tags.clone(),
        use_symlink: opts.use_symlink,
        force: opts.force,
    };

    if !registry.add(paths, &options) {
        bail!("failed to add {}", opts.source_path.display());
    }
    println!("Added {}", opts.source_path.display());
    Ok(())
}
