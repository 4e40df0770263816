//! `{{KEY}}` template rendering for template-typed entries.
//!
//! Substitution is literal string replacement, no nesting or conditionals.

use std::collections::BTreeMap;

use crate::platform::Platform;

/// Default variable set available to every template. Entry-specific
/// variables are merged on top and win on collision.
#[must_use]
pub fn default_vars(platform: &Platform) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "HOME".to_string(),
            platform.home_dir().display().to_string(),
        ),
        ("USER".to_string(), platform.username()),
        ("PLATFORM".to_string(), platform.os().to_string()),
        ("HOSTNAME".to_string(), platform.hostname()),
        (
            "CONFIG_DIR".to_string(),
            platform.config_dir("config").display().to_string(),
        ),
    ])
}

/// Replace every `{{KEY}}` placeholder in `content` with its value.
/// Unknown placeholders are left as-is.
#[must_use]
pub fn render(content: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rendered = content.to_string();
    for (key, value) in vars {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
    }
    rendered
}

/// Defaults merged with entry-specific variables, entry values winning.
#[must_use]
pub fn merged_vars(
    platform: &Platform,
    entry_vars: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut vars = default_vars(platform);
    for (key, value) in entry_vars {
        vars.insert(key.clone(), value.clone());
    }
    vars
}
