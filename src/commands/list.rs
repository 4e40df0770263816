//! Command: list managed configurations.

use anyhow::Result;

use crate::cli::{GlobalOpts, ListOpts, OutputFormat};
use crate::registry::ListFilter;
use crate::registry::entry::ConfigEntry;

/// Run the list command.
///
/// # Errors
///
/// Returns an error when the repository is not initialized or JSON
/// serialization fails.
pub fn run(global: &GlobalOpts, opts: &ListOpts) -> Result<()> {
    let registry = super::open_registry(global)?;
    let filter = ListFilter {
        platform: opts.platform,
        tags: opts.tags.clone(),
        status: opts.status,
    };
    let entries = registry.list(&filter);

    match opts.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No configurations found");
                return Ok(());
            }
            print!("{}", render_table(&entries));
        }
    }
    Ok(())
}

fn render_table(entries: &[&ConfigEntry]) -> String {
    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);

    let mut out = format!(
        "{:name_width$}  {:10}  {:10}  {:24}  DESCRIPTION\n",
        "NAME", "TYPE", "STATUS", "PLATFORMS"
    );
    for entry in entries {
        let platforms = entry
            .platforms
            .iter()
            .map(|os| os.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{:name_width$}  {:10}  {:10}  {:24}  {}\n",
            entry.name,
            entry.config_type.as_str(),
            entry.status.as_str(),
            platforms,
            entry.description.as_deref().unwrap_or("-"),
        ));
    }
    out
}
