//! CLI command for `fleetkit templates`

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::core::layers::Workspace;

/// List discovered templates with their base and location
pub fn execute(workspace: &mut Workspace) -> Result<()> {
    let catalog = workspace
        .catalog()
        .context("while discovering templates")?;
    if catalog.names().is_empty() {
        println!("{} No templates found", status::WARNING);
        return Ok(());
    }
    for (name, info) in catalog.iter() {
        let base = info
            .base
            .as_deref()
            .map(|b| format!(" (base: {b})"))
            .unwrap_or_default();
        println!("{name}{base}");
        if !info.description.is_empty() {
            println!("    {}", info.description);
        }
        println!("    {}", info.path.display());
    }
    Ok(())
}
