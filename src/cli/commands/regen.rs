//! CLI command for `fleetkit regen`

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::core::layers::{Stage, Workspace};

/// Re-render tracked template files
pub fn execute(workspace: &Workspace, stage: Stage) -> Result<()> {
    let written = workspace
        .regenerate(stage)
        .context("while regenerating template files")?;
    if written.is_empty() {
        println!("{} No tracked template files", status::INFO);
    }
    for path in written {
        println!("{} Regenerated {}", status::SUCCESS, path.display());
    }
    Ok(())
}
