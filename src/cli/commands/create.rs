//! CLI command for `fleetkit create`
//!
//! Scaffolds an application from the language template named by `app.lang`.
//! Application settings are usually supplied with `-c`, e.g.
//! `fleetkit -c app.lang=go,app.name=demo,... create ./demo`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{create_spinner, status};
use crate::core::layers::{Stage, Workspace};

/// Execute create command
pub fn execute(workspace: &mut Workspace, stage: Stage, dest: &Path) -> Result<()> {
    let spinner = create_spinner(&format!("Creating application in {}", dest.display()));
    let result = workspace.create(dest, stage);
    spinner.finish_and_clear();
    let written = result.context("while creating application")?;

    println!(
        "{} Created {} application '{}' in {}",
        status::SUCCESS,
        workspace.config.app.lang,
        workspace.config.app.name,
        dest.display()
    );
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
