//! CLI command for `fleetkit config`
//!
//! Reads and writes configuration values by dotted path. Project writes
//! validate the application settings, persist the project layer and, unless
//! disabled, regenerate tracked template files.

use anyhow::{Context, Result};

use crate::cli::commands::regen;
use crate::cli::output::{format_value, status};
use crate::core::layers::{Stage, Workspace};

/// Arguments of `config set` and `config add`
#[derive(Debug)]
pub struct WriteRequest<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub append: bool,
    pub global: bool,
    pub regen: bool,
}

/// Print the value at `key`
pub fn get(workspace: &Workspace, key: &str, global: bool) -> Result<()> {
    let document = if global {
        workspace.global()
    } else {
        &workspace.config
    };
    let value = document
        .read_field(key)
        .context("while retrieving config value")?;
    let text = format_value(&value)?;
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

/// Execute `config set` / `config add`
pub fn write(workspace: &mut Workspace, stage: Stage, request: &WriteRequest<'_>) -> Result<()> {
    if request.global {
        workspace
            .global_mut()
            .write_field(request.key, request.value, request.append)
            .context("while writing configuration value")?;
        let path = workspace
            .persist_global()
            .context("while writing configuration file")?;
        println!("{} Updated {}", status::SUCCESS, path.display());
        return Ok(());
    }

    workspace
        .require_project_root()
        .context("while writing configuration value")?;
    workspace
        .config
        .write_field(request.key, request.value, request.append)
        .context("while writing configuration value")?;
    workspace
        .validate_app(false)
        .context("while validating application settings")?;
    let path = workspace
        .persist_project()
        .context("while writing configuration file")?;
    println!("{} Updated {}", status::SUCCESS, path.display());

    if request.regen {
        regen::execute(workspace, stage)?;
    }
    Ok(())
}

/// Print the completions of a partial key path, one per line
pub fn keys(workspace: &Workspace, prefix: &str) -> Result<()> {
    for suggestion in workspace.config.suggestions(prefix) {
        println!("{suggestion}");
    }
    Ok(())
}
