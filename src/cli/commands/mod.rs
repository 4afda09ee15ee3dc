//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod config;
pub mod create;
pub mod exec;
pub mod regen;
pub mod templates;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::core::layers::{Stage, Workspace};

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read or change configuration values
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Create a new application from the template selected by app.lang
    Create {
        /// Destination directory
        dest: PathBuf,
    },

    /// Re-render the tracked template files of the project
    Regen,

    /// Run a named sequence on a device
    Exec {
        /// Sequence name
        sequence: String,

        /// Device name from the devices mapping
        device: String,
    },

    /// List the available templates
    Templates,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print a value (the whole configuration when no key is given)
    Get {
        /// Dotted key path, e.g. app.name
        key: Option<String>,

        /// Read the system and user configuration only
        #[arg(short, long)]
        global: bool,
    },

    /// Replace a value
    Set {
        /// Dotted key path
        key: String,

        /// YAML value, or a bare string
        value: String,

        /// Write to the user configuration instead of the project
        #[arg(short, long)]
        global: bool,

        /// Do not regenerate tracked template files afterwards
        #[arg(long)]
        no_regen: bool,
    },

    /// Append to a list or merge into a mapping
    Add {
        /// Dotted key path
        key: String,

        /// YAML value, or a bare string
        value: String,

        /// Write to the user configuration instead of the project
        #[arg(short, long)]
        global: bool,

        /// Do not regenerate tracked template files afterwards
        #[arg(long)]
        no_regen: bool,
    },

    /// List key completions for a partial path
    Keys {
        /// Partial dotted key path
        #[arg(default_value = "")]
        prefix: String,
    },
}

impl Commands {
    /// Execute the command against a loaded workspace
    pub fn run(&self, workspace: &mut Workspace, stage: Stage) -> Result<()> {
        match self {
            Self::Config { action } => match action {
                ConfigCommands::Get { key, global } => {
                    config::get(workspace, key.as_deref().unwrap_or_default(), *global)
                }
                ConfigCommands::Set {
                    key,
                    value,
                    global,
                    no_regen,
                } => config::write(
                    workspace,
                    stage,
                    &config::WriteRequest {
                        key,
                        value,
                        append: false,
                        global: *global,
                        regen: !no_regen,
                    },
                ),
                ConfigCommands::Add {
                    key,
                    value,
                    global,
                    no_regen,
                } => config::write(
                    workspace,
                    stage,
                    &config::WriteRequest {
                        key,
                        value,
                        append: true,
                        global: *global,
                        regen: !no_regen,
                    },
                ),
                ConfigCommands::Keys { prefix } => config::keys(workspace, prefix),
            },
            Self::Create { dest } => create::execute(workspace, stage, dest),
            Self::Regen => regen::execute(workspace, stage),
            Self::Exec { sequence, device } => exec::execute(workspace, stage, sequence, device),
            Self::Templates => templates::execute(workspace),
        }
    }
}
