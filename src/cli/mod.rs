//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::layers::{Stage, Workspace};
use crate::infra::dirs::FleetkitDirs;
use commands::Commands;

/// Fleetkit - scaffold, configure and drive containerized applications
///
/// Configuration is read from the system, user and project layers, in that
/// order; later layers override earlier ones.
#[derive(Parser, Debug)]
#[command(name = "fleetkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override configuration values as comma-separated 'key=value' pairs
    #[arg(short = 'c', long = "config", value_delimiter = ',', global = true)]
    pub overrides: Vec<String>,

    /// Project root (default: nearest directory holding fleetkit.yaml)
    #[arg(short = 'C', long = "cwd", global = true)]
    pub project: Option<PathBuf>,

    /// Deployment stage 'dev' (default)
    #[arg(long, global = true, conflicts_with_all = ["staging", "prod"])]
    pub dev: bool,

    /// Deployment stage 'staging'
    #[arg(long, global = true, conflicts_with = "prod")]
    pub staging: bool,

    /// Deployment stage 'prod'
    #[arg(long, global = true)]
    pub prod: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Deployment stage selected on the command line
    pub fn stage(&self) -> Stage {
        if self.staging {
            Stage::Staging
        } else if self.prod {
            Stage::Prod
        } else {
            Stage::Dev
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Some(command) = self.command.as_ref() else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let cwd = std::env::current_dir().context("while reading current directory")?;
        let mut workspace = Workspace::load(FleetkitDirs::new(), self.project.as_deref(), &cwd)
            .context("while reading configuration")?;
        workspace
            .apply_overrides(&self.overrides)
            .context("while parsing configuration overrides")?;

        command.run(&mut workspace, self.stage())
    }
}
