//! Fleetkit CLI - application scaffolding and device automation
//!
//! Entry point for the fleetkit command-line application.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use fleetkit::cli::output::display_error;
use fleetkit::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG applies unless -v raises the level
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        _ => EnvFilter::from_default_env().add_directive(Level::DEBUG.into()),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = cli.run() {
        display_error(&e);
        std::process::exit(1);
    }
}
