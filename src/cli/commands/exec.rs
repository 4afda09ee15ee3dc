//! CLI command for `fleetkit exec`
//!
//! Runs a named sequence against one configured device. The device address
//! may contain `${}` expressions; it is evaluated before connecting.

use anyhow::{Context, Result};
use serde_yaml::Value;

use crate::cli::output::status;
use crate::core::layers::{Stage, Workspace};
use crate::core::sequence::{self, SequenceRunner};
use crate::infra::transport;

/// Execute exec command
pub fn execute(workspace: &Workspace, stage: Stage, name: &str, device: &str) -> Result<()> {
    let sequences = &workspace.config.sequences;
    sequence::validate_references(sequences, name)
        .with_context(|| format!("while executing {name} sequence"))?;

    let context = workspace
        .device_context(device, stage)
        .context("while preparing device context")?;
    let addr = context
        .get("device")
        .and_then(|d| d.get("addr"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    println!("{} Connecting to {device} at {addr}", status::INFO);
    let mut console = transport::connect(addr).context("while connecting to device console")?;

    SequenceRunner::new(sequences, &context)
        .execute(name, &mut *console)
        .with_context(|| format!("while executing {name} sequence"))?;
    println!("{} Sequence {name} completed", status::SUCCESS);
    Ok(())
}
