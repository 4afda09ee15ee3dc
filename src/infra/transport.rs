//! Device connections
//!
//! Resolves a device address to a [`Transport`]. This build runs commands
//! for `local://` addresses through the host shell; the path part of the
//! address, when present, is the working directory.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::core::sequence::{CommandOutput, Transport};

/// Scheme handled by [`LocalShell`]
pub const LOCAL_SCHEME: &str = "local://";

/// Runs commands with `sh -c` on the host
#[derive(Debug, Clone, Default)]
pub struct LocalShell {
    workdir: Option<PathBuf>,
}

impl LocalShell {
    pub fn new(workdir: Option<PathBuf>) -> Self {
        Self { workdir }
    }
}

impl Transport for LocalShell {
    fn send(&mut self, cmd: &str) -> Result<CommandOutput> {
        debug!("sh -c {cmd:?}");
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        let output = command
            .output()
            .with_context(|| format!("Failed to spawn shell for '{cmd}'"))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            match output.status.code() {
                Some(code) => bail!("exit code ({code}): {}", stderr.trim()),
                None => bail!("terminated by signal: {}", stderr.trim()),
            }
        }
        Ok(CommandOutput { stdout, stderr })
    }
}

/// Open a transport for a device address
pub fn connect(addr: &str) -> Result<Box<dyn Transport>> {
    if let Some(rest) = addr.strip_prefix(LOCAL_SCHEME) {
        let workdir = (!rest.is_empty()).then(|| PathBuf::from(rest));
        return Ok(Box::new(LocalShell::new(workdir)));
    }
    match addr.split_once("://") {
        Some((scheme, _)) => bail!("Scheme '{scheme}' is not supported by this build (address '{addr}')"),
        None => bail!("Device address '{addr}' has no scheme"),
    }
}
