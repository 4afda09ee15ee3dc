//! Named command sequences
//!
//! A sequence is an ordered list of [`SequenceCmd`] steps sent to a device
//! through a [`Transport`]. A step whose command is exactly `$(name)` runs the
//! sequence `name` in its place, so sequences compose into graphs; cycles in
//! that graph are rejected before anything is sent.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::core::document::is_default;
use crate::core::template::engine;
use crate::error::SequenceError;
use crate::record_node;

/// One step of a sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SequenceCmd {
    /// Templated command, or `$(other)` to run another sequence
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cmd: String,

    /// Templated text the trimmed stdout must equal
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expected_output: String,

    /// Milliseconds to wait after every attempt
    #[serde(skip_serializing_if = "is_default")]
    pub delay: u64,

    /// Additional attempts after a failure
    #[serde(skip_serializing_if = "is_default")]
    pub retries: u32,

    /// Continue with the next step when this one fails
    #[serde(skip_serializing_if = "is_default")]
    pub ignore_failure: bool,
}

record_node!(SequenceCmd {
    "cmd" => cmd,
    "expectedOutput" => expected_output,
    "delay" => delay,
    "retries" => retries,
    "ignoreFailure" => ignore_failure,
});

impl SequenceCmd {
    /// Name of the sequence this step delegates to, if any
    pub fn reference(&self) -> Option<&str> {
        self.cmd
            .trim()
            .strip_prefix("$(")
            .and_then(|rest| rest.strip_suffix(')'))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Output captured from one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Capability to run one command on a device
pub trait Transport {
    /// Run `cmd` and return its output; a non-zero exit is an error
    fn send(&mut self, cmd: &str) -> anyhow::Result<CommandOutput>;
}

impl<F> Transport for F
where
    F: FnMut(&str) -> anyhow::Result<CommandOutput>,
{
    fn send(&mut self, cmd: &str) -> anyhow::Result<CommandOutput> {
        self(cmd)
    }
}

/// Check that every sequence reachable from `root` exists and that no
/// reference leads back to a sequence already on the path
pub fn validate_references(
    sequences: &BTreeMap<String, Vec<SequenceCmd>>,
    root: &str,
) -> Result<(), SequenceError> {
    fn visit(
        sequences: &BTreeMap<String, Vec<SequenceCmd>>,
        name: &str,
        path: &mut Vec<String>,
        done: &mut Vec<String>,
    ) -> Result<(), SequenceError> {
        if let Some(start) = path.iter().position(|seen| seen == name) {
            return Err(cycle_error(&path[start..], name));
        }
        if done.iter().any(|seen| seen == name) {
            return Ok(());
        }
        let steps = sequences
            .get(name)
            .ok_or_else(|| SequenceError::SequenceNotFound {
                name: name.to_string(),
            })?;

        path.push(name.to_string());
        for target in steps.iter().filter_map(SequenceCmd::reference) {
            visit(sequences, target, path, done)?;
        }
        path.pop();
        done.push(name.to_string());
        Ok(())
    }

    visit(sequences, root, &mut Vec::new(), &mut Vec::new())
}

fn cycle_error(path: &[String], back_to: &str) -> SequenceError {
    let mut cycle = path.to_vec();
    cycle.push(back_to.to_string());
    SequenceError::CircularSequenceReference {
        cycle: cycle.join(" -> "),
    }
}

/// Executes sequences against a context and a transport
pub struct SequenceRunner<'a> {
    sequences: &'a BTreeMap<String, Vec<SequenceCmd>>,
    context: &'a Value,
    sleep: Box<dyn FnMut(Duration) + 'a>,
}

impl<'a> SequenceRunner<'a> {
    /// Runner that waits with [`std::thread::sleep`]
    pub fn new(sequences: &'a BTreeMap<String, Vec<SequenceCmd>>, context: &'a Value) -> Self {
        Self {
            sequences,
            context,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the wait primitive
    #[must_use]
    pub fn with_sleep(mut self, sleep: impl FnMut(Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Run the sequence `name`
    pub fn execute(&mut self, name: &str, transport: &mut dyn Transport) -> Result<(), SequenceError> {
        validate_references(self.sequences, name)?;
        self.run(name, transport, &mut Vec::new())
    }

    fn run(
        &mut self,
        name: &str,
        transport: &mut dyn Transport,
        active: &mut Vec<String>,
    ) -> Result<(), SequenceError> {
        if let Some(start) = active.iter().position(|seen| seen == name) {
            return Err(cycle_error(&active[start..], name));
        }
        let sequences = self.sequences;
        let steps = sequences
            .get(name)
            .ok_or_else(|| SequenceError::SequenceNotFound {
                name: name.to_string(),
            })?;

        active.push(name.to_string());
        let result = self.run_steps(name, steps, transport, active);
        active.pop();
        result
    }

    fn run_steps(
        &mut self,
        name: &str,
        steps: &[SequenceCmd],
        transport: &mut dyn Transport,
        active: &mut Vec<String>,
    ) -> Result<(), SequenceError> {
        for (index, step) in steps.iter().enumerate() {
            info!("Executing {name} sequence step {}/{}", index + 1, steps.len());
            let mut attempts = step.retries.saturating_add(1);
            loop {
                let result = self.run_step(name, index, step, transport, active);
                let failure = match result {
                    Ok(()) => None,
                    Err(err) if !err.is_retryable() => return Err(err),
                    Err(err) => Some(err),
                };
                attempts -= 1;

                let outcome = match failure {
                    None => Ok(true),
                    Some(err) if step.ignore_failure => {
                        warn!("Ignoring failed step {}/{} of {name}: {err}", index + 1, steps.len());
                        Ok(true)
                    }
                    Some(err) if attempts == 0 => Err(err),
                    Some(err) => {
                        warn!("Command failed ({err}); will retry {attempts} more time(s)");
                        Ok(false)
                    }
                };

                if step.delay > 0 {
                    debug!("Waiting for {} millisecond(s)", step.delay);
                    (self.sleep)(Duration::from_millis(step.delay));
                }

                if outcome? {
                    break;
                }
            }
        }
        Ok(())
    }

    fn run_step(
        &mut self,
        name: &str,
        index: usize,
        step: &SequenceCmd,
        transport: &mut dyn Transport,
        active: &mut Vec<String>,
    ) -> Result<(), SequenceError> {
        if let Some(target) = step.reference() {
            debug!("Step {} of {name} runs sequence {target}", index + 1);
            return self.run(target, transport, active);
        }
        if step.cmd.trim().is_empty() {
            return Ok(());
        }

        let render = |text: &str| {
            engine::render_str("cmd", text, self.context).map_err(|source| SequenceError::Render {
                sequence: name.to_string(),
                step: index + 1,
                source,
            })
        };

        let cmd = render(&step.cmd)?;
        info!("Send cmd: '{cmd}'");
        let output = transport
            .send(&cmd)
            .map_err(|e| SequenceError::CommandFailed {
                cmd: cmd.clone(),
                error: format!("{e:#}"),
            })?;

        if !step.expected_output.is_empty() {
            let expected = render(&step.expected_output)?;
            let actual = output.stdout.trim();
            if expected.trim() != actual {
                return Err(SequenceError::OutputMismatch {
                    cmd,
                    expected,
                    actual: actual.to_string(),
                });
            }
            debug!("Cmd output validated: {expected}");
        }
        Ok(())
    }
}
