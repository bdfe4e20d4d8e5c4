//! Text-completion oracle abstraction.
//!
//! The [`Oracle`] trait decouples the decision loop from the model backend.
//! Production runs spawn a configured CLI command; tests use scripted
//! oracles that return canned completions without spawning processes.
//!
//! Errors from an oracle are transport failures. Callers degrade them —
//! substituting a finish decision, an empty edit plan, or a locally rendered
//! report — rather than aborting the run.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::process::run_command_with_timeout;

/// A text-in, text-out completion backend.
pub trait Oracle {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Oracle that spawns a command and exchanges text over stdin/stdout.
///
/// The prompt is written to the child's stdin; its stdout is the completion.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandOracle {
    pub fn new(
        command: Vec<String>,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Result<Self> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(anyhow!("oracle command must be non-empty"));
        }
        Ok(Self {
            command,
            timeout,
            output_limit_bytes,
        })
    }
}

impl Oracle for CommandOracle {
    #[instrument(skip_all, fields(command = %self.command[0], prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        info!("invoking oracle command");
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);

        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .context("run oracle command")?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "oracle command timed out");
            return Err(anyhow!(
                "oracle command timed out after {}s",
                self.timeout.as_secs()
            ));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle command failed");
            return Err(anyhow!(
                "oracle command failed with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(anyhow!("oracle command produced no output"));
        }
        debug!(bytes = text.len(), "oracle completion received");
        Ok(text)
    }
}
