//! A [`Step`] backed by an external program.

use async_trait::async_trait;
use tokio::process::Command;

use super::executor::CommandInput;
use super::subprocess;
use crate::error::{ConfigError, StepError};
use crate::step::Step;

/// Runs `program args...` as a child process. Exit code 0 is success; any
/// other exit fails the step with the tail of the child's stderr.
#[derive(Debug, Clone)]
pub struct CommandStep {
    name: String,
    program: String,
    args: Vec<String>,
    input: CommandInput,
}

impl CommandStep {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        input: CommandInput,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            input,
        }
    }

    /// Build a step from a whitespace-separated command line. The first
    /// word is the program. No shell quoting is interpreted.
    pub fn from_command_line(
        name: impl Into<String>,
        line: &str,
        input: CommandInput,
    ) -> Result<Self, ConfigError> {
        let mut words = line.split_whitespace().map(str::to_string);
        let name = name.into();
        let program = words.next().ok_or_else(|| ConfigError::Invalid {
            var: "command line",
            value: line.to_string(),
            reason: format!("empty command for step {name}"),
        })?;
        Ok(Self::new(name, program, words.collect(), input))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Step for CommandStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<(), StepError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let output = subprocess::run_command(&mut cmd, &self.input, &self.name).await?;

        tracing::debug!(
            step = %self.name,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            stdout_lines = output.stdout_lines,
            "Child process exited",
        );

        if output.success() {
            Ok(())
        } else {
            Err(StepError::ExitStatus {
                code: output.exit_code,
                detail: output.stderr_tail.join("\n"),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
