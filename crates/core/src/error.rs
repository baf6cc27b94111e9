use crate::orchestrator::RunReport;
use crate::scripting::executor::ScriptError;

/// Exit code used when a failure carries no usable process exit code.
pub const GENERIC_FAILURE_CODE: u8 = 1;

/// Failure reported by a single step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A child process ran to completion but exited non-zero.
    ///
    /// `code` is `-1` when the process was terminated by a signal. `detail`
    /// is the stderr tail and may be empty.
    #[error("exited with code {code}{}", detail_suffix(.detail))]
    ExitStatus { code: i32, detail: String },

    /// The child process could not be spawned, waited on, or timed out.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The step reported a failure message of its own.
    #[error("{0}")]
    Failed(String),

    /// A library error raised inside the step.
    #[error("{0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StepError {
    /// Wrap any library error (sqlx, io, ...) as a step failure.
    pub fn wrap<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

/// The orchestrator's only error: the step at `index` failed and the run
/// stopped there.
#[derive(Debug, thiserror::Error)]
#[error("step {position} ({step}) failed: {source}", position = .index + 1)]
pub struct StepFailed {
    /// Zero-based index of the failing step in the sequence.
    pub index: usize,
    /// Name of the failing step.
    pub step: String,
    /// The step's own error detail.
    #[source]
    pub source: StepError,
    /// Trace of every step run so far, the failing one included.
    pub report: RunReport,
}

impl StepFailed {
    /// One-based position of the failing step.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    /// Process exit code for this failure.
    ///
    /// A child exit code in `1..=255` is propagated as-is; anything else
    /// (signals, spawn errors, database errors) maps to
    /// [`GENERIC_FAILURE_CODE`].
    pub fn exit_code(&self) -> u8 {
        match &self.source {
            StepError::ExitStatus { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(GENERIC_FAILURE_CODE),
            _ => GENERIC_FAILURE_CODE,
        }
    }
}

/// Invalid or missing configuration, detected before any step runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
