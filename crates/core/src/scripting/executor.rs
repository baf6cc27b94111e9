//! Shared subprocess types: [`CommandInput`], [`CommandOutput`], and
//! [`ScriptError`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Per-invocation settings for a child process.
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
    /// Additional environment variables set for the child process. The
    /// parent environment is always inherited.
    pub env_vars: Vec<(String, String)>,
    /// Working directory for the child process (uses current dir if `None`).
    pub working_directory: Option<PathBuf>,
    /// Maximum wall-clock time before the process is killed. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

/// Result of a child process that ran to completion.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Number of stdout lines forwarded to the log.
    pub stdout_lines: usize,
    /// Last lines written to stderr, oldest first.
    pub stderr_tail: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that prevent a child process from running to completion.
#[derive(Debug)]
pub enum ScriptError {
    /// The program was not found at the given path or on `PATH`.
    NotFound(String),
    /// The program exists but lacks execute permissions.
    PermissionDenied(String),
    /// The process exceeded its configured timeout and was killed.
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed_ms: u64,
    },
    /// An I/O error occurred while spawning or waiting on the process.
    IoError(std::io::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(program) => write!(f, "Program not found: {program}"),
            Self::PermissionDenied(program) => write!(f, "Permission denied: {program}"),
            Self::Timeout { elapsed_ms } => {
                write!(f, "Process timed out after {elapsed_ms}ms")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl ScriptError {
    /// Classify an error returned by `Command::spawn` for `program`.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::IoError(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
