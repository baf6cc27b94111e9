//! Shared subprocess management.
//!
//! [`run_command`] spawns a prepared [`tokio::process::Command`], forwards
//! its output to the log line by line, and enforces the optional timeout.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::executor::{CommandInput, CommandOutput, ScriptError};

/// Number of trailing stderr lines kept as failure detail.
pub const STDERR_TAIL_LINES: usize = 20;

/// Longest line kept in the stderr tail; longer lines are cut.
const MAX_LINE_CHARS: usize = 2048;

/// How long output is still read after the child exits. Anything a
/// leftover background process writes later is dropped.
const OUTPUT_DRAIN: Duration = Duration::from_millis(500);

/// Spawn `cmd` as a child process of step `step` and wait for it.
///
/// Stdin is closed. Every stdout line is logged at `info` and every stderr
/// line at `warn`, tagged with the step name. The call returns once the
/// child exits, after at most [`OUTPUT_DRAIN`] of further reading. The
/// child is killed if the timeout fires, since the handle is dropped with
/// `kill_on_drop(true)`.
///
/// A non-zero exit is not an error here; callers inspect
/// [`CommandOutput::exit_code`].
pub async fn run_command(
    cmd: &mut Command,
    input: &CommandInput,
    step: &str,
) -> Result<CommandOutput, ScriptError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|e| ScriptError::from_spawn(&program, e))?;

    tracing::debug!(step, program = %program, pid = child.id(), "Spawned child process");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let run = async {
        let mut stdout_lines = 0usize;
        let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        let status = {
            let readers = async {
                tokio::join!(
                    read_lines(stdout, |line| {
                        stdout_lines += 1;
                        tracing::info!(step, stream = "stdout", "{line}");
                    }),
                    read_lines(stderr, |line| {
                        tracing::warn!(step, stream = "stderr", "{line}");
                        if stderr_tail.len() == STDERR_TAIL_LINES {
                            stderr_tail.pop_front();
                        }
                        stderr_tail
                            .push_back(line.chars().take(MAX_LINE_CHARS).collect::<String>());
                    }),
                );
            };
            tokio::pin!(readers);

            // The step ends when the child exits, not when its pipes close:
            // a background process it leaves behind may hold them open.
            let mut readers_done = false;
            let status = loop {
                tokio::select! {
                    status = child.wait() => break status,
                    () = &mut readers, if !readers_done => readers_done = true,
                }
            };

            if !readers_done
                && tokio::time::timeout(OUTPUT_DRAIN, &mut readers)
                    .await
                    .is_err()
            {
                tracing::warn!(
                    step,
                    "Child exited but its output pipes are still open, detaching from them"
                );
            }

            status
        };

        (status, stdout_lines, stderr_tail)
    };

    let (status, stdout_lines, stderr_tail) = match input.timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                return Err(ScriptError::Timeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        },
        None => run.await,
    };

    let status = status.map_err(ScriptError::IoError)?;

    Ok(CommandOutput {
        exit_code: status.code().unwrap_or(-1),
        duration_ms: start.elapsed().as_millis() as u64,
        stdout_lines,
        stderr_tail: stderr_tail.into(),
    })
}

/// Feed every line of `handle` to `on_line` until EOF. Invalid UTF-8 is
/// replaced rather than ending the read, so the child never blocks on a
/// full pipe.
async fn read_lines<R, F>(handle: Option<R>, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let Some(handle) = handle else {
        return;
    };
    let mut reader = BufReader::new(handle);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\n', '\r']));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
