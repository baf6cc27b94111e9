//! Sequential, fail-fast step runner.
//!
//! [`Orchestrator::run`] invokes each step in declared order, awaiting each
//! one before starting the next, and stops at the first failure. Nothing is
//! retried and nothing is rolled back: every step is expected to be
//! idempotent, so a failed run is fixed by running again.

use std::time::Instant;

use serde::Serialize;

use crate::error::StepFailed;
use crate::step::BoxedStep;

/// Lifecycle of a single orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Zero-based index of the step currently executing.
    Running(usize),
    Succeeded,
    /// Zero-based index of the step that failed.
    Failed(usize),
}

impl RunState {
    /// `true` once the run has either succeeded or failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// How a single step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed { error: String },
}

/// Trace entry for one invoked step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    /// One-based position in the sequence.
    pub position: usize,
    pub duration_ms: u64,
    pub outcome: StepOutcome,
}

/// Trace of a run: one record per invoked step, in invocation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub total_duration_ms: u64,
}

impl RunReport {
    /// Names of the steps that completed successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|r| r.outcome == StepOutcome::Succeeded)
            .map(|r| r.name.as_str())
    }
}

/// Runs a fixed, ordered list of steps.
pub struct Orchestrator {
    steps: Vec<BoxedStep>,
    state: RunState,
}

impl Orchestrator {
    pub fn new(steps: Vec<BoxedStep>) -> Self {
        Self {
            steps,
            state: RunState::NotStarted,
        }
    }

    /// Outcome of the most recent run, or [`RunState::NotStarted`] before
    /// the first one.
    ///
    /// `run` holds `&mut self` until it returns, so callers only ever see
    /// `NotStarted`, `Succeeded` or `Failed`. `Running` is internal to a run
    /// and is reported through the per-step log events instead.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Step names in invocation order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Invoke every step in order, stopping at the first failure.
    ///
    /// On failure the returned [`StepFailed`] names the failing step and
    /// carries the report of every step invoked so far. Later steps are
    /// never invoked. The orchestrator can be run again afterwards; each
    /// run starts from [`RunState::NotStarted`].
    pub async fn run(&mut self) -> Result<RunReport, StepFailed> {
        self.state = RunState::NotStarted;
        let total = self.steps.len();
        let run_start = Instant::now();
        let mut report = RunReport::default();

        tracing::info!(total, "Starting startup sequence");

        for (index, step) in self.steps.iter().enumerate() {
            self.state = RunState::Running(index);
            let name = step.name().to_string();
            let position = index + 1;

            tracing::info!(step = %name, position, total, "Running step");

            let start = Instant::now();
            let result = step.invoke().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    tracing::info!(step = %name, position, total, duration_ms, "Step completed");
                    report.steps.push(StepRecord {
                        name,
                        position,
                        duration_ms,
                        outcome: StepOutcome::Succeeded,
                    });
                }
                Err(err) => {
                    tracing::error!(
                        step = %name,
                        position,
                        total,
                        duration_ms,
                        error = %err,
                        "Step failed, aborting startup sequence",
                    );
                    report.steps.push(StepRecord {
                        name: name.clone(),
                        position,
                        duration_ms,
                        outcome: StepOutcome::Failed {
                            error: err.to_string(),
                        },
                    });
                    report.total_duration_ms = run_start.elapsed().as_millis() as u64;
                    self.state = RunState::Failed(index);
                    return Err(StepFailed {
                        index,
                        step: name,
                        source: err,
                        report,
                    });
                }
            }
        }

        report.total_duration_ms = run_start.elapsed().as_millis() as u64;
        self.state = RunState::Succeeded;
        tracing::info!(
            total,
            duration_ms = report.total_duration_ms,
            "Startup sequence completed"
        );
        Ok(report)
    }
}
