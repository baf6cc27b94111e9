//! End-to-end orchestrator scenarios with instrumented steps.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use prestart_core::error::StepError;
use prestart_core::orchestrator::{Orchestrator, RunState, StepOutcome};
use prestart_core::scripting::command_step::CommandStep;
use prestart_core::scripting::executor::CommandInput;
use prestart_core::step::{BoxedStep, Step};

type Invocations = Arc<Mutex<Vec<String>>>;

/// Step that records each call. A step that "writes" stays successful on
/// every repeat call, mirroring an upsert-or-skip seed loader.
struct Recorded {
    name: &'static str,
    error: Option<&'static str>,
    log: Invocations,
}

#[async_trait]
impl Step for Recorded {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self) -> Result<(), StepError> {
        self.log.lock().unwrap().push(self.name.to_string());
        self.error
            .map_or(Ok(()), |msg| Err(StepError::Failed(msg.to_string())))
    }
}

fn ok(name: &'static str, log: &Invocations) -> BoxedStep {
    Box::new(Recorded {
        name,
        error: None,
        log: Arc::clone(log),
    })
}

fn failing(name: &'static str, msg: &'static str, log: &Invocations) -> BoxedStep {
    Box::new(Recorded {
        name,
        error: Some(msg),
        log: Arc::clone(log),
    })
}

#[tokio::test]
async fn seed_product_failure_stops_after_three_successes() {
    let log = Invocations::default();
    let mut orch = Orchestrator::new(vec![
        ok("DBReady", &log),
        ok("Migrate", &log),
        ok("SeedRegion", &log),
        failing("SeedProduct", "duplicate key", &log),
        ok("SeedCoupon", &log),
    ]);

    let err = orch.run().await.expect_err("run should fail");

    assert_eq!(
        err.report.succeeded().collect::<Vec<_>>(),
        ["DBReady", "Migrate", "SeedRegion"]
    );
    assert_eq!(err.step, "SeedProduct");
    assert_eq!(err.position(), 4);
    assert_eq!(err.source.to_string(), "duplicate key");
    assert_eq!(
        err.report.steps.last().map(|r| &r.outcome),
        Some(&StepOutcome::Failed {
            error: "duplicate key".to_string()
        })
    );
    assert_eq!(orch.state(), RunState::Failed(3));
    assert!(!log.lock().unwrap().iter().any(|s| s == "SeedCoupon"));
}

#[tokio::test]
async fn db_ready_failure_invokes_nothing_else() {
    let log = Invocations::default();
    let mut orch = Orchestrator::new(vec![
        failing("DBReady", "connection refused", &log),
        ok("Migrate", &log),
        ok("SeedInitial", &log),
        ok("SeedRegion", &log),
    ]);

    let err = orch.run().await.expect_err("run should fail");

    assert_eq!(*log.lock().unwrap(), ["DBReady"]);
    assert_eq!(err.step, "DBReady");
    assert_eq!(err.position(), 1);
    assert_matches!(err.source, StepError::Failed(ref m) if m == "connection refused");
    assert_eq!(err.report.succeeded().count(), 0);
}

#[tokio::test]
async fn full_sequence_is_rerunnable() {
    let log = Invocations::default();
    let names = ["DBReady", "Migrate", "SeedInitial", "SeedRegion", "SeedProduct"];
    let mut orch = Orchestrator::new(names.iter().map(|&n| ok(n, &log)).collect());

    let first = orch.run().await.expect("first run");
    let second = orch.run().await.expect("second run");

    assert_eq!(first.steps.len(), names.len());
    assert_eq!(second.steps.len(), names.len());
    let expected: Vec<&str> = names.iter().chain(names.iter()).copied().collect();
    assert_eq!(*log.lock().unwrap(), expected);
}

#[tokio::test]
async fn command_exit_code_becomes_process_exit_code() {
    let log = Invocations::default();
    let mut orch = Orchestrator::new(vec![
        ok("DBReady", &log),
        Box::new(CommandStep::new(
            "seed-points",
            "sh",
            vec!["-c".to_string(), "echo 'points table missing' >&2; exit 7".to_string()],
            CommandInput::default(),
        )) as BoxedStep,
        ok("SeedDiscovery", &log),
    ]);

    let err = orch.run().await.expect_err("run should fail");

    assert_eq!(err.step, "seed-points");
    assert_eq!(err.exit_code(), 7);
    assert_matches!(
        err.source,
        StepError::ExitStatus { code: 7, ref detail } if detail == "points table missing"
    );
    assert_eq!(*log.lock().unwrap(), ["DBReady"]);
}
