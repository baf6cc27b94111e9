//! The unit of orchestrated work.

use async_trait::async_trait;

use crate::error::StepError;

/// One externally-implemented unit of startup work: a readiness probe, a
/// migration run, or a seed loader.
///
/// Implementations must be safe to invoke again on a later run. The
/// orchestrator never retries or undoes a step.
#[async_trait]
pub trait Step: Send + Sync {
    /// Human-readable identifier used in traces and failure reports.
    fn name(&self) -> &str;

    /// Run the step to completion.
    async fn invoke(&self) -> Result<(), StepError>;
}

/// Owned, type-erased step as stored in a startup plan.
pub type BoxedStep = Box<dyn Step>;
