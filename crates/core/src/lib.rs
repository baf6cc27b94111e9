//! Core of the startup orchestrator: the [`Step`](step::Step) trait, the
//! fail-fast [`Orchestrator`](orchestrator::Orchestrator), the error
//! taxonomy, and subprocess-backed command steps. No database access lives
//! here.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod scripting;
pub mod step;
