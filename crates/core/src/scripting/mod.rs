//! Subprocess-backed steps.
//!
//! Seed loaders are separate programs. [`command_step::CommandStep`] runs
//! one as a child process through [`subprocess::run_command`], which owns
//! spawning, output forwarding, and timeout handling.

pub mod command_step;
pub mod executor;
pub mod subprocess;
