//! `prestart` library crate.
//!
//! Assembles the startup sequence and exposes it for integration testing.
//! The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod logging;
pub mod plan;
pub mod seed;
