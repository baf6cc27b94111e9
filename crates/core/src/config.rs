//! Environment-variable helpers shared by the config structs of each crate.
//!
//! Config loaders take a [`Lookup`] rather than reading the process
//! environment directly, so they can be fed a fixed map in tests.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Source of raw variable values.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// [`Lookup`] backed by the process environment.
pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Read `var` from the environment, treating empty values as unset.
pub fn env_opt(var: &str) -> Option<String> {
    var_opt(&process_env, var)
}

/// Read `var` through `lookup`, treating empty values as unset.
pub fn var_opt(lookup: Lookup<'_>, var: &str) -> Option<String> {
    lookup(var).filter(|v| !v.trim().is_empty())
}

/// Read a required variable.
pub fn var_required(lookup: Lookup<'_>, var: &'static str) -> Result<String, ConfigError> {
    var_opt(lookup, var).ok_or(ConfigError::Missing(var))
}

/// Read and parse `var`, falling back to `default` when it is unset.
pub fn var_or<T>(lookup: Lookup<'_>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_or(var, var_opt(lookup, var), default)
}

/// Parse an optional raw value, falling back to `default` when absent.
pub fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Parse an optional timeout in whole seconds. Absent or `0` means no
/// timeout.
pub fn parse_timeout_secs(
    var: &'static str,
    raw: Option<String>,
) -> Result<Option<Duration>, ConfigError> {
    let secs: u64 = parse_or(var, raw, 0)?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
