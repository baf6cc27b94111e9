use std::path::PathBuf;
use std::time::Duration;

use prestart_core::config::{env_opt, parse_timeout_secs, process_env, var_opt, var_or, Lookup};
use prestart_core::error::ConfigError;
use prestart_db::DbConfig;

/// Default seed command: one executable per loader under `bin/`.
pub const DEFAULT_SEED_COMMAND_TEMPLATE: &str = "bin/seed-{loader}";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`. Unknown values fall back to text so a typo never
    /// hides the startup log.
    pub fn from_env() -> Self {
        Self::parse(env_opt("LOG_FORMAT").as_deref())
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Everything the startup plan needs, loaded once before any step runs.
#[derive(Debug, Clone)]
pub struct PrestartConfig {
    pub db: DbConfig,
    /// Command line for each seed loader; see
    /// [`SeedLoader::render_command`](crate::seed::SeedLoader::render_command).
    pub seed_command_template: String,
    /// Working directory for seed loaders (current dir if `None`).
    pub seed_working_dir: Option<PathBuf>,
    /// Per seed loader timeout. `None` waits indefinitely.
    pub step_timeout: Option<Duration>,
}

impl PrestartConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default              |
    /// |-------------------------|----------------------|
    /// | `SEED_COMMAND_TEMPLATE` | `bin/seed-{loader}`  |
    /// | `SEED_WORKING_DIR`      | current dir          |
    /// | `STEP_TIMEOUT_SECS`     | none (`0` = none)    |
    ///
    /// Database settings come from [`DbConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let seed_command_template = var_or(
            lookup,
            "SEED_COMMAND_TEMPLATE",
            DEFAULT_SEED_COMMAND_TEMPLATE.to_string(),
        )?;

        Ok(Self {
            db: DbConfig::from_lookup(lookup)?,
            seed_command_template,
            seed_working_dir: var_opt(lookup, "SEED_WORKING_DIR").map(PathBuf::from),
            step_timeout: parse_timeout_secs(
                "STEP_TIMEOUT_SECS",
                var_opt(lookup, "STEP_TIMEOUT_SECS"),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PrestartConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PrestartConfig::from_lookup(&|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_only_server_is_set() {
        let config = load(&[("POSTGRES_SERVER", "db")]).expect("load");
        assert_eq!(config.seed_command_template, DEFAULT_SEED_COMMAND_TEMPLATE);
        assert_eq!(config.seed_working_dir, None);
        assert_eq!(config.step_timeout, None);
    }

    #[test]
    fn seed_settings_are_read() {
        let config = load(&[
            ("POSTGRES_SERVER", "db"),
            ("SEED_COMMAND_TEMPLATE", "python -m loaders.{loader_snake}"),
            ("SEED_WORKING_DIR", "/srv/app"),
            ("STEP_TIMEOUT_SECS", "120"),
        ])
        .expect("load");
        assert_eq!(config.seed_command_template, "python -m loaders.{loader_snake}");
        assert_eq!(config.seed_working_dir, Some(PathBuf::from("/srv/app")));
        assert_eq!(config.step_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn bad_step_timeout_is_rejected() {
        let err = load(&[("POSTGRES_SERVER", "db"), ("STEP_TIMEOUT_SECS", "soon")])
            .expect_err("bad timeout");
        assert_matches!(err, ConfigError::Invalid { var: "STEP_TIMEOUT_SECS", .. });
    }

    #[test]
    fn database_errors_surface() {
        let err = load(&[]).expect_err("no database settings");
        assert_matches!(err, ConfigError::Missing("POSTGRES_SERVER"));
    }

    #[test]
    fn log_format_parses_json_case_insensitively() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" json ")), LogFormat::Json);
    }

    #[test]
    fn log_format_defaults_to_text() {
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
    }
}
