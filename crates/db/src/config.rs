use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use prestart_core::config::{process_env, var_opt, var_or, var_required, Lookup};
use prestart_core::error::ConfigError;
use sqlx::postgres::PgConnectOptions;

/// Database settings shared by the readiness probe and the migration step.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub connect_options: PgConnectOptions,
    /// Upper bound on opening one connection.
    pub connect_timeout: Duration,
    /// Readiness probe attempts before giving up (at least 1).
    pub ready_max_attempts: u32,
    /// Pause between readiness probe attempts.
    pub ready_interval: Duration,
    pub migrations_dir: PathBuf,
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `DATABASE_URL`            | built from `POSTGRES_*`        |
    /// | `POSTGRES_SERVER`         | required without `DATABASE_URL`|
    /// | `POSTGRES_PORT`           | `5432`                         |
    /// | `POSTGRES_USER`           | `postgres`                     |
    /// | `POSTGRES_PASSWORD`       | empty                          |
    /// | `POSTGRES_DB`             | empty                          |
    /// | `DB_CONNECT_TIMEOUT_SECS` | `5`                            |
    /// | `DB_READY_MAX_ATTEMPTS`   | `300`                          |
    /// | `DB_READY_INTERVAL_MS`    | `1000`                         |
    /// | `MIGRATIONS_DIR`          | `db/migrations`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let connect_options = match var_opt(lookup, "DATABASE_URL") {
            Some(url) => parse_database_url(&url)?,
            None => connect_options_from_parts(
                &var_required(lookup, "POSTGRES_SERVER")?,
                var_or(lookup, "POSTGRES_PORT", 5432)?,
                &var_or(lookup, "POSTGRES_USER", "postgres".to_string())?,
                var_opt(lookup, "POSTGRES_PASSWORD").as_deref(),
                var_opt(lookup, "POSTGRES_DB").as_deref(),
            ),
        };

        Ok(Self {
            connect_options,
            connect_timeout: Duration::from_secs(var_or(lookup, "DB_CONNECT_TIMEOUT_SECS", 5)?),
            ready_max_attempts: var_or(lookup, "DB_READY_MAX_ATTEMPTS", 300u32)?.max(1),
            ready_interval: Duration::from_millis(var_or(lookup, "DB_READY_INTERVAL_MS", 1000)?),
            migrations_dir: PathBuf::from(var_or(
                lookup,
                "MIGRATIONS_DIR",
                "db/migrations".to_string(),
            )?),
        })
    }
}

/// Parse a `postgres://` URL. The URL itself is kept out of the error since
/// it usually carries a password.
pub fn parse_database_url(url: &str) -> Result<PgConnectOptions, ConfigError> {
    PgConnectOptions::from_str(url).map_err(|e| ConfigError::Invalid {
        var: "DATABASE_URL",
        value: "<redacted>".to_string(),
        reason: e.to_string(),
    })
}

/// Build connect options from discrete server settings.
pub fn connect_options_from_parts(
    server: &str,
    port: u16,
    user: &str,
    password: Option<&str>,
    database: Option<&str>,
) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(server)
        .port(port)
        .username(user);
    if let Some(password) = password {
        options = options.password(password);
    }
    if let Some(database) = database {
        options = options.database(database);
    }
    options
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DbConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DbConfig::from_lookup(&|var| vars.get(var).cloned())
    }

    #[test]
    fn database_url_wins_over_parts() {
        let config = load(&[
            ("DATABASE_URL", "postgres://app:pw@db.internal:5433/shop"),
            ("POSTGRES_SERVER", "ignored"),
            ("POSTGRES_PORT", "9999"),
        ])
        .expect("load");
        assert_eq!(config.connect_options.get_host(), "db.internal");
        assert_eq!(config.connect_options.get_port(), 5433);
    }

    #[test]
    fn parts_are_used_without_url() {
        let config = load(&[("POSTGRES_SERVER", "db"), ("POSTGRES_DB", "shop")]).expect("load");
        assert_eq!(config.connect_options.get_host(), "db");
        assert_eq!(config.connect_options.get_port(), 5432);
        assert_eq!(config.connect_options.get_username(), "postgres");
        assert_eq!(config.connect_options.get_database(), Some("shop"));
        assert_eq!(config.ready_max_attempts, 300);
        assert_eq!(config.ready_interval, Duration::from_millis(1000));
        assert_eq!(config.migrations_dir, PathBuf::from("db/migrations"));
    }

    #[test]
    fn missing_server_without_url_is_reported() {
        let err = load(&[("POSTGRES_PORT", "5432")]).expect_err("no server");
        assert_matches!(err, ConfigError::Missing("POSTGRES_SERVER"));
    }

    #[test]
    fn bad_attempt_count_is_rejected() {
        let err = load(&[("POSTGRES_SERVER", "db"), ("DB_READY_MAX_ATTEMPTS", "forever")])
            .expect_err("bad attempts");
        assert_matches!(
            err,
            ConfigError::Invalid { var: "DB_READY_MAX_ATTEMPTS", ref value, .. } if value == "forever"
        );
    }

    #[test]
    fn zero_attempts_still_probes_once() {
        let config = load(&[("POSTGRES_SERVER", "db"), ("DB_READY_MAX_ATTEMPTS", "0")])
            .expect("load");
        assert_eq!(config.ready_max_attempts, 1);
    }

    #[test]
    fn parts_populate_connect_options() {
        let opts = connect_options_from_parts("db", 6543, "app", Some("s3cr3t"), Some("shop"));
        assert_eq!(opts.get_host(), "db");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_username(), "app");
        assert_eq!(opts.get_database(), Some("shop"));
    }

    #[test]
    fn url_is_parsed() {
        let opts = parse_database_url("postgres://app:pw@db.internal:5433/shop").expect("parse");
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 5433);
        assert_eq!(opts.get_database(), Some("shop"));
    }

    #[test]
    fn bad_url_error_hides_value() {
        let err = parse_database_url("postgres://app:pw@db:notaport/shop").expect_err("bad port");
        assert_matches!(
            err,
            ConfigError::Invalid { var: "DATABASE_URL", ref value, .. } if value == "<redacted>"
        );
        assert!(!err.to_string().contains("pw@"));
    }
}
