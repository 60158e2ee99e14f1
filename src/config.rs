//! Runtime configuration from environment variables
//!
//! Binaries call `dotenv().ok()` first, so a local `.env` file works the same
//! as exported variables.

use std::env;
use std::time::Duration;

/// Default SQLite database file
pub const DEFAULT_DB_PATH: &str = "repsync.db";

/// Default directory holding `*.sql` schema files
pub const DEFAULT_SCHEMA_DIR: &str = "sql";

/// Default trace retention (one week)
pub const DEFAULT_RETENTION_HOURS: u64 = 168;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration shared by the operator binaries
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Directory with schema files run by `run_schema_migrations`
    pub schema_dir: String,

    /// Trace rows older than this are eligible for pruning
    pub retention: Duration,
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `REPSYNC_DB_PATH` (default: repsync.db)
    /// - `REPSYNC_SCHEMA_DIR` (default: sql)
    /// - `TRACE_RETENTION_HOURS` (default: 168)
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = env::var("REPSYNC_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let schema_dir =
            env::var("REPSYNC_SCHEMA_DIR").unwrap_or_else(|_| DEFAULT_SCHEMA_DIR.to_string());

        let retention_hours = match env::var("TRACE_RETENTION_HOURS") {
            Ok(raw) => parse_retention_hours(&raw)?,
            Err(_) => DEFAULT_RETENTION_HOURS,
        };

        Ok(Self {
            db_path,
            schema_dir,
            retention: Duration::from_secs(retention_hours * 3600),
        })
    }
}

fn parse_retention_hours(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            "TRACE_RETENTION_HOURS must be greater than zero".to_string(),
        )),
        Ok(hours) => Ok(hours),
        Err(_) => Err(ConfigError::InvalidValue(format!(
            "TRACE_RETENTION_HOURS must be a whole number of hours, got '{}'",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests share process state; keep them in a single test.
    #[test]
    fn test_env_config() {
        env::remove_var("REPSYNC_DB_PATH");
        env::remove_var("REPSYNC_SCHEMA_DIR");
        env::remove_var("TRACE_RETENTION_HOURS");

        let config = RuntimeConfig::from_env().unwrap();
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert_eq!(config.schema_dir, DEFAULT_SCHEMA_DIR);
        assert_eq!(config.retention, Duration::from_secs(168 * 3600));

        env::set_var("REPSYNC_DB_PATH", "/tmp/repsync-test.db");
        env::set_var("TRACE_RETENTION_HOURS", "24");
        let config = RuntimeConfig::from_env().unwrap();
        assert_eq!(config.db_path, "/tmp/repsync-test.db");
        assert_eq!(config.retention, Duration::from_secs(24 * 3600));

        env::set_var("TRACE_RETENTION_HOURS", "soon");
        assert!(matches!(
            RuntimeConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        env::remove_var("REPSYNC_DB_PATH");
        env::remove_var("TRACE_RETENTION_HOURS");
    }

    #[test]
    fn test_zero_retention_rejected() {
        assert!(parse_retention_hours("0").is_err());
        assert_eq!(parse_retention_hours(" 12 ").unwrap(), 12);
    }
}
