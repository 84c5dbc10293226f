//! Margin reconciliation configuration.
//!
//! Loaded from environment variables with fallback to defaults; the
//! `fix-margins` binary lets flags override individual values.

use salesos_core::money::Money;
use salesos_core::reconcile::default_tolerance;
use salesos_core::validation::parse_tolerance;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "SALESOS_DB_PATH";
pub const ENV_TOLERANCE: &str = "SALESOS_MARGIN_TOLERANCE";
pub const ENV_DRY_RUN: &str = "SALESOS_DRY_RUN";

const DEFAULT_DB_PATH: &str = "salesos.db";

/// Reconciliation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Smallest difference that counts as drift (default one penny).
    pub tolerance: Money,

    /// Report drift without writing.
    pub dry_run: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            tolerance: default_tolerance(),
            dry_run: false,
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReconcileConfig::default();

        let database_path = lookup(ENV_DB_PATH)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let tolerance = match lookup(ENV_TOLERANCE) {
            Some(raw) => parse_tolerance(&raw)
                .map_err(|e| ConfigError::InvalidValue(ENV_TOLERANCE.to_string(), e.to_string()))?,
            None => defaults.tolerance,
        };

        let dry_run = match lookup(ENV_DRY_RUN) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(ENV_DRY_RUN.to_string(), format!("'{}' is not a boolean", raw))
            })?,
            None => defaults.dry_run,
        };

        Ok(ReconcileConfig {
            database_path,
            tolerance,
            dry_run,
        })
    }

    pub fn with_tolerance(mut self, tolerance: Money) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ReconcileConfig::default());
        assert_eq!(config.tolerance, Money::from_cents(1));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_env_values() {
        let config = ReconcileConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/salesos/live.db"),
            (ENV_TOLERANCE, "0.5"),
            (ENV_DRY_RUN, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/salesos/live.db"));
        assert_eq!(config.tolerance, Money::new(dec!(0.5)));
        assert!(config.dry_run);
    }

    #[test]
    fn test_invalid_values() {
        let err = ReconcileConfig::from_lookup(lookup(&[(ENV_TOLERANCE, "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == ENV_TOLERANCE));

        let err = ReconcileConfig::from_lookup(lookup(&[(ENV_DRY_RUN, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == ENV_DRY_RUN));
    }
}
