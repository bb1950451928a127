//! Connection configuration (spec §6): the serde-deserializable shape a
//! caller loads from TOML/env/whatever and hands to [`crate::registry::register`].
//!
//! Grounded in the teacher's pool configuration fields (`max_open`,
//! `max_idle`, connection lifetime), generalized from a Postgres-only
//! `deadpool_postgres::Config` wrapper to a dialect-neutral struct every
//! backend's constructor can read from.

use crate::dialect::DialectKind;
use serde::Deserialize;
use std::time::Duration;

fn default_max_open() -> u32 {
    10
}

fn default_max_idle() -> u32 {
    2
}

fn default_conn_max_lifetime() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(30)
}

/// A single named connection's configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub driver: DialectKind,
    pub dsn: String,

    #[serde(default = "default_max_open")]
    pub max_open: u32,

    #[serde(default = "default_max_idle")]
    pub max_idle: u32,

    #[serde(default = "default_conn_max_lifetime", with = "humantime_duration")]
    pub conn_max_lifetime: Duration,

    #[serde(default = "default_query_timeout", with = "humantime_duration")]
    pub query_timeout: Duration,

    #[serde(default)]
    pub debug: bool,
}

impl Config {
    pub fn new(driver: DialectKind, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            dsn: dsn.into(),
            max_open: default_max_open(),
            max_idle: default_max_idle(),
            conn_max_lifetime: default_conn_max_lifetime(),
            query_timeout: default_query_timeout(),
            debug: false,
        }
    }
}

/// Deserializes durations from a `"30s"`/`"5m"`/`"1h"`-style string so
/// `Config` is pleasant to write in TOML by hand, instead of forcing
/// callers to spell out `{ secs = 30, nanos = 0 }`.
mod humantime_duration {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = Config::new(DialectKind::Postgres, "postgres://localhost/app");
        assert_eq!(config.max_open, 10);
        assert_eq!(config.conn_max_lifetime, Duration::from_secs(1800));
        assert!(!config.debug);
    }

    #[test]
    fn deserializes_from_toml_with_human_durations() {
        let toml = r#"
            driver = "postgres"
            dsn = "postgres://localhost/app"
            max_open = 20
            conn_max_lifetime = "10m"
            query_timeout = "5s"
            debug = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.max_open, 20);
        assert_eq!(config.conn_max_lifetime, Duration::from_secs(600));
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert!(config.debug);
    }
}
