//! Environment-driven configuration.
//!
//! Store credentials are required and validated at startup; everything else
//! has a default. A `.env` file next to the process is honored.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default base URL of the upstream air-quality network.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.gios.gov.pl/pjp-api/rest";

const DEFAULT_FETCH_INTERVAL_MINUTES: u64 = 60;
const DEFAULT_FETCH_CONCURRENCY: usize = 16;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value '{value}' for {name}")]
    InvalidVar { name: &'static str, value: String },
}

/// Connection settings for the time-series store.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub org: String,
    pub token: String,
    pub bucket: String,
}

/// Settings for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub influx: InfluxConfig,
    pub upstream: UpstreamConfig,
    /// Period of the background fetch schedule.
    pub fetch_interval: Duration,
    /// In-flight request bound for each fan-out stage of the pipeline.
    pub fetch_concurrency: usize,
    /// Per-call timeout on the shared HTTP client.
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the environment (and `.env`, if one is
    /// present). Missing store credentials are a startup error.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Config {
            influx: InfluxConfig {
                url: require("INFLUXDB_URL")?,
                org: require("INFLUXDB_ORG")?,
                token: require("INFLUXDB_TOKEN")?,
                bucket: require("INFLUXDB_BUCKET")?,
            },
            upstream: UpstreamConfig {
                base_url: std::env::var("UPSTREAM_API_URL")
                    .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            },
            fetch_interval: Duration::from_secs(
                60 * parse_var("FETCH_INTERVAL_MINUTES", DEFAULT_FETCH_INTERVAL_MINUTES)?,
            ),
            fetch_concurrency: parse_var("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY)?,
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_an_error() {
        std::env::remove_var("AERIS_TEST_ABSENT");
        assert!(matches!(
            require("AERIS_TEST_ABSENT"),
            Err(ConfigError::MissingVar("AERIS_TEST_ABSENT"))
        ));
    }

    #[test]
    fn optional_vars_fall_back_and_reject_garbage() {
        std::env::remove_var("AERIS_TEST_UNSET");
        assert_eq!(parse_var("AERIS_TEST_UNSET", 7u64).unwrap(), 7);

        std::env::set_var("AERIS_TEST_BAD", "not-a-number");
        assert!(matches!(
            parse_var::<u64>("AERIS_TEST_BAD", 7),
            Err(ConfigError::InvalidVar { .. })
        ));
        std::env::remove_var("AERIS_TEST_BAD");
    }
}
