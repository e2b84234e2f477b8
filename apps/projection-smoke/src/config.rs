//! Environment-backed runtime configuration for `projection-smoke`.

use std::{env, error::Error, fmt};

const DEFAULT_ACCOUNT_ID: &str = "@demo:example.org";
const DEFAULT_BUS_CAPACITY: usize = 64;
const DEFAULT_SETTLE_MS: u64 = 150;
const DEFAULT_FETCH_BATCH: u16 = 20;

/// Runtime configuration used by the smoke run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    /// Account id the scripted collections belong to.
    pub account_id: String,
    /// Wake channel capacity shared by every projection.
    pub bus_capacity: usize,
    /// Pause between scripted stages, long enough for drains to land.
    pub settle_ms: u64,
    /// Pagination batch size used by the timeline stage.
    pub fetch_batch: u16,
}

impl SmokeConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let account_id = optional_trimmed_env("PROJECTION_SMOKE_ACCOUNT", &mut lookup)
            .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_owned());
        let bus_capacity = parse_optional_usize(
            "PROJECTION_SMOKE_BUS_CAPACITY",
            DEFAULT_BUS_CAPACITY,
            &mut lookup,
        )?;
        let settle_ms =
            parse_optional_u64("PROJECTION_SMOKE_SETTLE_MS", DEFAULT_SETTLE_MS, &mut lookup)?;
        let fetch_batch = parse_optional_u16(
            "PROJECTION_SMOKE_FETCH_BATCH",
            DEFAULT_FETCH_BATCH,
            &mut lookup,
        )?;

        if bus_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PROJECTION_SMOKE_BUS_CAPACITY",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if fetch_batch == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PROJECTION_SMOKE_FETCH_BATCH",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            account_id,
            bus_capacity,
            settle_ms,
            fetch_batch,
        })
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u16<F>(key: &'static str, default: u16, lookup: &mut F) -> Result<u16, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<u16>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_u64<F>(key: &'static str, default: u64, lookup: &mut F) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_usize<F>(
    key: &'static str,
    default: usize,
    lookup: &mut F,
) -> Result<usize, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .parse::<usize>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Result<SmokeConfig, ConfigError> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        SmokeConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn uses_defaults_when_nothing_is_set() {
        let cfg = config_from_pairs(&[]).expect("config should parse");
        assert_eq!(cfg.account_id, DEFAULT_ACCOUNT_ID);
        assert_eq!(cfg.bus_capacity, DEFAULT_BUS_CAPACITY);
        assert_eq!(cfg.settle_ms, DEFAULT_SETTLE_MS);
        assert_eq!(cfg.fetch_batch, DEFAULT_FETCH_BATCH);
    }

    #[test]
    fn parses_overrides() {
        let cfg = config_from_pairs(&[
            ("PROJECTION_SMOKE_ACCOUNT", " @smoke:example.org "),
            ("PROJECTION_SMOKE_BUS_CAPACITY", "8"),
            ("PROJECTION_SMOKE_SETTLE_MS", "25"),
            ("PROJECTION_SMOKE_FETCH_BATCH", "10"),
        ])
        .expect("config should parse");

        assert_eq!(cfg.account_id, "@smoke:example.org");
        assert_eq!(cfg.bus_capacity, 8);
        assert_eq!(cfg.settle_ms, 25);
        assert_eq!(cfg.fetch_batch, 10);
    }

    #[test]
    fn rejects_invalid_numeric_values() {
        let err = config_from_pairs(&[("PROJECTION_SMOKE_SETTLE_MS", "soon")])
            .expect_err("invalid settle value should fail");

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "PROJECTION_SMOKE_SETTLE_MS",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_capacity_and_batch() {
        let err = config_from_pairs(&[("PROJECTION_SMOKE_BUS_CAPACITY", "0")])
            .expect_err("zero capacity should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "PROJECTION_SMOKE_BUS_CAPACITY",
                ..
            }
        ));

        let err = config_from_pairs(&[("PROJECTION_SMOKE_FETCH_BATCH", "0")])
            .expect_err("zero batch should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "PROJECTION_SMOKE_FETCH_BATCH",
                ..
            }
        ));
    }
}
