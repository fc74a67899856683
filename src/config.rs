use crate::compiler::DEFAULT_PRECISION;
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.credmark.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const GATEWAY_URL_VAR: &str = "MODEL_RUNNER_GATEWAY_URL";
pub const TIMEOUT_VAR: &str = "MODEL_RUNNER_TIMEOUT_SECS";
pub const PRECISION_VAR: &str = "MODEL_RUNNER_PRECISION";

/// Runtime settings. Unset variables fall back to their defaults; set but
/// unparsable ones are an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub gateway_url: String,
    pub timeout: Duration,
    /// Significant digits used by transform expressions.
    pub precision: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let gateway_url = lookup(GATEWAY_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.gateway_url);
        let timeout = parse_var::<u64>(&lookup, TIMEOUT_VAR)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let precision = match parse_var::<u64>(&lookup, PRECISION_VAR)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    name: PRECISION_VAR.to_string(),
                    value: "0".to_string(),
                    message: "precision must be at least 1".to_string(),
                });
            }
            Some(p) => p,
            None => defaults.precision,
        };

        Ok(Self {
            gateway_url,
            timeout,
            precision,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
            message: e.to_string(),
        })
}
