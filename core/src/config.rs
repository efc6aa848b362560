//! Client runtime configuration.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const ENV_BASE_HOST: &str = "HARNESS_BASE_HOST";
pub const ENV_TIMEOUT_MS: &str = "HARNESS_TIMEOUT_MS";
pub const ENV_MAX_REDIRECTS: &str = "HARNESS_MAX_REDIRECTS";
pub const ENV_USER_AGENT: &str = "HARNESS_USER_AGENT";

/// Where a client sends requests, plus the transport settings that go with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root every relative request path is resolved against.
    pub base_host: Url,

    /// Overall per-request timeout in milliseconds. `None` or `0` waits
    /// indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Redirects the transport follows before returning the 3xx as is.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_redirects() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("harness-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    pub fn new(base_host: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_host: parse_base_host(base_host)?,
            timeout_ms: None,
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(raw)?;
        check_base_host(&config.base_host)?;
        Ok(config)
    }

    /// Read the configuration from `HARNESS_*` environment variables. Only
    /// the base host is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_host = env::var(ENV_BASE_HOST).map_err(|_| ConfigError::MissingVar(ENV_BASE_HOST))?;
        let mut config = Self::new(&base_host)?;
        if let Some(timeout) = parse_var(ENV_TIMEOUT_MS)? {
            config.timeout_ms = Some(timeout);
        }
        if let Some(redirects) = parse_var(ENV_MAX_REDIRECTS)? {
            config.max_redirects = redirects;
        }
        if let Ok(agent) = env::var(ENV_USER_AGENT) {
            config.user_agent = agent;
        }
        Ok(config)
    }

    /// Set the per-request timeout. A zero duration clears it; anything
    /// shorter than a millisecond rounds up to one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = if timeout.is_zero() {
            None
        } else {
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1))
        };
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
        Err(_) => Ok(None),
    }
}

fn parse_base_host(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseHost {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    check_base_host(&url)?;
    Ok(url)
}

fn check_base_host(url: &Url) -> Result<(), ConfigError> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseHost {
            value: url.to_string(),
            reason: "expected an absolute http or https URL".to_string(),
        });
    }
    Ok(())
}
