//! Client configuration.
//!
//! Values come from code (`ClientConfig::new`) or from the environment
//! (`ClientConfig::from_env`). Environment parsing goes through a lookup
//! function so it can be exercised without touching process state.

use std::time::Duration;

use thiserror::Error;

pub const ENV_URL: &str = "COLLAB_URL";
pub const ENV_TIMEOUT_MS: &str = "COLLAB_TIMEOUT_MS";
pub const ENV_DECODE_MODE: &str = "COLLAB_DECODE_MODE";

/// How to treat a success response whose body does not decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Report `ClientError::DecodeAmbiguity`.
    #[default]
    Strict,
    /// Return the type's zero value with no error, logging a warning.
    Lenient,
}

impl std::str::FromStr for DecodeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(DecodeMode::Strict),
            "lenient" => Ok(DecodeMode::Lenient),
            _ => Err(ConfigError::InvalidDecodeMode(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("COLLAB_URL is not set")]
    MissingUrl,
    #[error("invalid COLLAB_TIMEOUT_MS value '{0}'")]
    InvalidTimeout(String),
    #[error("invalid decode mode '{0}'; expected 'strict' or 'lenient'")]
    InvalidDecodeMode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server location, for example `http://localhost:8065`.
    pub url: String,
    /// Applied to the transport handle; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub decode_mode: DecodeMode,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            timeout: None,
            decode_mode: DecodeMode::default(),
            user_agent: default_user_agent(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(ENV_URL)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let mut config = Self::new(url.trim());

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Some(Duration::from_millis(millis));
        }
        if let Some(raw) = lookup(ENV_DECODE_MODE) {
            config.decode_mode = raw.parse()?;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_decode_mode(mut self, decode_mode: DecodeMode) -> Self {
        self.decode_mode = decode_mode;
        self
    }
}

fn default_user_agent() -> String {
    concat!("collab-client/", env!("CARGO_PKG_VERSION")).to_string()
}
