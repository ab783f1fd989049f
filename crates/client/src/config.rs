use std::time::Duration;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Client configuration loaded from environment variables.
///
/// Defaults match the behaviour of the web frontend: poll every three
/// seconds, forever, with no per-request deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL (default: `http://localhost:8000`).
    pub api_url: String,
    /// Fixed interval between status polls (default: 3s).
    pub poll_interval: Duration,
    /// Give up after this many status requests. `None` polls until the
    /// backend reports a terminal status.
    pub max_poll_attempts: Option<u32>,
    /// Per-request deadline. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            request_timeout: None,
        }
    }
}

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{key} must be {expected} (got '{value}')")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `VIDGEN_API_URL`              | `http://localhost:8000` |
    /// | `VIDGEN_POLL_INTERVAL_SECS`   | `3`                     |
    /// | `VIDGEN_MAX_POLL_ATTEMPTS`    | unset (unlimited)       |
    /// | `VIDGEN_REQUEST_TIMEOUT_SECS` | unset (no timeout)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading values through
    /// `lookup`, so callers can supply their own source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("VIDGEN_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let poll_interval = match lookup("VIDGEN_POLL_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(parse_positive("VIDGEN_POLL_INTERVAL_SECS", &v)?),
            None => defaults.poll_interval,
        };

        let max_poll_attempts = lookup("VIDGEN_MAX_POLL_ATTEMPTS")
            .map(|v| parse_positive("VIDGEN_MAX_POLL_ATTEMPTS", &v))
            .transpose()?
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX));

        let request_timeout = lookup("VIDGEN_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_positive("VIDGEN_REQUEST_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            api_url,
            poll_interval,
            max_poll_attempts,
            request_timeout,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError {
            key,
            value: value.to_string(),
            expected: "a positive integer",
        }),
    }
}
