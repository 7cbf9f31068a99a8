use crate::core::channel::FeedChannel;
use crate::traits::{FeedError, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "ws://127.0.0.1:9050";
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: usize = 10;

/// Feed client configuration.
///
/// All knobs are environment-driven in deployments (see [`FeedConfig::from_env`]);
/// tests construct instances directly for isolation.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Gateway base URL (`ws://` or `wss://`), without a trailing slash.
    pub base_url: String,
    /// Base delay for exponential reconnect backoff.
    pub reconnect_interval: Duration,
    /// Retry ceiling; once hit, a channel stays down until an explicit
    /// `connect` or `subscribe` resets it.
    pub max_reconnect_attempts: usize,
}

impl FeedConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Load configuration from the environment.
    ///
    /// * `FEED_WS_URL` - gateway base URL
    /// * `FEED_RECONNECT_INTERVAL_MS` - base backoff delay in milliseconds
    /// * `FEED_MAX_RECONNECT_ATTEMPTS` - retry ceiling
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            std::env::var("FEED_WS_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        );

        if let Ok(raw) = std::env::var("FEED_RECONNECT_INTERVAL_MS") {
            let millis: u64 = raw.parse().map_err(|e| {
                FeedError::Configuration(format!("invalid FEED_RECONNECT_INTERVAL_MS '{raw}': {e}"))
            })?;
            config.reconnect_interval = Duration::from_millis(millis);
        }

        if let Ok(raw) = std::env::var("FEED_MAX_RECONNECT_ATTEMPTS") {
            config.max_reconnect_attempts = raw.parse().map_err(|e| {
                FeedError::Configuration(format!("invalid FEED_MAX_RECONNECT_ATTEMPTS '{raw}': {e}"))
            })?;
        }

        Ok(config)
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Full endpoint URL for a channel's socket.
    pub fn url_for(&self, channel: FeedChannel) -> String {
        format!("{}{}", self.base_url, channel.endpoint_path())
    }
}
