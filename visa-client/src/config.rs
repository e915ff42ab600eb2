//! Client Configuration
//!
//! All settings can be supplied through environment variables.

use std::env;
use std::time::Duration;

use crate::polling::PollConfig;
use crate::retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin
    pub api_url: String,
    /// Versioned REST root below the origin
    pub api_prefix: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            poll: PollConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("VISA_API_URL").unwrap_or(defaults.api_url),
            api_prefix: env::var("VISA_API_PREFIX").unwrap_or(defaults.api_prefix),
            timeout: parse_var("VISA_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retry: RetryPolicy {
                max_retries: parse_var("VISA_RETRY_MAX").unwrap_or(defaults.retry.max_retries),
                initial_delay: parse_var("VISA_RETRY_INITIAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.initial_delay),
                max_delay: parse_var("VISA_RETRY_MAX_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.max_delay),
                ..defaults.retry
            },
            poll: PollConfig {
                interval: parse_var("VISA_POLL_INTERVAL_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.poll.interval),
                window: parse_var("VISA_POLL_WINDOW_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.poll.window),
            },
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Origin joined with the version prefix
    pub fn base_url(&self) -> String {
        let origin = self.api_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            origin.to_string()
        } else {
            format!("{}/{}", origin, prefix)
        }
    }
}
