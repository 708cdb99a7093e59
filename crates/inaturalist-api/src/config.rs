use std::env;
use std::time::Duration;

use crate::error::{ApiError, Result};

const DEFAULT_BASE_URL: &str = "https://api.inaturalist.org/v1";
const DEFAULT_USER_AGENT: &str = concat!("inaturalist-api-rs/", env!("CARGO_PKG_VERSION"));

/// Client configuration, read-only once a client has been built from it
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts per logical call (initial try included)
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// iNaturalist asks for at most one request per second
    pub rate_limit_per_second: f64,
    /// Optional JWT sent as a bearer token
    pub api_token: Option<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            rate_limit_per_second: 1.0,
            api_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("INATURALIST_BASE_URL").unwrap_or(defaults.base_url);

        let timeout = env::var("INATURALIST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_retries = env::var("INATURALIST_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_retries);

        let retry_delay = env::var("INATURALIST_RETRY_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);

        let rate_limit_per_second = env::var("INATURALIST_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.rate_limit_per_second);

        let api_token = env::var("INATURALIST_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let user_agent = env::var("INATURALIST_USER_AGENT").unwrap_or(defaults.user_agent);

        Self {
            base_url,
            timeout,
            max_retries,
            retry_delay,
            rate_limit_per_second,
            api_token,
            user_agent,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_rate_limit(mut self, per_second: f64) -> Self {
        self.rate_limit_per_second = per_second;
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Number of attempts the executor makes; zero is treated as one
    pub(crate) fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Minimum spacing between two dispatched requests
    pub(crate) fn min_interval(&self) -> Duration {
        crate::rate_limiter::interval_for(self.rate_limit_per_second)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.rate_limit_per_second.is_finite() || self.rate_limit_per_second <= 0.0 {
            return Err(ApiError::Config(format!(
                "rate_limit_per_second must be a positive number, got {}",
                self.rate_limit_per_second
            )));
        }
        url::Url::parse(&self.base_url)?;
        Ok(())
    }
}
