//! Configuration types for the Telegram adapter.
//!
//! # Example Configuration
//!
//! ```toml
//! [adapters.telegram]
//! bot_token = "123456:ABC-DEF"
//! poll_timeout_secs = 30
//!
//! [adapters.telegram.retry]
//! initial_delay_ms = 1000
//! max_delay_ms = 60000
//! backoff_multiplier = 2.0
//! ```
//!
//! The token is usually supplied through the environment instead:
//! `GLOSSA_ADAPTERS__TELEGRAM__BOT_TOKEN=123456:ABC-DEF`.

use std::time::Duration;

use glossa_core::{AdapterError, AdapterResult};
use serde::{Deserialize, Serialize};

/// Telegram adapter configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    pub bot_token: String,

    /// Bot API base URL, without the `/bot<token>` suffix.
    pub api_base_url: String,

    /// Server-side long-poll timeout for `getUpdates`. Must be at least 1.
    pub poll_timeout_secs: u64,

    /// Timeout for every other request; added on top of the poll timeout
    /// for `getUpdates`.
    pub request_timeout_secs: u64,

    /// Backoff after polling errors.
    pub retry: RetryConfig,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            request_timeout_secs: 10,
            retry: RetryConfig::default(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl TelegramConfig {
    /// Creates a configuration with the given token and defaults otherwise.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            ..Default::default()
        }
    }

    /// Checks the values that would otherwise only fail at runtime.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.bot_token.trim().is_empty() {
            return Err(AdapterError::Startup(
                "adapters.telegram.bot_token is not set".into(),
            ));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(AdapterError::Startup(format!(
                "adapters.telegram.api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }

        if self.poll_timeout_secs == 0 {
            return Err(AdapterError::Startup(
                "adapters.telegram.poll_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AdapterError::Startup(
                "adapters.telegram.request_timeout_secs must be greater than 0".into(),
            ));
        }

        self.retry.validate()
    }

    pub(crate) fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry configuration for the polling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Consecutive failures tolerated before the adapter gives up.
    /// `0` retries forever.
    pub max_retries: u32,

    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> AdapterResult<()> {
        if self.initial_delay_ms == 0 {
            return Err(AdapterError::Startup(
                "Initial retry delay must be greater than 0".into(),
            ));
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(AdapterError::Startup(
                "Max retry delay must be greater than or equal to initial delay".into(),
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(AdapterError::Startup(
                "Backoff multiplier must be a finite number of at least 1.0".into(),
            ));
        }

        Ok(())
    }
}

/// Exponential backoff state for one failure streak.
#[derive(Debug)]
pub(crate) struct Backoff {
    config: RetryConfig,
    attempts: u32,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(config: RetryConfig) -> Self {
        let current = Duration::from_millis(config.initial_delay_ms);
        Self {
            config,
            attempts: 0,
            current,
        }
    }

    /// Returns the delay before the next attempt, or `None` once the retry
    /// budget is spent.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_retries > 0 && self.attempts >= self.config.max_retries {
            return None;
        }
        self.attempts += 1;

        let delay = self.current;
        let max_delay = Duration::from_millis(self.config.max_delay_ms);
        self.current =
            Duration::try_from_secs_f64(self.current.as_secs_f64() * self.config.backoff_multiplier)
                .unwrap_or(max_delay)
                .min(max_delay);
        Some(delay)
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
        self.current = Duration::from_millis(self.config.initial_delay_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelegramConfig::default();
        assert_eq!(config.api_base_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.validate().is_err(), "empty token must be rejected");
        assert!(TelegramConfig::new("123:abc").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", TelegramConfig::new("123:secret"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_bad_retry_rejected() {
        let mut config = TelegramConfig::new("123:abc");
        config.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = TelegramConfig::new("123:abc");
        config.retry.max_delay_ms = 10;
        assert!(config.validate().is_err());

        let mut config = TelegramConfig::new("123:abc");
        config.retry.backoff_multiplier = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_timeout_rejected() {
        let mut config = TelegramConfig::new("123:abc");
        config.poll_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_huge_multiplier_caps() {
        for multiplier in [1e30, f64::INFINITY] {
            let mut backoff = Backoff::new(RetryConfig {
                max_retries: 0,
                initial_delay_ms: 100,
                max_delay_ms: 5_000,
                backoff_multiplier: multiplier,
            });
            assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
            assert_eq!(backoff.next_delay(), Some(Duration::from_millis(5_000)));
            assert_eq!(backoff.next_delay(), Some(Duration::from_millis(5_000)));
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let mut backoff = Backoff::new(RetryConfig {
            max_retries: 0,
            initial_delay_ms: 100,
            max_delay_ms: 300,
            backoff_multiplier: 2.0,
        });
        let delays: Vec<_> = (0..4).filter_map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            [100, 200, 300, 300].map(Duration::from_millis).to_vec()
        );

        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_backoff_budget() {
        let mut backoff = Backoff::new(RetryConfig {
            max_retries: 2,
            ..Default::default()
        });
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
    }
}
