//! Outbound rate limiting.
//!
//! The gateway allows a fixed number of calls per rolling window. Every HTTP
//! attempt a client makes passes through its [`RateLimiter`], which makes the
//! caller wait for a free slot instead of failing.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Configuration for outbound rate limiting.
///
/// # Examples
///
/// ```
/// use intacct_link::rate_limit::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = RateLimitConfig::builder()
///     .max_calls(5)
///     .window(Duration::from_secs(2))
///     .build();
/// assert_eq!(config.max_calls, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether calls are gated at all.
    pub enabled: bool,

    /// Calls allowed per window. Defaults to 10.
    pub max_calls: usize,

    /// Length of the rolling window. Defaults to one second.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_calls: 10,
            window: Duration::from_secs(1),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new builder for configuring rate limiting.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// Creates a disabled rate limit configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Builder for `RateLimitConfig`.
#[derive(Default)]
pub struct RateLimitConfigBuilder {
    enabled: Option<bool>,
    max_calls: Option<usize>,
    window: Option<Duration>,
}

impl RateLimitConfigBuilder {
    /// Sets whether rate limiting is enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the number of calls allowed per window.
    pub fn max_calls(mut self, max_calls: usize) -> Self {
        self.max_calls = Some(max_calls);
        self
    }

    /// Sets the window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Builds the `RateLimitConfig`.
    pub fn build(self) -> RateLimitConfig {
        let default = RateLimitConfig::default();
        RateLimitConfig {
            enabled: self.enabled.unwrap_or(default.enabled),
            max_calls: self.max_calls.unwrap_or(default.max_calls).max(1),
            window: self.window.unwrap_or(default.window),
        }
    }
}

/// A rolling-window gate shared by every call of one client.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter with no calls recorded.
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = if config.enabled { config.max_calls } else { 0 };
        Self {
            config,
            calls: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Waits until a call may go out, then records it.
    pub async fn acquire(&self) {
        if !self.config.enabled {
            return;
        }

        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while let Some(&oldest) = calls.front() {
                    if now.duration_since(oldest) >= self.config.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }

                match calls.front() {
                    Some(&oldest) if calls.len() >= self.config.max_calls => {
                        self.config.window.saturating_sub(now.duration_since(oldest))
                    }
                    _ => {
                        calls.push_back(now);
                        return;
                    }
                }
            };

            tracing::debug!(
                wait_ms = wait.as_millis(),
                max_calls = self.config.max_calls,
                "Rate limit reached - waiting for a free slot"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
