//! Runtime configuration sourced from the environment.

use std::time::Duration;

/// Environment variable holding the rate-limit window in seconds
pub const CONN_WINDOW_ENV: &str = "WEBRTC_CONN_SEC";
/// Environment variable holding the max connection attempts per window
pub const CONN_MAX_ENV: &str = "WEBRTC_CONN_MAX";

pub const DEFAULT_CONN_WINDOW: Duration = Duration::from_secs(10);
pub const DEFAULT_CONN_MAX: usize = 15;

/// Per-address connection rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of the sliding window
    pub window: Duration,
    /// Attempts admitted per address within one window
    pub max_attempts: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_CONN_WINDOW,
            max_attempts: DEFAULT_CONN_MAX,
        }
    }
}

impl RateLimitConfig {
    pub fn new(window: Duration, max_attempts: usize) -> Self {
        Self {
            window,
            max_attempts,
        }
    }

    /// Load from `WEBRTC_CONN_SEC` / `WEBRTC_CONN_MAX`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Missing, non-numeric and non-positive values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = positive_integer(&lookup, CONN_WINDOW_ENV) {
            config.window = Duration::from_secs(secs);
            tracing::info!("Connection rate-limit window: {:?}", config.window);
        }
        if let Some(max) = positive_integer(&lookup, CONN_MAX_ENV) {
            config.max_attempts = usize::try_from(max).unwrap_or(usize::MAX);
            tracing::info!("Max connections per address per window: {}", max);
        }

        config
    }
}

fn positive_integer<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!("Ignoring invalid {}='{}', keeping default", key, raw);
            None
        }
    }
}
