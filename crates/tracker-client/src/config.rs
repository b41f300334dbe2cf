//! Client configuration.
//!
//! Everything is read from the environment once at startup:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TRACKER_API_URL` / `NEXT_PUBLIC_API_URL` | `http://localhost:8000` | Backend origin |
//! | `TRACKER_BACKEND_LOCAL` | derived from host | Treat the backend as local |
//! | `TRACKER_USE_PROXY` | `true` unless local | Route calls through the relay |
//! | `TRACKER_RELAY_URL` | `http://localhost:3000` | Relay origin |
//! | `TRACKER_MAX_ATTEMPTS` | `7` | Primary attempts per load |
//! | `TRACKER_RETRY_DELAY_SECS` | `15` | Pause between attempts |
//! | `TRACKER_FETCH_TIMEOUT_SECS` | `90` | Per-call timeout |
//! | `TRACKER_HEALTH_TIMEOUT_SECS` | `10` | Warm-up probe timeout |
//! | `TRACKER_REFRESH_TIMEOUT_SECS` | `600` | Crawl trigger timeout |
//! | `TRACKER_DEBOUNCE_MS` | `300` | Quiet period for text inputs |

use std::time::Duration;

use tracker_core::config::{env_flag, env_or, normalize_origin, CLIENT_BACKEND_VARS};
use tracker_core::{defaults, BackendOrigin};

use crate::error::Result;

/// Retry policy for category loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total primary attempts, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
    /// Deadline for each primary call.
    pub call_timeout: Duration,
    /// Deadline for the warm-up probe.
    pub probe_timeout: Duration,
    /// Send a warm-up probe before each retry.
    pub warm_up: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(defaults::RETRY_DELAY_SECS),
            call_timeout: Duration::from_secs(defaults::FETCH_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(defaults::HEALTH_TIMEOUT_SECS),
            warm_up: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        Self {
            max_attempts: env_or("TRACKER_MAX_ATTEMPTS", defaults::MAX_ATTEMPTS).max(1),
            retry_delay: Duration::from_secs(env_or(
                "TRACKER_RETRY_DELAY_SECS",
                defaults::RETRY_DELAY_SECS,
            )),
            call_timeout: Duration::from_secs(env_or(
                "TRACKER_FETCH_TIMEOUT_SECS",
                defaults::FETCH_TIMEOUT_SECS,
            )),
            probe_timeout: Duration::from_secs(env_or(
                "TRACKER_HEALTH_TIMEOUT_SECS",
                defaults::HEALTH_TIMEOUT_SECS,
            )),
            warm_up: true,
        }
    }

    /// Single attempt, no warm-up.
    pub fn once(call_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            call_timeout,
            warm_up: false,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: BackendOrigin,
    /// Backend is on this machine; fixed for the process lifetime.
    pub is_local: bool,
    /// Route calls through the relay instead of the backend directly.
    pub use_proxy: bool,
    /// Relay origin without trailing slash.
    pub relay_url: String,
    pub retry: RetryPolicy,
    pub refresh_timeout: Duration,
    pub debounce: Duration,
}

impl ClientConfig {
    /// Build configuration for an explicit backend origin.
    pub fn new(backend: BackendOrigin) -> Self {
        let is_local = backend.is_local();
        Self {
            backend,
            is_local,
            use_proxy: false,
            relay_url: defaults::RELAY_URL.to_string(),
            retry: RetryPolicy::default().with_warm_up(!is_local),
            refresh_timeout: Duration::from_secs(defaults::REFRESH_TIMEOUT_SECS),
            debounce: Duration::from_millis(defaults::DEBOUNCE_MS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let backend = BackendOrigin::resolve(CLIENT_BACKEND_VARS)?;
        let is_local = env_flag("TRACKER_BACKEND_LOCAL").unwrap_or_else(|| backend.is_local());
        let use_proxy = env_flag("TRACKER_USE_PROXY").unwrap_or(!is_local);
        let relay_url = match std::env::var("TRACKER_RELAY_URL") {
            Ok(raw) if !raw.trim().is_empty() => normalize_origin(&raw)?,
            _ => defaults::RELAY_URL.to_string(),
        };

        Ok(Self {
            backend,
            is_local,
            use_proxy,
            relay_url,
            retry: RetryPolicy::from_env().with_warm_up(!is_local),
            refresh_timeout: Duration::from_secs(env_or(
                "TRACKER_REFRESH_TIMEOUT_SECS",
                defaults::REFRESH_TIMEOUT_SECS,
            )),
            debounce: Duration::from_millis(env_or("TRACKER_DEBOUNCE_MS", defaults::DEBOUNCE_MS)),
        })
    }

    /// Route calls through a relay at `relay_url`.
    pub fn with_relay(mut self, relay_url: impl Into<String>) -> Self {
        self.relay_url = relay_url.into().trim_end_matches('/').to_string();
        self.use_proxy = true;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Base every request path is appended to.
    pub fn base_url(&self) -> String {
        if self.use_proxy {
            format!("{}{}", self.relay_url, defaults::RELAY_PREFIX)
        } else {
            self.backend.url.clone()
        }
    }
}
