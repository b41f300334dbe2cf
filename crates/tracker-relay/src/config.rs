//! Relay configuration from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RELAY_BACKEND_URL` / `BACKEND_URL` / `NEXT_PUBLIC_API_URL` | `http://localhost:8000` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `RELAY_TIMEOUT_SECS` | `90` |

use std::time::Duration;

use tracker_core::config::{env_or, RELAY_BACKEND_VARS};
use tracker_core::{defaults, BackendOrigin, Result};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub backend: BackendOrigin,
    pub host: String,
    pub port: u16,
    /// Hard deadline for each upstream call.
    pub timeout: Duration,
}

impl RelayConfig {
    pub fn new(backend: BackendOrigin) -> Self {
        Self {
            backend,
            host: defaults::RELAY_HOST.to_string(),
            port: defaults::RELAY_PORT,
            timeout: Duration::from_secs(defaults::RELAY_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        let backend = BackendOrigin::resolve(RELAY_BACKEND_VARS)?;
        Ok(Self {
            backend,
            host: std::env::var("HOST").unwrap_or_else(|_| defaults::RELAY_HOST.to_string()),
            port: env_or("PORT", defaults::RELAY_PORT),
            timeout: Duration::from_secs(env_or(
                "RELAY_TIMEOUT_SECS",
                defaults::RELAY_TIMEOUT_SECS,
            )),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Operator hint for a failed upstream call.
    pub fn unreachable_hint(&self) -> String {
        if self.backend.is_default() {
            format!(
                "No backend origin is configured, so the relay is using the local default {}. \
                 Set RELAY_BACKEND_URL (or BACKEND_URL / NEXT_PUBLIC_API_URL) to the real backend.",
                self.backend.url
            )
        } else {
            format!(
                "The backend {} (from {}) is configured but unreachable. \
                 Check that it is running and reachable from the relay.",
                self.backend.url, self.backend.source
            )
        }
    }
}
