//! Backend target resolution shared by the relay and the client.
//!
//! The backend origin is read from an ordered list of environment variables;
//! the first non-empty one wins. When none is set the local default is used
//! and a warning is logged once per process.
//!
//! | Consumer | Variables (in order) |
//! |----------|----------------------|
//! | relay    | `RELAY_BACKEND_URL`, `BACKEND_URL`, `NEXT_PUBLIC_API_URL` |
//! | client   | `TRACKER_API_URL`, `NEXT_PUBLIC_API_URL` |

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing::{debug, warn};

use crate::defaults;
use crate::error::{Error, Result};

/// Variables consulted by the relay.
pub const RELAY_BACKEND_VARS: &[&str] =
    &["RELAY_BACKEND_URL", "BACKEND_URL", "NEXT_PUBLIC_API_URL"];

/// Variables consulted by the client.
pub const CLIENT_BACKEND_VARS: &[&str] = &["TRACKER_API_URL", "NEXT_PUBLIC_API_URL"];

static DEFAULT_BACKEND_WARNING: Once = Once::new();

/// Where the backend origin came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSource {
    /// Named environment variable.
    Env(&'static str),
    /// Nothing configured; built-in local default.
    Default,
}

impl fmt::Display for BackendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(name) => write!(f, "env:{}", name),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A resolved backend origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOrigin {
    /// Origin without a trailing slash.
    pub url: String,
    pub source: BackendSource,
}

impl BackendOrigin {
    /// Resolve from the process environment.
    pub fn resolve(vars: &'static [&'static str]) -> Result<Self> {
        Self::resolve_with(vars, |name| std::env::var(name).ok())
    }

    /// Resolve using a custom lookup (tests, embedded configs).
    pub fn resolve_with<F>(vars: &'static [&'static str], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in vars {
            if let Some(value) = lookup(*name) {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                let origin = Self {
                    url: normalize_origin(value)?,
                    source: BackendSource::Env(*name),
                };
                debug!(source = %origin.source, url = %origin.url, "Resolved backend origin");
                return Ok(origin);
            }
        }

        DEFAULT_BACKEND_WARNING.call_once(|| {
            warn!(
                default = defaults::BACKEND_URL,
                checked = %vars.join(", "),
                "No backend origin configured, falling back to local default"
            );
        });
        Ok(Self {
            url: defaults::BACKEND_URL.to_string(),
            source: BackendSource::Default,
        })
    }

    /// Whether the built-in default is in use.
    pub fn is_default(&self) -> bool {
        self.source == BackendSource::Default
    }

    /// Whether the origin points at this machine.
    pub fn is_local(&self) -> bool {
        is_local_url(&self.url)
    }
}

/// Validate an origin and strip trailing slashes.
pub fn normalize_origin(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(Error::Config(format!(
            "backend origin must start with http:// or https://, got: {}",
            raw
        )));
    }
    reqwest::Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("invalid backend origin {}: {}", raw, e)))?;
    Ok(trimmed.to_string())
}

/// Whether a URL's host is a loopback name or address.
pub fn is_local_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                host.eq_ignore_ascii_case("localhost")
                    || host
                        .parse::<std::net::IpAddr>()
                        .map(|ip| ip.is_loopback())
                        .unwrap_or(false)
            }
            None => false,
        },
        Err(_) => false,
    }
}

/// Read a boolean flag (`1`/`true`/`yes` or `0`/`false`/`no`).
pub fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&std::env::var(name).ok()?)
}

/// Parse a boolean flag value.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// unset or unparsable.
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_first_configured_variable_wins() {
        let origin = BackendOrigin::resolve_with(
            RELAY_BACKEND_VARS,
            lookup(&[
                ("BACKEND_URL", "https://b.example/"),
                ("NEXT_PUBLIC_API_URL", "https://c.example"),
            ]),
        )
        .unwrap();
        assert_eq!(origin.url, "https://b.example");
        assert_eq!(origin.source, BackendSource::Env("BACKEND_URL"));
        assert!(!origin.is_local());
    }

    #[test]
    fn test_blank_variable_is_skipped() {
        let origin = BackendOrigin::resolve_with(
            CLIENT_BACKEND_VARS,
            lookup(&[
                ("TRACKER_API_URL", "  "),
                ("NEXT_PUBLIC_API_URL", "https://api.example"),
            ]),
        )
        .unwrap();
        assert_eq!(origin.source, BackendSource::Env("NEXT_PUBLIC_API_URL"));
    }

    #[test]
    fn test_falls_back_to_local_default() {
        let origin = BackendOrigin::resolve_with(RELAY_BACKEND_VARS, lookup(&[])).unwrap();
        assert!(origin.is_default());
        assert_eq!(origin.url, defaults::BACKEND_URL);
        assert!(origin.is_local());
    }

    #[test]
    fn test_rejects_origin_without_scheme() {
        let err = BackendOrigin::resolve_with(
            RELAY_BACKEND_VARS,
            lookup(&[("BACKEND_URL", "b.example")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must start with http"));
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("http://localhost:8000"));
        assert!(is_local_url("http://127.0.0.1:8000/api"));
        assert!(is_local_url("http://[::1]:8000"));
        assert!(!is_local_url("https://tracker.up.railway.app"));
        // Substring matches are not enough.
        assert!(!is_local_url("https://localhost.example.com"));
        assert!(!is_local_url("not a url"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
