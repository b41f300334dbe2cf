//! Error types for backend calls.
//!
//! A single call fails with one of the transient kinds (`Timeout`, `Network`,
//! `Http`, `InvalidPayload`). The retry loop turns the last of those into a
//! [`FinalError`] once the attempt budget is spent; that is what the UI shows.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The call did not complete before its deadline.
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The connection failed before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("Backend returned HTTP {status}")]
    Http { status: u16 },

    /// A 2xx response whose body could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A crawl did not answer before its deadline. It may still be running
    /// on the backend.
    #[error("Crawl timed out after {}s", .0.as_secs())]
    CrawlTimeout(Duration),

    /// A crawl responded 2xx but did not report success.
    #[error("Crawl did not complete: {0}")]
    CrawlFailed(String),

    /// Input rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every attempt failed.
    #[error("{0}")]
    RetriesExhausted(Box<FinalError>),

    /// The operation was superseded or torn down.
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the retry loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::Http { .. } | Self::InvalidPayload(_)
        )
    }

    /// Short, user-facing explanation.
    pub fn user_hint(&self) -> String {
        match self {
            Self::CrawlTimeout(d) => format!(
                "The crawl took longer than {}. It may still be running on the backend; reload later.",
                describe_duration(*d)
            ),
            Self::CrawlFailed(_) => "Crawl failed, try again later.".to_string(),
            Self::RetriesExhausted(final_error) => final_error.hint.clone(),
            other => other.to_string(),
        }
    }
}

fn describe_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} seconds", secs)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidPayload(err.to_string())
    }
}

impl From<tracker_core::Error> for ClientError {
    fn from(err: tracker_core::Error) -> Self {
        match err {
            tracker_core::Error::InvalidInput(msg) => ClientError::InvalidInput(msg),
            tracker_core::Error::Config(msg) => ClientError::Config(msg),
            other => ClientError::Config(other.to_string()),
        }
    }
}

impl From<FinalError> for ClientError {
    fn from(err: FinalError) -> Self {
        ClientError::RetriesExhausted(Box::new(err))
    }
}

/// Classification of the last failure of an exhausted load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalErrorKind {
    Timeout,
    Network,
    Http(u16),
    InvalidPayload,
}

impl FinalErrorKind {
    /// Classify a transient failure. Non-transient errors count as network.
    pub fn classify(err: &ClientError) -> Self {
        match err {
            ClientError::Timeout(_) => Self::Timeout,
            ClientError::Http { status } => Self::Http(*status),
            ClientError::InvalidPayload(_) => Self::InvalidPayload,
            _ => Self::Network,
        }
    }
}

impl fmt::Display for FinalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network"),
            Self::Http(status) => write!(f, "http {}", status),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

/// Terminal failure of a retried load.
#[derive(Debug, Clone, Error)]
#[error("{hint} ({attempts} attempts, last error: {last})")]
pub struct FinalError {
    pub kind: FinalErrorKind,
    /// Primary attempts made.
    pub attempts: u32,
    /// The last attempt's error.
    pub last: Box<ClientError>,
    /// Human-readable hint naming the backend target.
    pub hint: String,
}

impl FinalError {
    pub fn new(last: ClientError, attempts: u32, target: &str) -> Self {
        let kind = FinalErrorKind::classify(&last);
        Self {
            kind,
            attempts,
            hint: hint_for(kind, target),
            last: Box::new(last),
        }
    }
}

fn hint_for(kind: FinalErrorKind, target: &str) -> String {
    match kind {
        FinalErrorKind::Timeout => format!(
            "Cannot reach the backend at {} (request timed out). The service may be starting up; try again in a minute.",
            target
        ),
        FinalErrorKind::Network => format!(
            "Cannot reach the backend at {} (network error). It may be blocked by a firewall or proxy; check TRACKER_API_URL.",
            target
        ),
        FinalErrorKind::Http(status) => format!(
            "The backend at {} answered HTTP {}. Check that the service is running and reachable.",
            target, status
        ),
        FinalErrorKind::InvalidPayload => format!(
            "The backend at {} returned a response that could not be read.",
            target
        ),
    }
}
