//! Relay error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream call failed or timed out. Maps to 502.
    #[error("Upstream {target} unreachable: {detail}")]
    UpstreamUnreachable {
        target: String,
        detail: String,
        hint: String,
    },
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::UpstreamUnreachable { detail, hint, .. } => {
                let body = Json(serde_json::json!({
                    "error": "Proxy failed",
                    "detail": detail,
                    "hint": hint,
                }));
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
        }
    }
}

/// Flatten an error and its sources into one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "outer: connection refused");
    }

    #[test]
    fn test_upstream_unreachable_is_bad_gateway() {
        let response = RelayError::UpstreamUnreachable {
            target: "http://b".into(),
            detail: "refused".into(),
            hint: "check it".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
