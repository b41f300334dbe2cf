//! Transport seam between the orchestrator and the network.
//!
//! [`HttpTransport`] is the production implementation over `reqwest`.
//! Deadlines are applied by the caller, not by the transport, so the same
//! client can serve 10 s probes, 90 s loads and 10 minute crawls.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// A request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path plus query string, starting with `/`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with [`ClientError::Http`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Http {
                status: self.status,
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends requests to the backend (directly or through the relay).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange. Only connection-level failures are errors;
    /// any HTTP status is returned as a response.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Base URL requests are resolved against.
    fn base_url(&self) -> &str;

    /// Absolute URL of a request path.
    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("tracker-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self { client, base_url })
    }

    fn build_request(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(request.method.clone(), self.url_for(&request.path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, path = %request.path, "Sending backend request");
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        debug!(status, body_len = body.len(), "Backend response received");
        Ok(ApiResponse { status, body })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(std::time::Duration::ZERO)
    } else {
        ClientError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::post("/api/subscriptions")
            .with_json(serde_json::json!({"type": "keyword", "value": "nerf"}));
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/api/subscriptions");
        assert!(req.body.is_some());
        assert_eq!(ApiRequest::delete("/api/x").method, Method::DELETE);
    }

    #[test]
    fn test_error_for_status() {
        assert!(ApiResponse::new(204, "").error_for_status().is_ok());
        let err = ApiResponse::new(503, "busy").error_for_status().unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 503 }));
    }

    #[test]
    fn test_json_decode_failure_is_invalid_payload() {
        let err = ApiResponse::new(200, "<html>")
            .json::<Vec<serde_json::Value>>()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidPayload(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://relay:3000/api/proxy/").unwrap();
        assert_eq!(
            transport.url_for("/api/papers?limit=100"),
            "http://relay:3000/api/proxy/api/papers?limit=100"
        );
    }
}
