//! Byte-transparent forwarding of `/api/proxy/{path}` to the backend.
//!
//! Outbound requests carry only `Accept` and, for non-GET methods, the
//! inbound `Content-Type`. Everything else the browser sent (cookies, host,
//! authorization, hop-by-hop headers) stays at the relay. The upstream
//! status, content type and body bytes come back unchanged; the relay never
//! retries.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Uri};
use axum::response::Response;
use bytes::Bytes;
use tracing::{debug, error, info};

use tracker_core::defaults;

use crate::error::{error_chain, RelayError};
use crate::AppState;

/// A fully resolved upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyForwardSpec {
    pub method: Method,
    pub target_url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyForwardSpec {
    /// Resolve an inbound request against the backend origin.
    pub fn from_inbound(
        backend: &str,
        method: Method,
        uri: &Uri,
        inbound: &HeaderMap,
        body: Bytes,
    ) -> Self {
        let suffix = uri
            .path()
            .strip_prefix(defaults::RELAY_PREFIX)
            .unwrap_or_default();
        let target_url = build_target_url(backend, suffix, uri.query());
        let headers = outbound_headers(&method, inbound);
        let body = (method != Method::GET && !body.is_empty()).then_some(body);
        Self {
            method,
            target_url,
            headers,
            body,
        }
    }
}

/// `backend + "/" + path + "?" + query`; the slash is omitted for an empty
/// path and the `?` for an empty query.
pub fn build_target_url(backend: &str, path: &str, query: Option<&str>) -> String {
    let mut url = backend.trim_end_matches('/').to_string();
    let path = path.trim_start_matches('/');
    if !path.is_empty() {
        url.push('/');
        url.push_str(path);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// The only headers sent upstream.
pub fn outbound_headers(method: &Method, inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let accept = inbound
        .get(header::ACCEPT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(defaults::RELAY_CONTENT_TYPE));
    headers.insert(header::ACCEPT, accept);
    if *method != Method::GET {
        if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, content_type.clone());
        }
    }
    headers
}

/// Handler for every method on `/api/proxy` and `/api/proxy/*path`.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let spec = ProxyForwardSpec::from_inbound(
        &state.config.backend.url,
        method,
        &uri,
        &headers,
        body,
    );
    debug!(
        method = %spec.method,
        target_url = %spec.target_url,
        body_len = spec.body.as_ref().map(Bytes::len).unwrap_or(0),
        "Forwarding request"
    );

    let started = Instant::now();
    match send(&state, &spec).await {
        Ok(response) => {
            info!(
                method = %spec.method,
                target_url = %spec.target_url,
                status = response.status().as_u16(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Relayed upstream response"
            );
            Ok(response)
        }
        Err(detail) => {
            error!(
                method = %spec.method,
                target_url = %spec.target_url,
                duration_ms = started.elapsed().as_millis() as u64,
                error = %detail,
                "Upstream call failed"
            );
            Err(RelayError::UpstreamUnreachable {
                target: spec.target_url,
                detail,
                hint: state.config.unreachable_hint(),
            })
        }
    }
}

async fn send(state: &AppState, spec: &ProxyForwardSpec) -> Result<Response, String> {
    let mut request = state
        .client
        .request(spec.method.clone(), &spec.target_url)
        .headers(spec.headers.clone())
        .timeout(state.config.timeout);
    if let Some(body) = &spec.body {
        request = request.body(body.clone());
    }

    let upstream = request.send().await.map_err(|e| error_chain(&e))?;
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(defaults::RELAY_CONTENT_TYPE));
    let body = upstream.bytes().await.map_err(|e| error_chain(&e))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
