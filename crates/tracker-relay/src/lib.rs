//! Same-origin HTTP relay for the research-tracker dashboard.
//!
//! Browser traffic to `/api/proxy/{path}` is forwarded verbatim to the
//! configured backend so the dashboard never needs cross-origin access.

pub mod config;
pub mod error;
pub mod proxy;

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use tracker_core::{defaults, Error, Result};

pub use config::RelayConfig;
pub use error::RelayError;
pub use proxy::{build_target_url, outbound_headers, ProxyForwardSpec};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        // No client-wide timeout; each call carries the configured deadline.
        let client = reqwest::Client::builder()
            .user_agent(concat!("tracker-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// Request ID generator using UUIDv7 for time-ordered request tracing.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.config.backend.url,
    }))
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    let forward = get(proxy::forward)
        .post(proxy::forward)
        .patch(proxy::forward)
        .delete(proxy::forward);

    Router::new()
        .route("/health", get(health_check))
        .route(defaults::RELAY_PREFIX, forward.clone())
        .route(&format!("{}/*path", defaults::RELAY_PREFIX), forward)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
