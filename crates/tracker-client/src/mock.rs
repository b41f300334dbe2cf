//! Scripted transport for deterministic tests.
//!
//! Replies are queued per path prefix. Each call pops the next reply; the
//! last reply of a queue repeats forever. Delays use tokio time, so tests on
//! a paused clock run instantly.
//!
//! ```rust,ignore
//! let transport = MockTransport::new()
//!     .with_reply("/api/papers", Reply::status(503))
//!     .with_reply("/api/papers", Reply::json(200, json!([])));
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct Reply {
    delay: Duration,
    result: Result<ApiResponse>,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(ApiResponse::new(status, body.to_string())),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::raw(status, "")
    }

    pub fn raw(status: u16, body: &'static str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(ApiResponse::new(status, body)),
        }
    }

    pub fn error(err: ClientError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    /// Never answers within any realistic deadline.
    pub fn hang() -> Self {
        Self::status(200).after(Duration::from_secs(24 * 60 * 60))
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub at: tokio::time::Instant,
}

struct Route {
    prefix: String,
    replies: VecDeque<Reply>,
}

/// In-memory transport with a call log.
#[derive(Clone)]
pub struct MockTransport {
    base_url: String,
    routes: Arc<Mutex<Vec<Route>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            base_url: "http://backend.test".to_string(),
            routes: Arc::new(Mutex::new(Vec::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Queue a reply for paths starting with `prefix`.
    pub fn with_reply(self, prefix: &str, reply: Reply) -> Self {
        self.push_reply(prefix, reply);
        self
    }

    /// Queue a reply on an already shared transport.
    pub fn push_reply(&self, prefix: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| r.prefix == prefix) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                prefix: prefix.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Calls whose path (without query) starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| path_only(&c.path).starts_with(prefix))
            .collect()
    }

    pub fn probe_count(&self) -> usize {
        self.calls_to(tracker_core::defaults::HEALTH_PATH).len()
    }

    fn next_reply(&self, path: &str) -> Reply {
        let path = path_only(path);
        let mut routes = self.routes.lock().unwrap();
        // Longest matching prefix wins.
        let route = routes
            .iter_mut()
            .filter(|r| path.starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len());
        match route {
            Some(route) if route.replies.len() > 1 => route.replies.pop_front().unwrap(),
            Some(route) => route.replies.front().cloned().unwrap(),
            None => Reply::status(404),
        }
    }
}

fn path_only(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.call_log.lock().unwrap().push(MockCall {
            method: request.method.clone(),
            path: request.path.clone(),
            body: request.body.clone(),
            at: tokio::time::Instant::now(),
        });
        let reply = self.next_reply(&request.path);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
