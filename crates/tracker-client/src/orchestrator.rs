//! Fetch orchestrator: bounded retries with warm-up probes.
//!
//! One logical load is a [`RetrySession`]. Attempts run strictly in
//! sequence:
//!
//! 1. Before every attempt after the first, when warm-up is enabled, send a
//!    best-effort `GET /api/health` with its own short deadline. Its outcome
//!    is logged and otherwise ignored.
//! 2. Send the primary call under the per-call deadline.
//! 3. A 2xx response with a decodable body ends the session.
//! 4. Timeouts, network failures, non-2xx statuses and undecodable bodies
//!    are retried after a fixed delay until the attempt budget is spent;
//!    the last failure becomes a [`FinalError`].
//!
//! Crawl triggers use [`FetchOrchestrator::send_once`]: one attempt, no
//! probe, long deadline.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use tracker_core::defaults;

use crate::config::RetryPolicy;
use crate::error::{ClientError, FinalError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Outcome of a single primary call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { status: u16 },
    Http { status: u16 },
    Network(String),
    Timeout,
    InvalidPayload(String),
}

impl AttemptOutcome {
    fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::Timeout(_) => Self::Timeout,
            ClientError::Http { status } => Self::Http { status: *status },
            ClientError::InvalidPayload(msg) => Self::InvalidPayload(msg.clone()),
            other => Self::Network(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Record of one primary call within a session.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    /// Zero-based attempt index.
    pub index: u32,
    pub method: Method,
    pub url: String,
    pub timeout: Duration,
    /// Whether a warm-up probe preceded this attempt.
    pub probed: bool,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

/// One bounded sequence of attempts for a single logical load.
#[derive(Debug, Clone)]
pub struct RetrySession {
    policy: RetryPolicy,
    attempts: Vec<RequestAttempt>,
    probes: u32,
}

impl RetrySession {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: Vec::new(),
            probes: 0,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> &[RequestAttempt] {
        &self.attempts
    }

    /// Warm-up probes sent so far.
    pub fn probes(&self) -> u32 {
        self.probes
    }

    fn next_index(&self) -> u32 {
        self.attempts.len() as u32
    }

    fn has_budget(&self) -> bool {
        (self.attempts.len() as u32) < self.policy.max_attempts
    }
}

/// Runs retry sessions against a transport.
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    display_target: String,
}

impl FetchOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        let display_target = transport.base_url().to_string();
        Self {
            transport,
            policy,
            display_target,
        }
    }

    /// Name `target` in failure hints instead of the transport base URL.
    /// Used when calls go through the relay but the operator configures the
    /// backend.
    pub fn with_display_target(mut self, target: impl Into<String>) -> Self {
        self.display_target = target.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Backend target quoted in failure hints.
    pub fn target(&self) -> &str {
        &self.display_target
    }

    /// Base URL the transport sends to.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Load and decode `request` under a fresh session.
    pub async fn load<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<T, FinalError> {
        let mut session = RetrySession::new(self.policy.clone());
        self.run(request, &mut session).await
    }

    /// Drive `session` until success or exhaustion.
    pub async fn run<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        session: &mut RetrySession,
    ) -> std::result::Result<T, FinalError> {
        let url = self.transport.url_for(&request.path);
        loop {
            let index = session.next_index();
            let probed = index > 0 && session.policy.warm_up;
            if probed {
                session.probes += 1;
                self.warm_up(index, session.policy.probe_timeout).await;
            }

            let started = Instant::now();
            let result = self
                .send_once(request, session.policy.call_timeout)
                .await
                .and_then(ApiResponse::error_for_status)
                .and_then(|response| Ok((response.status, response.json::<T>()?)));
            let elapsed = started.elapsed();

            let outcome = match &result {
                Ok((status, _)) => AttemptOutcome::Success { status: *status },
                Err(err) => AttemptOutcome::from_error(err),
            };
            session.attempts.push(RequestAttempt {
                index,
                method: request.method.clone(),
                url: url.clone(),
                timeout: session.policy.call_timeout,
                probed,
                elapsed,
                outcome,
            });

            match result {
                Ok((_, payload)) => {
                    debug!(
                        target_url = %url,
                        attempt = index,
                        duration_ms = elapsed.as_millis() as u64,
                        "Load succeeded"
                    );
                    return Ok(payload);
                }
                Err(err) if err.is_retryable() && session.has_budget() => {
                    warn!(
                        target_url = %url,
                        attempt = index,
                        error = %err,
                        retry_in_secs = session.policy.retry_delay.as_secs(),
                        "Load attempt failed, retry scheduled"
                    );
                    sleep(session.policy.retry_delay).await;
                }
                Err(err) => {
                    let attempts = session.attempts.len() as u32;
                    warn!(
                        target_url = %url,
                        attempts,
                        error = %err,
                        "Load failed, attempts exhausted"
                    );
                    return Err(FinalError::new(err, attempts, self.target()));
                }
            }
        }
    }

    /// One attempt: status check and JSON decode.
    pub async fn fetch_once<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        deadline: Duration,
    ) -> Result<T> {
        self.send_once(request, deadline)
            .await?
            .error_for_status()?
            .json()
    }

    /// One attempt returning the raw response, any status.
    pub async fn send_once(&self, request: &ApiRequest, deadline: Duration) -> Result<ApiResponse> {
        match timeout(deadline, self.transport.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            // A transport-level timeout reports the deadline we applied.
            Ok(Err(ClientError::Timeout(_))) | Err(_) => Err(ClientError::Timeout(deadline)),
            Ok(Err(err)) => Err(err),
        }
    }

    /// Best-effort health probe. Never fails.
    async fn warm_up(&self, attempt: u32, deadline: Duration) {
        let probe = ApiRequest::get(defaults::HEALTH_PATH);
        match self.send_once(&probe, deadline).await {
            Ok(response) if response.is_success() => {
                info!(attempt, "Warm-up probe answered");
            }
            Ok(response) => {
                debug!(attempt, status = response.status, "Warm-up probe returned error status");
            }
            Err(err) => {
                debug!(attempt, error = %err, "Warm-up probe failed, ignoring");
            }
        }
    }

    /// Single probe of the health endpoint, for callers that want the result.
    pub async fn health(&self) -> Result<()> {
        let probe = ApiRequest::get(defaults::HEALTH_PATH);
        self.send_once(&probe, self.policy.probe_timeout)
            .await?
            .error_for_status()
            .map(|_| ())
    }
}
