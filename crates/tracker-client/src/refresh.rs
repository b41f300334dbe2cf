//! Refresh/crawl trigger.
//!
//! A crawl is one `POST` to the category's refresh endpoint with a long
//! deadline and no retries. The backend answers `{status, *_added, ...}`;
//! anything but `status == "ok"` is a failed crawl even on HTTP 200.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use tracker_core::query::build_refresh;
use tracker_core::{defaults, Category, FilterState, RefreshResponse};

use crate::error::{ClientError, Result};
use crate::orchestrator::FetchOrchestrator;
use crate::transport::ApiRequest;

/// Result of a crawl followed by a reload.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub category: Category,
    /// Items the backend reported as added.
    pub added: u64,
    /// Items shown after the reload; `None` if the reload failed.
    pub item_count: Option<usize>,
    /// Set when the crawl added nothing and the reload came back empty.
    pub hint: Option<String>,
    pub response: RefreshResponse,
}

/// Sends crawl triggers.
#[derive(Clone)]
pub struct RefreshTrigger {
    orchestrator: Arc<FetchOrchestrator>,
    timeout: Duration,
}

impl RefreshTrigger {
    pub fn new(orchestrator: Arc<FetchOrchestrator>, timeout: Duration) -> Self {
        Self {
            orchestrator,
            timeout,
        }
    }

    /// Crawl request for a category's current filters.
    pub fn request_for(filters: &FilterState) -> ApiRequest {
        let endpoint = filters.category().descriptor().refresh_endpoint;
        ApiRequest::post(build_refresh(filters).append_to(endpoint))
    }

    /// Run the crawl for `filters`' category.
    pub async fn trigger(&self, filters: &FilterState) -> Result<RefreshResponse> {
        let category = filters.category();
        let request = Self::request_for(filters);
        info!(category = %category, path = %request.path, "Triggering crawl");

        let response = self
            .orchestrator
            .send_once(&request, self.timeout)
            .await
            .map_err(|err| {
                warn!(category = %category, error = %err, "Crawl request failed");
                match err {
                    ClientError::Timeout(deadline) => ClientError::CrawlTimeout(deadline),
                    other => other,
                }
            })?
            .error_for_status()?;

        // An unreadable body counts as a crawl that did not report success.
        let body: RefreshResponse = response.json().unwrap_or_default();
        if !body.is_ok() {
            warn!(category = %category, status = %body.status, "Crawl reported failure");
            let reported = if body.status.is_empty() {
                "no status reported".to_string()
            } else {
                body.status.clone()
            };
            return Err(ClientError::CrawlFailed(reported));
        }

        info!(category = %category, added = body.added(), "Crawl completed");
        Ok(body)
    }
}

/// Hint shown when a crawl added nothing and the reload is empty.
pub fn empty_result_hint(category: Category, response: &RefreshResponse) -> String {
    match category {
        Category::Community => response
            .hint
            .clone()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| category.descriptor().empty_refresh_hint.to_string()),
        Category::Company if !response.errors.is_empty() => {
            let shown = &response.errors[..response.errors.len().min(defaults::COMPANY_ERROR_PREVIEW)];
            let more = if response.errors.len() > defaults::COMPANY_ERROR_PREVIEW {
                "…"
            } else {
                ""
            };
            format!(
                "Crawl failed: {}{}. Google News may need a proxy; set HTTPS_PROXY on the backend or deploy it elsewhere.",
                shown.join("; "),
                more
            )
        }
        _ => category.descriptor().empty_refresh_hint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::mock::{MockTransport, Reply};
    use serde_json::json;
    use tracker_core::{CodeFilters, CompanyFilters, PaperFilters};

    fn trigger(transport: &MockTransport) -> RefreshTrigger {
        let orch = FetchOrchestrator::new(Arc::new(transport.clone()), RetryPolicy::default());
        RefreshTrigger::new(Arc::new(orch), Duration::from_secs(600))
    }

    #[test]
    fn test_request_paths_per_category() {
        let papers = FilterState::Papers(PaperFilters {
            tag: "3DGS".into(),
            ..Default::default()
        });
        assert_eq!(
            RefreshTrigger::request_for(&papers).path,
            "/api/refresh?days=15&tag=3DGS"
        );

        let code = FilterState::Code(CodeFilters {
            tag: "GitHub".into(),
            ..Default::default()
        });
        assert_eq!(RefreshTrigger::request_for(&code).path, "/api/refresh-code");

        let company = FilterState::Company(CompanyFilters::default());
        assert_eq!(
            RefreshTrigger::request_for(&company).path,
            "/api/refresh-company-posts?days=90"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ok_status_returns_counts() {
        let transport = MockTransport::new().with_reply(
            "/api/refresh",
            Reply::json(200, json!({"status": "ok", "papers_added": 12, "notifications_added": 2})),
        );
        let body = trigger(&transport)
            .trigger(&FilterState::for_category(Category::Papers))
            .await
            .unwrap();
        assert_eq!(body.added(), 12);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_ok_status_is_crawl_failure() {
        let transport = MockTransport::new()
            .with_reply("/api/refresh-posts", Reply::json(200, json!({"status": "error"})));
        let err = trigger(&transport)
            .trigger(&FilterState::for_category(Category::Community))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::CrawlFailed(ref s) if s == "error"));
        assert_eq!(err.user_hint(), "Crawl failed, try again later.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_body_is_crawl_failure() {
        let transport = MockTransport::new().with_reply("/api/refresh-code", Reply::raw(200, "done"));
        let err = trigger(&transport)
            .trigger(&FilterState::for_category(Category::Code))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::CrawlFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_is_not_retried() {
        let transport = MockTransport::new().with_reply("/api/refresh", Reply::status(500));
        let err = trigger(&transport)
            .trigger(&FilterState::for_category(Category::Papers))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 500 }));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.probe_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_crawl_times_out_after_ten_minutes() {
        let transport = MockTransport::new().with_reply("/api/refresh", Reply::hang());
        let started = tokio::time::Instant::now();
        let err = trigger(&transport)
            .trigger(&FilterState::for_category(Category::Papers))
            .await
            .unwrap_err();
        assert_eq!(started.elapsed(), Duration::from_secs(600));
        assert!(matches!(err, ClientError::CrawlTimeout(d) if d == Duration::from_secs(600)));
        assert!(err.user_hint().contains("10 minutes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_crawl_deadline_keeps_crawl_message() {
        let transport = MockTransport::new().with_reply("/api/refresh-posts", Reply::hang());
        let orch = FetchOrchestrator::new(Arc::new(transport.clone()), RetryPolicy::default());
        let trigger = RefreshTrigger::new(Arc::new(orch), Duration::from_secs(120));
        let err = trigger
            .trigger(&FilterState::for_category(Category::Community))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::CrawlTimeout(_)));
        assert!(err.user_hint().contains("The crawl took longer than 2 minutes"));
    }

    #[test]
    fn test_company_hint_quotes_first_three_errors() {
        let response = RefreshResponse {
            status: "ok".into(),
            posts_added: Some(0),
            errors: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..Default::default()
        };
        let hint = empty_result_hint(Category::Company, &response);
        assert!(hint.starts_with("Crawl failed: a; b; c…."));
        assert!(!hint.contains("; d"));
    }

    #[test]
    fn test_community_hint_prefers_backend_hint() {
        let response = RefreshResponse {
            status: "ok".into(),
            hint: Some("Reddit blocked".into()),
            ..Default::default()
        };
        assert_eq!(empty_result_hint(Category::Community, &response), "Reddit blocked");
        assert_eq!(
            empty_result_hint(Category::Code, &response),
            Category::Code.descriptor().empty_refresh_hint
        );
    }
}
