//! Ancillary backend resources: notifications, subscriptions, saved
//! Semantic Scholar queries, crawl keywords and tag backfill.
//!
//! These are single-attempt calls with the regular per-call deadline. Every
//! mutation is followed by a fresh listing, so callers always hold the
//! backend's view rather than a locally patched copy.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use tracker_core::{
    defaults, BackfillResponse, CrawlKeyword, CrawlScope, NotificationItem, QuerySpec, S2Query,
    Subscription, SubscriptionType,
};

use crate::error::{ClientError, Result};
use crate::orchestrator::FetchOrchestrator;
use crate::transport::ApiRequest;

const NOTIFICATIONS: &str = "/api/notifications";
const SUBSCRIPTIONS: &str = "/api/subscriptions";
const S2_QUERIES: &str = "/api/s2-queries";
const CRAWL_KEYWORDS: &str = "/api/crawl-keywords";
const BACKFILL_TAGS: &str = "/api/backfill-tags";

/// Typed access to the ancillary endpoints.
#[derive(Clone)]
pub struct ResourceClient {
    orchestrator: Arc<FetchOrchestrator>,
    timeout: Duration,
}

impl ResourceClient {
    pub fn new(orchestrator: Arc<FetchOrchestrator>) -> Self {
        let timeout = orchestrator.policy().call_timeout;
        Self {
            orchestrator,
            timeout,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.orchestrator.fetch_once(&request, self.timeout).await
    }

    async fn execute(&self, request: ApiRequest) -> Result<()> {
        debug!(method = %request.method, path = %request.path, "Mutating resource");
        self.orchestrator
            .send_once(&request, self.timeout)
            .await?
            .error_for_status()
            .map(|_| ())
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    /// Unread notifications, newest first.
    pub async fn unread_notifications(&self) -> Result<Vec<NotificationItem>> {
        let query: QuerySpec = [
            ("unread", "true".to_string()),
            ("limit", defaults::NOTIFICATION_LIMIT.to_string()),
        ]
        .into_iter()
        .collect();
        self.fetch(ApiRequest::get(query.append_to(NOTIFICATIONS)))
            .await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
        self.execute(ApiRequest::patch(format!("{}/{}/read", NOTIFICATIONS, id)))
            .await
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.fetch(ApiRequest::get(SUBSCRIPTIONS)).await
    }

    pub async fn add_subscription(
        &self,
        kind: SubscriptionType,
        value: &str,
    ) -> Result<Vec<Subscription>> {
        let value = non_blank(value, "subscription value")?;
        self.execute(
            ApiRequest::post(SUBSCRIPTIONS).with_json(json!({"type": kind, "value": value})),
        )
        .await?;
        info!(kind = %kind, value, "Subscription added");
        self.subscriptions().await
    }

    pub async fn set_subscription_active(
        &self,
        id: i64,
        active: bool,
    ) -> Result<Vec<Subscription>> {
        self.execute(
            ApiRequest::patch(format!("{}/{}", SUBSCRIPTIONS, id))
                .with_json(json!({"active": active as i64})),
        )
        .await?;
        self.subscriptions().await
    }

    pub async fn delete_subscription(&self, id: i64) -> Result<Vec<Subscription>> {
        self.execute(ApiRequest::delete(format!("{}/{}", SUBSCRIPTIONS, id)))
            .await?;
        self.subscriptions().await
    }

    // =========================================================================
    // SEMANTIC SCHOLAR QUERIES
    // =========================================================================

    pub async fn s2_queries(&self) -> Result<Vec<S2Query>> {
        self.fetch(ApiRequest::get(S2_QUERIES)).await
    }

    pub async fn add_s2_query(&self, query: &str) -> Result<Vec<S2Query>> {
        let query = non_blank(query, "query")?;
        self.execute(ApiRequest::post(S2_QUERIES).with_json(json!({"query": query})))
            .await?;
        self.s2_queries().await
    }

    pub async fn set_s2_query_active(&self, id: i64, active: bool) -> Result<Vec<S2Query>> {
        self.execute(
            ApiRequest::patch(format!("{}/{}", S2_QUERIES, id))
                .with_json(json!({"active": active as i64})),
        )
        .await?;
        self.s2_queries().await
    }

    pub async fn delete_s2_query(&self, id: i64) -> Result<Vec<S2Query>> {
        self.execute(ApiRequest::delete(format!("{}/{}", S2_QUERIES, id)))
            .await?;
        self.s2_queries().await
    }

    // =========================================================================
    // CRAWL KEYWORDS
    // =========================================================================

    pub async fn crawl_keywords(&self) -> Result<Vec<CrawlKeyword>> {
        self.fetch(ApiRequest::get(CRAWL_KEYWORDS)).await
    }

    pub async fn add_crawl_keyword(
        &self,
        keyword: &str,
        scope: CrawlScope,
    ) -> Result<Vec<CrawlKeyword>> {
        let keyword = non_blank(keyword, "keyword")?;
        self.execute(
            ApiRequest::post(CRAWL_KEYWORDS).with_json(json!({"keyword": keyword, "scope": scope})),
        )
        .await?;
        self.crawl_keywords().await
    }

    pub async fn set_crawl_keyword_active(
        &self,
        id: i64,
        active: bool,
    ) -> Result<Vec<CrawlKeyword>> {
        self.execute(
            ApiRequest::patch(format!("{}/{}", CRAWL_KEYWORDS, id))
                .with_json(json!({"active": active as i64})),
        )
        .await?;
        self.crawl_keywords().await
    }

    pub async fn delete_crawl_keyword(&self, id: i64) -> Result<Vec<CrawlKeyword>> {
        self.execute(ApiRequest::delete(format!("{}/{}", CRAWL_KEYWORDS, id)))
            .await?;
        self.crawl_keywords().await
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Re-tag stored papers. With `force`, papers that already have tags
    /// are re-tagged too.
    pub async fn backfill_tags(&self, force: bool) -> Result<BackfillResponse> {
        let mut query = QuerySpec::new();
        if force {
            query.push("force", "true");
        }
        let body: BackfillResponse = self
            .fetch(ApiRequest::post(query.append_to(BACKFILL_TAGS)))
            .await?;
        info!(papers_updated = body.papers_updated, "Tag backfill finished");
        Ok(body)
    }
}

fn non_blank<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(format!("{} must not be blank", what)));
    }
    Ok(trimmed)
}
