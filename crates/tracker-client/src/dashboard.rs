//! Dashboard aggregate: the four categories, the active tab and the
//! ancillary lists.
//!
//! Papers load when the dashboard starts; the other categories load the
//! first time their tab is activated. Switching tabs never cancels another
//! category's load. Dropping the dashboard drops every controller, which
//! aborts their loads and pending retries.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use tracker_core::{Category, CrawlKeyword, NotificationItem, S2Query, Subscription};

use crate::category::CategoryController;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::orchestrator::FetchOrchestrator;
use crate::refresh::{RefreshOutcome, RefreshTrigger};
use crate::resources::ResourceClient;
use crate::transport::{HttpTransport, Transport};

/// Ancillary lists as last loaded.
#[derive(Debug, Clone, Default)]
pub struct Ancillary {
    pub notifications: Vec<NotificationItem>,
    pub subscriptions: Vec<Subscription>,
    pub s2_queries: Vec<S2Query>,
    pub crawl_keywords: Vec<CrawlKeyword>,
}

pub struct Dashboard {
    categories: BTreeMap<Category, CategoryController>,
    active: Mutex<Category>,
    resources: ResourceClient,
    ancillary: Mutex<Ancillary>,
    orchestrator: Arc<FetchOrchestrator>,
}

impl Dashboard {
    /// Build a dashboard talking HTTP to the configured target.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Build a dashboard over any transport. Must be called within a tokio
    /// runtime.
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let orchestrator = Arc::new(
            FetchOrchestrator::new(transport, config.retry.clone())
                .with_display_target(config.backend.url.clone()),
        );
        let refresh = RefreshTrigger::new(Arc::clone(&orchestrator), config.refresh_timeout);

        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                let controller = CategoryController::new(
                    category,
                    Arc::clone(&orchestrator),
                    refresh.clone(),
                    config.debounce,
                );
                (category, controller)
            })
            .collect();

        info!(
            target_url = orchestrator.base_url(),
            backend = orchestrator.target(),
            is_local = config.is_local,
            via_relay = config.use_proxy,
            "Dashboard initialized"
        );

        Self {
            categories,
            active: Mutex::new(Category::Papers),
            resources: ResourceClient::new(Arc::clone(&orchestrator)),
            ancillary: Mutex::new(Ancillary::default()),
            orchestrator,
        }
    }

    /// Initial mount: load papers and the ancillary lists.
    pub async fn start(&self) {
        self.category(Category::Papers).activate();
        self.reload_ancillary().await;
    }

    pub fn category(&self, category: Category) -> &CategoryController {
        // Every category is inserted in `new`.
        &self.categories[&category]
    }

    pub fn active_tab(&self) -> Category {
        *self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Switch tabs. Returns `true` if this triggered the tab's first load.
    pub fn switch_tab(&self, category: Category) -> bool {
        *self.active.lock().unwrap_or_else(|p| p.into_inner()) = category;
        self.category(category).activate()
    }

    /// Crawl and reload a category. A papers crawl also reloads
    /// notifications, since new papers may match subscriptions.
    pub async fn refresh(&self, category: Category) -> Result<RefreshOutcome> {
        let outcome = self.category(category).refresh().await?;
        if category == Category::Papers {
            self.reload_notifications().await;
        }
        Ok(outcome)
    }

    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }

    pub fn ancillary(&self) -> Ancillary {
        self.ancillary
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Probe the backend health endpoint once.
    pub async fn health(&self) -> Result<()> {
        self.orchestrator.health().await
    }

    /// Reload every ancillary list. Failures leave the previous list in
    /// place and are logged.
    pub async fn reload_ancillary(&self) {
        let (notifications, subscriptions, s2_queries, crawl_keywords) = futures::join!(
            self.resources.unread_notifications(),
            self.resources.subscriptions(),
            self.resources.s2_queries(),
            self.resources.crawl_keywords(),
        );

        let mut ancillary = self.ancillary.lock().unwrap_or_else(|p| p.into_inner());
        keep_or_log(&mut ancillary.notifications, notifications, "notifications");
        keep_or_log(&mut ancillary.subscriptions, subscriptions, "subscriptions");
        keep_or_log(&mut ancillary.s2_queries, s2_queries, "s2-queries");
        keep_or_log(&mut ancillary.crawl_keywords, crawl_keywords, "crawl-keywords");
    }

    pub async fn reload_notifications(&self) {
        let result = self.resources.unread_notifications().await;
        let mut ancillary = self.ancillary.lock().unwrap_or_else(|p| p.into_inner());
        keep_or_log(&mut ancillary.notifications, result, "notifications");
    }

    /// Mark a notification read and drop it from the unread list.
    pub async fn mark_notification_read(&self, id: i64) -> Result<()> {
        self.resources.mark_notification_read(id).await?;
        self.ancillary
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .notifications
            .retain(|n| n.id != id);
        Ok(())
    }
}

fn keep_or_log<T>(slot: &mut Vec<T>, result: std::result::Result<Vec<T>, ClientError>, what: &str) {
    match result {
        Ok(items) => *slot = items,
        Err(err) => warn!(resource = what, error = %err, "Failed to load ancillary list"),
    }
}
