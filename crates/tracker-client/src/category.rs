//! Category state machine.
//!
//! One [`CategoryController`] per content category. It owns the category's
//! filter record, one debouncer per free-text field, and the load state:
//!
//! ```text
//! Idle ──load──▶ Loading ──▶ Loaded(items)
//!                   ▲   └──▶ Failed(final error)
//!                   └── reload (filter settled, refresh, first activation)
//! ```
//!
//! Every load runs as its own task under a fresh retry session. Starting a
//! new load aborts the previous one, including any pending retry delay, so
//! a stale response can never overwrite a newer one. Dropping the
//! controller aborts everything it spawned.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use tracker_core::query::read_path;
use tracker_core::{Category, Debouncer, FilterState, Items, Paper, Post, TextField};

use crate::error::{ClientError, FinalError, Result};
use crate::orchestrator::FetchOrchestrator;
use crate::refresh::{empty_result_hint, RefreshOutcome, RefreshTrigger};
use crate::task::TaskHandle;
use crate::transport::ApiRequest;

/// Load state of a category.
#[derive(Debug, Clone, Default)]
pub enum CategoryLoadState {
    #[default]
    Idle,
    Loading,
    Loaded(Items),
    Failed(FinalError),
}

impl CategoryLoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn items(&self) -> Option<&Items> {
        match self {
            Self::Loaded(items) => Some(items),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FinalError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
            Self::Failed(_) => "failed",
        }
    }
}

struct Inner {
    category: Category,
    orchestrator: Arc<FetchOrchestrator>,
    /// Filters as last edited, text fields included.
    filters: Mutex<FilterState>,
    /// Text values that survived the debounce window.
    settled: Mutex<BTreeMap<TextField, String>>,
    state: watch::Sender<CategoryLoadState>,
    in_flight: Mutex<Option<TaskHandle>>,
    generation: AtomicU64,
    started: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State stays consistent across a panicking holder; keep going.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Inner {
    fn effective_filters(&self) -> FilterState {
        lock(&self.filters).with_settled_text(&lock(&self.settled))
    }

    fn start_load(self: &Arc<Self>) {
        self.started.store(true, Ordering::SeqCst);
        let filters = self.effective_filters();
        let request = ApiRequest::get(read_path(&filters));

        // Bump and publish under the watch lock so `finish` never sees the
        // new generation paired with the old state.
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = CategoryLoadState::Loading;
        });
        debug!(category = %self.category, query = %request.path, generation, "Starting load");

        let inner = Arc::clone(self);
        let task = TaskHandle::spawn(async move {
            let result = match inner.category {
                Category::Papers => inner
                    .orchestrator
                    .load::<Vec<Paper>>(&request)
                    .await
                    .map(Items::Papers),
                _ => inner
                    .orchestrator
                    .load::<Vec<Post>>(&request)
                    .await
                    .map(Items::Posts),
            };
            inner.finish(generation, result);
        });

        if let Some(previous) = lock(&self.in_flight).replace(task) {
            if !previous.is_finished() {
                debug!(category = %self.category, "Superseding in-flight load");
            }
            previous.cancel();
        }
    }

    fn finish(&self, generation: u64, result: std::result::Result<Items, FinalError>) {
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = match result {
                Ok(items) => {
                    info!(category = %self.category, item_count = items.len(), "Category loaded");
                    CategoryLoadState::Loaded(items)
                }
                Err(err) => {
                    warn!(
                        category = %self.category,
                        attempts = err.attempts,
                        kind = %err.kind,
                        "Category load failed"
                    );
                    CategoryLoadState::Failed(err)
                }
            };
            true
        });
        if !applied {
            debug!(category = %self.category, generation, "Discarding superseded load result");
        }
    }

    fn cancel_in_flight(&self) {
        if let Some(task) = lock(&self.in_flight).take() {
            task.cancel();
        }
    }
}

/// Filters, debouncers and load state of one category.
pub struct CategoryController {
    inner: Arc<Inner>,
    refresh: RefreshTrigger,
    debouncers: BTreeMap<TextField, Debouncer<String>>,
    _settle_listener: TaskHandle,
}

impl CategoryController {
    /// Create a controller with default filters. Must be called within a
    /// tokio runtime; nothing is loaded until [`load`](Self::load) or
    /// [`activate`](Self::activate).
    pub fn new(
        category: Category,
        orchestrator: Arc<FetchOrchestrator>,
        refresh: RefreshTrigger,
        debounce: Duration,
    ) -> Self {
        Self::with_filters(FilterState::for_category(category), orchestrator, refresh, debounce)
    }

    pub fn with_filters(
        filters: FilterState,
        orchestrator: Arc<FetchOrchestrator>,
        refresh: RefreshTrigger,
        debounce: Duration,
    ) -> Self {
        let category = filters.category();
        let (sink, mut settled_rx) = mpsc::unbounded_channel::<(TextField, String)>();

        let mut settled = BTreeMap::new();
        let mut debouncers = BTreeMap::new();
        for field in category.descriptor().debounced {
            let initial = filters.text(*field).unwrap_or_default().to_string();
            settled.insert(*field, initial.clone());
            let field = *field;
            debouncers.insert(
                field,
                Debouncer::spawn_into(initial, debounce, sink.clone(), move |v| (field, v)),
            );
        }
        drop(sink);

        let (state, _) = watch::channel(CategoryLoadState::Idle);
        let inner = Arc::new(Inner {
            category,
            orchestrator,
            filters: Mutex::new(filters),
            settled: Mutex::new(settled),
            state,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            started: AtomicBool::new(false),
        });

        let listener_inner = Arc::clone(&inner);
        let settle_listener = TaskHandle::spawn(async move {
            while let Some((field, value)) = settled_rx.recv().await {
                {
                    let mut settled = lock(&listener_inner.settled);
                    // Already committed directly.
                    if settled.get(&field) == Some(&value) {
                        continue;
                    }
                    settled.insert(field, value);
                }
                debug!(category = %listener_inner.category, field = %field, "Filter text settled");
                listener_inner.start_load();
            }
        });

        Self {
            inner,
            refresh,
            debouncers,
            _settle_listener: settle_listener,
        }
    }

    pub fn category(&self) -> Category {
        self.inner.category
    }

    /// Current load state.
    pub fn state(&self) -> CategoryLoadState {
        self.inner.state.borrow().clone()
    }

    /// Watch load state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CategoryLoadState> {
        self.inner.state.subscribe()
    }

    /// Filters as last edited.
    pub fn filters(&self) -> FilterState {
        lock(&self.inner.filters).clone()
    }

    /// Filters the next load will query with (settled text only).
    pub fn effective_filters(&self) -> FilterState {
        self.inner.effective_filters()
    }

    /// Whether a load has ever been started.
    pub fn has_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Edit the filters.
    ///
    /// Non-text changes reload immediately; text changes go through their
    /// debouncer and reload once settled.
    pub fn update_filters<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut FilterState),
    {
        let (non_text_changed, text_changes) = {
            let mut filters = lock(&self.inner.filters);
            let before = filters.clone();
            let mut after = before.clone();
            edit(&mut after);
            if after.category() != self.inner.category {
                return Err(ClientError::InvalidInput(format!(
                    "filters for {} cannot be applied to {}",
                    after.category(),
                    self.inner.category
                )));
            }

            let text_changes: Vec<(TextField, String)> = self
                .debouncers
                .keys()
                .filter_map(|field| {
                    let new = after.text(*field)?;
                    (before.text(*field) != Some(new)).then(|| (*field, new.to_string()))
                })
                .collect();
            let non_text_changed = before.without_text() != after.without_text();
            *filters = after;
            (non_text_changed, text_changes)
        };

        for (field, value) in text_changes {
            if let Some(debouncer) = self.debouncers.get(&field) {
                debouncer.update(value);
            }
        }
        if non_text_changed {
            self.inner.start_load();
        }
        Ok(())
    }

    /// Edit the filters and settle text fields at once, without loading.
    ///
    /// For callers that submit a complete filter set (a command line, a
    /// form submit) rather than keystrokes.
    pub fn commit_filters<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut FilterState),
    {
        let committed = {
            let mut filters = lock(&self.inner.filters);
            let mut after = filters.clone();
            edit(&mut after);
            if after.category() != self.inner.category {
                return Err(ClientError::InvalidInput(format!(
                    "filters for {} cannot be applied to {}",
                    after.category(),
                    self.inner.category
                )));
            }
            *filters = after.clone();
            after
        };

        let mut settled = lock(&self.inner.settled);
        for (field, debouncer) in &self.debouncers {
            if let Some(value) = committed.text(*field) {
                settled.insert(*field, value.to_string());
                // Keeps the debouncer's own last value in step.
                debouncer.update(value.to_string());
            }
        }
        Ok(())
    }

    /// Set one free-text field; the reload happens after the quiet period.
    pub fn set_text(&self, field: TextField, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        // Reject fields this category does not have before touching state.
        self.filters().set_text(field, value.clone())?;
        self.update_filters(|filters| {
            let _ = filters.set_text(field, value);
        })
    }

    /// Start a load, superseding any in-flight one.
    pub fn load(&self) {
        self.inner.start_load();
    }

    /// Start a load and wait for it (or whatever supersedes it) to finish.
    pub async fn load_and_wait(&self) -> Result<CategoryLoadState> {
        let mut rx = self.subscribe();
        self.inner.start_load();
        let state = rx
            .wait_for(|s| !s.is_loading())
            .await
            .map_err(|_| ClientError::Cancelled)?;
        Ok(state.clone())
    }

    /// Load on first activation only.
    pub fn activate(&self) -> bool {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.start_load();
        true
    }

    /// Trigger a crawl, then reload.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let category = self.inner.category;
        let response = self.refresh.trigger(&self.effective_filters()).await?;
        let state = self.load_and_wait().await?;
        let item_count = state.items().map(Items::len);
        let added = response.added();

        let hint = (added == 0 && item_count == Some(0))
            .then(|| empty_result_hint(category, &response));
        if let Some(hint) = &hint {
            info!(category = %category, hint = %hint, "Crawl ran but found nothing");
        }

        Ok(RefreshOutcome {
            category,
            added,
            item_count,
            hint,
            response,
        })
    }

    /// Abort any in-flight load and pending retry.
    pub fn cancel(&self) {
        self.inner.cancel_in_flight();
        self.inner.state.send_if_modified(|state| {
            if state.is_loading() {
                *state = CategoryLoadState::Idle;
                true
            } else {
                false
            }
        });
    }
}

impl Drop for CategoryController {
    fn drop(&mut self) {
        // The load task holds the shared state, so abort it explicitly.
        self.inner.cancel_in_flight();
    }
}
