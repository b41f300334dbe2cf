//! # tracker-client
//!
//! Asynchronous client for the research-tracker backend.
//!
//! - [`transport`]: the request seam, with a `reqwest` implementation
//! - [`orchestrator`]: retry sessions with warm-up probes
//! - [`category`]: per-category filters, debouncing and load state
//! - [`refresh`]: crawl triggers
//! - [`resources`]: notifications, subscriptions, saved queries, keywords
//! - [`dashboard`]: the four categories and ancillary lists together

pub mod category;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod orchestrator;
pub mod refresh;
pub mod resources;
pub mod task;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use category::{CategoryController, CategoryLoadState};
pub use config::{ClientConfig, RetryPolicy};
pub use dashboard::{Ancillary, Dashboard};
pub use error::{ClientError, FinalError, FinalErrorKind, Result};
pub use orchestrator::{AttemptOutcome, FetchOrchestrator, RequestAttempt, RetrySession};
pub use refresh::{RefreshOutcome, RefreshTrigger};
pub use resources::ResourceClient;
pub use task::TaskHandle;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
