//! # tracker-core
//!
//! Core types and pure logic for research-tracker.
//!
//! This crate provides the data shared by the client and the relay:
//! categories and their filter records, the query builder, the debounce
//! controller, backend records, configuration resolution, and the error type.
//!
//! ## Logging
//!
//! Both binaries log through `tracing` with the same structured field names:
//! `category`, `target_url`, `attempt`, `status`, `duration_ms`,
//! `item_count`, `added`, `error`.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, retry scheduled, fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, built queries, settled inputs |
//! | TRACE | Per-item data, response bodies |

pub mod category;
pub mod config;
pub mod debounce;
pub mod defaults;
pub mod error;
pub mod filters;
pub mod models;
pub mod query;

// Re-export commonly used types at crate root
pub use category::{Category, CategoryDescriptor, TextField};
pub use config::{BackendOrigin, BackendSource};
pub use debounce::Debouncer;
pub use error::{Error, Result};
pub use filters::{
    CodeFilters, CodeSort, CommunityFilters, CompanyFilters, FilterState, PaperFilters,
};
pub use models::*;
pub use query::{BuildQuery, QuerySpec};
