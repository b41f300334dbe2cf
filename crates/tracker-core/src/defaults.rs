//! Centralized default constants for research-tracker.
//!
//! **This module is the single source of truth** for shared default values.
//! The client, the relay, and the CLI reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by domain area.

// =============================================================================
// BACKEND
// =============================================================================

/// Backend origin used when no configuration source is set.
pub const BACKEND_URL: &str = "http://localhost:8000";

/// Relay origin used by the client when proxying is enabled.
pub const RELAY_URL: &str = "http://localhost:3000";

/// Mount point of the relay route on the relay origin.
pub const RELAY_PREFIX: &str = "/api/proxy";

/// Health endpoint used for warm-up probes.
pub const HEALTH_PATH: &str = "/api/health";

// =============================================================================
// RETRY SESSION
// =============================================================================

/// Maximum primary calls in one retry session (first attempt included).
pub const MAX_ATTEMPTS: u32 = 7;

/// Fixed delay between attempts in seconds.
pub const RETRY_DELAY_SECS: u64 = 15;

/// Per-call timeout for reads in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 90;

/// Timeout for a single warm-up probe in seconds.
pub const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Timeout for crawl/refresh triggers in seconds (10 minutes).
pub const REFRESH_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// RELAY
// =============================================================================

/// Hard per-call timeout applied by the relay in seconds.
pub const RELAY_TIMEOUT_SECS: u64 = 90;

/// Default relay listen port.
pub const RELAY_PORT: u16 = 3000;

/// Default relay listen host.
pub const RELAY_HOST: &str = "0.0.0.0";

/// Content type reported when the upstream response carries none.
pub const RELAY_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// FILTERS
// =============================================================================

/// Quiet period for free-text inputs in milliseconds.
pub const DEBOUNCE_MS: u64 = 300;

/// Default relative window for papers (days).
pub const PAPER_DAYS: u32 = 15;

/// Default relative window for conference papers (days).
pub const CONFERENCE_DAYS: u32 = 365;

/// Default relative window for community posts (days).
pub const COMMUNITY_DAYS: u32 = 7;

/// Default relative window for code posts (days).
pub const CODE_DAYS: u32 = 365;

/// Default relative window for company posts (days).
pub const COMPANY_DAYS: u32 = 365;

/// Page size requested for papers.
pub const PAPER_LIMIT: u32 = 100;

/// Page size requested for posts.
pub const POST_LIMIT: u32 = 200;

/// Code refresh sends `days` only below this window.
pub const CODE_REFRESH_MAX_DAYS: u32 = 365;

/// Window used by the company crawl trigger (days).
pub const COMPANY_REFRESH_DAYS: u32 = 90;

/// Platform sources queried by the code tab when no source is selected.
pub const CODE_SOURCES: &[&str] = &["github", "huggingface"];

/// Tags naming a code platform rather than a topic; never sent to the code crawl.
pub const CODE_PLATFORM_TAGS: &[&str] = &["GitHub", "Hugging Face"];

// =============================================================================
// ANCILLARY
// =============================================================================

/// Number of unread notifications fetched for the header badge.
pub const NOTIFICATION_LIMIT: u32 = 20;

/// Maximum crawl errors quoted in the company empty-result hint.
pub const COMPANY_ERROR_PREVIEW: usize = 3;
