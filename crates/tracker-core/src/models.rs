//! Records returned by the backend.
//!
//! The backend owns these shapes; fields the dashboard does not rely on are
//! optional so that older or newer backends still deserialize. Only `id`
//! and the timestamp are guaranteed; the backend emits `null` for any other
//! column it has no value for.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A research paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub arxiv_url: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub affiliations: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// A community, code, or company activity post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Payload of a category load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Items {
    Papers(Vec<Paper>),
    Posts(Vec<Post>),
}

impl Items {
    /// Number of records in the payload.
    pub fn len(&self) -> usize {
        match self {
            Items::Papers(p) => p.len(),
            Items::Posts(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Subscription kinds accepted by `/api/subscriptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Keyword,
    Author,
    Affiliation,
    Category,
}

impl std::fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Author => write!(f, "author"),
            Self::Affiliation => write!(f, "affiliation"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// A notification subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub active: i64,
    pub created_at: String,
}

/// A notification raised by a subscription match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: i64,
    pub paper_id: String,
    #[serde(default)]
    pub subscription_id: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    pub read: i64,
    pub created_at: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub arxiv_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A saved Semantic Scholar query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S2Query {
    pub id: i64,
    pub query: String,
    pub active: i64,
    pub created_at: String,
}

/// Scope a crawl keyword applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrawlScope {
    #[default]
    Papers,
    Community,
    Company,
    All,
}

/// A keyword that widens backend crawls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlKeyword {
    pub id: i64,
    pub keyword: String,
    pub scope: String,
    pub active: i64,
    pub created_at: String,
}

/// Body returned by the refresh/crawl endpoints.
///
/// Papers report `papers_added`, post crawls report `posts_added`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub papers_added: Option<u64>,
    #[serde(default)]
    pub posts_added: Option<u64>,
    #[serde(default)]
    pub notifications_added: Option<u64>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RefreshResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Items the crawl reported as added, whichever counter is present.
    pub fn added(&self) -> u64 {
        self.papers_added.or(self.posts_added).unwrap_or(0)
    }
}

/// Body returned by `/api/backfill-tags`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub papers_updated: u64,
}
