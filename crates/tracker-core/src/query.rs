//! Query building: filter records to canonical query strings.
//!
//! Building is a pure function of the filter record. Rules shared by every
//! category:
//!
//! - empty text fields are omitted, never sent as `key=`
//! - numeric fields are rendered as decimal strings
//! - an explicit date range suppresses the relative day windows
//! - multi-valued fields repeat the key (`source=github&source=huggingface`)

use std::fmt;

use tracing::trace;

use crate::category::Category;
use crate::defaults;
use crate::filters::{
    CodeFilters, CodeSort, CommunityFilters, CompanyFilters, FilterState, PaperFilters,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ordered key/value pairs destined for a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pairs: Vec<(String, String)>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair unconditionally.
    pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.to_string(), value.into()));
        self
    }

    /// Append a pair only when `value` is non-empty after trimming.
    pub fn push_text(&mut self, key: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() {
            self.push(key, value);
        }
        self
    }

    /// Append a decimal number.
    pub fn push_number(&mut self, key: &str, value: impl Into<u64>) -> &mut Self {
        self.push(key, value.into().to_string())
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn keys(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Percent-encoded `k=v&k=v` string (no leading `?`).
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `path` with this query appended, or `path` alone when empty.
    pub fn append_to(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.to_query_string())
        }
    }

    /// Parse a query string back into pairs. Accepts an optional leading `?`
    /// and `+` for spaces. Undecodable pairs are kept raw.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (k, v) = part.split_once('=').unwrap_or((part, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();
        Self { pairs }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QuerySpec {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Anything that projects to a read query.
pub trait BuildQuery {
    fn build_query(&self) -> QuerySpec;
}

impl BuildQuery for PaperFilters {
    fn build_query(&self) -> QuerySpec {
        let mut q = QuerySpec::new();
        q.push_text("category", &self.category)
            .push_text("search", &self.search)
            .push_text("tag", &self.tag);
        if !self.has_date_range() {
            q.push_number("days", self.days)
                .push_number("conference_days", self.conference_days);
        }
        if let Some(from) = self.from_date {
            q.push("from_date", from.format(DATE_FORMAT).to_string());
        }
        if let Some(to) = self.to_date {
            q.push("to_date", to.format(DATE_FORMAT).to_string());
        }
        q.push_text("source", &self.source)
            .push_text("author", &self.author)
            .push_text("affiliation", &self.affiliation)
            .push_text("keyword", &self.keyword);
        if let Some(min) = self.min_citations {
            q.push_number("min_citations", min);
        }
        q.push_number("limit", defaults::PAPER_LIMIT);
        q
    }
}

impl BuildQuery for CodeFilters {
    fn build_query(&self) -> QuerySpec {
        let mut q = QuerySpec::new();
        if self.source.trim().is_empty() {
            for source in defaults::CODE_SOURCES {
                q.push("source", *source);
            }
        } else {
            q.push("source", self.source.as_str());
        }
        q.push_text("search", &self.search)
            .push_text("domain", &self.domain)
            .push_text("tag", &self.tag)
            .push_number("days", self.days);
        if self.sort == CodeSort::Star {
            q.push("sort", "star");
        }
        q.push_number("limit", defaults::POST_LIMIT);
        q
    }
}

impl BuildQuery for CommunityFilters {
    fn build_query(&self) -> QuerySpec {
        let mut q = QuerySpec::new();
        q.push_text("source", &self.source)
            .push_text("search", &self.search)
            .push_text("domain", &self.domain)
            .push_text("tag", &self.tag)
            .push_number("days", self.days)
            .push_number("limit", defaults::POST_LIMIT);
        q
    }
}

impl BuildQuery for CompanyFilters {
    fn build_query(&self) -> QuerySpec {
        let mut q = QuerySpec::new();
        q.push("source", "company")
            .push_text("direction", &self.direction)
            .push_text("company", &self.company)
            .push_text("search", &self.search)
            .push_text("tag", &self.tag)
            .push_number("days", self.days)
            .push_number("limit", defaults::POST_LIMIT);
        q
    }
}

impl BuildQuery for FilterState {
    fn build_query(&self) -> QuerySpec {
        let query = match self {
            FilterState::Papers(f) => f.build_query(),
            FilterState::Code(f) => f.build_query(),
            FilterState::Community(f) => f.build_query(),
            FilterState::Company(f) => f.build_query(),
        };
        trace!(category = %self.category(), query = %query, "Built read query");
        query
    }
}

/// Build the read query for a filter record.
pub fn build(filters: &FilterState) -> QuerySpec {
    filters.build_query()
}

/// Build the query for a category's crawl trigger.
///
/// Crawls take a narrower parameter set than reads: papers and community
/// send their window and tag, code drops platform tags and the "all time"
/// window, and the company crawl always uses a fixed window.
pub fn build_refresh(filters: &FilterState) -> QuerySpec {
    let mut q = QuerySpec::new();
    match filters {
        FilterState::Papers(f) => {
            q.push_number("days", f.days).push_text("tag", &f.tag);
        }
        FilterState::Community(f) => {
            q.push_number("days", f.days)
                .push_text("tag", &f.tag)
                .push_text("source", &f.source);
        }
        FilterState::Code(f) => {
            if f.days < defaults::CODE_REFRESH_MAX_DAYS {
                q.push_number("days", f.days);
            }
            if !defaults::CODE_PLATFORM_TAGS.contains(&f.tag.as_str()) {
                q.push_text("tag", &f.tag);
            }
        }
        FilterState::Company(_) => {
            q.push_number("days", defaults::COMPANY_REFRESH_DAYS);
        }
    }
    q
}

/// Read path (endpoint plus query) for a filter record.
pub fn read_path(filters: &FilterState) -> String {
    let descriptor = Category::descriptor(&filters.category());
    build(filters).append_to(descriptor.endpoint)
}
