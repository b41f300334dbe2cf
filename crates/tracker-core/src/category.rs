//! Content categories and their static descriptors.
//!
//! Every category shares one load/retry design; what differs is captured
//! here: which endpoint it reads, which endpoint crawls it, which inputs are
//! debounced, and what to say when a crawl comes back empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the four independent content groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Papers,
    Code,
    Community,
    Company,
}

impl Category {
    /// All categories in tab order.
    pub const ALL: [Category; 4] = [
        Category::Papers,
        Category::Code,
        Category::Community,
        Category::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Papers => "papers",
            Self::Code => "code",
            Self::Community => "community",
            Self::Company => "company",
        }
    }

    /// Static descriptor for this category.
    pub fn descriptor(&self) -> &'static CategoryDescriptor {
        match self {
            Self::Papers => &PAPERS,
            Self::Code => &CODE,
            Self::Community => &COMMUNITY,
            Self::Company => &COMPANY,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "papers" | "paper" => Ok(Self::Papers),
            "code" => Ok(Self::Code),
            "community" | "posts" => Ok(Self::Community),
            "company" => Ok(Self::Company),
            other => Err(Error::InvalidInput(format!("unknown category: {}", other))),
        }
    }
}

/// Free-text filter inputs that go through a debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextField {
    Search,
    Author,
    Affiliation,
    Keyword,
}

impl TextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Author => "author",
            Self::Affiliation => "affiliation",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static, per-category parameters of the shared load design.
#[derive(Debug)]
pub struct CategoryDescriptor {
    pub category: Category,
    /// Read endpoint (relative to the backend base).
    pub endpoint: &'static str,
    /// Crawl endpoint triggered by an explicit refresh.
    pub refresh_endpoint: &'static str,
    /// Inputs that are debounced before reaching the query.
    pub debounced: &'static [TextField],
    /// Shown when a crawl added nothing and the reload is empty.
    pub empty_refresh_hint: &'static str,
}

static PAPERS: CategoryDescriptor = CategoryDescriptor {
    category: Category::Papers,
    endpoint: "/api/papers",
    refresh_endpoint: "/api/refresh",
    debounced: &[
        TextField::Search,
        TextField::Author,
        TextField::Affiliation,
        TextField::Keyword,
    ],
    empty_refresh_hint: "Crawl finished but found no papers. arXiv may be unreachable from the backend network.",
};

static CODE: CategoryDescriptor = CategoryDescriptor {
    category: Category::Code,
    endpoint: "/api/posts",
    refresh_endpoint: "/api/refresh-code",
    debounced: &[TextField::Search],
    empty_refresh_hint: "Crawl finished but found nothing. GitHub/Hugging Face may be unreachable; check the backend network or proxy.",
};

static COMMUNITY: CategoryDescriptor = CategoryDescriptor {
    category: Category::Community,
    endpoint: "/api/posts",
    refresh_endpoint: "/api/refresh-posts",
    debounced: &[TextField::Search],
    empty_refresh_hint: "Crawl finished but found nothing. HN/Reddit/YouTube may be unreachable; check the backend network or proxy.",
};

static COMPANY: CategoryDescriptor = CategoryDescriptor {
    category: Category::Company,
    endpoint: "/api/posts",
    refresh_endpoint: "/api/refresh-company-posts",
    debounced: &[TextField::Search],
    empty_refresh_hint: "Crawl finished but found nothing. Google News may be unreachable; check the backend network or set HTTPS_PROXY.",
};
