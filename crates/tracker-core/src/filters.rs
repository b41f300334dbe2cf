//! Per-category filter records.
//!
//! A filter record is created with defaults when a category is initialized
//! and mutated by user interaction for the rest of the session. Empty strings
//! mean "not set"; the query builder omits them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::{Category, TextField};
use crate::defaults;
use crate::error::{Error, Result};

/// Filters for the papers tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperFilters {
    /// arXiv category such as `cs.CV`.
    pub category: String,
    pub search: String,
    pub days: u32,
    pub conference_days: u32,
    /// `arxiv`, `openreview` or `s2`.
    pub source: String,
    pub author: String,
    pub affiliation: String,
    pub keyword: String,
    pub tag: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub min_citations: Option<u32>,
}

impl Default for PaperFilters {
    fn default() -> Self {
        Self {
            category: String::new(),
            search: String::new(),
            days: defaults::PAPER_DAYS,
            conference_days: defaults::CONFERENCE_DAYS,
            source: String::new(),
            author: String::new(),
            affiliation: String::new(),
            keyword: String::new(),
            tag: String::new(),
            from_date: None,
            to_date: None,
            min_citations: None,
        }
    }
}

impl PaperFilters {
    /// Whether an explicit date range is set (either bound).
    pub fn has_date_range(&self) -> bool {
        self.from_date.is_some() || self.to_date.is_some()
    }
}

/// Sort order for the code tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSort {
    #[default]
    Created,
    Star,
}

/// Filters for the code tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFilters {
    /// Empty means every code platform.
    pub source: String,
    pub search: String,
    pub domain: String,
    pub tag: String,
    pub days: u32,
    pub sort: CodeSort,
}

impl Default for CodeFilters {
    fn default() -> Self {
        Self {
            source: String::new(),
            search: String::new(),
            domain: String::new(),
            tag: String::new(),
            days: defaults::CODE_DAYS,
            sort: CodeSort::Created,
        }
    }
}

/// Filters for the community tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityFilters {
    pub source: String,
    pub search: String,
    pub domain: String,
    pub tag: String,
    pub days: u32,
}

impl Default for CommunityFilters {
    fn default() -> Self {
        Self {
            source: String::new(),
            search: String::new(),
            domain: String::new(),
            tag: String::new(),
            days: defaults::COMMUNITY_DAYS,
        }
    }
}

/// Filters for the company tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFilters {
    /// Product direction such as `3d_gen` or `llm`.
    pub direction: String,
    pub company: String,
    pub search: String,
    pub tag: String,
    pub days: u32,
}

impl Default for CompanyFilters {
    fn default() -> Self {
        Self {
            direction: String::new(),
            company: String::new(),
            search: String::new(),
            tag: String::new(),
            days: defaults::COMPANY_DAYS,
        }
    }
}

/// Filter record of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tab", rename_all = "lowercase")]
pub enum FilterState {
    Papers(PaperFilters),
    Code(CodeFilters),
    Community(CommunityFilters),
    Company(CompanyFilters),
}

impl FilterState {
    /// Default filters for a category.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Papers => Self::Papers(PaperFilters::default()),
            Category::Code => Self::Code(CodeFilters::default()),
            Category::Community => Self::Community(CommunityFilters::default()),
            Category::Company => Self::Company(CompanyFilters::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Papers(_) => Category::Papers,
            Self::Code(_) => Category::Code,
            Self::Community(_) => Category::Community,
            Self::Company(_) => Category::Company,
        }
    }

    /// Current value of a debounced text field, if the category has it.
    pub fn text(&self, field: TextField) -> Option<&str> {
        match (self, field) {
            (Self::Papers(f), TextField::Search) => Some(&f.search),
            (Self::Papers(f), TextField::Author) => Some(&f.author),
            (Self::Papers(f), TextField::Affiliation) => Some(&f.affiliation),
            (Self::Papers(f), TextField::Keyword) => Some(&f.keyword),
            (Self::Code(f), TextField::Search) => Some(&f.search),
            (Self::Community(f), TextField::Search) => Some(&f.search),
            (Self::Company(f), TextField::Search) => Some(&f.search),
            _ => None,
        }
    }

    /// Set a text field. Fails if the category has no such field.
    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) -> Result<()> {
        let category = self.category();
        let slot = match (self, field) {
            (Self::Papers(f), TextField::Search) => &mut f.search,
            (Self::Papers(f), TextField::Author) => &mut f.author,
            (Self::Papers(f), TextField::Affiliation) => &mut f.affiliation,
            (Self::Papers(f), TextField::Keyword) => &mut f.keyword,
            (Self::Code(f), TextField::Search) => &mut f.search,
            (Self::Community(f), TextField::Search) => &mut f.search,
            (Self::Company(f), TextField::Search) => &mut f.search,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "{} has no {} filter",
                    category, field
                )))
            }
        };
        *slot = value.into();
        Ok(())
    }

    /// Copy of these filters with text fields replaced by settled values.
    ///
    /// Fields missing from `settled` keep their current value.
    pub fn with_settled_text(&self, settled: &BTreeMap<TextField, String>) -> Self {
        let mut effective = self.clone();
        for (field, value) in settled {
            // Fields foreign to this category are ignored.
            let _ = effective.set_text(*field, value.clone());
        }
        effective
    }

    /// Filters with every debounced field blanked, used to detect whether
    /// a change touched anything other than free text.
    pub fn without_text(&self) -> Self {
        let mut stripped = self.clone();
        for field in self.category().descriptor().debounced {
            let _ = stripped.set_text(*field, String::new());
        }
        stripped
    }
}
