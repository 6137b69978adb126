//! Catalog filter and pagination state.

use common::CategoryId;
use serde::{Deserialize, Serialize};

/// Courses shown per catalog page.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Course length buckets offered by the catalog filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationFilter {
    #[serde(rename = "0-5")]
    UpToFive,
    #[serde(rename = "5-10")]
    FiveToTen,
    #[serde(rename = "10+")]
    TenPlus,
}

impl DurationFilter {
    /// All buckets in display order.
    pub const ALL: [DurationFilter; 3] = [
        DurationFilter::UpToFive,
        DurationFilter::FiveToTen,
        DurationFilter::TenPlus,
    ];

    /// Query-string value understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationFilter::UpToFive => "0-5",
            DurationFilter::FiveToTen => "5-10",
            DurationFilter::TenPlus => "10+",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DurationFilter::UpToFive => "0-5 Hours",
            DurationFilter::FiveToTen => "5-10 Hours",
            DurationFilter::TenPlus => "10+ Hours",
        }
    }
}

impl std::fmt::Display for DurationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DurationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DurationFilter::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown duration filter '{s}', expected 0-5, 5-10 or 10+"))
    }
}

/// Filter state of a catalog view.
///
/// Changing any filter returns to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    page: u32,
    size: u32,
    category_id: Option<CategoryId>,
    keyword: Option<String>,
    duration: Option<DurationFilter>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            category_id: None,
            keyword: None,
            duration: None,
        }
    }
}

impl CatalogQuery {
    /// Creates a query for the first page with no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the page size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    /// Current page, starting at 1.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn duration(&self) -> Option<DurationFilter> {
        self.duration
    }

    /// Sets the category filter.
    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.page = 1;
        self.category_id = category_id;
    }

    /// Sets the keyword filter. Blank keywords clear the filter.
    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.page = 1;
        let keyword = keyword.into();
        let trimmed = keyword.trim();
        self.keyword = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Sets the duration filter.
    pub fn set_duration(&mut self, duration: Option<DurationFilter>) {
        self.page = 1;
        self.duration = duration;
    }

    /// Clears every filter.
    pub fn clear_filters(&mut self) {
        self.page = 1;
        self.category_id = None;
        self.keyword = None;
        self.duration = None;
    }

    /// Moves to `page` if it lies within `1..=total_pages`.
    ///
    /// Returns false and leaves the page unchanged otherwise.
    pub fn go_to_page(&mut self, page: u32, total_pages: u32) -> bool {
        if page >= 1 && page <= total_pages.max(1) {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Query-string pairs in the order the backend expects.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(category_id) = self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        if let Some(duration) = self.duration {
            pairs.push(("duration", duration.as_str().to_string()));
        }
        pairs
    }
}

/// Page-number window for a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page, starting at 1.
    pub current: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(current: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current: current.clamp(1, total_pages),
            total_pages,
        }
    }

    /// Up to `max_shown` consecutive page numbers centred on the current page.
    pub fn window(&self, max_shown: u32) -> Vec<u32> {
        let max_shown = max_shown.max(1);
        let half = max_shown / 2;
        let mut start = self.current.saturating_sub(half).max(1);
        let mut end = (self.current + half).min(self.total_pages);

        if end - start + 1 < max_shown {
            if start > 1 {
                start = (end + 1).saturating_sub(max_shown).max(1);
            } else if end < self.total_pages {
                end = (start + max_shown - 1).min(self.total_pages);
            }
        }
        (start..=end).collect()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }
}
