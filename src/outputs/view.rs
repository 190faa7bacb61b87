//! Filtering and paging over a collection, without copying records.

use crate::models::{Collection, DEFAULT_SOURCES, NewsRecord};

/// Records per page.
pub const PAGE_SIZE: usize = 10;

/// Which records the reader wants to see.
///
/// - `sources`: the enabled sources. A record from one of the
///   [`DEFAULT_SOURCES`] is hidden unless its source is enabled; records
///   from any other source are always shown.
/// - `categories`: empty means every category.
/// - `search`: case-insensitive substring over title, summary and body.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub sources: Vec<String>,
    pub categories: Vec<String>,
    pub search: String,
}

impl FeedFilter {
    pub fn matches(&self, record: &NewsRecord) -> bool {
        let source = record.source.to_lowercase();
        if DEFAULT_SOURCES.contains(&source.as_str())
            && !self.sources.iter().any(|s| s.eq_ignore_ascii_case(&source))
        {
            return false;
        }

        if !self.categories.is_empty() {
            let category = record.category.trim();
            if category.is_empty() || !self.categories.iter().any(|c| c == category) {
                return false;
            }
        }

        let term = self.search.trim().to_lowercase();
        if !term.is_empty() {
            let combined = format!("{} {} {}", record.title, record.summary, record.body);
            if !combined.to_lowercase().contains(&term) {
                return false;
            }
        }

        true
    }

    /// Matching records, in collection order.
    pub fn apply<'a>(&self, collection: &'a Collection) -> Vec<&'a NewsRecord> {
        collection.iter().filter(|r| self.matches(r)).collect()
    }
}

/// One page of filtered records.
#[derive(Debug, Clone)]
pub struct FeedPage<'a> {
    pub records: Vec<&'a NewsRecord>,
    /// 1-based, already clamped into `1..=total_pages`.
    pub page: usize,
    /// At least 1, even when nothing matched.
    pub total_pages: usize,
    pub total_matches: usize,
}

/// Slice `matches` into the requested page, clamping out-of-range pages.
pub fn paginate<'a>(matches: &[&'a NewsRecord], page: usize, page_size: usize) -> FeedPage<'a> {
    let page_size = page_size.max(1);
    let total_pages = matches.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;

    FeedPage {
        records: matches.iter().skip(start).take(page_size).copied().collect(),
        page,
        total_pages,
        total_matches: matches.len(),
    }
}
