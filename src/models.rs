//! Data models for streamed news records and the collections built from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsRecord`]: One news item as streamed by the crawl server
//! - [`Collection`]: The ordered, deduplicated working set (newest first)
//! - [`DailySnapshot`]: The persisted, day-stamped copy of a collection
//! - [`CrawlRequest`]: The body sent to the server to start a stream
//!
//! Field names are snake_case on the wire, matching the server's schema.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Sources the crawl server knows how to fetch.
pub const DEFAULT_SOURCES: [&str; 2] = ["vnexpress", "vietnamnet"];

/// One news item as delivered by the crawl server.
///
/// Only `title`, `body` and `source` are required on the wire; everything
/// else defaults to empty or absent. See [`crate::ingest::codec`] for the
/// parsing rules and the identity key used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsRecord {
    /// The article headline.
    pub title: String,
    /// The full article text.
    pub body: String,
    /// Source identifier, e.g. `"vnexpress"` or `"vietnamnet"`.
    pub source: String,
    /// Canonical article URL, when the crawler captured one.
    #[serde(default)]
    pub url: Option<String>,
    /// Publication time as formatted by the server (free-form text).
    #[serde(default)]
    pub published_at: Option<String>,
    /// Model-generated summary. May be empty.
    #[serde(default)]
    pub summary: String,
    /// Category derived from the article URL. May be empty or `"unknown"`.
    #[serde(default)]
    pub category: String,
}

/// An ordered sequence of records, newest-observed first.
///
/// New records are only ever prepended, so the relative order of records
/// already present never changes. Deduplication is enforced by
/// [`crate::ingest::merge`], which is the only code that grows a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Collection {
    items: VecDeque<NewsRecord>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NewsRecord> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&NewsRecord> {
        self.items.front()
    }

    /// Prepend a record. Callers are responsible for the uniqueness check.
    pub(crate) fn prepend(&mut self, record: NewsRecord) {
        self.items.push_front(record);
    }
}

impl From<Vec<NewsRecord>> for Collection {
    /// Builds a collection from records already in newest-first order.
    fn from(items: Vec<NewsRecord>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a NewsRecord;
    type IntoIter = std::collections::vec_deque::Iter<'a, NewsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The single persisted copy of a collection, tagged with the local calendar
/// day (`YYYY-MM-DD`) on which it was written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailySnapshot {
    pub date: String,
    pub items: Collection,
}

/// Request body for the streaming crawl endpoint.
///
/// `force_new` asks the server to crawl live instead of replaying what it
/// already stored today. `force_refresh` would make the server re-run its
/// models on every article and is always `false` from this client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrawlRequest {
    pub sources: Vec<String>,
    pub limit: u32,
    pub force_new: bool,
    pub force_refresh: bool,
}

impl CrawlRequest {
    /// Build a request, falling back to [`DEFAULT_SOURCES`] when no source is selected.
    pub fn new(sources: &[String], limit: u32, force_new: bool) -> Self {
        let sources = if sources.is_empty() {
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            sources.to_vec()
        };
        Self {
            sources,
            limit,
            force_new,
            force_refresh: false,
        }
    }
}

/// Response body of the `available_dates` history endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvailableDates {
    pub dates: Vec<String>,
}

#[cfg(test)]
pub(crate) fn record(title: &str, source: &str, url: Option<&str>) -> NewsRecord {
    NewsRecord {
        title: title.to_string(),
        body: format!("body of {title}"),
        source: source.to_string(),
        url: url.map(str::to_string),
        published_at: None,
        summary: String::new(),
        category: String::new(),
    }
}
