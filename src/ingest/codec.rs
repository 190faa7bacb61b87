//! Line-level record decoding and identity keys.
//!
//! Each frame from the stream is one JSON object. Only `title`, `body` and
//! `source` are required; the rest default to empty or absent.

use crate::error::ParseFailure;
use crate::models::NewsRecord;
use serde::Deserialize;

/// Wire shape with every field optional, so that a missing required field is
/// reported as [`ParseFailure::MissingField`] rather than a generic decode error.
#[derive(Debug, Deserialize)]
struct WireRecord {
    title: Option<String>,
    body: Option<String>,
    source: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Parse one frame into a [`NewsRecord`].
///
/// Leading and trailing whitespace is ignored. A failure here only drops
/// this frame; callers keep processing the stream.
pub fn parse_line(line: &str) -> Result<NewsRecord, ParseFailure> {
    let wire: WireRecord = serde_json::from_str(line.trim())?;

    Ok(NewsRecord {
        title: wire.title.ok_or(ParseFailure::MissingField("title"))?,
        body: wire.body.ok_or(ParseFailure::MissingField("body"))?,
        source: wire.source.ok_or(ParseFailure::MissingField("source"))?,
        url: wire.url,
        published_at: wire.published_at,
        summary: wire.summary.unwrap_or_default(),
        category: wire.category.unwrap_or_default(),
    })
}

/// The deduplication key of a record: its URL when non-empty, otherwise
/// `"{source}__{title}"`.
///
/// URLs are compared verbatim. No case folding or trailing-slash handling.
pub fn identity_key(record: &NewsRecord) -> String {
    match record.url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => format!("{}__{}", record.source, record.title),
    }
}
