//! Plain-text rendering of a feed page for the terminal.
//!
//! Output is Markdown-flavoured so it reads fine raw or piped into a pager
//! that understands Markdown:
//!
//! ```text
//! # Today's news (page 1/3, 24 articles)
//!
//! Categories on this page: Kinh doanh (2), Thể thao (1)
//!
//! ## Giá vàng tăng <small>`vnexpress`</small>
//! *Kinh doanh* · Thứ hai, 01/12/2025, 08:00 (GMT+7)
//!
//! Vàng SJC lên đỉnh...
//!
//! <https://vnexpress.net/...>
//! ```

use crate::models::NewsRecord;
use crate::outputs::feed::FeedStatus;
use crate::outputs::view::FeedPage;
use crate::utils::excerpt;
use std::collections::BTreeMap;

/// Body excerpt length used when a record has no summary.
const BODY_EXCERPT_CHARS: usize = 280;

/// Render one page under `heading`.
pub fn render_page(heading: &str, page: &FeedPage<'_>) -> String {
    let mut out = format!(
        "# {} (page {}/{}, {} articles)\n\n",
        heading, page.page, page.total_pages, page.total_matches
    );

    if page.records.is_empty() {
        out.push_str("No articles match the current filters.\n");
        return out;
    }

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &page.records {
        *by_category.entry(category_label(record)).or_insert(0) += 1;
    }
    let summary = by_category
        .iter()
        .map(|(category, count)| format!("{category} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("Categories on this page: {summary}\n\n"));

    for record in &page.records {
        out.push_str(&render_record(record));
        out.push('\n');
    }
    out
}

fn render_record(record: &NewsRecord) -> String {
    let mut out = format!("## {} <small>`{}`</small>\n", record.title, record.source);

    let mut meta = format!("*{}*", category_label(record));
    if let Some(published) = record.published_at.as_deref().filter(|p| !p.is_empty()) {
        meta.push_str(" · ");
        meta.push_str(published);
    }
    out.push_str(&meta);
    out.push_str("\n\n");

    let text = if record.summary.trim().is_empty() {
        excerpt(record.body.trim(), BODY_EXCERPT_CHARS)
    } else {
        record.summary.trim().to_string()
    };
    if !text.is_empty() {
        out.push_str(&text);
        out.push_str("\n\n");
    }

    if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("<{url}>\n"));
    }
    out
}

fn category_label(record: &NewsRecord) -> &str {
    match record.category.trim() {
        "" => "unknown",
        category => category,
    }
}

/// One-line status for the last run, or `None` when there is nothing to say.
pub fn status_line(status: &FeedStatus) -> Option<String> {
    match status {
        FeedStatus::Idle => None,
        FeedStatus::Loading => Some("Loading...".to_string()),
        FeedStatus::Completed { added: 0 } => {
            Some("No new articles (they may already be in the feed)".to_string())
        }
        FeedStatus::Completed { added } => Some(format!("Added {added} new articles")),
        FeedStatus::Failed { message } => Some(message.clone()),
    }
}
