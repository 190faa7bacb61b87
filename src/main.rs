//! # Fast News Feed
//!
//! A terminal client for a news crawl server. It streams newline-delimited
//! JSON records, deduplicates them against what it already has, and keeps a
//! one-per-day snapshot so that restarting on the same day is instant.
//!
//! ## Usage
//!
//! ```sh
//! fast_news_feed --refresh -s vnexpress --category "Thể thao"
//! ```
//!
//! ## Architecture
//!
//! 1. **Cold start**: restore today's snapshot, or stream what the server stored today
//! 2. **Refresh** (optional): stream a live crawl and merge only new records
//! 3. **Snapshot**: written once at the end of each successful run
//! 4. **Output**: filter, page and render the collection to stdout

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod error;
mod ingest;
mod models;
mod outputs;
mod utils;

use api::HttpTransport;
use error::FeedError;
use cli::Cli;
use models::Collection;
use outputs::feed::{Bootstrap, NewsFeed};
use outputs::render::{render_page, status_line};
use outputs::snapshot::SnapshotCache;
use outputs::view::{FeedFilter, PAGE_SIZE, paginate};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fast_news_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let transport = HttpTransport::new(&args.server_url)?;
    let view_filter = FeedFilter {
        sources: args.sources.clone(),
        categories: args.categories.clone(),
        search: args.search.clone().unwrap_or_default(),
    };

    // ---- History mode: read-only, never touches the snapshot ----
    if args.list_dates {
        for date in transport.available_dates().await? {
            println!("{date}");
        }
        return Ok(());
    }

    if let Some(date) = args.history_date {
        let records = transport.fetch_by_date(date).await?;
        let collection = Collection::from(records);
        let matches = view_filter.apply(&collection);
        let page = paginate(&matches, args.page, PAGE_SIZE);
        print!("{}", render_page(&format!("News from {date}"), &page));
        return Ok(());
    }

    // ---- Snapshot cache ----
    let cache = match ensure_writable_dir(Path::new(&args.cache_dir)).await {
        Ok(()) => SnapshotCache::new(&args.cache_dir),
        Err(e) => {
            warn!(
                path = %args.cache_dir,
                error = %e,
                "Cache directory is not writable; continuing without a snapshot"
            );
            SnapshotCache::disabled()
        }
    };

    let feed = NewsFeed::new(transport, cache, args.limit);
    feed.set_sources(args.sources.clone());

    let mut updates = feed.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            debug!(count = state.collection.len(), status = ?state.status, "Feed updated");
        }
    });

    // ---- Cold start ----
    let mut last_error = None;
    let bootstrap = feed.bootstrap().await;
    if let Err(e) = &bootstrap {
        error!(error = %e, "Initial load failed");
    }
    match settle(&mut last_error, bootstrap) {
        Some(Bootstrap::Restored { count }) => info!(count, "Loaded feed from today's snapshot"),
        Some(Bootstrap::Fetched(report)) => {
            info!(added = report.added, "Loaded feed from the server")
        }
        None => {}
    }

    // ---- Live refresh ----
    if args.refresh {
        let refresh = feed.refresh().await;
        if let Err(e) = &refresh {
            error!(error = %e, "Refresh failed");
        }
        if let Some(report) = settle(&mut last_error, refresh) {
            info!(
                added = report.added,
                duplicates = report.duplicates,
                skipped = report.skipped_frames,
                "Refresh completed"
            );
        }
    }

    // ---- Output ----
    let state = feed.current();
    if let Some(line) = status_line(&state.status) {
        println!("{line}\n");
    }
    let matches = view_filter.apply(&state.collection);
    let page = paginate(&matches, args.page, PAGE_SIZE);
    let heading = format!("News for {}", Local::now().date_naive());
    print!("{}", render_page(&heading, &page));

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total = state.collection.len(),
        shown = page.records.len(),
        "Execution complete"
    );

    match last_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Keep the outcome of the latest run only: a success clears an earlier failure.
fn settle<R>(last_error: &mut Option<FeedError>, outcome: Result<R, FeedError>) -> Option<R> {
    match outcome {
        Ok(value) => {
            *last_error = None;
            Some(value)
        }
        Err(e) => {
            *last_error = Some(e);
            None
        }
    }
}
