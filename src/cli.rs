//! Command-line interface definitions for Fast News Feed.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection and cache settings can also come from environment variables.

use chrono::NaiveDate;
use clap::Parser;

/// Command-line arguments for the Fast News Feed client.
///
/// # Examples
///
/// ```sh
/// # Show today's feed (snapshot first, then the server)
/// fast_news_feed
///
/// # Ask the server for a live crawl and merge new articles
/// fast_news_feed --refresh
///
/// # Only sports from VnExpress, second page
/// fast_news_feed -s vnexpress --category "Thể thao" -p 2
///
/// # Browse what the server stored on a past day
/// fast_news_feed --history-date 2025-11-28
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the crawl server
    #[arg(short = 'u', long, env = "FASTNEWS_SERVER_URL", default_value = "http://localhost:8000")]
    pub server_url: String,

    /// Directory holding the daily snapshot
    #[arg(short, long, env = "FASTNEWS_CACHE_DIR", default_value = ".fastnews")]
    pub cache_dir: String,

    /// Source to request and show (repeatable)
    #[arg(short, long = "source", default_values = ["vnexpress", "vietnamnet"])]
    pub sources: Vec<String>,

    /// Maximum number of records to ask the server for
    #[arg(short, long, default_value_t = 999)]
    pub limit: u32,

    /// Request a live crawl after loading and merge anything new
    #[arg(short, long)]
    pub refresh: bool,

    /// Only show this category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Only show articles whose title, summary or body contains this text
    #[arg(long)]
    pub search: Option<String>,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Show what the server stored on this day (YYYY-MM-DD) instead of today's feed
    #[arg(long)]
    pub history_date: Option<NaiveDate>,

    /// List the days the server has stored news for
    #[arg(long)]
    pub list_dates: bool,
}
