//! HTTP access to the crawl server.
//!
//! The module uses a trait-based design so ingestion can be driven by any
//! chunk source:
//! - [`NewsTransport`]: opens the NDJSON stream for a [`CrawlRequest`]
//! - [`HttpTransport`]: the `reqwest` implementation used by the binary
//!
//! # Endpoints
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | POST | `/api/v1/news/crawl_today_stream` | one JSON record per line, chunked |
//! | GET | `/api/v1/news/by_date?date=YYYY-MM-DD` | stored records for a day |
//! | GET | `/api/v1/news/available_dates` | days that have stored records |
//!
//! Retries and backoff are left to the caller.

use crate::error::TransportError;
use crate::models::{AvailableDates, CrawlRequest, NewsRecord};
use bytes::Bytes;
use chrono::NaiveDate;
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, Response};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Raw body chunks in arrival order. Chunk boundaries are arbitrary.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Anything that can open a chunked record stream.
pub trait NewsTransport {
    /// Start a crawl and return its body as a chunk stream.
    ///
    /// A non-success status must be reported here, before any chunk is read.
    async fn open_stream(&self, request: &CrawlRequest) -> Result<ChunkStream, TransportError>;
}

/// [`NewsTransport`] over HTTP, plus the read-only history endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    stream_url: Url,
    by_date_url: Url,
    dates_url: Url,
}

impl HttpTransport {
    /// Build a transport for the server rooted at `base_url`.
    ///
    /// No request timeout is set: a crawl stream may legitimately stay open
    /// for minutes while the server summarizes articles.
    pub fn new(base_url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            stream_url: base.join("api/v1/news/crawl_today_stream")?,
            by_date_url: base.join("api/v1/news/by_date")?,
            dates_url: base.join("api/v1/news/available_dates")?,
        })
    }

    /// Records the server stored on `date`, newest first.
    #[instrument(level = "info", skip_all, fields(%date))]
    pub async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<NewsRecord>, TransportError> {
        let t0 = Instant::now();
        let mut url = self.by_date_url.clone();
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y-%m-%d").to_string());

        let response = check_status(self.client.get(url).send().await?)?;
        let records: Vec<NewsRecord> = response.json().await?;
        info!(
            count = records.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched stored records"
        );
        Ok(records)
    }

    /// Days (`YYYY-MM-DD`, newest first) that have stored records.
    #[instrument(level = "info", skip_all)]
    pub async fn available_dates(&self) -> Result<Vec<String>, TransportError> {
        let response = check_status(self.client.get(self.dates_url.clone()).send().await?)?;
        let body: AvailableDates = response.json().await?;
        debug!(count = body.dates.len(), "Fetched available dates");
        Ok(body.dates)
    }
}

impl NewsTransport for HttpTransport {
    #[instrument(level = "info", skip_all, fields(sources = ?request.sources, force_new = request.force_new))]
    async fn open_stream(&self, request: &CrawlRequest) -> Result<ChunkStream, TransportError> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(self.stream_url.clone())
            .json(request)
            .send()
            .await?;
        let response = check_status(response)?;
        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            "Crawl stream opened"
        );

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Stream(e.to_string())));
        Ok(Box::pin(chunks))
    }
}

fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(%status, url = %response.url(), "Server returned non-success status");
        Err(TransportError::Status(status))
    }
}
