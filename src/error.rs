//! Error types shared across ingestion, transport, and the feed boundary.
//!
//! Failures fall into three tiers:
//! - [`ParseFailure`]: one bad frame. Logged and skipped; the run continues.
//! - [`TransportError`]: the stream could not be opened or broke mid-read.
//!   Ends the run as failed; records merged so far are kept.
//! - [`FeedError`]: what the presentation boundary sees for a run request.
//!
//! Snapshot cache failures have no type here; they never leave the cache module.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("frame is not a valid record payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(StatusCode),
    #[error("stream aborted: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("an ingestion run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
