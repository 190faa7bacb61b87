//! The live feed handed to the presentation layer.
//!
//! [`NewsFeed`] owns the current collection and status and publishes both
//! through a `tokio::sync::watch` channel. Every change is an atomic replace
//! of the whole [`FeedState`]; readers hold an `Arc` to an immutable
//! collection and never mutate it.
//!
//! At most one ingestion run is active at a time. A run requested while
//! another is in flight is rejected with [`FeedError::RunInProgress`].

use crate::api::NewsTransport;
use crate::error::FeedError;
use crate::ingest::session::{CollectionObserver, IngestionSession, RunReport};
use crate::models::{Collection, CrawlRequest, DEFAULT_SOURCES};
use crate::outputs::snapshot::SnapshotStore;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Completed { added: usize },
    Failed { message: String },
}

/// What a subscriber sees.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub collection: Arc<Collection>,
    pub status: FeedStatus,
    /// Added-count of the last completed run, if any.
    pub last_added: Option<usize>,
}

/// How [`NewsFeed::bootstrap`] obtained its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// Today's snapshot was used; no network call was made.
    Restored { count: usize },
    /// The server was asked for what it already stored today.
    Fetched(RunReport),
}

pub const RETRY_MESSAGE: &str = "Could not load news. Please try again.";

pub struct NewsFeed<T, S> {
    transport: T,
    store: S,
    limit: u32,
    sources: Mutex<Vec<String>>,
    state: watch::Sender<FeedState>,
    run_gate: tokio::sync::Mutex<()>,
}

impl<T, S> NewsFeed<T, S>
where
    T: NewsTransport,
    S: SnapshotStore,
{
    /// A feed requesting [`DEFAULT_SOURCES`] until [`NewsFeed::set_sources`] says otherwise.
    pub fn new(transport: T, store: S, limit: u32) -> Self {
        let initial = FeedState {
            collection: Arc::new(Collection::new()),
            status: FeedStatus::Idle,
            last_added: None,
        };
        let (state, _) = watch::channel(initial);
        Self {
            transport,
            store,
            limit,
            sources: Mutex::new(DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()),
            state,
            run_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn current(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Switch which sources the next run requests.
    pub fn set_sources(&self, sources: Vec<String>) {
        if let Ok(mut current) = self.sources.lock() {
            info!(?sources, "Source selection changed");
            *current = sources;
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Cold start: today's snapshot if it has records, otherwise ask the
    /// server for what it already stored (`force_new = false`).
    #[instrument(level = "info", skip_all)]
    pub async fn bootstrap(&self) -> Result<Bootstrap, FeedError> {
        let _gate = self.run_gate.try_lock().map_err(|_| FeedError::RunInProgress)?;

        if let Some(cached) = self.store.read().await {
            if !cached.is_empty() {
                let count = cached.len();
                self.state.send_modify(|state| {
                    state.collection = Arc::new(cached);
                    state.status = FeedStatus::Idle;
                });
                info!(count, "Restored today's snapshot");
                return Ok(Bootstrap::Restored { count });
            }
        }

        self.run_locked(false).await.map(Bootstrap::Fetched)
    }

    /// Ask the server for a live crawl (`force_new = true`) and merge
    /// whatever is new into the current collection.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh(&self) -> Result<RunReport, FeedError> {
        let _gate = self.run_gate.try_lock().map_err(|_| FeedError::RunInProgress)?;
        self.run_locked(true).await
    }

    /// Caller must hold `run_gate`.
    async fn run_locked(&self, force_new: bool) -> Result<RunReport, FeedError> {
        let request = CrawlRequest::new(&self.sources(), self.limit, force_new);
        let existing = Collection::clone(&self.state.borrow().collection);

        self.state.send_modify(|state| state.status = FeedStatus::Loading);
        let loading = LoadingGuard(&self.state);

        let session = IngestionSession::new(request, existing);
        let publisher = StatePublisher(&self.state);
        let (collection, result) = session.run(&self.transport, &self.store, &publisher).await;

        let outcome = match result {
            Ok(report) => {
                self.state.send_modify(|state| {
                    state.collection = Arc::new(collection);
                    state.status = FeedStatus::Completed { added: report.added };
                    state.last_added = Some(report.added);
                });
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Ingestion run failed");
                self.state.send_modify(|state| {
                    state.collection = Arc::new(collection);
                    state.status = FeedStatus::Failed {
                        message: RETRY_MESSAGE.to_string(),
                    };
                });
                Err(e.into())
            }
        };
        drop(loading);
        outcome
    }
}

/// Forwards every collection change of a run to the watch channel.
struct StatePublisher<'a>(&'a watch::Sender<FeedState>);

impl CollectionObserver for StatePublisher<'_> {
    fn collection_replaced(&self, collection: &Collection) {
        let next = Arc::new(collection.clone());
        self.0.send_modify(|state| state.collection = next);
    }
}

/// Puts a status stuck at `Loading` back to `Idle` when a run is dropped
/// before finishing.
struct LoadingGuard<'a>(&'a watch::Sender<FeedState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| {
            if state.status == FeedStatus::Loading {
                state.status = FeedStatus::Idle;
                true
            } else {
                false
            }
        });
    }
}
