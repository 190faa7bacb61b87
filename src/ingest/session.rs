//! One ingestion run, from opening the stream to the snapshot write.
//!
//! ```text
//! Idle -> Streaming -> Draining -> Completed
//!            |            |
//!            +------------+--> Failed
//! ```
//!
//! The session owns the working collection, the identity keys seen this run,
//! and the partial-line buffer, so independent sessions never share state.
//! Chunks are handled strictly in arrival order on the calling task; the only
//! suspension point is waiting for the next chunk.
//!
//! Dropping a run mid-stream keeps whatever observers were already shown and
//! skips the snapshot write.

use crate::api::NewsTransport;
use crate::error::TransportError;
use crate::ingest::codec::parse_line;
use crate::ingest::frames::{FrameAssembler, Utf8Decoder};
use crate::ingest::merge::{offer, seed_keys};
use crate::models::{Collection, CrawlRequest};
use crate::outputs::snapshot::SnapshotStore;
use crate::utils::truncate_for_log;
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Draining,
    Completed,
    Failed,
}

/// Receives the whole collection each time a run changes it.
///
/// Implementations must treat the value as a read-only copy.
pub trait CollectionObserver {
    fn collection_replaced(&self, collection: &Collection);
}

impl CollectionObserver for () {
    fn collection_replaced(&self, _collection: &Collection) {}
}

/// Counters for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records newly inserted.
    pub added: usize,
    /// Well-formed records rejected as already present.
    pub duplicates: usize,
    /// Frames that failed to parse.
    pub skipped_frames: usize,
}

#[derive(Debug)]
pub struct IngestionSession {
    state: SessionState,
    request: CrawlRequest,
    collection: Collection,
    session_keys: HashSet<String>,
    decoder: Utf8Decoder,
    assembler: FrameAssembler,
    report: RunReport,
}

impl IngestionSession {
    /// A session that will dedupe against `existing` and grow a copy of it.
    pub fn new(request: CrawlRequest, existing: Collection) -> Self {
        Self {
            state: SessionState::Idle,
            request,
            collection: existing,
            session_keys: HashSet::new(),
            decoder: Utf8Decoder::new(),
            assembler: FrameAssembler::new(),
            report: RunReport::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Run to completion or failure.
    ///
    /// Always hands back the collection: the full result on success, or
    /// everything merged before the failure. The snapshot is written once,
    /// and only on success.
    #[instrument(level = "info", skip_all, fields(sources = ?self.request.sources, force_new = self.request.force_new))]
    pub async fn run<T, S, O>(
        mut self,
        transport: &T,
        store: &S,
        observer: &O,
    ) -> (Collection, Result<RunReport, TransportError>)
    where
        T: NewsTransport,
        S: SnapshotStore,
        O: CollectionObserver,
    {
        let t0 = Instant::now();
        self.begin();

        let mut stream = match transport.open_stream(&self.request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(e),
        };

        let mut failure = None;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if self.push_chunk(&bytes) > 0 {
                        observer.collection_replaced(&self.collection);
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(stream);
        if let Some(e) = failure {
            return self.fail(e);
        }

        if self.drain() > 0 {
            observer.collection_replaced(&self.collection);
        }

        store.write(&self.collection).await;
        self.state = SessionState::Completed;
        info!(
            added = self.report.added,
            duplicates = self.report.duplicates,
            skipped_frames = self.report.skipped_frames,
            total = self.collection.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Ingestion run completed"
        );
        (self.collection, Ok(self.report))
    }

    /// Idle -> Streaming: seed the key set from the existing collection.
    fn begin(&mut self) {
        debug_assert_eq!(self.state, SessionState::Idle);
        self.session_keys = seed_keys(&self.collection);
        self.state = SessionState::Streaming;
        debug!(seeded = self.session_keys.len(), "Streaming started");
    }

    /// Feed one raw chunk. Returns how many records it inserted.
    fn push_chunk(&mut self, bytes: &[u8]) -> usize {
        debug_assert_eq!(self.state, SessionState::Streaming);
        let text = self.decoder.decode(bytes);
        let frames = self.assembler.push(&text);
        frames.iter().filter(|frame| self.process_frame(frame)).count()
    }

    /// Streaming -> Draining: flush the decoder and the pending tail.
    fn drain(&mut self) -> usize {
        self.state = SessionState::Draining;
        let tail = self.decoder.finish();
        let mut frames = self.assembler.push(&tail);
        frames.extend(self.assembler.flush());
        frames.iter().filter(|frame| self.process_frame(frame)).count()
    }

    fn process_frame(&mut self, frame: &str) -> bool {
        let record = match parse_line(frame) {
            Ok(record) => record,
            Err(e) => {
                self.report.skipped_frames += 1;
                warn!(error = %e, frame = %truncate_for_log(frame, 120), "Skipping malformed frame");
                return false;
            }
        };

        let title = record.title.clone();
        if offer(&mut self.collection, &mut self.session_keys, record) {
            self.report.added += 1;
            debug!(%title, "Record added");
            true
        } else {
            self.report.duplicates += 1;
            false
        }
    }

    fn fail(mut self, error: TransportError) -> (Collection, Result<RunReport, TransportError>) {
        self.state = SessionState::Failed;
        warn!(
            error = %error,
            added = self.report.added,
            pending_bytes = self.assembler.pending_len(),
            "Ingestion run failed; keeping records merged so far"
        );
        (self.collection, Err(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::models::record;
    use crate::outputs::snapshot::testing::MemoryStore;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lengths: Mutex<Vec<usize>>,
    }

    impl CollectionObserver for Recorder {
        fn collection_replaced(&self, collection: &Collection) {
            self.lengths.lock().unwrap().push(collection.len());
        }
    }

    fn request() -> CrawlRequest {
        CrawlRequest::new(&[], 999, false)
    }

    fn line(title: &str, source: &str, url: Option<&str>) -> String {
        let mut json = serde_json::to_string(&record(title, source, url)).unwrap();
        json.push('\n');
        json
    }

    #[tokio::test]
    async fn test_two_chunks_split_mid_record() {
        let transport = ScriptedTransport::with_chunks([
            r#"{"title":"A","body":"b","source":"vnexpress"}
{"title":"B""#,
            ",\"body\":\"c\",\"source\":\"vietnamnet\"}\n",
        ]);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &()).await;

        let report = result.unwrap();
        assert_eq!(report.added, 2);
        let titles: Vec<_> = collection.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_restored_url_is_not_reinserted() {
        let existing = Collection::from(vec![record("Old", "vnexpress", Some("http://x/1"))]);
        let transport = ScriptedTransport::with_chunks([line("New title", "vnexpress", Some("http://x/1"))]);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), existing);
        let (collection, result) = session.run(&transport, &store, &()).await;

        let report = result.unwrap();
        assert_eq!(report.added, 0);
        assert_eq!(report.duplicates, 1);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.first().unwrap().title, "Old");
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let mut body = String::from("not-json\n");
        body.push_str(&line("A", "vnexpress", None));
        let transport = ScriptedTransport::with_chunks([body]);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &()).await;

        let report = result.unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.skipped_frames, 1);
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_unterminated_last_record_is_ingested() {
        let transport = ScriptedTransport::with_chunks([
            line("A", "vnexpress", None),
            r#"{"title":"B","body":"c","source":"vnexpress"}"#.to_string(),
        ]);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &()).await;

        assert_eq!(result.unwrap().added, 2);
        assert_eq!(collection.first().unwrap().title, "B");
    }

    #[tokio::test]
    async fn test_single_snapshot_write_for_many_records() {
        let chunks: Vec<String> = (0..25)
            .map(|i| line(&format!("T{i}"), "vnexpress", None))
            .collect();
        let transport = ScriptedTransport::with_chunks(chunks);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &()).await;

        assert_eq!(result.unwrap().added, 25);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.stored.lock().unwrap().as_ref(), Some(&collection));
    }

    #[tokio::test]
    async fn test_empty_run_still_writes_once() {
        let transport = ScriptedTransport::with_chunks(Vec::<String>::new());
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (_, result) = session.run(&transport, &store, &()).await;

        assert_eq!(result.unwrap().added, 0);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_run() {
        let mut body = line("A", "vnexpress", Some("http://x/1"));
        body.push_str(&line("A again", "vietnamnet", Some("http://x/1")));
        body.push_str(&line("A", "vnexpress", Some("http://x/1")));
        let transport = ScriptedTransport::with_chunks([body]);
        let store = MemoryStore::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &()).await;

        let report = result.unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 2);
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_status_fails_without_write() {
        let transport = ScriptedTransport::failing_with(StatusCode::INTERNAL_SERVER_ERROR);
        let store = MemoryStore::default();
        let existing = Collection::from(vec![record("Old", "vnexpress", None)]);

        let session = IngestionSession::new(request(), existing.clone());
        let (collection, result) = session.run(&transport, &store, &()).await;

        assert!(matches!(
            result,
            Err(TransportError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        assert_eq!(collection, existing);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_mid_stream_abort_keeps_partial_results() {
        let transport = ScriptedTransport::with_chunks([line("A", "vnexpress", None), "{\"title\":\"B\"".to_string()])
            .then_abort("connection reset");
        let store = MemoryStore::default();
        let observer = Recorder::default();

        let session = IngestionSession::new(request(), Collection::new());
        let (collection, result) = session.run(&transport, &store, &observer).await;

        assert!(matches!(result, Err(TransportError::Stream(_))));
        assert_eq!(collection.len(), 1);
        assert_eq!(store.write_count(), 0);
        assert_eq!(*observer.lengths.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_observer_sees_each_growing_chunk() {
        let transport = ScriptedTransport::with_chunks([
            line("A", "vnexpress", None),
            line("A", "vnexpress", None),
            line("B", "vnexpress", None),
        ]);
        let store = MemoryStore::default();
        let observer = Recorder::default();

        let session = IngestionSession::new(request(), Collection::new());
        let _ = session.run(&transport, &store, &observer).await;

        assert_eq!(*observer.lengths.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_request_is_forwarded() {
        let transport = ScriptedTransport::with_chunks(Vec::<String>::new());
        let store = MemoryStore::default();
        let req = CrawlRequest::new(&["vietnamnet".to_string()], 50, true);

        let session = IngestionSession::new(req.clone(), Collection::new());
        let _ = session.run(&transport, &store, &()).await;

        assert_eq!(*transport.requests.lock().unwrap(), vec![req]);
    }

    #[test]
    fn test_state_transitions() {
        let mut session = IngestionSession::new(request(), Collection::new());
        assert_eq!(session.state(), SessionState::Idle);

        session.begin();
        assert_eq!(session.state(), SessionState::Streaming);

        assert_eq!(session.push_chunk(b"{\"title\":\"A\",\"body\":\"b\","), 0);
        assert_eq!(session.push_chunk(b"\"source\":\"vnexpress\"}"), 0);
        assert_eq!(session.drain(), 1);
        assert_eq!(session.state(), SessionState::Draining);
        assert_eq!(session.collection().len(), 1);
    }

    #[test]
    fn test_multibyte_title_split_across_chunks() {
        let line = line("Thời sự", "vnexpress", None);
        let bytes = line.as_bytes();
        let cut = line.find('ờ').unwrap() + 1;

        let mut session = IngestionSession::new(request(), Collection::new());
        session.begin();
        assert_eq!(session.push_chunk(&bytes[..cut]), 0);
        assert_eq!(session.push_chunk(&bytes[cut..]), 1);
        assert_eq!(session.collection().first().unwrap().title, "Thời sự");
    }
}
