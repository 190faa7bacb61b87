//! Streaming ingestion: from raw chunks to a deduplicated collection.
//!
//! # Submodules
//!
//! - [`codec`]: parses one line into a [`NewsRecord`](crate::models::NewsRecord)
//!   and derives its identity key
//! - [`frames`]: recovers complete lines from chunks split at arbitrary offsets
//! - [`merge`]: insert-or-skip merging that keeps one record per identity key
//! - [`session`]: drives one run and writes the snapshot when it completes
//!
//! # Data Flow
//!
//! ```text
//! chunk -> Utf8Decoder -> FrameAssembler -> parse_line -> offer -> Collection
//!                                                                    |
//!                                             end of stream -> SnapshotStore::write
//! ```

pub mod codec;
pub mod frames;
pub mod merge;
pub mod session;
