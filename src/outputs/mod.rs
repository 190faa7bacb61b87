//! Everything the ingestion core exposes outward.
//!
//! # Submodules
//!
//! - [`snapshot`]: persists the day-stamped collection and restores it on cold start
//! - [`feed`]: the live collection, run status and run triggers for the presentation layer
//! - [`view`]: source/category/search filtering and paging of the collection
//! - [`render`]: turns a page into text for the terminal
//!
//! # On Disk
//!
//! ```text
//! cache_dir/
//! └── fastnews_daily_cache_v1.json   # { "date": "2025-11-28", "items": [...] }
//! ```

pub mod feed;
pub mod render;
pub mod snapshot;
pub mod view;
