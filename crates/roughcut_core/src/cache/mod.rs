//! On-disk caches.
//!
//! - [`FingerprintCache`]: per-material analysis keyed by absolute path and
//!   modification time, flushed after every store.
//! - [`MatchCache`]: the last matching result with a digest of its request.
//!
//! All files are pretty JSON, rewritten whole via temp file and rename.

mod error;
mod fingerprint;
mod match_cache;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use fingerprint::{
    modification_time, AnalysisRecord, CacheEntry, FingerprintCache, ANALYSIS_CACHE_FILE,
};
pub use match_cache::{request_fingerprint, MatchCache, MATCH_CACHE_FILE};
