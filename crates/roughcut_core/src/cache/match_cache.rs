//! Persisted matching result, reused for identical requests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::matching::MatchRecord;

use super::error::CacheResult;
use super::store;

pub const MATCH_CACHE_FILE: &str = "srt_matches.json";

/// Hex SHA-256 of the exact request payload.
pub fn request_fingerprint(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMatches {
    request_hash: String,
    matches: Vec<MatchRecord>,
}

/// The `srt_matches.json` file in a cache directory.
#[derive(Debug, Clone)]
pub struct MatchCache {
    path: PathBuf,
}

impl MatchCache {
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(MATCH_CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored matches, if they were produced for `request_hash`.
    pub fn lookup(&self, request_hash: &str) -> Option<Vec<MatchRecord>> {
        let stored: StoredMatches = store::read_json(&self.path)?;
        if stored.request_hash == request_hash {
            Some(stored.matches)
        } else {
            tracing::debug!("Match cache is for a different request, ignoring");
            None
        }
    }

    pub fn store(&self, request_hash: &str, matches: &[MatchRecord]) -> CacheResult<()> {
        store::write_json(
            &self.path,
            &StoredMatches {
                request_hash: request_hash.to_string(),
                matches: matches.to_vec(),
            },
        )
    }
}
