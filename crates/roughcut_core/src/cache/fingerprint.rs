//! Per-file analysis cache keyed by absolute path and modification time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::media::MaterialKind;

use super::error::CacheResult;
use super::store;

/// Cache file name inside the cache directory.
pub const ANALYSIS_CACHE_FILE: &str = "material_analysis.json";

/// What the descriptive phase learned about one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub kind: MaterialKind,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "desc")]
    pub description: String,
    /// Proxy image the model looked at, if one was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_image: Option<PathBuf>,
}

/// Stored record plus the freshness key it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Compared exactly, so it must reload bit for bit (serde_json is built
    /// with `float_roundtrip`).
    #[serde(rename = "mtime")]
    pub modification_time: f64,
    #[serde(flatten)]
    pub record: AnalysisRecord,
}

/// Modification time of `path` in seconds since the epoch, 0.0 if unknown.
pub fn modification_time(path: &Path) -> f64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Path-keyed analysis cache, written through on every store.
///
/// Loaded once per run. Entries are superseded when the freshness key
/// changes, never removed.
#[derive(Debug)]
pub struct FingerprintCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl FingerprintCache {
    /// Load the cache at `path`. A missing or corrupt file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries: BTreeMap<String, CacheEntry> = store::read_json(&path).unwrap_or_default();
        tracing::debug!("Loaded {} cache entries from {}", entries.len(), path.display());
        Self { path, entries }
    }

    /// Cache at the default location inside `cache_dir`.
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::load(cache_dir.join(ANALYSIS_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(&key_for(path))
    }

    /// Return the cached record for `path`, or compute and persist a new one.
    ///
    /// `probe` yields the current freshness key. On a hit (not forced, key
    /// unchanged) the stored record is returned and `compute` is never
    /// called. On a miss `compute` receives the stored entry, if any, and
    /// the result is flushed to disk before returning.
    pub fn get_or_compute<P, C>(
        &mut self,
        path: &Path,
        probe: P,
        compute: C,
        force: bool,
    ) -> CacheResult<AnalysisRecord>
    where
        P: FnOnce(&Path) -> f64,
        C: FnOnce(Option<&CacheEntry>) -> AnalysisRecord,
    {
        let key = key_for(path);
        let modification_time = probe(path);

        let previous = self.entries.get(&key);
        if let Some(entry) = previous {
            if !force && entry.modification_time == modification_time {
                tracing::debug!("Cache hit: {}", key);
                return Ok(entry.record.clone());
            }
        }

        tracing::debug!("Cache miss: {} (forced: {})", key, force);
        let record = compute(previous);
        self.entries.insert(
            key,
            CacheEntry {
                modification_time,
                record: record.clone(),
            },
        );
        self.flush()?;
        Ok(record)
    }

    /// Rewrite the whole mapping to disk.
    pub fn flush(&self) -> CacheResult<()> {
        store::write_json(&self.path, &self.entries)
    }
}

fn key_for(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    fn record(desc: &str) -> AnalysisRecord {
        AnalysisRecord {
            kind: MaterialKind::Image,
            duration: 0.0,
            tags: vec!["beach".to_string()],
            description: desc.to_string(),
            vision_image: None,
        }
    }

    #[test]
    fn computes_once_for_unchanged_file() {
        let dir = tempdir().unwrap();
        let mut cache = FingerprintCache::in_dir(dir.path());
        let calls = Cell::new(0);
        let material = Path::new("/media/a.png");

        for _ in 0..2 {
            let got = cache
                .get_or_compute(
                    material,
                    |_| 42.0,
                    |_| {
                        calls.set(calls.get() + 1);
                        record("first")
                    },
                    false,
                )
                .unwrap();
            assert_eq!(got.description, "first");
        }

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recomputes_when_modified_or_forced() {
        let dir = tempdir().unwrap();
        let mut cache = FingerprintCache::in_dir(dir.path());
        let material = Path::new("/media/a.png");

        cache
            .get_or_compute(material, |_| 1.0, |_| record("v1"), false)
            .unwrap();
        let changed = cache
            .get_or_compute(material, |_| 2.0, |prev| {
                assert_eq!(prev.unwrap().modification_time, 1.0);
                record("v2")
            }, false)
            .unwrap();
        assert_eq!(changed.description, "v2");

        let forced = cache
            .get_or_compute(material, |_| 2.0, |_| record("v3"), true)
            .unwrap();
        assert_eq!(forced.description, "v3");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn writes_through_and_reloads() {
        let dir = tempdir().unwrap();
        let material = Path::new("/media/b.mp4");
        {
            let mut cache = FingerprintCache::in_dir(dir.path());
            cache
                .get_or_compute(material, |_| 7.5, |_| record("saved"), false)
                .unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join(ANALYSIS_CACHE_FILE)).unwrap();
        assert!(raw.contains("\"mtime\": 7.5"));
        assert!(raw.contains("\"desc\": \"saved\""));

        let reloaded = FingerprintCache::in_dir(dir.path());
        let entry = reloaded.get(material).unwrap();
        assert_eq!(entry.modification_time, 7.5);
        assert_eq!(entry.record.description, "saved");
    }

    #[test]
    fn nanosecond_mtimes_survive_reload() {
        let dir = tempdir().unwrap();
        let mut mtimes: Vec<f64> = (0..500u64)
            .map(|i| {
                let nanos = ((i * 2_654_435_761) % 1_000_000_000) as u32;
                std::time::Duration::new(1_700_000_000 + i * 7919, nanos).as_secs_f64()
            })
            .collect();
        mtimes.push(1_700_007_919.654_435_9);

        {
            let mut cache = FingerprintCache::in_dir(dir.path());
            for (i, mtime) in mtimes.iter().enumerate() {
                let material = PathBuf::from(format!("/media/{}.mp4", i));
                cache
                    .get_or_compute(&material, |_| *mtime, |_| record("stored"), false)
                    .unwrap();
            }
        }

        let mut reloaded = FingerprintCache::in_dir(dir.path());
        assert_eq!(reloaded.len(), mtimes.len());
        for (i, mtime) in mtimes.iter().enumerate() {
            let material = PathBuf::from(format!("/media/{}.mp4", i));
            let got = reloaded
                .get_or_compute(
                    &material,
                    |_| *mtime,
                    |_| panic!("recomputed {} (mtime {})", i, mtime),
                    false,
                )
                .unwrap();
            assert_eq!(got.description, "stored");
        }
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(ANALYSIS_CACHE_FILE), "{not json").unwrap();

        let cache = FingerprintCache::in_dir(dir.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn modification_time_of_missing_file_is_zero() {
        assert_eq!(modification_time(Path::new("/no/such/file")), 0.0);
    }
}
