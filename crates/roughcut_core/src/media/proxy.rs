//! Visual proxies handed to the descriptive model.
//!
//! Videos get a contact sheet under `storyboards/`, stills are copied into
//! `media/` so the model can read them from inside its allowed directories.
//! Both are named by a digest of path and modification time, so an edited
//! source gets a fresh proxy and an unchanged one is reused.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::tools::MediaTools;
use super::types::{MaterialKind, MediaError, MediaResult};

pub const STORYBOARD_DIR: &str = "storyboards";
pub const MEDIA_DIR: &str = "media";

/// Hex SHA-256 of the path and modification time.
pub fn proxy_key(path: &Path, modification_time: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(modification_time.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Produce (or reuse) the proxy image for a material.
pub fn visual_proxy(
    tools: &dyn MediaTools,
    cache_dir: &Path,
    path: &Path,
    kind: MaterialKind,
    modification_time: f64,
) -> MediaResult<PathBuf> {
    let key = proxy_key(path, modification_time);

    match kind {
        MaterialKind::Video => {
            let out = cache_dir.join(STORYBOARD_DIR).join(format!("{}.jpg", key));
            if out.exists() {
                tracing::debug!("Reusing storyboard {}", out.display());
            } else {
                tools.storyboard(path, &out)?;
            }
            Ok(out)
        }
        MaterialKind::Image => {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_ascii_lowercase()))
                .unwrap_or_default();
            let dir = cache_dir.join(MEDIA_DIR);
            let out = dir.join(format!("{}{}", key, ext));
            if !out.exists() {
                fs::create_dir_all(&dir).map_err(|e| MediaError::CreateDir {
                    path: dir.clone(),
                    source: e,
                })?;
                fs::copy(path, &out).map_err(|e| MediaError::Copy {
                    from: path.to_path_buf(),
                    to: out.clone(),
                    source: e,
                })?;
            }
            Ok(out)
        }
    }
}
