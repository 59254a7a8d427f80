//! Durable JSON files written atomically.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{CacheError, CacheResult};

/// Write `value` as pretty JSON via a temp file and rename.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CacheResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_text(path, &json)
}

/// Write `content` via a temp file and rename, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> CacheResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    fs::write(temp_path, content).map_err(|e| CacheError::write(temp_path, e))?;
    fs::rename(temp_path, path).map_err(|e| CacheError::write(path, e))?;
    Ok(())
}

/// Read a JSON file, returning `None` when it is missing or unreadable.
///
/// A corrupt file is logged and treated like a missing one; it will be
/// overwritten by the next write.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
            None
        }
    }
}
