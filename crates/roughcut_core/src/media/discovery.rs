//! Material discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::types::is_media;

/// Collect material files from a mix of files and directories.
///
/// Directories are walked recursively and only files with a known media
/// extension are taken. Files named explicitly are always kept. The result
/// is absolute, de-duplicated and sorted; `limit` of 0 means no limit.
pub fn collect_material_files(inputs: &[PathBuf], limit: usize) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry under {}: {}", input.display(), e);
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_media(entry.path()) {
                    found.insert(absolute(entry.path()));
                }
            }
        } else if input.is_file() {
            found.insert(absolute(input));
        } else {
            tracing::warn!("Material input does not exist: {}", input.display());
        }
    }

    let mut files: Vec<PathBuf> = found.into_iter().collect();
    if limit > 0 && files.len() > limit {
        tracing::debug!("Limiting materials from {} to {}", files.len(), limit);
        files.truncate(limit);
    }
    files
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
