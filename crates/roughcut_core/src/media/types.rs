//! Media types and errors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::RunError;

/// Video file extensions accepted during discovery (lowercase, no dot).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];

/// Still image file extensions accepted during discovery (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Kind of a source clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Video,
    Image,
}

impl MaterialKind {
    /// Classify a path by extension.
    ///
    /// Anything that is not a known video extension is treated as a still,
    /// which is how explicitly named files of unknown type get handled.
    pub fn classify(path: &Path) -> Self {
        if has_extension(path, VIDEO_EXTENSIONS) {
            MaterialKind::Video
        } else {
            MaterialKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Video => "video",
            MaterialKind::Image => "image",
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A described source clip. Ids are positions in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: usize,
    pub path: PathBuf,
    pub kind: MaterialKind,
    pub duration: f64,
    pub tags: Vec<String>,
    pub description: String,
}

impl MaterialRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Whether `path` has one of the known media extensions.
pub fn is_media(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS) || has_extension(path, IMAGE_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|known| e.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Errors from media tooling.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("{tool} reported success but produced no output at '{path}'")]
    MissingOutput { tool: String, path: PathBuf },
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
