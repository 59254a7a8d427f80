//! Caption error types.

use std::path::PathBuf;

/// Errors that can occur while loading captions.
///
/// Parsing itself never fails: unrecognized blocks are skipped and
/// unparseable timestamps degrade to `0.0`.
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    /// Failed to read caption file.
    #[error("Failed to read file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was readable but contained no caption blocks.
    #[error("No caption segments found in '{0}'")]
    NoSegments(PathBuf),
}

impl CaptionError {
    /// Create a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }
}
