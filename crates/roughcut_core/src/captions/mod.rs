//! Caption processing module.
//!
//! Parses numbered, time-coded caption blocks (SubRip style) into
//! [`CaptionSegment`]s and formats second values back into canonical
//! `HH:MM:SS,mmm` timestamps.
//!
//! # Components
//!
//! - **types**: [`CaptionSegment`]
//! - **parser**: lenient block parser that skips anything it does not recognize
//! - **writer**: timestamp formatting
//!
//! # Usage
//!
//! ```ignore
//! use roughcut_core::captions::{parse_file, format_timestamp};
//!
//! let captions = parse_file("voiceover.srt")?;
//! for caption in &captions {
//!     println!("{} {}", format_timestamp(caption.start), caption.text);
//! }
//! ```

mod error;
mod parser;
mod types;
mod writer;

use std::fs;
use std::path::Path;

pub use error::CaptionError;
pub use parser::{parse_srt, parse_timestamp, TIMING_SEPARATOR};
pub use types::CaptionSegment;
pub use writer::format_timestamp;

/// Read and parse a caption file from disk.
///
/// Malformed blocks are skipped by the parser; a file that yields no
/// segments at all is reported as [`CaptionError::NoSegments`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<CaptionSegment>, CaptionError> {
    let path = path.as_ref();

    let content =
        fs::read_to_string(path).map_err(|e| CaptionError::read(path.to_path_buf(), e))?;

    let segments = parse_srt(&content);
    if segments.is_empty() {
        return Err(CaptionError::NoSegments(path.to_path_buf()));
    }

    tracing::debug!("Parsed {} caption segments from {}", segments.len(), path.display());
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_file() {
        let content = "1\r\n00:00:01,000 --> 00:00:04,000\r\nHello, world!\r\n";

        let mut temp_file = NamedTempFile::with_suffix(".srt").unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let captions = parse_file(temp_file.path()).unwrap();
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "Hello, world!");
        assert_eq!(format_timestamp(captions[0].end), "00:00:04,000");
    }

    #[test]
    fn test_parse_file_without_segments() {
        let mut temp_file = NamedTempFile::with_suffix(".srt").unwrap();
        temp_file.write_all(b"just some notes\n").unwrap();

        let err = parse_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, CaptionError::NoSegments(_)));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("/definitely/not/here.srt").unwrap_err();
        assert!(matches!(err, CaptionError::ReadError { .. }));
    }
}
