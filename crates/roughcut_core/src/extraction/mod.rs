//! Structured-data extraction from free-form model output.
//!
//! Model responses are natural language that is supposed to carry exactly
//! one JSON object or array, but in practice arrives wrapped in Markdown
//! fences, language hints and chatty preambles. This module recovers that
//! single value.
//!
//! # Algorithm
//!
//! 1. Trim; empty input is [`ExtractError::Empty`].
//! 2. If fences are present, pick the best fenced chunk (see [`fences`]).
//! 3. Scan for the first balanced `{...}`/`[...]` span (see [`scanner`]).
//! 4. Parse the span. If locating or parsing the span fails, try the whole
//!    candidate text before giving up.
//!
//! # Example
//!
//! ```
//! use roughcut_core::extraction::extract_structured;
//!
//! let value = extract_structured("Sure! {\"tags\": [\"a\"]} Anything else?").unwrap();
//! assert_eq!(value["tags"][0], "a");
//! ```

mod error;
pub mod fences;
pub mod scanner;

use serde_json::Value;

pub use error::{ExtractError, ExtractResult};

/// Extract the single structured value embedded in `text`.
///
/// When both the span and the full text fail, the span's failure is
/// reported.
pub fn extract_structured(text: &str) -> ExtractResult<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    let candidate = fences::select_candidate(text);

    match scanner::find_balanced_span(candidate) {
        Ok(span) => match serde_json::from_str(&candidate[span]) {
            Ok(value) => Ok(value),
            Err(span_err) => {
                tracing::trace!("Span did not parse ({}), trying full candidate", span_err);
                serde_json::from_str(candidate).map_err(|_| ExtractError::Parse(span_err))
            }
        },
        Err(scan_err) => {
            tracing::trace!("No usable span ({}), trying full candidate", scan_err);
            serde_json::from_str(candidate).map_err(|_| scan_err)
        }
    }
}

/// Human-readable head of a response for error messages and logs.
pub fn response_head(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let mut head: String = trimmed.chars().take(max_chars).collect();
    if trimmed.chars().count() > max_chars {
        head.push_str("...");
    }
    head
}
