//! Structured-data extraction errors.

use thiserror::Error;

/// Why a structured value could not be recovered from model text.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The response was empty after trimming.
    #[error("Model response is empty")]
    Empty,

    /// No `{` or `[` appears in the chosen candidate text.
    #[error("No opening bracket found in model response")]
    NoOpeningBracket,

    /// Brackets were still open when the text ended.
    #[error("Unterminated structure starting at byte {start} ({depth} bracket(s) left open)")]
    Unterminated { start: usize, depth: usize },

    /// A balanced span was found but it is not valid JSON, and neither is
    /// the whole candidate text.
    #[error("Failed to parse structured value: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
