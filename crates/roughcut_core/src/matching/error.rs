//! Match validation errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    /// The top-level value was not an array of candidates.
    #[error("Expected a list of matches, got {found}")]
    NotAList { found: &'static str },
}

pub type MatchResult<T> = Result<T, MatchError>;
