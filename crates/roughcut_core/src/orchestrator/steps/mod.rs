//! Pipeline step implementations.

mod captions;
mod describe;
mod discover;
mod matching;

pub use captions::CaptionsStep;
pub use describe::{DescribeStep, MaterialDescription, ANALYSIS_RAW_FILE};
pub use discover::DiscoverStep;
pub use matching::{MatchStep, MATCH_RAW_FILE};
