//! Caption-to-material match validation and fallback.
//!
//! [`sanitize_matches`] turns whatever the model returned into records that
//! satisfy the structural rules; [`apply_fallback`] then guarantees a usable
//! timeline when the model assigned nothing at all.

mod error;
mod fallback;
mod sanitize;
mod transition;
mod types;

pub use error::{MatchError, MatchResult};
pub use fallback::{apply_fallback, needs_fallback};
pub use sanitize::{coerce_int, sanitize_matches, CAPTION_KEYS, MATERIAL_KEYS};
pub use transition::Transition;
pub use types::MatchRecord;
