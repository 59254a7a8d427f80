//! Match record type.

use serde::{Deserialize, Serialize};

use super::transition::Transition;

/// One caption's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub caption_index: i64,
    /// Material id, or `None` for "no suitable material".
    pub material_id: Option<usize>,
    pub transition: Transition,
}
