//! Deterministic assignment when the model picked nothing.

use super::types::MatchRecord;

/// Whether the sanitized list should be replaced by the fallback.
///
/// True only for a non-empty list where every id is null while materials
/// exist. A model that deliberately left every caption empty is
/// indistinguishable from one that did not cooperate; both get filled.
pub fn needs_fallback(records: &[MatchRecord], material_count: usize) -> bool {
    material_count > 0
        && !records.is_empty()
        && records.iter().all(|r| r.material_id.is_none())
}

/// Assign materials by position if [`needs_fallback`] holds.
///
/// With reuse the ids cycle (`position % material_count`); without it each
/// material is used once and the remaining records stay null. Returns
/// whether anything was replaced.
pub fn apply_fallback(
    records: &mut [MatchRecord],
    material_count: usize,
    allow_reuse: bool,
) -> bool {
    if !needs_fallback(records, material_count) {
        return false;
    }

    tracing::info!(
        "No usable assignments, falling back to positional order over {} materials",
        material_count
    );

    for (position, record) in records.iter_mut().enumerate() {
        record.material_id = if allow_reuse {
            Some(position % material_count)
        } else if position < material_count {
            Some(position)
        } else {
            None
        };
    }
    true
}
