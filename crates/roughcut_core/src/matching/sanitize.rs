//! Candidate validation.
//!
//! Model output is coerced into [`MatchRecord`]s here and nowhere else.
//! Rules, applied per candidate in input order:
//!
//! - no integer caption index: candidate dropped
//! - material id missing, not an integer, or out of range: nulled
//! - repeated material id when reuse is off: nulled (first one wins)
//! - transition not exactly an allowed label: replaced by the default

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::error::{MatchError, MatchResult};
use super::transition::Transition;
use super::types::MatchRecord;

/// Keys accepted for the caption index, in lookup order.
pub const CAPTION_KEYS: &[&str] = &["caption_index", "srt_idx"];

/// Keys accepted for the material id, in lookup order.
pub const MATERIAL_KEYS: &[&str] = &["material_id", "id"];

pub const TRANSITION_KEY: &str = "transition";

/// Validate raw candidates into match records.
///
/// `max_material_id` is inclusive; pass `material_count - 1` (so -1 when
/// there are no materials and every id gets nulled).
pub fn sanitize_matches(
    raw: &Value,
    allowed: &[Transition],
    max_material_id: i64,
    allow_reuse: bool,
) -> MatchResult<Vec<MatchRecord>> {
    let candidates = raw.as_array().ok_or(MatchError::NotAList {
        found: kind_of(raw),
    })?;

    let default_transition = Transition::default_for(allowed);
    let mut used = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());

    for (position, candidate) in candidates.iter().enumerate() {
        let Some(fields) = candidate.as_object() else {
            tracing::debug!("Dropping non-object candidate at {}", position);
            continue;
        };

        let Some(caption_index) = lookup(fields, CAPTION_KEYS).and_then(coerce_int) else {
            tracing::debug!("Dropping candidate at {} without caption index", position);
            continue;
        };

        let mut material_id = lookup(fields, MATERIAL_KEYS)
            .and_then(coerce_int)
            .filter(|id| *id >= 0 && *id <= max_material_id)
            .map(|id| id as usize);

        if !allow_reuse {
            if let Some(id) = material_id {
                if !used.insert(id) {
                    tracing::debug!("Material {} reused by caption {}, nulling", id, caption_index);
                    material_id = None;
                }
            }
        }

        let transition = fields
            .get(TRANSITION_KEY)
            .map(transition_text)
            .and_then(|label| Transition::from_label(label.trim()))
            .filter(|t| allowed.contains(t))
            .unwrap_or(default_transition);

        out.push(MatchRecord {
            caption_index,
            material_id,
            transition,
        });
    }

    Ok(out)
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| fields.get(*k))
}

fn transition_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Best-effort integer coercion of a loosely typed value.
///
/// Integers pass through, finite floats truncate toward zero, strings must
/// hold a plain integer after trimming, booleans map to 0/1. Anything else
/// (null, arrays, objects, `"1.5"`) is rejected.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
