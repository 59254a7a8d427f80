//! Markdown fence handling.
//!
//! Models often wrap their answer in one or more ```` ``` ```` fences, with
//! prose in between. Fenced chunks win over prose; among the candidates the
//! one that contains a bracket and is longest is chosen.

/// Fence delimiter.
pub const FENCE: &str = "```";

/// Pick the chunk of `text` most likely to hold the structured value.
///
/// Text without fences is returned unchanged.
pub fn select_candidate(text: &str) -> &str {
    if !text.contains(FENCE) {
        return text;
    }

    let chunks: Vec<&str> = text.split(FENCE).collect();

    // Odd chunks sit between an opening and a closing fence.
    let fenced: Vec<&str> = chunks
        .iter()
        .skip(1)
        .step_by(2)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    let candidates = if fenced.is_empty() {
        chunks
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    } else {
        fenced
    };

    // Earliest candidate wins ties.
    let mut best: Option<(bool, usize, &str)> = None;
    for candidate in candidates {
        let key = (has_opening_bracket(candidate), candidate.chars().count());
        match best {
            Some((b, len, _)) if (b, len) >= key => {}
            _ => best = Some((key.0, key.1, candidate)),
        }
    }

    best.map(|(_, _, c)| strip_language_hint(c)).unwrap_or("")
}

fn has_opening_bracket(s: &str) -> bool {
    s.contains('{') || s.contains('[')
}

/// Strip a leading info-string such as `json` or `JSON5` from a fenced chunk.
///
/// Only a bare word followed by whitespace counts as a hint, so a chunk that
/// is itself a scalar (`true`, `42`) is left alone.
fn strip_language_hint(chunk: &str) -> &str {
    let chunk = chunk.trim_start();
    let Some(token_end) = chunk.find(char::is_whitespace) else {
        return chunk;
    };

    let token = &chunk[..token_end];
    let is_hint = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'));

    if is_hint {
        chunk[token_end..].trim()
    } else {
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_fences_returns_input() {
        assert_eq!(select_candidate("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn prefers_fenced_chunk_and_strips_hint() {
        let text = "here you go ```json\n{\"a\": 1}\n``` hope it helps";
        assert_eq!(select_candidate(text), "{\"a\": 1}");
    }

    #[test]
    fn prefers_bracketed_over_longer_plain_chunk() {
        let text = "```\nthis fenced block is long but has no structure at all\n```\n```\n[1]\n```";
        assert_eq!(select_candidate(text), "[1]");
    }

    #[test]
    fn prefers_longest_bracketed_chunk() {
        let text = "```json\n[1]\n```\nand the full one\n```json\n[1, 2, 3]\n```";
        assert_eq!(select_candidate(text), "[1, 2, 3]");
    }

    #[test]
    fn unclosed_fence_still_uses_fenced_chunk() {
        let text = "Sure!\n```JSON\n{\"a\": [1]}";
        assert_eq!(select_candidate(text), "{\"a\": [1]}");
    }

    #[test]
    fn empty_fences_fall_back_to_all_chunks() {
        let text = "{\"a\": 1} ``````";
        assert_eq!(select_candidate(text), "{\"a\": 1}");
    }

    #[test]
    fn hint_stripping_leaves_scalars() {
        assert_eq!(strip_language_hint("true"), "true");
        assert_eq!(strip_language_hint("json\n[]"), "[]");
        assert_eq!(strip_language_hint("{\"a\": 1}"), "{\"a\": 1}");
    }
}
