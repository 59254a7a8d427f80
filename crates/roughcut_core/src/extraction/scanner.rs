//! Balanced-delimiter scanner.
//!
//! Locates the first complete `{...}` or `[...]` value in a string. Taking
//! the first `[` and the last `]` breaks on objects whose first field is an
//! array (`{"tags": [...], ...}` would yield just the tags), so the scanner
//! keeps a stack of expected closers instead and ignores brackets inside
//! JSON strings.
//!
//! Works on bytes: every delimiter of interest is ASCII and can never appear
//! inside a multi-byte UTF-8 sequence.

use std::ops::Range;

use super::error::{ExtractError, ExtractResult};

/// Find the byte range of the first balanced structure in `text`.
///
/// A closer that does not match the innermost open bracket is ignored, as is
/// a stray closer before anything is open.
pub fn find_balanced_span(text: &str) -> ExtractResult<Range<usize>> {
    let bytes = text.as_bytes();

    let start = bytes
        .iter()
        .position(|&b| b == b'{' || b == b'[')
        .ok_or(ExtractError::NoOpeningBracket)?;

    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.last() == Some(&b) {
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(start..i + 1);
                    }
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unterminated {
        start,
        depth: stack.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(text: &str) -> &str {
        &text[find_balanced_span(text).unwrap()]
    }

    #[test]
    fn finds_simple_object() {
        assert_eq!(span_of("noise {\"a\": 1} trailing"), "{\"a\": 1}");
    }

    #[test]
    fn outer_object_wins_over_inner_array() {
        let text = "Result: {\"tags\": [\"a\", \"b\"], \"desc\": \"x\"} done [9]";
        assert_eq!(span_of(text), "{\"tags\": [\"a\", \"b\"], \"desc\": \"x\"}");
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let text = r#"{"desc": "a } b ] c [ d {", "n": 1}"#;
        assert_eq!(span_of(text), text);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r#"x {"desc": "say \"}]\" loudly", "tags": ["\\"]} y"#;
        assert_eq!(
            span_of(text),
            r#"{"desc": "say \"}]\" loudly", "tags": ["\\"]}"#
        );
    }

    #[test]
    fn mismatched_closers_are_skipped() {
        let text = "[1, 2} , 3]";
        assert_eq!(span_of(text), "[1, 2} , 3]");
    }

    #[test]
    fn multibyte_text_is_handled() {
        let text = "结果如下：{\"标签\": [\"人物\"]}。";
        assert_eq!(span_of(text), "{\"标签\": [\"人物\"]}");
    }

    #[test]
    fn reports_missing_opening_bracket() {
        assert!(matches!(
            find_balanced_span("no structure here"),
            Err(ExtractError::NoOpeningBracket)
        ));
    }

    #[test]
    fn reports_unterminated_structure() {
        match find_balanced_span("ok {\"a\": [1, 2") {
            Err(ExtractError::Unterminated { start, depth }) => {
                assert_eq!(start, 3);
                assert_eq!(depth, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
