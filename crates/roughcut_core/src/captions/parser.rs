//! SRT caption parser.
//!
//! # Format Overview
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! A block starts at a line made only of digits that is immediately followed
//! by a line containing `-->`. Following non-blank lines are joined with a
//! space into the caption text. A text line made only of digits ends the
//! block, since it may be the next block's index.
//!
//! The parser never fails. Lines that do not start a block are skipped, and
//! a timestamp that cannot be read becomes `0.0`.

use super::types::CaptionSegment;

/// Separator between start and end timestamps on a timing line.
pub const TIMING_SEPARATOR: &str = "-->";

/// Parse SRT content into an ordered list of caption segments.
pub fn parse_srt(content: &str) -> Vec<CaptionSegment> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = content.split('\n').map(str::trim).collect();

    let mut segments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let timing = lines
            .get(i + 1)
            .copied()
            .filter(|line| line.contains(TIMING_SEPARATOR));

        let (Some(index), Some(timing)) = (parse_index(lines[i]), timing) else {
            i += 1;
            continue;
        };

        let mut text_lines = Vec::new();
        let mut j = i + 2;
        while j < lines.len() && !lines[j].is_empty() && !is_index_line(lines[j]) {
            text_lines.push(lines[j]);
            j += 1;
        }

        let (start, end) = parse_timing(timing, i + 2);
        segments.push(CaptionSegment::new(index, start, end, text_lines.join(" ")));

        i = j;
    }

    segments
}

/// Parse a caption timestamp: `H:MM:SS,mmm` (a period is accepted in place
/// of the comma, and the fraction is optional).
///
/// Returns the value in seconds, or `None` if the text is not a timestamp.
pub fn parse_timestamp(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours = parse_component(parts[0])?;
    let minutes = parse_component(parts[1])?;
    let seconds = parse_component(parts[2])?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_component(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse `start --> end`, degrading each unreadable side to `0.0`.
fn parse_timing(line: &str, line_num: usize) -> (f64, f64) {
    let mut parts = line.split(TIMING_SEPARATOR);
    let start_str = parts.next().unwrap_or("");
    let end_str = parts.next().unwrap_or("");

    let start = parse_timestamp(start_str).unwrap_or_else(|| {
        tracing::debug!("Unreadable start time at line {}: '{}'", line_num, start_str);
        0.0
    });
    let end = parse_timestamp(end_str).unwrap_or_else(|| {
        tracing::debug!("Unreadable end time at line {}: '{}'", line_num, end_str);
        0.0
    });

    (start, end)
}

fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(line: &str) -> Option<i64> {
    if !is_index_line(line) {
        return None;
    }
    line.parse().ok()
}
