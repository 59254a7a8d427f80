//! Caption timestamp formatting.
//!
//! Internal float seconds are rounded to the nearest millisecond only here.

/// Format seconds as a caption timestamp (`HH:MM:SS,mmm`).
///
/// Minutes, seconds and milliseconds are zero-padded; hours are padded to two
/// digits but never truncated, so `100:00:00,000` is a valid result.
/// Negative and non-finite inputs format as zero.
///
/// Formatting a parsed timestamp reproduces it only when its hours have at
/// least two digits: `0:00:01,000` comes back as `00:00:01,000`.
pub fn format_timestamp(seconds: f64) -> String {
    let ms = (seconds * 1000.0).round();
    let ms = if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 };

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
