//! Core caption types.
//!
//! Timing values are `f64` seconds. Rounding to milliseconds only happens
//! when a value is formatted.

use serde::{Deserialize, Serialize};

/// One timed unit of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Block number as written in the source file (1-based, may skip).
    pub index: i64,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    /// Caption text, multi-line blocks joined with single spaces.
    pub text: String,
}

impl CaptionSegment {
    pub fn new(index: i64, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration in seconds, never negative.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether the caption carries any text worth placing a clip under.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_clamped() {
        let caption = CaptionSegment::new(1, 2.0, 1.5, "backwards");
        assert_eq!(caption.duration(), 0.0);

        let caption = CaptionSegment::new(2, 1.0, 3.5, "forwards");
        assert!((caption.duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn has_text_ignores_whitespace() {
        assert!(!CaptionSegment::new(1, 0.0, 1.0, "  ").has_text());
        assert!(CaptionSegment::new(1, 0.0, 1.0, "hi").has_text());
    }
}
