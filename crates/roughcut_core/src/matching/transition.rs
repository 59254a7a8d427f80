//! Timeline transitions.

use serde::{Deserialize, Serialize};

/// Visual effect between adjacent clips.
///
/// Serialized with the labels the downstream project builder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    #[serde(rename = "叠化")]
    Dissolve,
    #[serde(rename = "闪白")]
    FlashWhite,
    #[serde(rename = "向左")]
    SlideLeft,
    #[serde(rename = "向右")]
    SlideRight,
    #[serde(rename = "向上")]
    SlideUp,
    #[serde(rename = "向下")]
    SlideDown,
    #[serde(rename = "缩放")]
    Zoom,
    #[serde(rename = "模糊")]
    Blur,
}

impl Transition {
    pub const ALL: [Transition; 8] = [
        Transition::Dissolve,
        Transition::FlashWhite,
        Transition::SlideLeft,
        Transition::SlideRight,
        Transition::SlideUp,
        Transition::SlideDown,
        Transition::Zoom,
        Transition::Blur,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Transition::Dissolve => "叠化",
            Transition::FlashWhite => "闪白",
            Transition::SlideLeft => "向左",
            Transition::SlideRight => "向右",
            Transition::SlideUp => "向上",
            Transition::SlideDown => "向下",
            Transition::Zoom => "缩放",
            Transition::Blur => "模糊",
        }
    }

    /// Exact label lookup.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Default substituted for unusable transitions: dissolve if it is
    /// allowed, otherwise the first allowed entry.
    pub fn default_for(allowed: &[Transition]) -> Transition {
        if allowed.is_empty() || allowed.contains(&Transition::Dissolve) {
            Transition::Dissolve
        } else {
            allowed[0]
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
