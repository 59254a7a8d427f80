//! Timeline plan handed to the external assembler.
//!
//! Joins the matching result with captions and materials. The plan only
//! says which clip goes under which caption and how it is entered; cutting
//! and rendering happen elsewhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::{store, CacheResult};
use crate::captions::CaptionSegment;
use crate::matching::{MatchRecord, Transition};
use crate::media::{MaterialKind, MaterialRecord};

/// One clip on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub caption_index: i64,
    pub material_id: usize,
    pub path: PathBuf,
    pub kind: MaterialKind,
    /// Timeline position in seconds, taken from the caption.
    pub start: f64,
    pub duration: f64,
    /// How the clip is entered; the first clip has none.
    pub transition: Option<Transition>,
}

/// Placements in caption order, skipping matches that cannot be placed:
/// null ids, unknown captions, captions without text and unknown materials.
pub fn build_placements(
    captions: &[CaptionSegment],
    materials: &[MaterialRecord],
    matches: &[MatchRecord],
) -> Vec<Placement> {
    let by_index: HashMap<i64, &CaptionSegment> = captions.iter().map(|c| (c.index, c)).collect();
    let mut placements: Vec<Placement> = Vec::new();

    for record in matches {
        let Some(material_id) = record.material_id else {
            continue;
        };
        let Some(caption) = by_index.get(&record.caption_index) else {
            tracing::debug!("Match for unknown caption {}", record.caption_index);
            continue;
        };
        if !caption.has_text() {
            continue;
        }
        let Some(material) = materials.get(material_id) else {
            tracing::debug!("Match for unknown material {}", material_id);
            continue;
        };

        let transition = (!placements.is_empty()).then_some(record.transition);
        placements.push(Placement {
            caption_index: caption.index,
            material_id,
            path: material.path.clone(),
            kind: material.kind,
            start: caption.start,
            duration: caption.duration(),
            transition,
        });
    }

    placements.sort_by(|a, b| a.start.total_cmp(&b.start));
    if let Some(first) = placements.first_mut() {
        first.transition = None;
    }
    placements
}

/// Serialized plan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub captions_path: PathBuf,
    pub created_at: String,
    pub placements: Vec<Placement>,
}

impl Plan {
    pub fn new(captions_path: impl Into<PathBuf>, placements: Vec<Placement>) -> Self {
        Self {
            captions_path: captions_path.into(),
            created_at: chrono::Local::now().to_rfc3339(),
            placements,
        }
    }

    /// End of the last placed clip.
    pub fn total_duration(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| p.start + p.duration)
            .fold(0.0, f64::max)
    }

    /// Write as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        store::write_json(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn material(id: usize, name: &str, kind: MaterialKind) -> MaterialRecord {
        MaterialRecord {
            id,
            path: PathBuf::from(format!("/clips/{}", name)),
            kind,
            duration: 3.0,
            tags: Vec::new(),
            description: String::new(),
        }
    }

    fn record(caption_index: i64, material_id: Option<usize>, transition: Transition) -> MatchRecord {
        MatchRecord {
            caption_index,
            material_id,
            transition,
        }
    }

    fn fixture() -> (Vec<CaptionSegment>, Vec<MaterialRecord>) {
        let captions = vec![
            CaptionSegment::new(1, 0.0, 2.0, "one"),
            CaptionSegment::new(2, 2.0, 3.5, "   "),
            CaptionSegment::new(3, 3.5, 6.0, "three"),
            CaptionSegment::new(4, 6.0, 7.0, "four"),
        ];
        let materials = vec![
            material(0, "a.mp4", MaterialKind::Video),
            material(1, "b.png", MaterialKind::Image),
        ];
        (captions, materials)
    }

    #[test]
    fn skips_unplaceable_matches() {
        let (captions, materials) = fixture();
        let matches = vec![
            record(1, None, Transition::Zoom),
            record(2, Some(0), Transition::Blur),
            record(3, Some(1), Transition::SlideUp),
            record(4, Some(7), Transition::Blur),
            record(9, Some(0), Transition::Blur),
        ];

        let placements = build_placements(&captions, &materials, &matches);

        assert_eq!(placements.len(), 1);
        let only = &placements[0];
        assert_eq!(only.caption_index, 3);
        assert_eq!(only.path, PathBuf::from("/clips/b.png"));
        assert_eq!(only.kind, MaterialKind::Image);
        assert_eq!(only.start, 3.5);
        assert_eq!(only.duration, 2.5);
        assert_eq!(only.transition, None);
    }

    #[test]
    fn first_clip_has_no_transition() {
        let (captions, materials) = fixture();
        let matches = vec![
            record(4, Some(0), Transition::Zoom),
            record(1, Some(1), Transition::FlashWhite),
        ];

        let placements = build_placements(&captions, &materials, &matches);

        let order: Vec<_> = placements.iter().map(|p| p.caption_index).collect();
        assert_eq!(order, vec![1, 4]);
        assert_eq!(placements[0].transition, None);
        assert_eq!(placements[1].transition, Some(Transition::Zoom));
    }

    #[test]
    fn saves_pretty_json() {
        let (captions, materials) = fixture();
        let matches = vec![
            record(1, Some(0), Transition::Dissolve),
            record(3, Some(0), Transition::SlideLeft),
        ];
        let plan = Plan::new("/voice.srt", build_placements(&captions, &materials, &matches));
        assert_eq!(plan.total_duration(), 6.0);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("plan.json");
        plan.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"transition\": \"向左\""));
        assert!(text.contains("\"transition\": null"));
        let loaded: Plan = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, plan);
    }
}
