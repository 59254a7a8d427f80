//! Model instructions and payloads.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::captions::CaptionSegment;
use crate::matching::Transition;
use crate::media::{MaterialKind, MaterialRecord, StoryboardLayout};

/// Command-line instruction for the descriptive phase; the task is on stdin.
pub const DESCRIBE_INSTRUCTION: &str =
    "Read STDIN and follow its instructions. Output only JSON.";

/// Command-line instruction for the matching phase.
pub const MATCH_INSTRUCTION: &str =
    "Follow the rules in STDIN and output a JSON array only (no Markdown).";

/// Stdin payload asking for tags and a description of one proxy image.
pub fn describe_payload(
    image: &Path,
    kind: MaterialKind,
    layout: &StoryboardLayout,
    language: &str,
) -> String {
    let mut out = String::new();
    out.push_str("You are a professional short-video editing assistant.\n");
    let _ = writeln!(out, "Read the image file: {}", image.display());
    if kind == MaterialKind::Video {
        let _ = writeln!(
            out,
            "The image is a {}x{} contact sheet of frames sampled evenly across one video clip.",
            layout.tiles_x, layout.tiles_y
        );
    }
    out.push('\n');
    let _ = writeln!(out, "Task: summarize what the picture shows, in {}.", language);
    out.push_str(
        "Output: a single JSON object only (no Markdown, no code fences, no explanations) with these fields:\n",
    );
    let _ = writeln!(
        out,
        "- tags: array of 3-8 short {} tags (never the file name)",
        language
    );
    let _ = writeln!(out, "- desc: string, a 1-2 sentence {} description", language);
    out.push_str("Prefer generic semantic tags (people, actions, scenes, objects).\n");
    out
}

#[derive(Serialize)]
struct CaptionEntry<'a> {
    caption_index: i64,
    start: f64,
    end: f64,
    duration: f64,
    text: &'a str,
}

#[derive(Serialize)]
struct MaterialEntry<'a> {
    material_id: usize,
    file: String,
    kind: MaterialKind,
    duration: f64,
    tags: &'a [String],
    desc: &'a str,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Captions that take part in matching: those with text.
pub fn matchable_captions(captions: &[CaptionSegment]) -> impl Iterator<Item = &CaptionSegment> {
    captions.iter().filter(|c| c.has_text())
}

/// Stdin payload for the matching phase.
///
/// Deterministic for identical inputs, so its digest can key the match
/// cache.
pub fn match_payload(
    captions: &[CaptionSegment],
    materials: &[MaterialRecord],
    allowed: &[Transition],
    style_hint: &str,
    allow_reuse: bool,
) -> String {
    let caption_entries: Vec<CaptionEntry> = matchable_captions(captions)
        .map(|c| CaptionEntry {
            caption_index: c.index,
            start: round3(c.start),
            end: round3(c.end),
            duration: round3(c.duration()),
            text: &c.text,
        })
        .collect();

    let material_entries: Vec<MaterialEntry> = materials
        .iter()
        .map(|m| MaterialEntry {
            material_id: m.id,
            file: m.file_name(),
            kind: m.kind,
            duration: round3(m.duration),
            tags: &m.tags,
            desc: &m.description,
        })
        .collect();

    let labels: Vec<&str> = allowed.iter().map(|t| t.label()).collect();

    // Serializing plain structs of strings and numbers cannot fail.
    let captions_json = serde_json::to_string(&caption_entries).unwrap_or_default();
    let materials_json = serde_json::to_string(&material_entries).unwrap_or_default();
    let labels_json = serde_json::to_string(&labels).unwrap_or_default();

    let mut out = String::new();
    out.push_str(
        "You are a professional short-video editor. Match each caption segment to the most suitable material.\n",
    );
    let style_hint = style_hint.trim();
    if !style_hint.is_empty() {
        let _ = writeln!(out, "Style hint: {}", style_hint);
    }
    out.push_str("Materials (JSON):\n");
    out.push_str(&materials_json);
    out.push_str("\n\nCaption segments (JSON):\n");
    out.push_str(&captions_json);
    out.push_str("\n\nOutput a strict JSON array (no Markdown, no explanations). Rules:\n");
    let _ = writeln!(
        out,
        "- The array length must equal the number of caption segments ({}); do not omit any segment.",
        caption_entries.len()
    );
    out.push_str("- Keep the order of the caption segments.\n");
    out.push_str(
        "- Exactly one record per segment: {\"caption_index\": <caption index>, \"material_id\": <material id or null>, \"transition\": <transition name>}.\n",
    );
    out.push_str("- If no material fits, set material_id to null.\n");
    if allow_reuse {
        out.push_str("- Materials may be used more than once.\n");
    } else {
        out.push_str(
            "- Use each material id at most once; if there are not enough materials, cover the key segments first and set the rest to null.\n",
        );
    }
    let _ = writeln!(out, "- transition must be one of: {}", labels_json);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn caption(index: i64, text: &str) -> CaptionSegment {
        CaptionSegment::new(index, 1.0, 2.5, text)
    }

    fn material(id: usize) -> MaterialRecord {
        MaterialRecord {
            id,
            path: PathBuf::from(format!("/m/clip{}.mp4", id)),
            kind: MaterialKind::Video,
            duration: 3.14159,
            tags: vec!["海边".to_string()],
            description: "海浪".to_string(),
        }
    }

    #[test]
    fn match_payload_lists_only_captions_with_text() {
        let payload = match_payload(
            &[caption(1, "hello"), caption(2, ""), caption(3, "bye")],
            &[material(0)],
            &Transition::ALL,
            "",
            false,
        );
        assert!(payload.contains("\"caption_index\":1"));
        assert!(!payload.contains("\"caption_index\":2"));
        assert!(payload.contains("number of caption segments (2)"));
        assert!(payload.contains("\"file\":\"clip0.mp4\""));
        assert!(payload.contains("\"duration\":3.142"));
        assert!(payload.contains("at most once"));
        assert!(!payload.contains("Style hint"));
    }

    #[test]
    fn match_payload_is_deterministic_and_reflects_options() {
        let captions = [caption(1, "hello")];
        let materials = [material(0)];
        let a = match_payload(&captions, &materials, &[Transition::Zoom], "fast cuts", true);
        let b = match_payload(&captions, &materials, &[Transition::Zoom], "fast cuts", true);
        assert_eq!(a, b);
        assert!(a.contains("Style hint: fast cuts"));
        assert!(a.contains("may be used more than once"));
        assert!(a.contains("[\"缩放\"]"));
    }

    #[test]
    fn describe_payload_mentions_contact_sheet_for_video() {
        let layout = StoryboardLayout::default();
        let video = describe_payload(Path::new("/c/s.jpg"), MaterialKind::Video, &layout, "Chinese");
        let still = describe_payload(Path::new("/c/m.png"), MaterialKind::Image, &layout, "English");
        assert!(video.contains("4x4 contact sheet"));
        assert!(video.contains("in Chinese"));
        assert!(!still.contains("contact sheet"));
        assert!(still.contains("/c/m.png"));
    }
}
