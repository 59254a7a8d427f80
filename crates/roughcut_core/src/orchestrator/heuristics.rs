//! Detectors for descriptive replies that are not about the picture.

/// Phrases of a model declining to look at the image.
pub const VISION_REFUSAL_MARKERS: &[&str] = &[
    "无法直接分析图片",
    "cannot directly analyze",
    "only return raw data",
    "只能返回图片的原始数据",
];

/// Description fragments that point at the file rather than its content.
pub const METADATA_DESCRIPTION_MARKERS: &[&str] = &[
    ".gemini_cache",
    ".roughcut_cache",
    "缓存",
    "目录",
    "文件名",
    "哈希",
    "media",
];

/// Tags (lowercased) that name a file type instead of a subject.
pub const METADATA_TAGS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "image", "file", "media", "cache", "文件", "图片",
];

/// The model said it cannot see the image.
pub fn looks_like_vision_refusal(response: &str) -> bool {
    VISION_REFUSAL_MARKERS.iter().any(|m| response.contains(m))
}

/// The model described the file (path, cache folder, format) instead of
/// what it shows.
///
/// Needs both a metadata-ish description and a file-type tag, so a genuine
/// description that mentions "media" on its own is not flagged.
pub fn looks_like_file_metadata(tags: &[String], description: &str) -> bool {
    if description.is_empty() {
        return false;
    }

    let description_hit = METADATA_DESCRIPTION_MARKERS
        .iter()
        .any(|m| description.contains(m));
    let tag_hit = tags
        .iter()
        .any(|t| METADATA_TAGS.contains(&t.trim().to_lowercase().as_str()));

    description_hit && tag_hit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_file_commentary() {
        assert!(looks_like_file_metadata(
            &tags(&["PNG ", "screenshot"]),
            "这是位于缓存目录中的一张图片"
        ));
        assert!(looks_like_file_metadata(
            &tags(&["image"]),
            "A file stored under .roughcut_cache/media"
        ));
    }

    #[test]
    fn needs_both_signals() {
        assert!(!looks_like_file_metadata(&tags(&["海边", "日落"]), "缓存目录里的海边日落"));
        assert!(!looks_like_file_metadata(&tags(&["jpg"]), "A dog running on the beach"));
        assert!(!looks_like_file_metadata(&tags(&["jpg"]), ""));
    }

    #[test]
    fn detects_refusals() {
        assert!(looks_like_vision_refusal(
            "I cannot directly analyze images, I can only return raw data."
        ));
        assert!(looks_like_vision_refusal("抱歉，我无法直接分析图片。"));
        assert!(!looks_like_vision_refusal("{\"tags\": [\"猫\"], \"desc\": \"一只猫\"}"));
    }
}
