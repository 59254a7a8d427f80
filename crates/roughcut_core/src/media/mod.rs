//! Material discovery, probing and visual proxies.

mod discovery;
pub mod proxy;
mod tools;
mod types;

pub use discovery::collect_material_files;
pub use proxy::{proxy_key, visual_proxy};
pub use tools::{FfmpegTools, MediaTools, StoryboardLayout};
pub use types::{
    is_media, MaterialKind, MaterialRecord, MediaError, MediaResult, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
