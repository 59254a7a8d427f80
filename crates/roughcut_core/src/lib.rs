//! roughcut core - model-assisted rough-cut planning
//!
//! Pairs the captions of a voiceover with a pool of video and image
//! materials. A multimodal model describes each material once (cached by
//! path and modification time), then a single model call assigns materials
//! to captions. The result is a placement plan for an external assembler.
//!
//! This crate has no UI or CLI dependencies.

pub mod cache;
pub mod captions;
pub mod config;
pub mod extraction;
pub mod logging;
pub mod matching;
pub mod media;
pub mod model;
pub mod orchestrator;
pub mod plan;
pub mod process;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
