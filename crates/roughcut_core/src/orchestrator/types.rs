//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::FingerprintCache;
use crate::captions::CaptionSegment;
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::matching::MatchRecord;
use crate::media::{MaterialRecord, MediaTools};
use crate::model::ModelClient;

/// What to run on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSpec {
    /// Caption file (`.srt`).
    pub captions_path: PathBuf,
    /// Material files and/or directories.
    pub material_inputs: Vec<PathBuf>,
    /// Keep at most this many materials, 0 for all.
    pub material_limit: usize,
    /// Ignore cached analysis and matches.
    pub force: bool,
}

/// Read-only context passed to pipeline steps.
///
/// Mutable results go in [`RunState`].
pub struct Context {
    pub spec: RunSpec,
    pub settings: Settings,
    pub run_name: String,
    /// Absolute cache directory.
    pub cache_dir: PathBuf,
    pub logger: RunLogger,
    pub client: Box<dyn ModelClient>,
    pub tools: Box<dyn MediaTools>,
}

impl Context {
    pub fn new(
        spec: RunSpec,
        settings: Settings,
        run_name: impl Into<String>,
        logger: RunLogger,
        client: Box<dyn ModelClient>,
        tools: Box<dyn MediaTools>,
    ) -> Self {
        let cache_dir = settings.paths.cache_dir();
        let cache_dir = std::path::absolute(&cache_dir).unwrap_or(cache_dir);
        Self {
            spec,
            settings,
            run_name: run_name.into(),
            cache_dir,
            logger,
            client,
            tools,
        }
    }

    /// Path of a diagnostic file inside the cache directory.
    pub fn diagnostic_path(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Outcome of the matching phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutput {
    pub matches: Vec<MatchRecord>,
    /// Reused from the match cache without calling the model.
    pub from_cache: bool,
    /// Positional fallback replaced the model's (all-null) answer.
    pub fallback_applied: bool,
}

/// Mutable run state, filled in step by step.
#[derive(Debug)]
pub struct RunState {
    pub run_id: String,
    pub started_at: String,
    /// Analysis cache, loaded once at the start of the run.
    pub cache: FingerprintCache,
    pub captions: Vec<CaptionSegment>,
    pub material_paths: Vec<PathBuf>,
    pub materials: Vec<MaterialRecord>,
    pub matching: Option<MatchOutput>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>, cache: FingerprintCache) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: chrono::Local::now().to_rfc3339(),
            cache,
            captions: Vec::new(),
            material_paths: Vec::new(),
            materials: Vec::new(),
            matching: None,
        }
    }

    pub fn has_captions(&self) -> bool {
        !self.captions.is_empty()
    }

    pub fn matches(&self) -> &[MatchRecord] {
        self.matching
            .as_ref()
            .map(|m| m.matches.as_slice())
            .unwrap_or(&[])
    }
}

/// Outcome of a step's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Nothing to do (not an error).
    Skipped(String),
}
