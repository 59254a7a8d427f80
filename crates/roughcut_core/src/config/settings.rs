//! Settings struct with TOML-based sections.
//!
//! Each section maps to one TOML table and can be updated on its own.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::matching::Transition;
use crate::media::StoryboardLayout;
use crate::model::{normalize_model_arg, RetryPolicy};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub model: ModelSettings,

    #[serde(default)]
    pub matching: MatchingSettings,

    #[serde(default)]
    pub storyboard: StoryboardSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Cache and log locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Analysis cache, proxies and diagnostics.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_cache_dir() -> String {
    ".roughcut_cache".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir)
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.logs_folder)
    }
}

/// Model client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Headless model CLI executable.
    #[serde(default = "default_program")]
    pub program: String,

    /// Model for the matching phase. `auto`/`default`/`none`/`null`/empty
    /// leave the choice to the CLI.
    #[serde(default = "default_model")]
    pub text_model: String,

    /// Model for the descriptive phase, same override rules.
    #[serde(default = "default_model")]
    pub vision_model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Language tags and descriptions are requested in.
    #[serde(default = "default_response_language")]
    pub response_language: String,
}

fn default_program() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_secs() -> u64 {
    5
}

fn default_backoff_multiplier() -> u32 {
    3
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_response_language() -> String {
    "Chinese".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            text_model: default_model(),
            vision_model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_secs: default_max_backoff_secs(),
            response_language: default_response_language(),
        }
    }
}

impl ModelSettings {
    pub fn text_model_override(&self) -> Option<String> {
        normalize_model_arg(Some(&self.text_model))
    }

    pub fn vision_model_override(&self) -> Option<String> {
        normalize_model_arg(Some(&self.vision_model))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_secs(self.initial_backoff_secs),
            multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        }
    }
}

/// Matching phase options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Allow one material to back several captions.
    #[serde(default)]
    pub allow_reuse: bool,

    /// Free-form editing style passed to the model.
    #[serde(default)]
    pub style_hint: String,

    /// Allowed transition labels. Unknown labels are ignored; an empty list
    /// allows every transition.
    #[serde(default = "default_transitions")]
    pub transitions: Vec<String>,
}

fn default_transitions() -> Vec<String> {
    Transition::ALL.iter().map(|t| t.label().to_string()).collect()
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            allow_reuse: false,
            style_hint: String::new(),
            transitions: default_transitions(),
        }
    }
}

impl MatchingSettings {
    pub fn allowed_transitions(&self) -> Vec<Transition> {
        let mut allowed = Vec::new();
        for label in &self.transitions {
            match Transition::from_label(label.trim()) {
                Some(t) if !allowed.contains(&t) => allowed.push(t),
                Some(_) => {}
                None => tracing::warn!("Ignoring unknown transition '{}' in config", label),
            }
        }
        if allowed.is_empty() {
            allowed = Transition::ALL.to_vec();
        }
        allowed
    }
}

/// Contact sheet geometry for video proxies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryboardSettings {
    #[serde(default = "default_tiles")]
    pub tiles_x: u32,

    #[serde(default = "default_tiles")]
    pub tiles_y: u32,

    #[serde(default = "default_scale_width")]
    pub scale_width: u32,
}

fn default_tiles() -> u32 {
    4
}

fn default_scale_width() -> u32 {
    320
}

impl Default for StoryboardSettings {
    fn default() -> Self {
        Self {
            tiles_x: default_tiles(),
            tiles_y: default_tiles(),
            scale_width: default_scale_width(),
        }
    }
}

impl StoryboardSettings {
    pub fn layout(&self) -> StoryboardLayout {
        StoryboardLayout {
            tiles_x: self.tiles_x,
            tiles_y: self.tiles_y,
            scale_width: self.scale_width,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Prefix run log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Number of model stderr lines shown when a call fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            show_timestamps: true,
            error_tail: default_error_tail(),
        }
    }
}

/// Config sections, one per TOML table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Model,
    Matching,
    Storyboard,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Model,
        ConfigSection::Matching,
        ConfigSection::Storyboard,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Model => "model",
            ConfigSection::Matching => "matching",
            ConfigSection::Storyboard => "storyboard",
            ConfigSection::Logging => "logging",
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Cache and log locations",
            ConfigSection::Model => "Model client",
            ConfigSection::Matching => "Caption to material matching",
            ConfigSection::Storyboard => "Video contact sheets",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
