//! Configuration management.
//!
//! TOML file with one table per [`ConfigSection`], written atomically and
//! updatable one section at a time.
//!
//! # Example
//!
//! ```no_run
//! use roughcut_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/roughcut.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Cache: {}", config.settings().paths.cache_dir);
//!
//! config.settings_mut().matching.allow_reuse = true;
//! config.update_section(ConfigSection::Matching).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, MatchingSettings, ModelSettings, PathSettings, Settings,
    StoryboardSettings,
};
