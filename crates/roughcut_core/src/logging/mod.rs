//! Logging infrastructure.
//!
//! - [`RunLogger`]: per-run log file with callback output and a tail buffer
//!   of model stderr
//! - [`init_tracing`]: global `tracing` subscriber for the binary
//!
//! # Example
//!
//! ```no_run
//! use roughcut_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("run_1", ".logs", LogConfig::default(), None).unwrap();
//! logger.phase("Describe materials");
//! logger.success("3 materials described");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: `RUST_LOG` if set, else `default_level`.
///
/// Call once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Test subscriber, warnings and above.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
