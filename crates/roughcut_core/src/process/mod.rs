//! External process execution.
//!
//! Thin layer over `std::process::Command` shared by the media tools and the
//! model client: captures stdout/stderr, optionally feeds stdin, and enforces
//! a wall-clock timeout by killing the child.

mod runner;

pub use runner::{CommandOutput, CommandRunner, RunError, RunResult};
