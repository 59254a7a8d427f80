//! Model client errors.

use std::time::Duration;

use thiserror::Error;

use crate::process::RunError;

/// Characters of stderr/stdout shown in error messages.
const HEAD_CHARS: usize = 400;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Capacity or rate-limit failures persisted through every retry.
    #[error("Model service still unavailable after {attempts} attempts (exit code {exit_code:?}): {}", head(.stderr))]
    Transient {
        attempts: u32,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The client exited with an error that retrying will not fix.
    #[error("Model client failed (exit code {exit_code:?}): {}", head(.stderr))]
    Permanent {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Model call timed out after {}s", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("Failed to start model client '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Stdout was not the expected JSON envelope.
    #[error("Unexpected model client output ({reason}): {}", head(.stdout))]
    Envelope { reason: String, stdout: String },

    #[error("I/O error talking to model client: {0}")]
    Io(#[source] std::io::Error),
}

impl ModelError {
    /// Diagnostic output attached to the error, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ModelError::Transient { stderr, .. } | ModelError::Permanent { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

impl From<RunError> for ModelError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Spawn { tool, source } => ModelError::Spawn {
                program: tool,
                source,
            },
            RunError::Timeout { timeout, .. } => ModelError::Timeout { timeout },
            RunError::Io { source, .. } => ModelError::Io(source),
        }
    }
}

fn head(text: &str) -> String {
    crate::extraction::response_head(text, HEAD_CHARS)
}

pub type ModelResult<T> = Result<T, ModelError>;
