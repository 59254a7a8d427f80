//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::captions::CaptionError;
use crate::extraction::ExtractError;
use crate::matching::MatchError;
use crate::model::ModelError;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },
}

impl PipelineError {
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// The step error underneath.
    pub fn step_error(&self) -> &StepError {
        match self {
            Self::StepFailed { source, .. } => source,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error(transparent)]
    Captions(#[from] CaptionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// The matching reply held no usable structured value.
    #[error("Could not parse matches from model response (raw saved to {raw_path}): {source}")]
    UnparsableMatches {
        raw_path: PathBuf,
        #[source]
        source: ExtractError,
    },

    /// The matching reply parsed but was not a list.
    #[error("Invalid matches from model response (raw saved to {raw_path}): {source}")]
    InvalidMatches {
        raw_path: PathBuf,
        #[source]
        source: MatchError,
    },

    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Where the raw model response was saved, for matching failures.
    pub fn raw_response_path(&self) -> Option<&PathBuf> {
        match self {
            Self::UnparsableMatches { raw_path, .. } | Self::InvalidMatches { raw_path, .. } => {
                Some(raw_path)
            }
            _ => None,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
