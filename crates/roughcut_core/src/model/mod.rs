//! Generative model boundary.
//!
//! The rest of the crate talks to the model through [`ModelClient`].
//! [`CliModelClient`] drives a headless CLI subprocess with a timeout and a
//! bounded retry on capacity errors.

mod client;
mod error;
mod retry;
mod types;

pub use client::{parse_envelope, CliModelClient, ModelClient};
pub use error::{ModelError, ModelResult};
pub use retry::{
    is_bootstrap_reply, is_transient, RetryPolicy, BOOTSTRAP_MARKERS, TRANSIENT_SIGNATURES,
};
pub use types::{normalize_model_arg, ModelRequest, ModelResponse};
