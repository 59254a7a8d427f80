//! Run orchestration.
//!
//! A run is a fixed sequence of steps over shared, read-only [`Context`]
//! and accumulating [`RunState`]:
//!
//! ```text
//! Pipeline
//!     ├── Step: Captions  (parse the caption file)
//!     ├── Step: Discover  (collect material files)
//!     ├── Step: Describe  (cache, proxy, descriptive model call)
//!     └── Step: Match     (one matching call, sanitize, fallback)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use roughcut_core::cache::FingerprintCache;
//! use roughcut_core::orchestrator::{create_standard_pipeline, Context, RunState};
//!
//! let ctx = Context::new(spec, settings, "run_1", logger, client, tools);
//! let mut state = RunState::new("run_1", FingerprintCache::in_dir(&ctx.cache_dir));
//! create_standard_pipeline().run(&ctx, &mut state)?;
//! println!("{} matches", state.matches().len());
//! ```

mod errors;
pub mod heuristics;
mod pipeline;
pub mod prompts;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult, StepReport};
pub use step::PipelineStep;
pub use steps::{CaptionsStep, DescribeStep, DiscoverStep, MatchStep};
pub use types::{Context, MatchOutput, RunSpec, RunState, StepOutcome};

/// Captions → Discover → Describe → Match.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(CaptionsStep::new())
        .with_step(DiscoverStep::new())
        .with_step(DescribeStep::new())
        .with_step(MatchStep::new())
}

#[cfg(test)]
mod tests;
