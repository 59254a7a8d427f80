//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};

/// One stage of a run.
///
/// The pipeline calls, in order:
///
/// 1. `validate_input` - check preconditions
/// 2. `execute` - do the work and record results in [`RunState`]
/// 3. `validate_output` - only after `execute` returned `Success`
pub trait PipelineStep {
    /// Step name, used in logs and error context.
    fn name(&self) -> &str;

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// `StepOutcome::Skipped` means there was nothing to do, not an error.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    fn description(&self) -> &str {
        self.name()
    }
}
