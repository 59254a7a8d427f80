//! Discover step: collect material files.

use crate::media::collect_material_files;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

pub struct DiscoverStep;

impl DiscoverStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiscoverStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DiscoverStep {
    fn name(&self) -> &str {
        "Discover"
    }

    fn description(&self) -> &str {
        "Discover materials"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if ctx.spec.material_inputs.is_empty() {
            return Err(StepError::invalid_input("No material inputs given"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let files = collect_material_files(&ctx.spec.material_inputs, ctx.spec.material_limit);
        if files.is_empty() {
            return Err(StepError::invalid_input(
                "No material files found in the given inputs",
            ));
        }

        for (id, path) in files.iter().enumerate() {
            ctx.logger.debug(&format!("Material {}: {}", id, path.display()));
        }
        ctx.logger.info(&format!("Found {} materials", files.len()));

        state.material_paths = files;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.material_paths.is_empty() {
            return Err(StepError::invalid_output("No materials recorded"));
        }
        Ok(())
    }
}
