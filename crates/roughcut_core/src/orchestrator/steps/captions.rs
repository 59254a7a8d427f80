//! Captions step: parse the caption file.

use crate::captions;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

pub struct CaptionsStep;

impl CaptionsStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CaptionsStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CaptionsStep {
    fn name(&self) -> &str {
        "Captions"
    }

    fn description(&self) -> &str {
        "Parse captions"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.spec.captions_path.is_file() {
            return Err(StepError::invalid_input(format!(
                "Caption file not found: {}",
                ctx.spec.captions_path.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let segments = captions::parse_file(&ctx.spec.captions_path)?;
        let with_text = segments.iter().filter(|c| c.has_text()).count();

        ctx.logger.info(&format!(
            "Parsed {} caption segments ({} with text) from {}",
            segments.len(),
            with_text,
            ctx.spec.captions_path.display()
        ));

        state.captions = segments;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_captions() {
            return Err(StepError::invalid_output("No caption segments recorded"));
        }
        Ok(())
    }
}
