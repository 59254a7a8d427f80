//! Sequential step runner.

use std::time::{Duration, Instant};

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};

/// Ordered steps, each checked before and after it runs.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step in order. The first failing check or step ends the run.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let run_started = Instant::now();
        let mut reports = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            ctx.logger.phase(step.description());
            tracing::debug!(step = step.name(), "step starting");

            let started = Instant::now();
            let outcome = run_step(step.as_ref(), ctx, state).map_err(|(stage, e)| {
                ctx.logger.error(&format!("{} {}: {}", step.name(), stage, e));
                PipelineError::step_failed(&ctx.run_name, step.name(), e)
            })?;
            let elapsed = started.elapsed();

            match &outcome {
                StepOutcome::Success => ctx.logger.success(&format!(
                    "{} done in {:.1}s",
                    step.name(),
                    elapsed.as_secs_f64()
                )),
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step.name(), reason))
                }
            }

            reports.push(StepReport {
                name: step.name().to_string(),
                outcome,
                elapsed,
            });
        }

        let result = PipelineRunResult {
            steps: reports,
            elapsed: run_started.elapsed(),
        };
        ctx.logger.success(&format!(
            "Run finished in {:.1}s",
            result.elapsed.as_secs_f64()
        ));
        ctx.logger.flush();
        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Input check, execution, and (on success) output check for one step.
/// Errors carry the stage that failed.
fn run_step(
    step: &dyn PipelineStep,
    ctx: &Context,
    state: &mut RunState,
) -> Result<StepOutcome, (&'static str, StepError)> {
    step.validate_input(ctx, state)
        .map_err(|e| ("input check failed", e))?;
    let outcome = step.execute(ctx, state).map_err(|e| ("failed", e))?;
    if outcome == StepOutcome::Success {
        step.validate_output(ctx, state)
            .map_err(|e| ("output check failed", e))?;
    }
    Ok(outcome)
}

/// What one step did.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
    pub elapsed: Duration,
}

/// Per-step reports of a finished run, in execution order.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
}

impl PipelineRunResult {
    /// No step was skipped.
    pub fn all_completed(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.outcome == StepOutcome::Success)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Skipped(_)))
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}
