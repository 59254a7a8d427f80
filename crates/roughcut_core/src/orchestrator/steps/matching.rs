//! Match step: assign materials to captions.
//!
//! One aggregate model call, validated by the sanitizer and completed by
//! the positional fallback. Failures here end the run; the raw reply is
//! saved first so it can be inspected without calling the model again.

use crate::cache::{request_fingerprint, store, MatchCache};
use crate::extraction::{extract_structured, response_head};
use crate::matching::{apply_fallback, sanitize_matches, MatchRecord};
use crate::model::ModelRequest;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::prompts::{match_payload, matchable_captions, MATCH_INSTRUCTION};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MatchOutput, RunState, StepOutcome};

/// Raw matching reply saved when it cannot be used.
pub const MATCH_RAW_FILE: &str = "srt_matches_raw.txt";

pub struct MatchStep;

impl MatchStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MatchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MatchStep {
    fn name(&self) -> &str {
        "Match"
    }

    fn description(&self) -> &str {
        "Match captions to materials"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_captions() {
            return Err(StepError::invalid_input("No captions to match"));
        }
        if state.materials.len() != state.material_paths.len() {
            return Err(StepError::invalid_input("Materials have not been described"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let expected = matchable_captions(&state.captions).count();
        if expected == 0 {
            return Ok(StepOutcome::Skipped("no caption has text".to_string()));
        }

        let matching = &ctx.settings.matching;
        let allowed = matching.allowed_transitions();
        let text_model = ctx.settings.model.text_model_override();

        let payload = match_payload(
            &state.captions,
            &state.materials,
            &allowed,
            &matching.style_hint,
            matching.allow_reuse,
        );
        let request_hash = request_fingerprint(&format!(
            "{}\n{}",
            text_model.as_deref().unwrap_or_default(),
            payload
        ));

        let cache = MatchCache::in_dir(&ctx.cache_dir);
        if !ctx.spec.force {
            if let Some(matches) = cache.lookup(&request_hash) {
                ctx.logger.info(&format!(
                    "Reusing {} cached matches from {}",
                    matches.len(),
                    cache.path().display()
                ));
                state.matching = Some(MatchOutput {
                    matches,
                    from_cache: true,
                    fallback_applied: false,
                });
                return Ok(StepOutcome::Success);
            }
        }

        ctx.logger.info(&format!(
            "Asking the model to match {} captions against {} materials",
            expected,
            state.materials.len()
        ));

        let request = ModelRequest::new(MATCH_INSTRUCTION)
            .with_payload(payload)
            .with_model(text_model)
            .with_context_dirs([ctx.cache_dir.as_path()]);

        let response = ctx.client.invoke(&request).map_err(|e| {
            if let Some(stderr) = e.stderr() {
                ctx.logger.model_stderr(stderr);
            }
            ctx.logger.show_tail("model");
            StepError::Model(e)
        })?;

        let mut matches = parse_matches(ctx, &response.text, state.materials.len())?;

        if matches.len() != expected {
            ctx.logger.warn(&format!(
                "Expected {} matches, model returned {}",
                expected,
                matches.len()
            ));
        }

        let fallback_applied =
            apply_fallback(&mut matches, state.materials.len(), matching.allow_reuse);
        if fallback_applied {
            ctx.logger
                .warn("Model assigned no materials; using positional fallback");
        }

        let assigned = matches.iter().filter(|m| m.material_id.is_some()).count();
        ctx.logger.info(&format!(
            "{} of {} captions have a material",
            assigned,
            matches.len()
        ));

        cache.store(&request_hash, &matches)?;

        state.matching = Some(MatchOutput {
            matches,
            from_cache: false,
            fallback_applied,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        let Some(output) = &state.matching else {
            return Err(StepError::invalid_output("Matches not recorded"));
        };

        let material_count = state.materials.len();
        if output
            .matches
            .iter()
            .filter_map(|m| m.material_id)
            .any(|id| id >= material_count)
        {
            return Err(StepError::invalid_output("Match refers to unknown material"));
        }

        if !ctx.settings.matching.allow_reuse {
            let mut seen = std::collections::HashSet::new();
            for id in output.matches.iter().filter_map(|m| m.material_id) {
                if !seen.insert(id) {
                    return Err(StepError::invalid_output(format!(
                        "Material {} assigned twice",
                        id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Extract and sanitize the reply, saving it to disk if either fails.
fn parse_matches(ctx: &Context, text: &str, material_count: usize) -> StepResult<Vec<MatchRecord>> {
    let allowed = ctx.settings.matching.allowed_transitions();

    let value = match extract_structured(text) {
        Ok(v) => v,
        Err(source) => {
            let raw_path = save_raw(ctx, text);
            ctx.logger
                .error(&format!("Unparsable reply: {}", response_head(text, 200)));
            return Err(StepError::UnparsableMatches { raw_path, source });
        }
    };

    sanitize_matches(
        &value,
        &allowed,
        material_count as i64 - 1,
        ctx.settings.matching.allow_reuse,
    )
    .map_err(|source| StepError::InvalidMatches {
        raw_path: save_raw(ctx, text),
        source,
    })
}

fn save_raw(ctx: &Context, text: &str) -> std::path::PathBuf {
    let path = ctx.diagnostic_path(MATCH_RAW_FILE);
    if let Err(e) = store::write_text(&path, text) {
        ctx.logger
            .warn(&format!("Could not save raw reply to {}: {}", path.display(), e));
    }
    path
}
