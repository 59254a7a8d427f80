//! Describe step: tags and a description for every material.
//!
//! Materials are handled one at a time through the analysis cache. On a
//! miss the material gets a visual proxy and one descriptive model call
//! (two if a forced model override produced something unusable). Any
//! failure degrades that material to empty tags and description.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::cache::{modification_time, store, AnalysisRecord};
use crate::extraction::{extract_structured, response_head, ExtractError};
use crate::media::{visual_proxy, MaterialKind, MaterialRecord};
use crate::model::{ModelError, ModelRequest};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::heuristics::{looks_like_file_metadata, looks_like_vision_refusal};
use crate::orchestrator::prompts::{describe_payload, DESCRIBE_INSTRUCTION};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Last suspicious descriptive reply, kept for inspection.
pub const ANALYSIS_RAW_FILE: &str = "analysis_raw_last.txt";

/// Tags and description pulled from a descriptive reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDescription {
    pub tags: Vec<String>,
    pub description: String,
}

impl MaterialDescription {
    /// Coerce a loosely typed reply. Non-object values and wrongly typed
    /// fields become empty; tags are stringified, trimmed, blanks dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let tags = fields
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|t| match t {
                        Value::String(s) => s.trim().to_string(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let description = fields
            .get("desc")
            .or_else(|| fields.get("description"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Self { tags, description }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.description.is_empty()
    }

    /// Empty, or about the file rather than its content.
    pub fn is_suspicious(&self) -> bool {
        self.is_empty() || looks_like_file_metadata(&self.tags, &self.description)
    }
}

/// Why one descriptive call produced nothing usable.
#[derive(Error, Debug)]
enum DescribeError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model declined to look at the image")]
    Refused { raw: String },

    #[error("no JSON in reply: {source}")]
    Unparsable {
        raw: String,
        #[source]
        source: ExtractError,
    },
}

impl DescribeError {
    fn raw(&self) -> Option<&str> {
        match self {
            DescribeError::Refused { raw } | DescribeError::Unparsable { raw, .. } => Some(raw),
            DescribeError::Model(_) => None,
        }
    }
}

pub struct DescribeStep;

impl DescribeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DescribeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DescribeStep {
    fn name(&self) -> &str {
        "Describe"
    }

    fn description(&self) -> &str {
        "Describe materials"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.material_paths.is_empty() {
            return Err(StepError::invalid_input("No materials to describe"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let total = state.material_paths.len();
        let mut materials = Vec::with_capacity(total);

        for (id, path) in state.material_paths.iter().enumerate() {
            ctx.logger
                .section(&format!("[{}/{}] {}", id + 1, total, path.display()));

            let kind = MaterialKind::classify(path);
            let mtime = modification_time(path);

            let record = state.cache.get_or_compute(
                path,
                |_| mtime,
                |_| describe_material(ctx, path, kind, mtime),
                ctx.spec.force,
            )?;

            if record.tags.is_empty() && record.description.is_empty() {
                ctx.logger.warn("No description available");
            } else {
                ctx.logger.info(&format!(
                    "Tags: {} | {}",
                    record.tags.join(", "),
                    record.description
                ));
            }

            materials.push(MaterialRecord {
                id,
                path: path.clone(),
                kind: record.kind,
                duration: record.duration,
                tags: record.tags,
                description: record.description,
            });
        }

        state.materials = materials;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.materials.len() != state.material_paths.len() {
            return Err(StepError::invalid_output(format!(
                "Described {} of {} materials",
                state.materials.len(),
                state.material_paths.len()
            )));
        }
        Ok(())
    }
}

/// Cache-miss path for one material. Never fails; problems are logged and
/// leave the description empty.
fn describe_material(ctx: &Context, path: &Path, kind: MaterialKind, mtime: f64) -> AnalysisRecord {
    let duration = match kind {
        MaterialKind::Video => ctx.tools.duration(path),
        MaterialKind::Image => 0.0,
    };

    let mut record = AnalysisRecord {
        kind,
        duration,
        tags: Vec::new(),
        description: String::new(),
        vision_image: None,
    };

    let proxy = match visual_proxy(ctx.tools.as_ref(), &ctx.cache_dir, path, kind, mtime) {
        Ok(p) => p,
        Err(e) => {
            ctx.logger
                .warn(&format!("Could not prepare {} for the model: {}", path.display(), e));
            return record;
        }
    };

    let description = describe_with_model(ctx, &proxy, kind);
    record.tags = description.tags;
    record.description = description.description;
    record.vision_image = Some(proxy);
    record
}

/// Ask for a description, retrying once without the model override when
/// the forced model refused, answered off-format, or described the file.
fn describe_with_model(ctx: &Context, proxy: &Path, kind: MaterialKind) -> MaterialDescription {
    let forced = ctx.settings.model.vision_model_override();
    let first = ask_for_description(ctx, proxy, kind, forced.clone());

    let retry = forced.is_some()
        && match &first {
            Ok(d) => d.is_suspicious(),
            Err(DescribeError::Model(_)) => false,
            Err(_) => true,
        };
    if !retry {
        return settle(ctx, first);
    }

    let raw = match &first {
        Ok(_) => None,
        Err(e) => e.raw(),
    };
    if let Some(raw) = raw {
        save_raw(ctx, raw);
    }
    ctx.logger.warn(&format!(
        "Unusable reply from '{}', retrying with the client's default model",
        forced.as_deref().unwrap_or_default()
    ));

    settle(ctx, ask_for_description(ctx, proxy, kind, None))
}

fn ask_for_description(
    ctx: &Context,
    proxy: &Path,
    kind: MaterialKind,
    model: Option<String>,
) -> Result<MaterialDescription, DescribeError> {
    let payload = describe_payload(
        proxy,
        kind,
        &ctx.settings.storyboard.layout(),
        &ctx.settings.model.response_language,
    );
    let request = ModelRequest::new(DESCRIBE_INSTRUCTION)
        .with_payload(payload)
        .with_model(model)
        .with_context_dirs([ctx.cache_dir.as_path()]);

    let response = ctx.client.invoke(&request).map_err(|e| {
        if let Some(stderr) = e.stderr() {
            ctx.logger.model_stderr(stderr);
        }
        e
    })?;

    if looks_like_vision_refusal(&response.text) {
        return Err(DescribeError::Refused { raw: response.text });
    }

    match extract_structured(&response.text) {
        Ok(value) => {
            let description = MaterialDescription::from_value(&value);
            if description.is_suspicious() {
                save_raw(ctx, &response.text);
            }
            Ok(description)
        }
        Err(source) => Err(DescribeError::Unparsable {
            raw: response.text,
            source,
        }),
    }
}

fn settle(ctx: &Context, result: Result<MaterialDescription, DescribeError>) -> MaterialDescription {
    match result {
        Ok(description) => description,
        Err(e) => {
            ctx.logger.warn(&format!("Describe failed: {}", e));
            if let Some(raw) = e.raw() {
                ctx.logger.debug(&format!("Reply head: {}", response_head(raw, 200)));
            }
            ctx.logger.show_tail("model");
            MaterialDescription::default()
        }
    }
}

fn save_raw(ctx: &Context, raw: &str) {
    let path = ctx.diagnostic_path(ANALYSIS_RAW_FILE);
    if let Err(e) = store::write_text(&path, raw) {
        tracing::warn!("Could not save raw reply to {}: {}", path.display(), e);
    }
}
