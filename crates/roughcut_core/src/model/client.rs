//! Model client trait and the headless-CLI implementation.

use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::extraction::scanner::find_balanced_span;
use crate::extraction::{response_head, ExtractError, ExtractResult};
use crate::process::CommandRunner;

use super::error::{ModelError, ModelResult};
use super::retry::{is_bootstrap_reply, is_transient, RetryPolicy};
use super::types::{ModelRequest, ModelResponse};

/// Anything that can answer a [`ModelRequest`].
pub trait ModelClient {
    fn invoke(&self, request: &ModelRequest) -> ModelResult<ModelResponse>;
}

/// Runs a headless model CLI once per attempt:
///
/// ```text
/// <program> -p <instruction> -o json [-m <model>] [--include-directories <dir>]...
/// ```
///
/// with the payload on stdin. Stdout must carry a JSON envelope with a
/// `response` string and optional `session_id`.
#[derive(Debug, Clone)]
pub struct CliModelClient {
    program: String,
    timeout: Duration,
    policy: RetryPolicy,
    working_dir: Option<PathBuf>,
}

impl CliModelClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(600),
            policy: RetryPolicy::default(),
            working_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_command(&self, request: &ModelRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-p").arg(&request.instruction).arg("-o").arg("json");
        if let Some(model) = &request.model {
            cmd.arg("-m").arg(model);
        }
        for dir in &request.context_dirs {
            cmd.arg("--include-directories").arg(dir);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl ModelClient for CliModelClient {
    fn invoke(&self, request: &ModelRequest) -> ModelResult<ModelResponse> {
        let max_attempts = self.policy.attempts();
        let runner = CommandRunner::new().with_timeout(request.timeout.unwrap_or(self.timeout));
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                "Model call attempt {}/{} (model: {})",
                attempt,
                max_attempts,
                request.model.as_deref().unwrap_or("default")
            );

            let output = runner.run(
                &self.program,
                self.build_command(request),
                request.payload.as_deref(),
            )?;

            if output.success {
                let envelope = parse_envelope(&output.stdout)?;
                if is_bootstrap_reply(&envelope.text) && attempt < max_attempts {
                    tracing::warn!(
                        "Model replied with a greeting instead of an answer, retrying: {}",
                        response_head(&envelope.text, 80)
                    );
                    continue;
                }
                return Ok(ModelResponse {
                    stderr: output.stderr,
                    attempts: attempt,
                    ..envelope
                });
            }

            if !is_transient(&output.stderr) {
                return Err(ModelError::Permanent {
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                });
            }
            if attempt >= max_attempts {
                return Err(ModelError::Transient {
                    attempts: attempt,
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                });
            }

            let delay = self.policy.backoff(attempt);
            tracing::warn!(
                "Model service busy (attempt {}/{}), retrying in {:.0}s",
                attempt,
                max_attempts,
                delay.as_secs_f64()
            );
            thread::sleep(delay);
        }
    }
}

/// Pull `session_id` and `response` out of the client's stdout.
///
/// Stray log lines around the envelope are tolerated. Fences are not looked
/// at: they belong to the `response` string, not to the envelope.
pub fn parse_envelope(stdout: &str) -> ModelResult<ModelResponse> {
    let envelope_error = |reason: String| ModelError::Envelope {
        reason,
        stdout: stdout.to_string(),
    };

    let fields = find_envelope(stdout).map_err(|e| envelope_error(e.to_string()))?;
    let Value::Object(fields) = fields else {
        return Err(envelope_error("not a JSON object".to_string()));
    };

    let text = match fields.get("response") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let session_id = fields
        .get("session_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ModelResponse {
        session_id,
        text,
        ..Default::default()
    })
}

/// The whole stdout if it parses, else the first balanced `{...}` that
/// parses as an object.
fn find_envelope(stdout: &str) -> ExtractResult<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Empty);
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let mut last_err = ExtractError::NoOpeningBracket;
    for (start, _) in stdout.match_indices('{') {
        let tail = &stdout[start..];
        let span = match find_balanced_span(tail) {
            Ok(span) => span,
            Err(e) => {
                last_err = e;
                continue;
            }
        };
        match serde_json::from_str::<Value>(&tail[span]) {
            Ok(value @ Value::Object(_)) => return Ok(value),
            Ok(_) => {}
            Err(e) => last_err = ExtractError::Parse(e),
        }
    }
    Err(last_err)
}
