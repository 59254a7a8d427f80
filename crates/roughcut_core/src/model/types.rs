//! Model request and response types.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// One call to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    /// Short instruction passed on the command line.
    pub instruction: String,
    /// Bulk input, fed on stdin.
    pub payload: Option<String>,
    /// Directories the model may read from. Absolute, unique, in the order
    /// they were first given.
    pub context_dirs: Vec<PathBuf>,
    /// Model override; `None` lets the client pick.
    pub model: Option<String>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
}

impl ModelRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            ..Default::default()
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add context directories, normalizing and skipping repeats.
    pub fn with_context_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for dir in dirs {
            let dir = dir.as_ref();
            if dir.as_os_str().is_empty() {
                continue;
            }
            let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
            if !self.context_dirs.contains(&dir) {
                self.context_dirs.push(dir);
            }
        }
        self
    }
}

/// Model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub session_id: Option<String>,
    /// Free text that may embed a structured value.
    pub text: String,
    /// Diagnostic output of the final attempt.
    pub stderr: String,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Normalize a model override: `auto`, `default`, `none`, `null` and blank
/// mean "no override".
pub fn normalize_model_arg(model: Option<&str>) -> Option<String> {
    let model = model?.trim();
    if model.is_empty() {
        return None;
    }
    match model.to_ascii_lowercase().as_str() {
        "auto" | "default" | "none" | "null" => None,
        _ => Some(model.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_dirs_are_absolute_and_unique() {
        let cwd = std::env::current_dir().unwrap();
        let request = ModelRequest::new("go").with_context_dirs(["a", "", "a", "/tmp/x"]);
        assert_eq!(
            request.context_dirs,
            vec![cwd.join("a"), PathBuf::from("/tmp/x")]
        );
    }

    #[test]
    fn model_overrides_normalize() {
        assert_eq!(normalize_model_arg(None), None);
        assert_eq!(normalize_model_arg(Some("  ")), None);
        assert_eq!(normalize_model_arg(Some("AUTO")), None);
        assert_eq!(normalize_model_arg(Some("null")), None);
        assert_eq!(
            normalize_model_arg(Some(" gemini-3-pro-preview ")),
            Some("gemini-3-pro-preview".to_string())
        );
    }
}
