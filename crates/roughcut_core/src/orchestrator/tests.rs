use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use super::*;
use crate::cache::{FingerprintCache, ANALYSIS_CACHE_FILE, MATCH_CACHE_FILE};
use crate::config::Settings;
use crate::logging::{init_test_tracing, LogConfig, RunLogger};
use crate::matching::Transition;
use crate::media::{MediaResult, MediaTools};
use crate::model::{ModelClient, ModelError, ModelRequest, ModelResponse, ModelResult};
use crate::orchestrator::prompts::MATCH_INSTRUCTION;
use crate::orchestrator::steps::{ANALYSIS_RAW_FILE, MATCH_RAW_FILE};

type Handler = Box<dyn Fn(&ModelRequest) -> ModelResult<String>>;

/// In-memory client answering through a closure and recording requests.
struct ScriptedClient {
    handler: Handler,
    calls: Rc<RefCell<Vec<ModelRequest>>>,
}

impl ModelClient for ScriptedClient {
    fn invoke(&self, request: &ModelRequest) -> ModelResult<ModelResponse> {
        self.calls.borrow_mut().push(request.clone());
        let text = (self.handler)(request)?;
        Ok(ModelResponse {
            text,
            attempts: 1,
            ..Default::default()
        })
    }
}

struct FakeTools;

impl MediaTools for FakeTools {
    fn duration(&self, _path: &Path) -> f64 {
        12.5
    }

    fn storyboard(&self, _video: &Path, out_image: &Path) -> MediaResult<()> {
        fs::create_dir_all(out_image.parent().unwrap()).unwrap();
        fs::write(out_image, b"storyboard").unwrap();
        Ok(())
    }
}

const SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n\
2\n00:00:02,000 --> 00:00:04,500\nBy the sea\n\n\
3\n00:00:04,500 --> 00:00:06,000\nGoodbye\n";

struct Fixture {
    dir: TempDir,
    calls: Rc<RefCell<Vec<ModelRequest>>>,
}

impl Fixture {
    fn new() -> Self {
        init_test_tracing();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("voice.srt"), SRT).unwrap();
        let media = dir.path().join("media");
        fs::create_dir_all(&media).unwrap();
        fs::write(media.join("a.png"), b"png").unwrap();
        fs::write(media.join("b.jpg"), b"jpg").unwrap();
        fs::write(media.join("c.mp4"), b"mp4").unwrap();
        Self {
            dir,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.paths.cache_dir = self.cache_dir().to_string_lossy().into_owned();
        settings
    }

    fn context(&self, settings: Settings, force: bool, handler: Handler) -> Context {
        let client = ScriptedClient {
            handler,
            calls: Rc::clone(&self.calls),
        };
        self.context_with_client(settings, force, Box::new(client))
    }

    fn context_with_client(
        &self,
        settings: Settings,
        force: bool,
        client: Box<dyn ModelClient>,
    ) -> Context {
        let logger = RunLogger::new(
            "test_run",
            self.dir.path().join("logs"),
            LogConfig {
                show_timestamps: false,
                ..LogConfig::default()
            },
            None,
        )
        .unwrap();
        let spec = RunSpec {
            captions_path: self.dir.path().join("voice.srt"),
            material_inputs: vec![self.dir.path().join("media")],
            material_limit: 0,
            force,
        };
        Context::new(spec, settings, "test_run", logger, client, Box::new(FakeTools))
    }

    fn run(&self, ctx: &Context) -> (PipelineResult<PipelineRunResult>, RunState) {
        let mut state = RunState::new("test_run", FingerprintCache::in_dir(&ctx.cache_dir));
        let result = create_standard_pipeline().run(ctx, &mut state);
        (result, state)
    }

    fn call_count(&self, matching: bool) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|r| (r.instruction == MATCH_INSTRUCTION) == matching)
            .count()
    }
}

fn is_match(request: &ModelRequest) -> bool {
    request.instruction == MATCH_INSTRUCTION
}

fn cooperative(request: &ModelRequest) -> ModelResult<String> {
    if is_match(request) {
        Ok("Here is the plan:\n```json\n[\
            {\"srt_idx\": 1, \"id\": 2, \"transition\": \"闪白\"},\
            {\"srt_idx\": 2, \"id\": 0, \"transition\": \"???\"},\
            {\"srt_idx\": 3, \"id\": 2, \"transition\": \"模糊\"}]\n```"
            .to_string())
    } else {
        Ok("{\"tags\": [\"海边\", \"日落\"], \"desc\": \"海边的日落\"}".to_string())
    }
}

#[test]
fn full_run_describes_matches_and_caches() {
    let fx = Fixture::new();
    let ctx = fx.context(fx.settings(), false, Box::new(cooperative));

    let (result, state) = fx.run(&ctx);
    let result = result.unwrap();

    assert!(result.all_completed());
    assert_eq!(result.total_steps(), 4);
    assert_eq!(state.captions.len(), 3);
    assert_eq!(state.materials.len(), 3);
    assert_eq!(state.materials[2].duration, 12.5);
    assert_eq!(state.materials[0].duration, 0.0);
    assert_eq!(state.materials[1].tags, vec!["海边", "日落"]);

    let matching = state.matching.as_ref().unwrap();
    assert!(!matching.from_cache);
    assert!(!matching.fallback_applied);
    let ids: Vec<_> = matching.matches.iter().map(|m| m.material_id).collect();
    assert_eq!(ids, vec![Some(2), Some(0), None]);
    assert_eq!(matching.matches[0].transition, Transition::FlashWhite);
    assert_eq!(matching.matches[1].transition, Transition::Dissolve);

    assert_eq!(fx.call_count(false), 3);
    assert_eq!(fx.call_count(true), 1);
    assert!(fx.cache_dir().join(ANALYSIS_CACHE_FILE).exists());
    assert!(fx.cache_dir().join(MATCH_CACHE_FILE).exists());
    assert!(fx.cache_dir().join("storyboards").is_dir());
    assert!(fx.cache_dir().join("media").is_dir());
}

#[test]
fn second_run_reuses_both_caches() {
    let fx = Fixture::new();
    let ctx = fx.context(fx.settings(), false, Box::new(cooperative));
    let (first, first_state) = fx.run(&ctx);
    first.unwrap();
    drop(ctx);

    let ctx = fx.context(fx.settings(), false, Box::new(|_: &ModelRequest| -> ModelResult<String> {
        panic!("model must not be called")
    }));
    let (second, state) = fx.run(&ctx);
    second.unwrap();

    assert_eq!(fx.call_count(false), 3);
    assert_eq!(fx.call_count(true), 1);
    assert_eq!(state.materials, first_state.materials);
    let matching = state.matching.unwrap();
    assert!(matching.from_cache);
    assert_eq!(matching.matches, first_state.matching.unwrap().matches);
}

#[test]
fn forced_run_calls_the_model_again() {
    let fx = Fixture::new();
    let ctx = fx.context(fx.settings(), false, Box::new(cooperative));
    fx.run(&ctx).0.unwrap();
    drop(ctx);

    let ctx = fx.context(fx.settings(), true, Box::new(cooperative));
    fx.run(&ctx).0.unwrap();

    assert_eq!(fx.call_count(false), 6);
    assert_eq!(fx.call_count(true), 2);
}

#[test]
fn refusal_from_forced_model_retries_with_default() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            return Ok("[]".to_string());
        }
        match request.model {
            Some(_) => Ok("Sorry, I cannot directly analyze images.".to_string()),
            None => Ok("{\"tags\": [\"猫\"], \"desc\": \"一只猫\"}".to_string()),
        }
    };
    let ctx = fx.context(fx.settings(), false, Box::new(handler));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    assert!(state.materials.iter().all(|m| m.description == "一只猫"));
    let models: Vec<_> = fx
        .calls
        .borrow()
        .iter()
        .filter(|r| !is_match(r))
        .map(|r| r.model.clone())
        .collect();
    assert_eq!(models.len(), 6);
    assert!(models[0].is_some());
    assert!(models[1].is_none());
    assert!(fx.cache_dir().join(ANALYSIS_RAW_FILE).exists());
}

#[test]
fn metadata_description_triggers_one_retry() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            return Ok("[]".to_string());
        }
        Ok("{\"tags\": [\"png\"], \"desc\": \"缓存目录中的一个文件\"}".to_string())
    };
    let ctx = fx.context(fx.settings(), false, Box::new(handler));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    // Both attempts looked like metadata; the second answer is kept as is.
    assert_eq!(fx.call_count(false), 6);
    assert_eq!(state.materials[0].tags, vec!["png"]);
    let raw = fs::read_to_string(fx.cache_dir().join(ANALYSIS_RAW_FILE)).unwrap();
    assert!(raw.contains("缓存目录"));
}

#[test]
fn no_override_means_no_retry() {
    let fx = Fixture::new();
    let mut settings = fx.settings();
    settings.model.vision_model = "auto".to_string();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            return Ok("[]".to_string());
        }
        assert!(request.model.is_none());
        Ok("no json here".to_string())
    };
    let ctx = fx.context(settings, false, Box::new(handler));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    assert_eq!(fx.call_count(false), 3);
    assert!(state
        .materials
        .iter()
        .all(|m| m.tags.is_empty() && m.description.is_empty()));
}

#[test]
fn model_failure_degrades_single_material() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            return Ok("[{\"srt_idx\": 1, \"id\": 1}]".to_string());
        }
        if request.payload.as_deref().unwrap_or_default().contains("contact sheet") {
            return Err(ModelError::Permanent {
                exit_code: Some(1),
                stderr: "boom\ninvalid API key".to_string(),
            });
        }
        Ok("{\"tags\": [\"花\"], \"desc\": \"花\"}".to_string())
    };
    let ctx = fx.context(fx.settings(), false, Box::new(handler));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    assert_eq!(state.materials[0].description, "花");
    assert_eq!(state.materials[2].description, "");
    // A transport failure is not retried without the override.
    assert_eq!(fx.call_count(false), 3);

    ctx.logger.flush();
    let log = fs::read_to_string(ctx.logger.log_path()).unwrap();
    assert!(log.contains("[model/tail]"));
    assert!(log.contains("invalid API key"));
}

#[test]
fn unparsable_matches_are_saved_and_fatal() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            Ok("I could not decide, sorry.".to_string())
        } else {
            Ok("{\"tags\": [\"a\"], \"desc\": \"b\"}".to_string())
        }
    };
    let ctx = fx.context(fx.settings(), false, Box::new(handler));

    let (result, _) = fx.run(&ctx);
    let err = result.unwrap_err();

    assert!(matches!(err.step_error(), StepError::UnparsableMatches { .. }));
    let raw_path = err.step_error().raw_response_path().unwrap();
    assert_eq!(*raw_path, fx.cache_dir().join(MATCH_RAW_FILE));
    assert_eq!(
        fs::read_to_string(raw_path).unwrap(),
        "I could not decide, sorry."
    );
    assert!(!fx.cache_dir().join(MATCH_CACHE_FILE).exists());
}

#[test]
fn non_list_matches_are_saved_and_fatal() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            Ok("{\"matches\": []}".to_string())
        } else {
            Ok("{\"tags\": [\"a\"], \"desc\": \"b\"}".to_string())
        }
    };
    let ctx = fx.context(fx.settings(), false, Box::new(handler));

    let err = fx.run(&ctx).0.unwrap_err();

    assert!(matches!(err.step_error(), StepError::InvalidMatches { .. }));
    assert!(fx.cache_dir().join(MATCH_RAW_FILE).exists());
}

#[test]
fn all_null_matches_fall_back_to_positions() {
    let fx = Fixture::new();
    let handler = |request: &ModelRequest| -> ModelResult<String> {
        if is_match(request) {
            Ok("[{\"srt_idx\": 1, \"id\": null}, {\"srt_idx\": 2, \"id\": null}, {\"srt_idx\": 3, \"id\": 99}]"
                .to_string())
        } else {
            Ok("{\"tags\": [\"a\"], \"desc\": \"b\"}".to_string())
        }
    };
    let mut settings = fx.settings();
    settings.matching.allow_reuse = true;
    let ctx = fx.context(settings, false, Box::new(handler));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    let matching = state.matching.unwrap();
    assert!(matching.fallback_applied);
    let ids: Vec<_> = matching.matches.iter().map(|m| m.material_id).collect();
    assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn missing_caption_file_fails_validation() {
    let fx = Fixture::new();
    fs::remove_file(fx.dir.path().join("voice.srt")).unwrap();
    let ctx = fx.context(fx.settings(), false, Box::new(cooperative));

    let err = fx.run(&ctx).0.unwrap_err();

    assert!(matches!(err.step_error(), StepError::InvalidInput(_)));
    assert!(fx.calls.borrow().is_empty());
}

#[test]
fn standard_pipeline_order() {
    assert_eq!(
        create_standard_pipeline().step_names(),
        vec!["Captions", "Discover", "Describe", "Match"]
    );
}

/// Stand-in model CLI: swallows stdin and prints a JSON envelope whose
/// `response` wraps its JSON in Markdown fences, as real replies often do.
#[cfg(unix)]
const FENCED_CLI: &str = r#"#!/bin/sh
cat > /dev/null
case "$2" in
*array*) cat <<'EOF'
Loaded cached credentials.
{"session_id":"m","response":"Here you go:\n```json\n[{\"srt_idx\": 1, \"id\": 2, \"transition\": \"闪白\"}, {\"srt_idx\": 2, \"id\": 0}, {\"srt_idx\": 3, \"id\": 1}]\n```"}
EOF
;;
*) cat <<'EOF'
{"session_id":"d","response":"Sure.\n```json\n{\"tags\": [\"sea\"], \"desc\": \"waves\"}\n```","stats":{}}
EOF
;;
esac
"#;

#[cfg(unix)]
#[test]
fn cli_client_with_fenced_replies() {
    use std::os::unix::fs::PermissionsExt;

    use crate::model::{CliModelClient, RetryPolicy};

    let fx = Fixture::new();
    let program = fx.dir.path().join("fake_model");
    fs::write(&program, FENCED_CLI).unwrap();
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
    let client = CliModelClient::new(program.to_string_lossy())
        .with_retry_policy(RetryPolicy::immediate(1));
    let ctx = fx.context_with_client(fx.settings(), false, Box::new(client));

    let (result, state) = fx.run(&ctx);
    result.unwrap();

    assert!(state
        .materials
        .iter()
        .all(|m| m.tags == vec!["sea"] && m.description == "waves"));
    let matching = state.matching.unwrap();
    let ids: Vec<_> = matching.matches.iter().map(|m| m.material_id).collect();
    assert_eq!(ids, vec![Some(2), Some(0), Some(1)]);
    assert_eq!(matching.matches[0].transition, Transition::FlashWhite);
    assert_eq!(matching.matches[1].transition, Transition::Dissolve);
    assert!(!matching.fallback_applied);
}
