//! roughcut binary entry point

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;

use roughcut_core::cache::FingerprintCache;
use roughcut_core::config::{ConfigManager, Settings};
use roughcut_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use roughcut_core::media::FfmpegTools;
use roughcut_core::model::CliModelClient;
use roughcut_core::orchestrator::{create_standard_pipeline, Context, RunSpec, RunState};
use roughcut_core::plan::{build_placements, Plan};

#[derive(Parser)]
#[command(name = "roughcut")]
#[command(version, about = "Match voiceover captions to video and image clips", long_about = None)]
struct Cli {
    /// Caption file (.srt)
    #[arg(long)]
    srt: PathBuf,

    /// Material files or directories (searched recursively)
    #[arg(long, num_args = 1.., required = true)]
    materials: Vec<PathBuf>,

    /// Editing style hint for the matching call
    #[arg(long)]
    style: Option<String>,

    /// Model for the matching call ("auto" for the CLI default)
    #[arg(long)]
    text_model: Option<String>,

    /// Model for material descriptions ("auto" for the CLI default)
    #[arg(long)]
    vision_model: Option<String>,

    /// Cache directory for analysis, proxies and diagnostics
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Use at most this many materials (0 for all)
    #[arg(long, default_value = "0")]
    limit_materials: usize,

    /// Ignore cached descriptions and matches
    #[arg(long)]
    force: bool,

    /// Let one material back several captions
    #[arg(long)]
    allow_reuse: bool,

    /// Settings file, created with defaults if missing
    #[arg(long, default_value = "roughcut.toml")]
    config: PathBuf,

    /// Plan output path (default: <cache dir>/plan.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    /// Per-run overrides on top of the loaded settings.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(style) = &self.style {
            settings.matching.style_hint = style.clone();
        }
        if let Some(model) = &self.text_model {
            settings.model.text_model = model.clone();
        }
        if let Some(model) = &self.vision_model {
            settings.model.vision_model = model.clone();
        }
        if let Some(dir) = &self.cache_dir {
            settings.paths.cache_dir = dir.to_string_lossy().into_owned();
        }
        if self.allow_reuse {
            settings.matching.allow_reuse = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    cli.apply_overrides(config.settings_mut());
    config
        .ensure_dirs_exist()
        .context("creating cache and log directories")?;
    let settings = config.into_settings();

    let level: LogLevel = settings.logging.level.parse().unwrap_or_default();
    init_tracing(level);
    tracing::debug!("roughcut {} starting", roughcut_core::version());

    let run_name = RunLogger::timestamped_name();
    let logger = RunLogger::new(
        &run_name,
        settings.paths.logs_folder(),
        LogConfig::from(&settings.logging),
        Some(Box::new(|line: &str| println!("{}", line))),
    )
    .context("opening run log")?;

    let client = CliModelClient::new(&settings.model.program)
        .with_timeout(settings.model.timeout())
        .with_retry_policy(settings.model.retry_policy());
    let tools = FfmpegTools::new(settings.storyboard.layout());

    let spec = RunSpec {
        captions_path: cli.srt.clone(),
        material_inputs: cli.materials.clone(),
        material_limit: cli.limit_materials,
        force: cli.force,
    };
    let ctx = Context::new(
        spec,
        settings,
        &run_name,
        logger,
        Box::new(client),
        Box::new(tools),
    );

    let mut state = RunState::new(&run_name, FingerprintCache::in_dir(&ctx.cache_dir));
    if let Err(e) = create_standard_pipeline().run(&ctx, &mut state) {
        if let Some(path) = e.step_error().raw_response_path() {
            ctx.logger
                .error(&format!("Raw model reply saved to {}", path.display()));
        }
        ctx.logger.close();
        return Err(e).context("run failed");
    }

    let placements = build_placements(&state.captions, &state.materials, state.matches());
    let plan = Plan::new(&ctx.spec.captions_path, placements);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| ctx.diagnostic_path("plan.json"));
    plan.save(&output)
        .with_context(|| format!("writing plan to {}", output.display()))?;

    ctx.logger.success(&format!(
        "{} clips placed over {:.1}s, plan written to {}",
        plan.placements.len(),
        plan.total_duration(),
        output.display()
    ));
    ctx.logger.info(&format!("Log: {}", ctx.logger.log_path().display()));
    ctx.logger.close();
    Ok(())
}
