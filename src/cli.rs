//! Command-line interface.
//!
//! The binary stays thin; argument definitions and command execution live
//! here so they are testable. `generate` drives a full batch against the
//! configured provider and writes every generated image to the output
//! directory; `scenes` prints the preset catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::batch::{BatchSelection, BatchSession};
use crate::catalog::PRESET_SCENES;
use crate::config::MockforgeConfig;
use crate::image::EncodedImage;
use crate::provider::{GeminiClient, GenerationClient, RetryPolicy, RetryingClient};
use crate::queue::{BatchQueue, QueueConfig};
use crate::store::{JobStatus, ResultStore};

#[derive(Debug, Parser)]
#[command(
    name = "mockforge",
    about = "Generate AI product-scene mockups from a product photo",
    version
)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Shortcut for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format: text, json
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the preset scene catalog
    Scenes,
    /// Generate a batch of mockups for a product photo
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Product photo to composite (png, jpeg, or webp)
    #[arg(long)]
    pub image: PathBuf,

    /// Preset scene id; repeat the flag to select several
    #[arg(long = "scene", value_name = "ID", conflicts_with = "theme")]
    pub scenes: Vec<String>,

    /// Every preset scene in the catalog
    #[arg(long, conflicts_with_all = ["scenes", "theme"])]
    pub all: bool,

    /// Free-text scene theme; expands to the full set of angle variants
    #[arg(long)]
    pub theme: Option<String>,

    /// Keep the product's photographed background instead of removing it
    #[arg(long)]
    pub keep_background: bool,

    /// Worker count override (values above 1 risk provider rate limits)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Directory generated images are written into
    #[arg(long, default_value = "mockups")]
    pub out: PathBuf,
}

pub async fn execute(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Command::Scenes => Ok(render_scenes()),
        Command::Generate(args) => run_generate(cli.config.as_deref(), args).await,
    }
}

fn render_scenes() -> String {
    let mut out = format!("{:<18} {:<10} {}\n", "ID", "CATEGORY", "NAME");
    for scene in &PRESET_SCENES {
        out.push_str(&format!(
            "{:<18} {:<10} {}\n",
            scene.id, scene.category, scene.name
        ));
    }
    out.push_str("\nCustom themes: pass --theme \"...\" instead of --scene ids.");
    out
}

async fn run_generate(config_file: Option<&Path>, args: GenerateArgs) -> anyhow::Result<String> {
    let config = MockforgeConfig::load(config_file).context("loading configuration")?;

    let source = read_source_image(&args.image)?;
    let selection = build_selection(&args)?;
    let session = BatchSession::new(selection, !args.keep_background)?;

    let policy = RetryPolicy {
        base_delay_ms: config.queue.retry_base_delay_ms,
        max_attempts: config.queue.max_attempts,
    };
    let client = RetryingClient::new(GeminiClient::new(&config.provider)?, policy);

    let queue_config = QueueConfig {
        concurrency: args.concurrency.unwrap_or(config.queue.concurrency),
        item_delay_ms: config.queue.item_delay_ms,
    };
    let queue = BatchQueue::with_config(
        Arc::new(client) as Arc<dyn GenerationClient>,
        Arc::new(ResultStore::new()),
        queue_config,
    );

    let handle = queue.start_batch(&session, &source);
    let mut progress = handle.progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow_and_update();
            info!(completed = p.completed, total = p.total, "Batch progress");
        }
    });

    let summary = handle.wait().await?;
    let _ = reporter.await;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    let mut lines = Vec::new();
    for job in queue.store().snapshot() {
        match job.status {
            JobStatus::Succeeded => {
                let image = job
                    .result_image
                    .context("succeeded job is missing its image")?;
                let path = args
                    .out
                    .join(format!("mockup-{}.{}", job.id, extension_for(image.mime_type())));
                std::fs::write(&path, image.decode_bytes()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                lines.push(format!("  ok      {:<14} -> {}", job.id, path.display()));
            }
            JobStatus::Failed => {
                let detail = job.error_detail.unwrap_or_else(|| "unknown error".to_string());
                lines.push(format!("  failed  {:<14} {detail}", job.id));
            }
            JobStatus::Pending | JobStatus::Running => {
                lines.push(format!("  stuck   {:<14} never completed", job.id));
            }
        }
    }

    Ok(format!(
        "Generated {}/{} mockups ({} failed)\n{}",
        summary.succeeded,
        summary.total,
        summary.failed,
        lines.join("\n")
    ))
}

fn build_selection(args: &GenerateArgs) -> anyhow::Result<BatchSelection> {
    if let Some(theme) = &args.theme {
        return Ok(BatchSelection::Custom(theme.clone()));
    }
    if args.all {
        return Ok(BatchSelection::Presets(
            PRESET_SCENES.iter().map(|s| s.id.to_string()).collect(),
        ));
    }
    if args.scenes.is_empty() {
        anyhow::bail!("select scenes with --scene, --all, or --theme");
    }
    Ok(BatchSelection::Presets(args.scenes.clone()))
}

fn read_source_image(path: &Path) -> anyhow::Result<EncodedImage> {
    let mime = mime_for_path(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(EncodedImage::from_bytes(&bytes, mime)?)
}

fn mime_for_path(path: &Path) -> anyhow::Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        other => anyhow::bail!("unsupported image extension: {other:?} (png, jpeg, webp)"),
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_scenes() {
        let cli = Cli::try_parse_from([
            "mockforge",
            "generate",
            "--image",
            "product.png",
            "--scene",
            "studio-white",
            "--scene",
            "neon-night",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.scenes, vec!["studio-white", "neon-night"]);
        assert!(!args.keep_background);
        assert_eq!(args.out, PathBuf::from("mockups"));
    }

    #[test]
    fn scene_and_theme_conflict() {
        let result = Cli::try_parse_from([
            "mockforge",
            "generate",
            "--image",
            "product.png",
            "--scene",
            "studio-white",
            "--theme",
            "Christmas",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn selection_requires_scenes_all_or_theme() {
        let cli = Cli::try_parse_from(["mockforge", "generate", "--image", "p.png"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(build_selection(&args).is_err());
    }

    #[test]
    fn all_flag_selects_the_whole_catalog() {
        let cli =
            Cli::try_parse_from(["mockforge", "generate", "--image", "p.png", "--all"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        match build_selection(&args).unwrap() {
            BatchSelection::Presets(ids) => assert_eq!(ids.len(), PRESET_SCENES.len()),
            BatchSelection::Custom(_) => panic!("expected presets"),
        }
    }

    #[test]
    fn mime_detection_follows_the_extension() {
        assert_eq!(mime_for_path(Path::new("a.PNG")).unwrap(), "image/png");
        assert_eq!(mime_for_path(Path::new("a.jpeg")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.webp")).unwrap(), "image/webp");
        assert!(mime_for_path(Path::new("a.gif")).is_err());
        assert!(mime_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn scene_listing_names_every_preset() {
        let listing = render_scenes();
        for scene in &PRESET_SCENES {
            assert!(listing.contains(scene.id));
        }
    }
}
