use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use image::DynamicImage;
use imagine_contracts::models::ModelRegistry;
use imagine_contracts::request::{
    AspectRatio, GenerationParams, ResponseFormat, DEFAULT_IMAGE_MODEL,
};
use imagine_engine::{EngineConfig, ImagineEngine};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "imagine-rs", version, about = "xAI Imagine image generation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate images and write them as PNG artifacts.
    Generate(GenerateArgs),
    /// List the supported image models.
    Models,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    model: String,
    #[arg(long, default_value_t = 1)]
    n: u64,
    #[arg(long, default_value = "auto")]
    aspect_ratio: String,
    #[arg(long, default_value = "url")]
    format: String,
    /// Overrides the XAI_API_KEY fallback.
    #[arg(long)]
    api_key: Option<String>,
    /// Overrides the XAI_API_BASE fallback and the production endpoint.
    #[arg(long)]
    api_base: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Models => {
            for model in ModelRegistry::default().list() {
                println!(
                    "{} (capabilities: {}, max n: {})",
                    model.name,
                    model.capabilities.join(", "),
                    model.max_batch
                );
            }
            Ok(())
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let aspect_ratio: AspectRatio = match args.aspect_ratio.parse() {
        Ok(value) => value,
        Err(message) => bail!("{message}"),
    };
    let response_format: ResponseFormat = match args.format.parse() {
        Ok(value) => value,
        Err(message) => bail!("{message}"),
    };
    let registry = ModelRegistry::default();
    let Some(model) = registry.ensure(&args.model, "image") else {
        let known = registry
            .by_capability("image")
            .into_iter()
            .map(|spec| spec.name)
            .collect::<Vec<_>>()
            .join(", ");
        bail!(
            "unknown image model '{}' (expected one of {known})",
            args.model
        );
    };
    if args.n < 1 || args.n > model.max_batch {
        bail!("n must be between 1 and {}", model.max_batch);
    }

    let mut config = EngineConfig::from_env();
    if let Some(api_base) = args.api_base {
        config.api_base = api_base.trim_end_matches('/').to_string();
    }
    if let Some(api_key) = args.api_key {
        config.api_key = Some(api_key);
    }

    let engine = ImagineEngine::new(config);
    let params = GenerationParams {
        api_key: String::new(),
        prompt: args.prompt,
        model: model.name,
        n: args.n,
        aspect_ratio,
        response_format,
    };

    let generation = match engine.generate(&params) {
        Ok(generation) => generation,
        Err(error) => bail!("image generation failed: {error}"),
    };

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let stamp = timestamp_millis();
    for (idx, image) in generation.images.iter().enumerate() {
        let path = args.out.join(format!("artifact-{stamp}-{idx:02}.png"));
        DynamicImage::ImageRgb32F(image.pixels.clone())
            .to_rgb8()
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    println!("{}", generation.status);
    Ok(())
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}
