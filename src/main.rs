//! Songcut CLI
//!
//! Renders song-edit plans into finished videos by stitching catalog
//! clips into a frame-exact timeline synchronized to a music track.
//!
//! # Usage
//!
//! ```bash
//! songcut render --plan edit.json --song track.mp3 --out final.mp4
//! songcut validate --plan edit.json
//! songcut inspect --media final.mp4
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use songcut::acquisition::AcquisitionContext;
use songcut::adapters::{
    FfmpegCutDetector, FfmpegTranscoder, FfprobeAdapter, HttpCatalogAdapter,
    ReqwestDeliveryAdapter, TracingDebugSink,
};
use songcut::cli::{Cli, Commands, InspectArgs, RenderArgs, ValidateArgs};
use songcut::domain::model::Plan;
use songcut::domain::rules::{validate_coverage, CoveragePolicy};
use songcut::ports::{MediaProbePort, NullCutIndex};
use songcut::render::{RenderOptions, RenderPipeline};
use songcut::RenderConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => execute_render(args).await?,
        Commands::Validate(args) => execute_validate(args)?,
        Commands::Inspect(args) => execute_inspect(args).await?,
    }

    Ok(())
}

fn load_plan(path: &str) -> Result<Plan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse plan file {}", path))
}

async fn execute_render(args: RenderArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => RenderConfig::load(Path::new(path))
            .with_context(|| format!("failed to load config {}", path))?,
        None => RenderConfig::default(),
    };
    let plan = load_plan(&args.plan)?;

    info!(
        plan = %args.plan,
        segments = plan.segments.len(),
        frames = plan.timeline_frames,
        "starting render"
    );

    let pipeline = RenderPipeline::new(
        Arc::new(HttpCatalogAdapter::new(&args.catalog_url)),
        Arc::new(ReqwestDeliveryAdapter::new(&args.delivery_url)),
        Arc::new(NullCutIndex),
        Arc::new(FfmpegCutDetector::new(
            &config.ffmpeg_bin,
            config.scene_threshold,
        )),
        Arc::new(FfprobeAdapter::new(&config.ffprobe_bin)),
        Arc::new(FfmpegTranscoder::new(&config.ffmpeg_bin)),
        Arc::new(TracingDebugSink::new()),
        config.clone(),
    );

    let options = RenderOptions {
        strict_preflight: config.strict_preflight && !args.legacy_preflight,
        relaxed_postflight: args.relaxed,
        debug: args.debug,
    };

    let output = pipeline
        .render(
            &plan,
            Path::new(&args.song),
            &AcquisitionContext::default(),
            &options,
        )
        .await?;

    std::fs::write(&args.out, &output.media)
        .with_context(|| format!("failed to write output {}", args.out))?;
    info!(out = %args.out, bytes = output.media.len(), "render complete");

    if let Some(debug) = output.debug {
        println!("command: {}", debug.command_line);
        if !debug.stderr_tail.is_empty() {
            println!("{}", debug.stderr_tail);
        }
    }

    Ok(())
}

fn execute_validate(args: ValidateArgs) -> Result<()> {
    let plan = load_plan(&args.plan)?;
    plan.validate_mode()?;

    let mut policy = CoveragePolicy::from_plan(&plan);
    policy.allow_overlap |= args.allow_overlap;
    policy.allow_reuse |= args.allow_reuse;

    validate_coverage(&plan, policy)?;
    println!(
        "plan is valid: {} segments, {} covers, {} frames at {} fps",
        plan.segments.len(),
        plan.covers.len(),
        plan.timeline_frames,
        plan.fps
    );
    Ok(())
}

async fn execute_inspect(args: InspectArgs) -> Result<()> {
    let probe = FfprobeAdapter::new(&args.ffprobe_bin);
    let measurement = probe.probe(Path::new(&args.media)).await?;
    println!(
        "{}: {} frames, {:.6}s at {:.3} fps",
        args.media, measurement.frames, measurement.duration, measurement.fps
    );
    Ok(())
}
