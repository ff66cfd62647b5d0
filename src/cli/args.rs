//! Command-line argument definitions

use clap::Args;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Plan file (JSON) describing the timeline
    #[arg(short, long)]
    pub plan: String,

    /// Song audio file the timeline is synced to
    #[arg(short, long)]
    pub song: String,

    /// Output file path for the muxed artifact
    #[arg(short, long)]
    pub out: String,

    /// Optional TOML config file
    #[arg(long)]
    pub config: Option<String>,

    /// Base URL of the media catalog service
    #[arg(long, env = "SONGCUT_CATALOG_URL", default_value = "http://localhost:8080")]
    pub catalog_url: String,

    /// Base URL of the delivery/CDN service
    #[arg(long, env = "SONGCUT_DELIVERY_URL", default_value = "http://localhost:8081")]
    pub delivery_url: String,

    /// Legacy ±1-frame preflight tolerance instead of strict
    #[arg(long)]
    pub legacy_preflight: bool,

    /// Skip postflight frame/duration comparison
    #[arg(long)]
    pub relaxed: bool,

    /// Return raw invocation and diagnostic info on top of the artifact
    #[arg(long)]
    pub debug: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Plan file (JSON) to validate
    #[arg(short, long)]
    pub plan: String,

    /// Permit overlapping source ranges of the same asset
    #[arg(long)]
    pub allow_overlap: bool,

    /// Permit disjoint reuse of the same asset
    #[arg(long)]
    pub allow_reuse: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Media file to probe
    #[arg(short, long)]
    pub media: String,

    /// ffprobe binary to invoke
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe_bin: String,
}
