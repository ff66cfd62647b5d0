//! Render configuration loaded from an optional TOML file
//!
//! Everything has a compiled-in default; a config file only overrides the
//! keys it names.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SongcutError, SongcutResult};

/// Tunables for one render pipeline instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Letterbox padding color
    pub pad_color: String,
    /// Burn a per-clip debug label into the video
    pub debug_labels: bool,
    /// Concurrent acquisitions per batch
    pub batch_size: usize,
    /// Concurrent acquisitions per batch while cut detection is active
    pub batch_size_detecting: usize,
    /// Substitutions allowed per segment
    pub max_retries: usize,
    /// Seconds added on both sides when searching for a cut-free window
    pub replacement_margin: f64,
    /// Scene-change score above which a frame counts as a hard cut
    pub scene_threshold: f64,
    /// Preflight tolerance: true = 0 frames, false = legacy ±1
    pub strict_preflight: bool,
    /// ffmpeg binary to invoke
    pub ffmpeg_bin: String,
    /// ffprobe binary to invoke
    pub ffprobe_bin: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            pad_color: "black".to_string(),
            debug_labels: false,
            batch_size: 4,
            batch_size_detecting: 2,
            max_retries: 2,
            replacement_margin: 5.0,
            scene_threshold: 0.4,
            strict_preflight: true,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl RenderConfig {
    /// Load from a TOML file, falling back to defaults for absent keys
    pub fn load(path: &Path) -> SongcutResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SongcutError::BadPlan {
            message: format!("failed to parse config {}: {}", path.display(), e),
        })
    }
}
