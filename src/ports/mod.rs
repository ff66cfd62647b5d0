// Ports - Interface definitions (contracts)

mod null;

pub use null::NullCutIndex;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SongcutError;

/// Descriptive metadata for one catalog asset
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Identifier the delivery network accepts for this asset
    pub delivery_id: String,
    /// Human-readable title, when the catalog carries one
    pub title: Option<String>,
    /// Full asset duration in seconds, when known
    pub duration: Option<f64>,
}

/// Port for the media catalog: `{assetId, catalogId}` to descriptive
/// metadata including a delivery identifier
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Look up an asset. A failure here is not fatal to acquisition:
    /// the engine falls back to the raw video id.
    async fn lookup(&self, video_id: &str, catalog_id: &str)
        -> Result<CatalogEntry, SongcutError>;
}

/// Port for the delivery/CDN network, consumed only via plain byte fetches
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    /// Fetch the `[start_seconds, end_seconds)` byte range of a delivery
    /// id into `dest`. A transfer failure fails the segment.
    async fn fetch_range(
        &self,
        delivery_id: &str,
        start_seconds: f64,
        end_seconds: f64,
        dest: &Path,
    ) -> Result<(), SongcutError>;
}

/// Port for the optional precomputed cut index
#[async_trait]
pub trait CutIndexPort: Send + Sync {
    /// Cut timestamps of an asset within `[start, end)`, in asset
    /// seconds. `None` when no index exists for the asset, in which case
    /// the engine falls back to on-the-fly detection.
    async fn cuts_in_range(
        &self,
        video_id: &str,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Result<Option<Vec<f64>>, SongcutError>;

    /// Find a cut-free window of at least `length` seconds within
    /// `[start, end)` of the asset, if one exists.
    async fn cut_free_window(
        &self,
        video_id: &str,
        start_seconds: f64,
        end_seconds: f64,
        length: f64,
    ) -> Result<Option<(f64, f64)>, SongcutError>;
}

/// Port for on-the-fly scene-cut detection on a retrieved file
#[async_trait]
pub trait CutDetectorPort: Send + Sync {
    /// Timestamps of hard scene cuts, in seconds relative to file start
    async fn detect_cuts(&self, file: &Path) -> Result<Vec<f64>, SongcutError>;
}

/// Measured properties of a local media file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMeasurement {
    /// Duration in seconds
    pub duration: f64,
    /// Counted video frames
    pub frames: u64,
    /// Detected frame rate
    pub fps: f64,
}

/// Port for local-file metadata probing
#[async_trait]
pub trait MediaProbePort: Send + Sync {
    async fn probe(&self, file: &Path) -> Result<MediaMeasurement, SongcutError>;
}

/// Everything the transcoder needs for one invocation
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// The song audio input (input 0)
    pub song_path: PathBuf,
    /// Clip inputs in timeline order (inputs 1..=N)
    pub clip_paths: Vec<PathBuf>,
    /// Rendered filter-graph text
    pub filter_graph: String,
    /// Output frame rate, enforced constant
    pub fps: f64,
    /// Where to write the muxed artifact
    pub output_path: PathBuf,
}

/// What the transcoder reports back on success
#[derive(Debug, Clone, Default)]
pub struct TranscodeReport {
    /// The exact command line that was run (debug diagnostics)
    pub command_line: String,
    /// Full diagnostic stream of the subprocess
    pub stderr: String,
}

/// Port for the external transcoding engine. Invoked exactly once per
/// render; a non-zero exit surfaces as [`SongcutError::Transcode`].
#[async_trait]
pub trait TranscoderPort: Send + Sync {
    async fn transcode(&self, job: &TranscodeJob) -> Result<TranscodeReport, SongcutError>;
}

/// One best-effort observability event
#[derive(Debug, Clone)]
pub struct DebugEvent {
    /// Pipeline phase the event belongs to
    pub phase: &'static str,
    /// Free-text payload
    pub message: String,
    /// When the event was produced
    pub at: DateTime<Utc>,
}

impl DebugEvent {
    pub fn now(phase: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Port for the best-effort debug side channel. Implementations must
/// swallow their own failures: emitting can never affect pipeline outcome.
#[async_trait]
pub trait DebugSinkPort: Send + Sync {
    async fn emit(&self, event: DebugEvent);
}

/// Sink that drops every event; the default when no sink is injected
pub struct NullDebugSink;

#[async_trait]
impl DebugSinkPort for NullDebugSink {
    async fn emit(&self, _event: DebugEvent) {}
}
