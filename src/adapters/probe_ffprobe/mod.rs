//! ffprobe adapter
//!
//! Measures duration and frame count of local media files by invoking
//! ffprobe with JSON output. Frame counts are actually counted
//! (`-count_frames`), not derived from duration.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{SongcutError, SongcutResult};
use crate::ports::{MediaMeasurement, MediaProbePort};

/// ffprobe-based media probe
pub struct FfprobeAdapter {
    ffprobe_bin: String,
}

impl FfprobeAdapter {
    pub fn new(ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    nb_read_frames: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[async_trait]
impl MediaProbePort for FfprobeAdapter {
    async fn probe(&self, file: &Path) -> SongcutResult<MediaMeasurement> {
        let output = tokio::process::Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=nb_read_frames,avg_frame_rate,duration",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(file)
            .output()
            .await
            .map_err(|e| SongcutError::Probe {
                message: format!("failed to spawn {}: {}", self.ffprobe_bin, e),
            })?;

        if !output.status.success() {
            return Err(SongcutError::Probe {
                message: format!(
                    "{} exited with {} for {}",
                    self.ffprobe_bin,
                    output.status,
                    file.display()
                ),
            });
        }

        let parsed: ProbeOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| SongcutError::Probe {
                message: format!("unparseable ffprobe output for {}: {}", file.display(), e),
            })?;

        let stream = parsed.streams.first().ok_or_else(|| SongcutError::Probe {
            message: format!("no video stream in {}", file.display()),
        })?;

        let frames = stream
            .nb_read_frames
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rational)
            .unwrap_or(0.0);
        let duration = stream
            .duration
            .as_deref()
            .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        debug!(
            file = %file.display(),
            frames, fps, duration, "probed media file"
        );
        Ok(MediaMeasurement {
            duration,
            frames,
            fps,
        })
    }
}

/// Parse ffprobe's rational frame rate ("30000/1001" or "30/1")
fn parse_rational(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}
