//! On-the-fly scene-cut detection
//!
//! Fallback for assets without a precomputed cut index: runs the
//! retrieved file through ffmpeg's scene-score select filter and parses
//! the matching frame timestamps out of the metadata printout.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{SongcutError, SongcutResult};
use crate::ports::CutDetectorPort;
use crate::utils::time::fmt_f64;

/// ffmpeg scene-score cut detector
pub struct FfmpegCutDetector {
    ffmpeg_bin: String,
    /// Scene-change score above which a frame counts as a hard cut
    threshold: f64,
}

impl FfmpegCutDetector {
    pub fn new(ffmpeg_bin: impl Into<String>, threshold: f64) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            threshold,
        }
    }
}

#[async_trait]
impl CutDetectorPort for FfmpegCutDetector {
    async fn detect_cuts(&self, file: &Path) -> SongcutResult<Vec<f64>> {
        let select = format!(
            "select='gt(scene,{})',metadata=print",
            fmt_f64(self.threshold)
        );
        let output = tokio::process::Command::new(&self.ffmpeg_bin)
            .args(["-hide_banner", "-i"])
            .arg(file)
            .args(["-vf", &select, "-an", "-f", "null", "-"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SongcutError::Probe {
                message: format!("failed to spawn {}: {}", self.ffmpeg_bin, e),
            })?;

        if !output.status.success() {
            return Err(SongcutError::Probe {
                message: format!(
                    "scene detection on {} exited with {}",
                    file.display(),
                    output.status
                ),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let cuts = parse_pts_times(&stderr);
        debug!(file = %file.display(), cuts = cuts.len(), "scene detection finished");
        Ok(cuts)
    }
}

/// Pull `pts_time:` values out of the metadata printout
fn parse_pts_times(log: &str) -> Vec<f64> {
    let mut cuts = Vec::new();
    for line in log.lines() {
        if let Some(pos) = line.find("pts_time:") {
            let rest = &line[pos + "pts_time:".len()..];
            let token = rest.split_whitespace().next().unwrap_or("");
            if let Ok(t) = token.parse::<f64>() {
                cuts.push(t);
            }
        }
    }
    cuts
}
