//! Transcoder invocation with frame-exact pre/postflight checks

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::model::{Clip, Plan};
use crate::error::{FrameDiag, SongcutError, SongcutResult};
use crate::graph::FilterGraph;
use crate::ports::{MediaProbePort, TranscodeJob, TranscoderPort};
use crate::utils::tail_lines;
use crate::utils::time::frame_duration;

/// Below this measured duration the postflight assumes a timebase
/// rounding artifact rather than a content bug and relaxes itself.
const NEAR_ZERO_SECONDS: f64 = 0.1;

/// Kept lines from the transcoder's diagnostic stream on failure
const STDERR_TAIL_LINES: usize = 30;

/// Per-render behavioral switches
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Preflight tolerance: true = 0 frames, false = legacy ±1
    pub strict_preflight: bool,
    /// Skip postflight frame/duration comparison
    pub relaxed_postflight: bool,
    /// Return the raw invocation and diagnostic stream with the artifact
    pub debug: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            strict_preflight: true,
            relaxed_postflight: false,
            debug: false,
        }
    }
}

/// Raw invocation info, returned in debug mode only
#[derive(Debug, Clone)]
pub struct RenderDebugInfo {
    pub command_line: String,
    pub stderr_tail: String,
}

/// The finished artifact. The muxed file has already been deleted; this
/// buffer is the only copy.
#[derive(Debug)]
pub struct RenderOutput {
    pub media: Vec<u8>,
    pub debug: Option<RenderDebugInfo>,
}

/// Invokes the external transcoder exactly once per render and verifies
/// its output against frame-exact expectations.
pub struct RenderExecutor {
    transcoder: Arc<dyn TranscoderPort>,
    probe: Arc<dyn MediaProbePort>,
}

impl RenderExecutor {
    pub fn new(transcoder: Arc<dyn TranscoderPort>, probe: Arc<dyn MediaProbePort>) -> Self {
        Self { transcoder, probe }
    }

    /// Preflight, invoke, postflight, read back, clean up.
    pub async fn execute(
        &self,
        plan: &Plan,
        song_path: &Path,
        clips: &[Clip],
        graph: &FilterGraph,
        workdir: &Path,
        options: &RenderOptions,
    ) -> SongcutResult<RenderOutput> {
        // Violations abort before any subprocess runs.
        self.preflight(plan, clips, options)?;

        let output_path = workdir.join("out.mp4");
        let job = TranscodeJob {
            song_path: song_path.to_path_buf(),
            clip_paths: clips.iter().map(|c| c.path.clone()).collect(),
            filter_graph: graph.render(),
            fps: plan.fps,
            output_path: output_path.clone(),
        };
        let report = self.transcoder.transcode(&job).await?;

        self.postflight(plan, &output_path, options).await?;

        let media = tokio::fs::read(&output_path).await?;
        // The working directory is removed wholesale by the caller; drop
        // the artifact eagerly since it has been read into the buffer.
        let _ = tokio::fs::remove_file(&output_path).await;

        info!(bytes = media.len(), "render complete");
        Ok(RenderOutput {
            media,
            debug: options.debug.then(|| RenderDebugInfo {
                command_line: report.command_line,
                stderr_tail: tail_lines(&report.stderr, STDERR_TAIL_LINES),
            }),
        })
    }

    /// `Σ clip.target_frames` must equal the plan's timeline, to zero
    /// frames in strict mode or one in legacy-compatibility mode.
    fn preflight(
        &self,
        plan: &Plan,
        clips: &[Clip],
        options: &RenderOptions,
    ) -> SongcutResult<()> {
        let actual: u64 = clips.iter().map(|c| c.target_frames).sum();
        let expected = plan.timeline_frames;
        let tolerance = if options.strict_preflight { 0 } else { 1 };

        if expected.abs_diff(actual) > tolerance {
            let diagnostics = clips
                .iter()
                .map(|c| FrameDiag {
                    segment_index: c.first_segment,
                    declared: c.target_frames,
                    actual: c.actual_frames,
                })
                .collect();
            return Err(SongcutError::GraphPreflight {
                expected,
                actual,
                diagnostics,
            });
        }
        Ok(())
    }

    /// Probe the artifact and compare to expectation: duration diff
    /// within one frame-duration and frame diff within one frame, unless
    /// relaxed mode was requested or auto-triggered.
    async fn postflight(
        &self,
        plan: &Plan,
        output: &Path,
        options: &RenderOptions,
    ) -> SongcutResult<()> {
        let measured = self.probe.probe(output).await?;
        if measured.frames == 0 {
            return Err(SongcutError::PostValidation {
                message: "output artifact contains no frames".to_string(),
            });
        }

        let mut relaxed = options.relaxed_postflight;
        if !relaxed && measured.duration < NEAR_ZERO_SECONDS {
            // Implausibly small measured duration with frames present is
            // a timebase rounding artifact, not a content bug.
            warn!(
                duration = measured.duration,
                "near-zero measured duration; relaxing postflight"
            );
            relaxed = true;
        }
        if relaxed {
            return Ok(());
        }

        let frame_dur = frame_duration(plan.fps);
        let frame_diff = measured.frames.abs_diff(plan.timeline_frames);
        let duration_diff = (measured.duration - plan.timeline_seconds()).abs();

        if frame_diff > 1 {
            return Err(SongcutError::PostValidation {
                message: format!(
                    "output holds {} frames, expected {} (diff {})",
                    measured.frames, plan.timeline_frames, frame_diff
                ),
            });
        }
        // A duration mismatch alone is tolerated; it only becomes fatal
        // alongside a frame-count mismatch.
        if duration_diff > frame_dur && frame_diff >= 1 {
            return Err(SongcutError::PostValidation {
                message: format!(
                    "output runs {:.4}s against an expected {:.4}s with a {}-frame diff",
                    measured.duration,
                    plan.timeline_seconds(),
                    frame_diff
                ),
            });
        }
        Ok(())
    }
}

