//! FFmpeg transcoder adapter
//!
//! Spawns one ffmpeg subprocess per render: the song as input 0, the
//! acquired clips as inputs 1..=N, the constructed filter graph, explicit
//! video/audio stream mappings, constant-frame-rate enforcement and a
//! progressive-playback-friendly output layout. The render suspends until
//! the subprocess exits; a non-zero exit is fatal and surfaces the tail
//! of the diagnostic stream.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{SongcutError, SongcutResult};
use crate::ports::{TranscodeJob, TranscodeReport, TranscoderPort};
use crate::utils::tail_lines;
use crate::utils::time::fmt_f64;

const STDERR_TAIL_LINES: usize = 30;

/// ffmpeg subprocess transcoder
pub struct FfmpegTranscoder {
    ffmpeg_bin: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    fn build_args(job: &TranscodeJob) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            job.song_path.to_string_lossy().into_owned(),
        ];
        for clip in &job.clip_paths {
            args.push("-i".into());
            args.push(clip.to_string_lossy().into_owned());
        }
        args.extend([
            "-filter_complex".into(),
            job.filter_graph.clone(),
            "-map".into(),
            "[vout]".into(),
            "-map".into(),
            "[aout]".into(),
            "-fps_mode".into(),
            "cfr".into(),
            "-r".into(),
            fmt_f64(job.fps),
            "-movflags".into(),
            "+faststart".into(),
            job.output_path.to_string_lossy().into_owned(),
        ]);
        args
    }
}

#[async_trait]
impl TranscoderPort for FfmpegTranscoder {
    async fn transcode(&self, job: &TranscodeJob) -> SongcutResult<TranscodeReport> {
        let args = Self::build_args(job);
        let command_line = format!("{} {}", self.ffmpeg_bin, args.join(" "));
        debug!(command = %command_line, "invoking transcoder");

        let output = tokio::process::Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SongcutError::Transcode {
                status: -1,
                stderr_tail: format!("failed to spawn {}: {}", self.ffmpeg_bin, e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(SongcutError::Transcode {
                status: output.status.code().unwrap_or(-1),
                stderr_tail: tail_lines(&stderr, STDERR_TAIL_LINES),
            });
        }

        info!(
            inputs = job.clip_paths.len() + 1,
            output = %job.output_path.display(),
            "transcode finished"
        );
        Ok(TranscodeReport {
            command_line,
            stderr,
        })
    }
}
