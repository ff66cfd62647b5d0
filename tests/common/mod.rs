//! Shared test doubles: in-memory port implementations that let the
//! pipeline run end to end without a network or an ffmpeg binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use songcut::domain::model::{AssetRef, Cover, Plan, RenderMode, Segment};
use songcut::error::{SongcutError, SongcutResult};
use songcut::ports::{
    CatalogEntry, CatalogPort, CutDetectorPort, CutIndexPort, DeliveryPort, MediaMeasurement,
    MediaProbePort, TranscodeJob, TranscodeReport, TranscoderPort,
};

/// Catalog that maps every video id to `d-<video_id>`
pub struct MockCatalog;

#[async_trait]
impl CatalogPort for MockCatalog {
    async fn lookup(&self, video_id: &str, _catalog_id: &str) -> SongcutResult<CatalogEntry> {
        Ok(CatalogEntry {
            delivery_id: format!("d-{}", video_id),
            title: None,
            duration: None,
        })
    }
}

/// Delivery that writes a fixed payload and records every fetch
pub struct MockDelivery {
    pub fetches: Mutex<Vec<(String, f64, f64)>>,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self {
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl DeliveryPort for MockDelivery {
    async fn fetch_range(
        &self,
        delivery_id: &str,
        start_seconds: f64,
        end_seconds: f64,
        dest: &Path,
    ) -> SongcutResult<()> {
        self.fetches
            .lock()
            .unwrap()
            .push((delivery_id.to_string(), start_seconds, end_seconds));
        tokio::fs::write(dest, b"mock clip bytes").await?;
        Ok(())
    }
}

/// Probe returning a fixed measurement, overridable per file-name prefix
pub struct MockProbe {
    pub default: MediaMeasurement,
    /// `(file-name prefix, measurement)` pairs; first match wins
    pub overrides: Vec<(String, MediaMeasurement)>,
}

impl MockProbe {
    /// Every file measures exactly `frames` at `fps`
    pub fn exact(frames: u64, fps: f64) -> Self {
        Self {
            default: MediaMeasurement {
                duration: frames as f64 / fps,
                frames,
                fps,
            },
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, prefix: &str, measurement: MediaMeasurement) -> Self {
        self.overrides.push((prefix.to_string(), measurement));
        self
    }
}

#[async_trait]
impl MediaProbePort for MockProbe {
    async fn probe(&self, file: &Path) -> SongcutResult<MediaMeasurement> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        for (prefix, measurement) in &self.overrides {
            if name.starts_with(prefix.as_str()) {
                return Ok(measurement.clone());
            }
        }
        Ok(self.default.clone())
    }
}

/// Cut index with a fixed per-video cut list; `None` means no index
pub struct MockCutIndex {
    pub cuts: Option<Vec<f64>>,
    pub free_window: Option<(f64, f64)>,
}

impl MockCutIndex {
    pub fn absent() -> Self {
        Self {
            cuts: None,
            free_window: None,
        }
    }
}

#[async_trait]
impl CutIndexPort for MockCutIndex {
    async fn cuts_in_range(
        &self,
        _video_id: &str,
        start_seconds: f64,
        end_seconds: f64,
    ) -> SongcutResult<Option<Vec<f64>>> {
        Ok(self.cuts.as_ref().map(|cuts| {
            cuts.iter()
                .copied()
                .filter(|t| *t >= start_seconds && *t < end_seconds)
                .collect()
        }))
    }

    async fn cut_free_window(
        &self,
        _video_id: &str,
        _start_seconds: f64,
        _end_seconds: f64,
        _length: f64,
    ) -> SongcutResult<Option<(f64, f64)>> {
        Ok(self.free_window)
    }
}

/// Detector reporting a fixed cut list for every file, counting calls
pub struct MockCutDetector {
    pub cuts: Vec<f64>,
    pub calls: AtomicUsize,
}

impl MockCutDetector {
    pub fn clean() -> Self {
        Self {
            cuts: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_cut_at(seconds: f64) -> Self {
        Self {
            cuts: vec![seconds],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CutDetectorPort for MockCutDetector {
    async fn detect_cuts(&self, _file: &Path) -> SongcutResult<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cuts.clone())
    }
}

/// Transcoder that writes a canned artifact and records each job
pub struct MockTranscoder {
    pub payload: Vec<u8>,
    pub invocations: AtomicUsize,
    pub graphs: Mutex<Vec<String>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            payload: b"mock rendered artifact".to_vec(),
            invocations: AtomicUsize::new(0),
            graphs: Mutex::new(Vec::new()),
        }
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscoderPort for MockTranscoder {
    async fn transcode(&self, job: &TranscodeJob) -> SongcutResult<TranscodeReport> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.graphs.lock().unwrap().push(job.filter_graph.clone());
        tokio::fs::write(&job.output_path, &self.payload).await?;
        Ok(TranscodeReport {
            command_line: "mock-ffmpeg".to_string(),
            stderr: String::new(),
        })
    }
}

/// Transcoder that always exits non-zero
pub struct FailingTranscoder;

#[async_trait]
impl TranscoderPort for FailingTranscoder {
    async fn transcode(&self, _job: &TranscodeJob) -> SongcutResult<TranscodeReport> {
        Err(SongcutError::Transcode {
            status: 1,
            stderr_tail: "mock failure".to_string(),
        })
    }
}

pub fn asset(video_id: &str, start: f64, end: f64) -> AssetRef {
    AssetRef {
        video_id: video_id.to_string(),
        catalog_id: "cat".to_string(),
        start,
        end,
    }
}

pub fn segment(index: usize, frame_count: u64, fps: f64, video_id: &str) -> Segment {
    let start = 10.0 * index as f64;
    Segment {
        index,
        frame_count,
        song_time: index as f64,
        asset: asset(video_id, start, start + frame_count as f64 / fps),
        rapid_clip_slot: None,
        beat: None,
        cut_free_verified: false,
        forced_reuse: false,
    }
}

/// One segment cover per segment, each with its own source video
pub fn plan(frame_counts: &[u64], fps: f64) -> Plan {
    let segments: Vec<Segment> = frame_counts
        .iter()
        .enumerate()
        .map(|(i, n)| segment(i, *n, fps, &format!("vid{}", i)))
        .collect();
    let covers: Vec<Cover> = segments
        .iter()
        .map(|s| Cover::Segment {
            index: s.index,
            frame_count: s.frame_count,
        })
        .collect();
    Plan {
        timeline_frames: frame_counts.iter().sum(),
        segments,
        covers,
        fps,
        audio_chunks: None,
        allow_overlap: false,
        reuse_clips: false,
        detect_cuts: false,
        mode: RenderMode::Standard,
    }
}

/// A throwaway song file for render calls
pub fn song_file(dir: &Path) -> PathBuf {
    let path = dir.join("song.mp3");
    std::fs::write(&path, b"mock song bytes").unwrap();
    path
}
