//! End-to-end pipeline tests over in-memory ports

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::*;
use songcut::acquisition::{AcquisitionContext, BannedWindow, CandidateSource};
use songcut::domain::errors::CoverageError;
use songcut::error::SongcutError;
use songcut::graph::FilterGraph;
use songcut::ports::{MediaMeasurement, NullCutIndex, NullDebugSink};
use songcut::render::{RenderExecutor, RenderOptions, RenderPipeline};
use songcut::{Clip, RenderConfig};
use songcut::domain::model::ClipSource;

fn pipeline(
    delivery: Arc<MockDelivery>,
    cut_detector: Arc<MockCutDetector>,
    probe: Arc<MockProbe>,
    transcoder: Arc<MockTranscoder>,
    config: RenderConfig,
) -> RenderPipeline {
    RenderPipeline::new(
        Arc::new(MockCatalog),
        delivery,
        Arc::new(NullCutIndex),
        cut_detector,
        probe,
        transcoder,
        Arc::new(NullDebugSink),
        config,
    )
}

#[tokio::test]
async fn render_happy_path_produces_the_transcoded_artifact() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let plan = plan(&[30, 45, 25], 25.0);

    let pipeline = pipeline(
        delivery.clone(),
        Arc::new(MockCutDetector::clean()),
        Arc::new(MockProbe::exact(100, 25.0)),
        transcoder.clone(),
        RenderConfig::default(),
    );

    let output = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(output.media, b"mock rendered artifact");
    assert!(output.debug.is_none());
    assert_eq!(transcoder.invocation_count(), 1);
    assert_eq!(delivery.fetch_count(), 3);
    assert_eq!(
        delivery.fetched_ids(),
        vec!["d-vid0", "d-vid1", "d-vid2"]
    );
}

#[tokio::test]
async fn coverage_violation_aborts_before_any_fetch() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let mut plan = plan(&[30, 45, 25], 25.0);
    plan.covers.remove(1);

    let pipeline = pipeline(
        delivery.clone(),
        Arc::new(MockCutDetector::clean()),
        Arc::new(MockProbe::exact(100, 25.0)),
        transcoder.clone(),
        RenderConfig::default(),
    );

    let err = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SongcutError::Coverage(CoverageError::MissingCoverage { ref indices }) if indices == &[1]
    ));
    assert_eq!(delivery.fetch_count(), 0);
    assert_eq!(transcoder.invocation_count(), 0);
}

#[tokio::test]
async fn short_media_fails_with_the_exact_deficit() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let plan = plan(&[90], 30.0);

    let probe = MockProbe::exact(90, 30.0).with_override(
        "seg000",
        MediaMeasurement {
            duration: 2.0,
            frames: 60,
            fps: 30.0,
        },
    );
    let pipeline = pipeline(
        delivery.clone(),
        Arc::new(MockCutDetector::clean()),
        Arc::new(probe),
        transcoder.clone(),
        RenderConfig::default(),
    );

    let err = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        SongcutError::FrameDeficit {
            segment_index,
            required,
            actual,
            deficit,
        } => {
            assert_eq!(segment_index, 0);
            assert_eq!(required, 90);
            assert_eq!(actual, 60);
            assert_eq!(deficit, 30);
        }
        other => panic!("expected FrameDeficit, got {}", other),
    }
    assert_eq!(transcoder.invocation_count(), 0);
}

#[tokio::test]
async fn concurrent_failures_report_every_failed_segment() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let plan = plan(&[90, 90], 30.0);

    let short = MediaMeasurement {
        duration: 0.5,
        frames: 15,
        fps: 30.0,
    };
    let probe = MockProbe::exact(90, 30.0)
        .with_override("seg000", short.clone())
        .with_override("seg001", short);
    let pipeline = pipeline(
        delivery,
        Arc::new(MockCutDetector::clean()),
        Arc::new(probe),
        transcoder.clone(),
        RenderConfig::default(),
    );

    let err = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SongcutError::Acquisition { ref failed_segments } if failed_segments == &[0, 1]
    ));
    assert_eq!(transcoder.invocation_count(), 0);
}

#[tokio::test]
async fn banned_source_is_substituted_before_fetching() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let transcoder = Arc::new(MockTranscoder::new());
    let plan = plan(&[50], 25.0);

    let ctx = AcquisitionContext {
        banned: vec![BannedWindow {
            video_id: "vid0".to_string(),
            start: 0.0,
            end: 100.0,
        }],
        candidates: vec![CandidateSource {
            asset: asset("spare", 0.0, 30.0),
        }],
    };
    let pipeline = pipeline(
        delivery.clone(),
        Arc::new(MockCutDetector::clean()),
        Arc::new(MockProbe::exact(50, 25.0)),
        transcoder,
        RenderConfig::default(),
    );

    pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &ctx,
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    let ids = delivery.fetched_ids();
    assert_eq!(ids, vec!["d-spare"]);
}

#[tokio::test]
async fn cut_replacement_stops_at_the_retry_bound() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let detector = Arc::new(MockCutDetector::always_cut_at(1.0));
    let transcoder = Arc::new(MockTranscoder::new());
    let config = RenderConfig::default();

    // 60 frames at 30 fps: a 2-second window with a cut dead center.
    let mut plan = plan(&[60], 30.0);
    plan.detect_cuts = true;

    let ctx = AcquisitionContext {
        banned: vec![],
        candidates: (0..5)
            .map(|i| CandidateSource {
                asset: asset(&format!("alt{}", i), 0.0, 10.0),
            })
            .collect(),
    };
    let pipeline = pipeline(
        delivery.clone(),
        detector.clone(),
        Arc::new(MockProbe::exact(60, 30.0)),
        transcoder.clone(),
        config.clone(),
    );

    // Every window contains a cut; after the bounded retries the engine
    // proceeds with the last acquisition rather than failing the render.
    pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &ctx,
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(delivery.fetch_count(), 1 + config.max_retries);
    assert_eq!(detector.call_count(), 1 + config.max_retries);
    assert_eq!(transcoder.invocation_count(), 1);
}

#[tokio::test]
async fn indexed_cut_rebinds_to_a_nearby_clean_window() {
    let workdir = TempDir::new().unwrap();
    let delivery = Arc::new(MockDelivery::new());
    let detector = Arc::new(MockCutDetector::clean());
    let transcoder = Arc::new(MockTranscoder::new());

    // The index knows about a cut at 1.0s inside the planned [0, 2)
    // window, and offers a clean window starting at 5.0s.
    let cut_index = Arc::new(MockCutIndex {
        cuts: Some(vec![1.0]),
        free_window: Some((5.0, 7.0)),
    });
    let mut plan = plan(&[60], 30.0);
    plan.detect_cuts = true;

    let pipeline = RenderPipeline::new(
        Arc::new(MockCatalog),
        delivery.clone(),
        cut_index,
        detector.clone(),
        Arc::new(MockProbe::exact(60, 30.0)),
        transcoder,
        Arc::new(NullDebugSink),
        RenderConfig::default(),
    );

    pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    let fetches = delivery.fetches.lock().unwrap().clone();
    assert_eq!(fetches.len(), 2);
    assert_eq!(fetches[0], ("d-vid0".to_string(), 0.0, 2.0));
    assert_eq!(fetches[1], ("d-vid0".to_string(), 5.0, 7.0));
    // The index answered; on-the-fly detection never ran.
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn transcoder_failure_surfaces_with_no_artifact() {
    let workdir = TempDir::new().unwrap();
    let plan = plan(&[40], 20.0);

    let pipeline = RenderPipeline::new(
        Arc::new(MockCatalog),
        Arc::new(MockDelivery::new()),
        Arc::new(NullCutIndex),
        Arc::new(MockCutDetector::clean()),
        Arc::new(MockProbe::exact(40, 20.0)),
        Arc::new(FailingTranscoder),
        Arc::new(NullDebugSink),
        RenderConfig::default(),
    );

    let err = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SongcutError::Transcode { status: 1, .. }));
}

fn fabricated_clip(first_segment: usize, target_frames: u64, path: std::path::PathBuf) -> Clip {
    Clip {
        path,
        target_frames,
        actual_frames: target_frames,
        actual_duration: 0.0,
        source: ClipSource::Downloaded,
        first_segment,
    }
}

#[tokio::test]
async fn strict_preflight_rejects_one_frame_drift_before_any_subprocess() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    let executor = RenderExecutor::new(
        transcoder.clone(),
        Arc::new(MockProbe::exact(300, 25.0)),
    );

    let plan = plan(&[100, 100, 100], 25.0);
    let clips: Vec<Clip> = vec![
        fabricated_clip(0, 100, workdir.path().join("a.mp4")),
        fabricated_clip(1, 100, workdir.path().join("b.mp4")),
        fabricated_clip(2, 99, workdir.path().join("c.mp4")),
    ];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };

    let err = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    match &err {
        SongcutError::GraphPreflight {
            expected,
            actual,
            diagnostics,
        } => {
            assert_eq!(*expected, 300);
            assert_eq!(*actual, 299);
            assert_eq!(diagnostics.len(), 3);
        }
        other => panic!("expected GraphPreflight, got {}", other),
    }
    assert!(err.diagnostic_table().contains("segment 2: declared 99"));
    assert_eq!(transcoder.invocation_count(), 0);
}

#[tokio::test]
async fn legacy_preflight_tolerates_a_single_frame() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    let executor = RenderExecutor::new(
        transcoder.clone(),
        Arc::new(MockProbe::exact(300, 25.0)),
    );

    let plan = plan(&[100, 100, 100], 25.0);
    let clips: Vec<Clip> = vec![
        fabricated_clip(0, 100, workdir.path().join("a.mp4")),
        fabricated_clip(1, 100, workdir.path().join("b.mp4")),
        fabricated_clip(2, 99, workdir.path().join("c.mp4")),
    ];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };
    let options = RenderOptions {
        strict_preflight: false,
        ..RenderOptions::default()
    };

    let output = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &options,
        )
        .await
        .unwrap();

    assert_eq!(output.media, b"mock rendered artifact");
    assert_eq!(transcoder.invocation_count(), 1);
}

fn probe_measuring(frames: u64, duration: f64) -> MockProbe {
    MockProbe {
        default: MediaMeasurement {
            duration,
            frames,
            fps: 25.0,
        },
        overrides: vec![],
    }
}

#[tokio::test]
async fn postflight_rejects_frame_drift_beyond_one() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    // The artifact measures two frames over the 300-frame timeline.
    let executor = RenderExecutor::new(transcoder.clone(), Arc::new(probe_measuring(302, 12.08)));

    let plan = plan(&[300], 25.0);
    let clips = vec![fabricated_clip(0, 300, workdir.path().join("a.mp4"))];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };

    let err = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &RenderOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SongcutError::PostValidation { .. }));
    // The transcoder did run; the artifact itself failed validation.
    assert_eq!(transcoder.invocation_count(), 1);
}

#[tokio::test]
async fn duration_only_drift_passes_postflight() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    // Frame count is exact; the measured duration runs half a second
    // long, far past one frame-duration. Without a frame mismatch the
    // duration wobble is tolerated.
    let executor = RenderExecutor::new(transcoder, Arc::new(probe_measuring(300, 12.5)));

    let plan = plan(&[300], 25.0);
    let clips = vec![fabricated_clip(0, 300, workdir.path().join("a.mp4"))];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };

    let output = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(output.media, b"mock rendered artifact");
}

#[tokio::test]
async fn near_zero_measured_duration_relaxes_postflight() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    // A 0.01s measurement with frames present is a timebase rounding
    // artifact; the comparison relaxes itself instead of failing.
    let executor = RenderExecutor::new(transcoder, Arc::new(probe_measuring(3, 0.01)));

    let plan = plan(&[300], 25.0);
    let clips = vec![fabricated_clip(0, 300, workdir.path().join("a.mp4"))];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };

    let output = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &RenderOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(output.media, b"mock rendered artifact");
}

#[tokio::test]
async fn frameless_output_is_always_fatal() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    let executor = RenderExecutor::new(transcoder, Arc::new(probe_measuring(0, 0.0)));

    let plan = plan(&[300], 25.0);
    let clips = vec![fabricated_clip(0, 300, workdir.path().join("a.mp4"))];
    let graph = FilterGraph {
        chains: vec![],
        volume_spans: vec![],
    };
    let options = RenderOptions {
        relaxed_postflight: true,
        ..RenderOptions::default()
    };

    // Even relaxed mode never accepts an artifact with no frames.
    let err = executor
        .execute(
            &plan,
            &song_file(workdir.path()),
            &clips,
            &graph,
            workdir.path(),
            &options,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SongcutError::PostValidation { .. }));
}

#[tokio::test]
async fn debug_mode_returns_the_invocation_details() {
    let workdir = TempDir::new().unwrap();
    let transcoder = Arc::new(MockTranscoder::new());
    let plan = plan(&[40], 20.0);

    let pipeline = pipeline(
        Arc::new(MockDelivery::new()),
        Arc::new(MockCutDetector::clean()),
        Arc::new(MockProbe::exact(40, 20.0)),
        transcoder,
        RenderConfig::default(),
    );
    let options = RenderOptions {
        debug: true,
        ..RenderOptions::default()
    };

    let output = pipeline
        .render(
            &plan,
            &song_file(workdir.path()),
            &AcquisitionContext::default(),
            &options,
        )
        .await
        .unwrap();

    let debug = output.debug.expect("debug info requested");
    assert_eq!(debug.command_line, "mock-ffmpeg");
}
