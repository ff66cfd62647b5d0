use super::*;

fn asset(video_id: &str, start: f64, end: f64) -> AssetRef {
    AssetRef {
        video_id: video_id.to_string(),
        catalog_id: "cat".to_string(),
        start,
        end,
    }
}

fn base_plan() -> Plan {
    Plan {
        segments: vec![Segment {
            index: 0,
            frame_count: 30,
            song_time: 0.0,
            asset: asset("a", 0.0, 1.0),
            rapid_clip_slot: None,
            beat: None,
            cut_free_verified: false,
            forced_reuse: false,
        }],
        covers: vec![Cover::Segment {
            index: 0,
            frame_count: 30,
        }],
        fps: 30.0,
        timeline_frames: 30,
        audio_chunks: None,
        allow_overlap: false,
        reuse_clips: false,
        detect_cuts: false,
        mode: RenderMode::Standard,
    }
}

#[test]
fn with_asset_preserves_frame_count() {
    let seg = base_plan().segments[0].clone();
    let rebound = seg.with_asset(asset("b", 4.0, 5.5));

    assert_eq!(rebound.frame_count, seg.frame_count);
    assert_eq!(rebound.index, seg.index);
    assert_eq!(rebound.asset.video_id, "b");
    // Original is untouched; rebinding never aliases.
    assert_eq!(seg.asset.video_id, "a");
}

#[test]
fn segment_frame_starts_are_cumulative() {
    let mut plan = base_plan();
    plan.segments.push(Segment {
        index: 1,
        frame_count: 45,
        song_time: 1.0,
        asset: asset("b", 0.0, 1.5),
        rapid_clip_slot: None,
        beat: None,
        cut_free_verified: false,
        forced_reuse: false,
    });

    assert_eq!(plan.segment_frame_starts(), vec![0, 30, 75]);
}

#[test]
fn validate_mode_rejects_non_contiguous_indices() {
    let mut plan = base_plan();
    plan.segments[0].index = 2;

    assert!(plan.validate_mode().is_err());
}

#[test]
fn validate_mode_rejects_zero_frame_segment() {
    let mut plan = base_plan();
    plan.segments[0].frame_count = 0;

    assert!(plan.validate_mode().is_err());
}

#[test]
fn instant_mode_requires_declared_composites() {
    let mut plan = base_plan();
    plan.segments.push(Segment {
        index: 1,
        frame_count: 30,
        song_time: 1.0,
        asset: asset("b", 0.0, 1.0),
        rapid_clip_slot: None,
        beat: None,
        cut_free_verified: false,
        forced_reuse: false,
    });
    plan.covers = vec![Cover::Composite {
        start: 0,
        end: 2,
        frame_count: 60,
        source: asset("composite", 0.0, 2.0),
    }];
    plan.timeline_frames = 60;

    // Undeclared composite rejected.
    plan.mode = RenderMode::Instant {
        composite_manifest: vec![CompositeUnit {
            start: 1,
            end: 2,
            source: asset("other", 0.0, 1.0),
        }],
    };
    assert!(plan.validate_mode().is_err());

    // Matching manifest accepted.
    plan.mode = RenderMode::Instant {
        composite_manifest: vec![CompositeUnit {
            start: 0,
            end: 2,
            source: asset("composite", 0.0, 2.0),
        }],
    };
    assert!(plan.validate_mode().is_ok());
}

#[test]
fn quick_mode_rejects_composite_covers() {
    let mut plan = base_plan();
    plan.covers = vec![Cover::Composite {
        start: 0,
        end: 1,
        frame_count: 30,
        source: asset("composite", 0.0, 1.0),
    }];
    plan.mode = RenderMode::Quick { seed: 7 };

    assert!(plan.validate_mode().is_err());
}

#[test]
fn plan_deserializes_from_editor_json() {
    let json = r#"{
        "segments": [{
            "index": 0,
            "frame_count": 90,
            "song_time": 12.5,
            "asset": {"video_id": "v1", "catalog_id": "c1", "start": 3.0, "end": 6.0},
            "beat": {"clip_volume": 0.5, "pause_music": true}
        }],
        "covers": [{"kind": "segment", "index": 0, "frame_count": 90}],
        "fps": 30.0,
        "timeline_frames": 90
    }"#;

    let plan: Plan = serde_json::from_str(json).expect("plan should parse");
    assert_eq!(plan.segments[0].frame_count, 90);
    assert!(plan.segments[0].pauses_music());
    // Unspecified music volume defaults to unity.
    assert_eq!(plan.segments[0].music_volume(), 1.0);
    assert_eq!(plan.mode, RenderMode::Standard);
    assert!(plan.validate_mode().is_ok());
}
