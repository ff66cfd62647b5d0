//! Song-bed volume automation
//!
//! Turns per-segment music volumes and pause directives into an ordered,
//! gap-free, overlap-free list of constant-volume spans over the whole
//! timeline. Adjacent spans never share a volume (merge invariant).

use crate::domain::model::Segment;
use crate::utils::time::frames_to_seconds;

const EPS: f64 = 1e-9;

/// One constant-volume interval of the song bed
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSpan {
    /// Interval start on the timeline, seconds
    pub start: f64,
    /// Interval end on the timeline, seconds (exclusive)
    pub end: f64,
    /// Gain in effect over the interval
    pub volume: f64,
}

/// A segment's timeline placement plus its bed directives
struct SegmentWindow {
    start: f64,
    end: f64,
    music_volume: f64,
    /// End of the mute, when the segment pauses music. May extend past
    /// `end` via the pause hold.
    pause_until: Option<f64>,
}

/// Compute the merged volume-automation span list for `[0, timeline_end)`.
///
/// Breakpoints are the timeline bounds, every segment edge, and every
/// pause-hold end that outlives its segment. The volume of each interval
/// is evaluated at its midpoint: 0 inside a pause hold, else the active
/// segment's music volume, else 1.
pub fn compute_volume_spans(segments: &[Segment], fps: f64, timeline_end: f64) -> Vec<VolumeSpan> {
    let windows = segment_windows(segments, fps, timeline_end);

    let mut breakpoints = vec![0.0, timeline_end];
    for w in &windows {
        breakpoints.push(w.start);
        breakpoints.push(w.end);
        if let Some(hold_end) = w.pause_until {
            if hold_end > w.end + EPS {
                breakpoints.push(hold_end);
            }
        }
    }

    breakpoints.retain(|t| *t >= -EPS && *t <= timeline_end + EPS);
    breakpoints.sort_by(|a, b| a.partial_cmp(b).expect("breakpoints are finite"));
    breakpoints.dedup_by(|a, b| (*a - *b).abs() < EPS);

    let mut spans: Vec<VolumeSpan> = Vec::new();
    for pair in breakpoints.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end - start < EPS {
            continue;
        }
        let volume = volume_at(&windows, (start + end) / 2.0);
        match spans.last_mut() {
            Some(last) if (last.volume - volume).abs() < EPS => last.end = end,
            _ => spans.push(VolumeSpan { start, end, volume }),
        }
    }
    spans
}

fn segment_windows(segments: &[Segment], fps: f64, timeline_end: f64) -> Vec<SegmentWindow> {
    let mut windows = Vec::with_capacity(segments.len());
    let mut acc = 0u64;
    for seg in segments {
        let start = frames_to_seconds(acc, fps);
        acc += seg.frame_count;
        let end = frames_to_seconds(acc, fps).min(timeline_end);
        let pause_until = if seg.pauses_music() {
            Some((end + seg.pause_hold()).min(timeline_end))
        } else {
            None
        };
        windows.push(SegmentWindow {
            start,
            end,
            music_volume: seg.music_volume(),
            pause_until,
        });
    }
    windows
}

fn volume_at(windows: &[SegmentWindow], t: f64) -> f64 {
    // A pause hold silences the bed even when it spills into the next
    // segment, so pauses win over segment volumes.
    for w in windows {
        if let Some(pause_until) = w.pause_until {
            if t >= w.start && t < pause_until {
                return 0.0;
            }
        }
    }
    for w in windows {
        if t >= w.start && t < w.end {
            return w.music_volume;
        }
    }
    1.0
}
