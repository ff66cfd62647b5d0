//! Frame/second conversion helpers
//!
//! Integer frame counts are the source of truth for durations everywhere
//! in the pipeline; these helpers are the only place frames and seconds
//! are converted.

/// Convert a frame count to seconds at the given frame rate
pub fn frames_to_seconds(frames: u64, fps: f64) -> f64 {
    frames as f64 / fps
}

/// Duration of a single frame in seconds
pub fn frame_duration(fps: f64) -> f64 {
    1.0 / fps
}

/// Deterministic decimal formatting for filter-graph arguments.
///
/// Fixed six-digit precision with trailing zeros stripped, so identical
/// inputs always render identical graph text.
pub fn fmt_f64(value: f64) -> String {
    let s = format!("{:.6}", value);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
