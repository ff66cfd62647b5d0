//! Coverage validation errors
//!
//! These are pure plan-consistency failures. They are produced by the
//! coverage validator before any media is touched and are never retried.

use thiserror::Error;

/// A violation of the plan's frame-coverage or reuse/overlap policy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoverageError {
    /// A cover references a segment index outside the plan
    #[error("cover references segment index {index}, but the plan has {segment_count} segments")]
    IndexOutOfRange { index: usize, segment_count: usize },

    /// Two covers claim the same segment
    #[error("segment index {index} is covered more than once")]
    DuplicateCover { index: usize },

    /// Segments no cover supplies pixels for
    #[error("segments {indices:?} are not covered by any cover")]
    MissingCoverage { indices: Vec<usize> },

    /// A cover's declared frame count disagrees with its segments
    #[error(
        "cover over segments {start}..{end} declares {declared} frames but the covered segments sum to {expected}"
    )]
    CoverFrameMismatch {
        start: usize,
        end: usize,
        declared: u64,
        expected: u64,
    },

    /// Covers do not sum to the plan's timeline length
    #[error("covers sum to {actual} frames but the timeline is {expected} frames")]
    TotalFrameMismatch { expected: u64, actual: u64 },

    /// Two segments use overlapping source ranges of the same asset
    #[error(
        "segments {a} and {b} use overlapping ranges [{a_start}, {a_end}) and [{b_start}, {b_end}) of asset {asset}"
    )]
    DisallowedOverlap {
        a: usize,
        b: usize,
        asset: String,
        a_start: f64,
        a_end: f64,
        b_start: f64,
        b_end: f64,
    },

    /// Two segments reuse the same asset while reuse is disabled
    #[error("segments {a} and {b} both use asset {asset} but clip reuse is disabled")]
    DisallowedReuse { a: usize, b: usize, asset: String },
}
