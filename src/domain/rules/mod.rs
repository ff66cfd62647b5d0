// Domain rules - Plan coverage validation
//
// This is the single gate preventing silently dropped or doubled frames
// downstream: acquisition only runs on plans this module has accepted.

use crate::domain::errors::CoverageError;
use crate::domain::model::{Cover, Plan};

/// Reuse/overlap policy for coverage validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveragePolicy {
    /// Permit overlapping source ranges of the same asset
    pub allow_overlap: bool,
    /// Permit disjoint reuse of the same asset
    pub allow_reuse: bool,
}

impl CoveragePolicy {
    /// Policy carried by the plan's own flags
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            allow_overlap: plan.allow_overlap,
            allow_reuse: plan.reuse_clips,
        }
    }
}

/// Validate that the plan's covers are a disjoint, exhaustive partition of
/// `[0, segment_count)` with exact frame-sum agreement, and that asset reuse
/// respects the policy.
///
/// Pure and idempotent: re-running on an unmutated plan yields the same
/// result. Checks run in a fixed order so the first violation reported is
/// stable.
pub fn validate_coverage(plan: &Plan, policy: CoveragePolicy) -> Result<(), CoverageError> {
    let segment_count = plan.segments.len();

    // (a) cover indices in range
    for cover in &plan.covers {
        let range = cover.covered_range();
        if range.start >= segment_count {
            return Err(CoverageError::IndexOutOfRange {
                index: range.start,
                segment_count,
            });
        }
        if range.end > segment_count {
            return Err(CoverageError::IndexOutOfRange {
                index: range.end - 1,
                segment_count,
            });
        }
    }

    // (b) no segment covered twice
    let mut covered = vec![0usize; segment_count];
    for cover in &plan.covers {
        for index in cover.covered_range() {
            covered[index] += 1;
            if covered[index] > 1 {
                return Err(CoverageError::DuplicateCover { index });
            }
        }
    }

    // (c) every segment covered; report the full missing set
    let missing: Vec<usize> = covered
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == 0)
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(CoverageError::MissingCoverage { indices: missing });
    }

    // (d) per-cover frame counts agree with the covered segments
    for cover in &plan.covers {
        let range = cover.covered_range();
        let expected: u64 = plan.segments[range.clone()]
            .iter()
            .map(|s| s.frame_count)
            .sum();
        if cover.frame_count() != expected {
            return Err(CoverageError::CoverFrameMismatch {
                start: range.start,
                end: range.end,
                declared: cover.frame_count(),
                expected,
            });
        }
    }

    // (e) covers sum to the timeline length
    let total: u64 = plan.covers.iter().map(Cover::frame_count).sum();
    if total != plan.timeline_frames {
        return Err(CoverageError::TotalFrameMismatch {
            expected: plan.timeline_frames,
            actual: total,
        });
    }

    // (f) reuse/overlap policy across segments sharing a source asset
    for (i, a) in plan.segments.iter().enumerate() {
        for b in plan.segments.iter().skip(i + 1) {
            if a.asset.video_id != b.asset.video_id {
                continue;
            }
            if a.asset.ranges_overlap(&b.asset) {
                let permitted = policy.allow_overlap || a.forced_reuse || b.forced_reuse;
                if !permitted {
                    return Err(CoverageError::DisallowedOverlap {
                        a: a.index,
                        b: b.index,
                        asset: a.asset.video_id.clone(),
                        a_start: a.asset.start,
                        a_end: a.asset.end,
                        b_start: b.asset.start,
                        b_end: b.asset.end,
                    });
                }
            } else if !policy.allow_reuse {
                return Err(CoverageError::DisallowedReuse {
                    a: a.index,
                    b: b.index,
                    asset: a.asset.video_id.clone(),
                });
            }
        }
    }

    Ok(())
}
