//! Clip acquisition
//!
//! Resolves every covered timeline unit to a local playable media file,
//! in fixed-size concurrent batches, with banned-source substitution and
//! cut-detection-driven replacement. Any unit that never yields a clip
//! aborts the whole render; partial renders are not produced.

mod engine;
mod keys;

pub use engine::ClipAcquisitionEngine;
pub use keys::{ClipKey, UsedKeys};

use crate::domain::model::AssetRef;

/// A source window known to be disallowed for this render
#[derive(Debug, Clone, PartialEq)]
pub struct BannedWindow {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
}

impl BannedWindow {
    /// Whether the ban applies to the given asset window
    pub fn matches(&self, asset: &AssetRef) -> bool {
        self.video_id == asset.video_id && self.start < asset.end && asset.start < self.end
    }
}

/// One usable source window offered as substitution/replacement material.
/// The asset's `[start, end)` range is the candidate's full usable window;
/// a rebind takes the needed prefix of it.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSource {
    pub asset: AssetRef,
}

/// Substitution material supplied alongside the plan
#[derive(Debug, Clone, Default)]
pub struct AcquisitionContext {
    /// Disallowed {asset, time-window} pairs
    pub banned: Vec<BannedWindow>,
    /// Pool scanned for substitutions and cut replacements
    pub candidates: Vec<CandidateSource>,
}

impl AcquisitionContext {
    /// Whether any ban covers the asset window
    pub fn is_banned(&self, asset: &AssetRef) -> bool {
        self.banned.iter().any(|b| b.matches(asset))
    }
}
