// Domain models - Plan, Segment, Cover, Clip and friends

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SongcutError, SongcutResult};

/// Reference into a source asset: which video, which catalog it lives in,
/// and the `[start, end)` second range used on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Delivery-facing video identifier
    pub video_id: String,
    /// Catalog the video belongs to
    pub catalog_id: String,
    /// Start of the used source range, in seconds
    pub start: f64,
    /// End of the used source range, in seconds (exclusive)
    pub end: f64,
}

impl AssetRef {
    /// Length of the used source range, in seconds
    pub fn window_seconds(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Whether this asset's source range overlaps another's.
    /// Only meaningful when both reference the same video.
    pub fn ranges_overlap(&self, other: &AssetRef) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Per-segment volume and pacing directives derived from beat analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatMetadata {
    /// Gain applied to the clip's own audio; 0 disables the chain entirely
    #[serde(default)]
    pub clip_volume: f64,
    /// Gain applied to the song bed while this segment plays
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,
    /// Mute the song bed for this segment's duration
    #[serde(default)]
    pub pause_music: bool,
    /// Extra seconds the mute holds past the segment's own end
    #[serde(default)]
    pub pause_hold: Option<f64>,
}

fn default_music_volume() -> f64 {
    1.0
}

impl Default for BeatMetadata {
    fn default() -> Self {
        Self {
            clip_volume: 0.0,
            music_volume: 1.0,
            pause_music: false,
            pause_hold: None,
        }
    }
}

/// One fixed-length slot of the output timeline.
///
/// `frame_count` is the single source of truth for the segment's duration
/// and never changes across acquisition retries; only `asset` is rebound,
/// and rebinding produces a fresh value via [`Segment::with_asset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// 0-based, contiguous timeline position
    pub index: usize,
    /// Exact number of output frames this segment occupies
    pub frame_count: u64,
    /// Offset into the song this segment is synced to, in seconds
    pub song_time: f64,
    /// Source media for this segment
    pub asset: AssetRef,
    /// Slot number when this segment belongs to a rapid-clip run
    #[serde(default)]
    pub rapid_clip_slot: Option<u32>,
    /// Beat-derived volume/pause directives
    #[serde(default)]
    pub beat: Option<BeatMetadata>,
    /// The asset window was already verified cut-free upstream
    #[serde(default)]
    pub cut_free_verified: bool,
    /// Overlapping reuse of this segment's source range is explicitly allowed
    #[serde(default)]
    pub forced_reuse: bool,
}

impl Segment {
    /// A copy of this segment bound to a different asset window.
    /// Everything else, `frame_count` above all, is preserved.
    pub fn with_asset(&self, asset: AssetRef) -> Self {
        Self {
            asset,
            ..self.clone()
        }
    }

    /// Segment duration in seconds at the given output frame rate
    pub fn duration_seconds(&self, fps: f64) -> f64 {
        self.frame_count as f64 / fps
    }

    /// Clip-audio gain for this segment (0 when no beat metadata)
    pub fn clip_volume(&self) -> f64 {
        self.beat.as_ref().map(|b| b.clip_volume).unwrap_or(0.0)
    }

    /// Song-bed gain for this segment (1 when no beat metadata)
    pub fn music_volume(&self) -> f64 {
        self.beat.as_ref().map(|b| b.music_volume).unwrap_or(1.0)
    }

    /// Whether this segment mutes the song bed
    pub fn pauses_music(&self) -> bool {
        self.beat.as_ref().map(|b| b.pause_music).unwrap_or(false)
    }

    /// Extra seconds the mute holds past the segment end, when pausing
    pub fn pause_hold(&self) -> f64 {
        self.beat
            .as_ref()
            .and_then(|b| b.pause_hold)
            .unwrap_or(0.0)
            .max(0.0)
    }
}

/// Declares which rendered unit supplies pixels for one or more segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cover {
    /// 1:1 with a segment; `frame_count` must equal the segment's
    Segment { index: usize, frame_count: u64 },
    /// A contiguous `[start, end)` index range sourced from one
    /// pre-rendered unit; `frame_count` must equal the covered sum
    Composite {
        start: usize,
        end: usize,
        frame_count: u64,
        source: AssetRef,
    },
}

impl Cover {
    /// First segment index this cover claims
    pub fn first_index(&self) -> usize {
        match self {
            Cover::Segment { index, .. } => *index,
            Cover::Composite { start, .. } => *start,
        }
    }

    /// The segment index range this cover claims
    pub fn covered_range(&self) -> std::ops::Range<usize> {
        match self {
            Cover::Segment { index, .. } => *index..*index + 1,
            Cover::Composite { start, end, .. } => *start..*end,
        }
    }

    /// Declared frame count of the rendered unit
    pub fn frame_count(&self) -> u64 {
        match self {
            Cover::Segment { frame_count, .. } => *frame_count,
            Cover::Composite { frame_count, .. } => *frame_count,
        }
    }
}

/// One pre-rendered multi-segment unit declared by instant mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeUnit {
    pub start: usize,
    pub end: usize,
    pub source: AssetRef,
}

/// Mode-specific plan payload, validated once at the boundary instead of
/// null-checked throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderMode {
    /// Plain per-segment render
    Standard,
    /// Uses pre-rendered composite units baked upstream
    Instant { composite_manifest: Vec<CompositeUnit> },
    /// Low-latency render seeded for reproducible upstream selection
    Quick { seed: u64 },
}

impl Default for RenderMode {
    fn default() -> Self {
        RenderMode::Standard
    }
}

/// One cut of the song bed placed at an explicit timeline offset.
/// All positions are in output frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Offset into the song where the cut begins
    pub start_frame: u64,
    /// Length of the cut
    pub frame_count: u64,
    /// Timeline frame the cut is placed at
    pub video_offset_frame: u64,
}

/// One render job. Constructed upstream, immutable here except that
/// acquisition may rebind a segment's asset (through [`Segment::with_asset`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered timeline slots, indices 0-based and contiguous
    pub segments: Vec<Segment>,
    /// Disjoint, exhaustive partition of the segment indices
    pub covers: Vec<Cover>,
    /// Output frame rate
    pub fps: f64,
    /// Total output length in frames
    pub timeline_frames: u64,
    /// Optional song-bed cut list
    #[serde(default)]
    pub audio_chunks: Option<Vec<AudioChunk>>,
    /// Permit overlapping source ranges of the same asset
    #[serde(default)]
    pub allow_overlap: bool,
    /// Permit disjoint reuse of the same asset
    #[serde(default)]
    pub reuse_clips: bool,
    /// Run cut detection on acquired media
    #[serde(default)]
    pub detect_cuts: bool,
    /// Mode-specific payload
    #[serde(default)]
    pub mode: RenderMode,
}

impl Plan {
    /// Sum of all segment frame counts
    pub fn segment_frame_total(&self) -> u64 {
        self.segments.iter().map(|s| s.frame_count).sum()
    }

    /// Timeline end in seconds
    pub fn timeline_seconds(&self) -> f64 {
        self.timeline_frames as f64 / self.fps
    }

    /// Timeline start offset, in frames, of each segment; one extra entry
    /// holding the total. Segment i plays `[starts[i], starts[i + 1])`.
    pub fn segment_frame_starts(&self) -> Vec<u64> {
        let mut starts = Vec::with_capacity(self.segments.len() + 1);
        let mut acc = 0u64;
        for seg in &self.segments {
            starts.push(acc);
            acc += seg.frame_count;
        }
        starts.push(acc);
        starts
    }

    /// Boundary validation of structural basics and the mode payload.
    /// Coverage itself is the validator's job.
    pub fn validate_mode(&self) -> SongcutResult<()> {
        if self.fps <= 0.0 {
            return Err(SongcutError::BadPlan {
                message: format!("frame rate must be positive, got {}", self.fps),
            });
        }
        if self.timeline_frames == 0 {
            return Err(SongcutError::BadPlan {
                message: "timeline must be at least one frame long".to_string(),
            });
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.index != i {
                return Err(SongcutError::BadPlan {
                    message: format!(
                        "segment at position {} carries index {}; indices must be contiguous",
                        i, seg.index
                    ),
                });
            }
            if seg.frame_count == 0 {
                return Err(SongcutError::BadPlan {
                    message: format!("segment {} has a zero frame count", i),
                });
            }
        }

        let composites: Vec<&Cover> = self
            .covers
            .iter()
            .filter(|c| matches!(c, Cover::Composite { .. }))
            .collect();

        match &self.mode {
            RenderMode::Standard => Ok(()),
            RenderMode::Quick { .. } => {
                if composites.is_empty() {
                    Ok(())
                } else {
                    Err(SongcutError::BadPlan {
                        message: "quick mode does not accept composite covers".to_string(),
                    })
                }
            }
            RenderMode::Instant { composite_manifest } => {
                if composite_manifest.is_empty() {
                    return Err(SongcutError::BadPlan {
                        message: "instant mode requires a composite manifest".to_string(),
                    });
                }
                for cover in composites {
                    if let Cover::Composite { start, end, .. } = cover {
                        let declared = composite_manifest
                            .iter()
                            .any(|u| u.start == *start && u.end == *end);
                        if !declared {
                            return Err(SongcutError::BadPlan {
                                message: format!(
                                    "composite cover {}..{} is not declared in the manifest",
                                    start, end
                                ),
                            });
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Where an acquired clip's bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSource {
    /// Already present on local disk
    Local,
    /// Fetched from the delivery network
    Downloaded,
    /// A pre-rendered composite unit
    Composite,
}

/// One concretely retrieved media artifact used as a transcoder input.
///
/// Owned exclusively by one render invocation; the file lives inside the
/// render's private working directory and dies with it on every exit path.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Local playable file
    pub path: PathBuf,
    /// Frames the timeline requires from this clip
    pub target_frames: u64,
    /// Frames measured in the file
    pub actual_frames: u64,
    /// Measured duration in seconds
    pub actual_duration: f64,
    /// Source classification
    pub source: ClipSource,
    /// Index of the first segment this clip covers
    pub first_segment: usize,
}

impl Clip {
    /// On-timeline duration in seconds at the given frame rate.
    /// Derived from the integer frame target, never from the measured
    /// floating-point duration.
    pub fn target_seconds(&self, fps: f64) -> f64 {
        self.target_frames as f64 / fps
    }
}

#[cfg(test)]
mod tests;
