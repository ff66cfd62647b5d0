//! Error handling module for songcut

use thiserror::Error;

use crate::domain::errors::CoverageError;

/// Per-clip row of the preflight diagnostic table: what the plan declared
/// for a timeline unit versus what the acquired media actually measured.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDiag {
    /// Index of the first segment the clip covers
    pub segment_index: usize,
    /// Frames the plan expects from this clip
    pub declared: u64,
    /// Frames measured in the acquired media
    pub actual: u64,
}

impl std::fmt::Display for FrameDiag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "segment {}: declared {} frames, measured {}",
            self.segment_index, self.declared, self.actual
        )
    }
}

/// Main error type for songcut operations.
///
/// Transient per-clip issues (a detected cut, a needed substitution) are
/// recovered inside acquisition and never appear here; everything below
/// fails the entire render. There is no partial-success output.
#[derive(Error, Debug)]
pub enum SongcutError {
    /// Plan inconsistency; always fatal, never retried
    #[error("plan coverage invalid: {0}")]
    Coverage(#[from] CoverageError),

    /// Segments that could not be filled after bounded retries
    #[error("acquisition failed for segments {failed_segments:?}")]
    Acquisition { failed_segments: Vec<usize> },

    /// Retrieved media too short for its timeline slot
    #[error(
        "segment {segment_index}: retrieved media holds {actual} frames but {required} are required (deficit {deficit})"
    )]
    FrameDeficit {
        segment_index: usize,
        required: u64,
        actual: u64,
        deficit: u64,
    },

    /// Filter graph construction failure
    #[error("filter graph construction failed: {message}")]
    Graph { message: String },

    /// Declared vs. expected frame totals mismatch, raised before any
    /// subprocess is spawned
    #[error(
        "preflight failed: clips declare {actual} frames against a {expected}-frame timeline"
    )]
    GraphPreflight {
        expected: u64,
        actual: u64,
        diagnostics: Vec<FrameDiag>,
    },

    /// Transcoder subprocess exited non-zero
    #[error("transcoder exited with status {status}: {stderr_tail}")]
    Transcode { status: i32, stderr_tail: String },

    /// Output artifact failed sanity or frame/duration expectations
    #[error("rendered artifact failed validation: {message}")]
    PostValidation { message: String },

    /// Media catalog lookup error
    #[error("catalog lookup failed: {message}")]
    Catalog { message: String },

    /// Delivery/CDN fetch error
    #[error("delivery fetch failed: {message}")]
    Delivery { message: String },

    /// Media probe error
    #[error("failed to probe media file: {message}")]
    Probe { message: String },

    /// Plan rejected at the boundary before any work started
    #[error("invalid plan: {message}")]
    BadPlan { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SongcutError {
    /// Render the preflight diagnostic table, one clip per line.
    /// Empty for every other variant.
    pub fn diagnostic_table(&self) -> String {
        match self {
            SongcutError::GraphPreflight { diagnostics, .. } => diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Result type alias for songcut operations
pub type SongcutResult<T> = std::result::Result<T, SongcutError>;
