//! Songcut library
//!
//! Assembles a finished video by stitching short source clips into a
//! fixed-length timeline synchronized to a music track, then renders the
//! result through an external transcoding engine (ffmpeg).
//!
//! Four components, consumed in dependency order: the coverage validator
//! ([`domain::rules`]) gates everything; the [`acquisition`] engine
//! resolves covered timeline units to local media; the [`graph`] builder
//! turns plan + clips into one deterministic composition graph; the
//! [`render`] executor invokes the transcoder and verifies the artifact
//! against frame-exact expectations.

pub mod acquisition;
pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod ports;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::RenderConfig;
pub use domain::errors::CoverageError;
pub use domain::model::{AssetRef, AudioChunk, Clip, Cover, Plan, RenderMode, Segment};
pub use domain::rules::{validate_coverage, CoveragePolicy};
pub use error::{SongcutError, SongcutResult};
pub use render::{RenderOptions, RenderOutput, RenderPipeline};
