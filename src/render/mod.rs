// Render execution - transcoder invocation and pipeline orchestration

pub mod executor;
pub mod pipeline;

pub use executor::{RenderDebugInfo, RenderExecutor, RenderOptions, RenderOutput};
pub use pipeline::RenderPipeline;
