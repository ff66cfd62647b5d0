//! Top-level render pipeline
//!
//! Wires the four stages together: coverage validation gates acquisition,
//! acquisition feeds graph construction, and the executor re-validates
//! against the original plan. Every render call owns a private temp
//! working directory that is deleted on every exit path.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::acquisition::{AcquisitionContext, ClipAcquisitionEngine};
use crate::config::RenderConfig;
use crate::domain::model::Plan;
use crate::domain::rules::{validate_coverage, CoveragePolicy};
use crate::error::SongcutResult;
use crate::graph::FilterGraphBuilder;
use crate::ports::{
    CatalogPort, CutDetectorPort, CutIndexPort, DebugEvent, DebugSinkPort, DeliveryPort,
    MediaProbePort, TranscoderPort,
};
use crate::render::executor::{RenderExecutor, RenderOptions, RenderOutput};

/// Orchestrates one linear timeline render per invocation
pub struct RenderPipeline {
    engine: ClipAcquisitionEngine,
    builder: FilterGraphBuilder,
    executor: RenderExecutor,
    debug_sink: Arc<dyn DebugSinkPort>,
}

impl RenderPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        delivery: Arc<dyn DeliveryPort>,
        cut_index: Arc<dyn CutIndexPort>,
        cut_detector: Arc<dyn CutDetectorPort>,
        probe: Arc<dyn MediaProbePort>,
        transcoder: Arc<dyn TranscoderPort>,
        debug_sink: Arc<dyn DebugSinkPort>,
        config: RenderConfig,
    ) -> Self {
        Self {
            engine: ClipAcquisitionEngine::new(
                catalog,
                delivery,
                cut_index,
                cut_detector,
                probe.clone(),
                config.clone(),
            ),
            builder: FilterGraphBuilder::new(&config),
            executor: RenderExecutor::new(transcoder, probe),
            debug_sink,
        }
    }

    /// Render one plan to a finished artifact. No partial success: any
    /// stage failure aborts the whole render and cleans up after itself.
    pub async fn render(
        &self,
        plan: &Plan,
        song_path: &Path,
        ctx: &AcquisitionContext,
        options: &RenderOptions,
    ) -> SongcutResult<RenderOutput> {
        plan.validate_mode()?;
        validate_coverage(plan, CoveragePolicy::from_plan(plan))?;
        self.emit("validate", format!(
            "plan accepted: {} segments, {} covers, {} frames",
            plan.segments.len(),
            plan.covers.len(),
            plan.timeline_frames
        ))
        .await;

        // Private working directory; dropped (and deleted) on every exit
        // path, success or failure.
        let workdir = tempfile::tempdir()?;

        let clips = self.engine.acquire_all(plan, ctx, workdir.path()).await?;
        self.emit("acquire", format!("{} clips acquired", clips.len()))
            .await;

        let graph = self.builder.build(plan, &clips)?;
        self.emit(
            "graph",
            format!(
                "{} chains, {} automation spans",
                graph.chains.len(),
                graph.volume_spans.len()
            ),
        )
        .await;

        let output = self
            .executor
            .execute(plan, song_path, &clips, &graph, workdir.path(), options)
            .await?;
        self.emit("render", format!("{} bytes produced", output.media.len()))
            .await;

        info!(
            segments = plan.segments.len(),
            frames = plan.timeline_frames,
            "render pipeline finished"
        );
        Ok(output)
    }

    async fn emit(&self, phase: &'static str, message: String) {
        // Best-effort by contract; the sink swallows its own failures.
        self.debug_sink.emit(DebugEvent::now(phase, message)).await;
    }
}
