//! The acquisition engine proper

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::acquisition::{AcquisitionContext, ClipKey, UsedKeys};
use crate::config::RenderConfig;
use crate::domain::model::{AssetRef, Clip, ClipSource, Cover, Plan, Segment};
use crate::error::{SongcutError, SongcutResult};
use crate::ports::{CatalogPort, CutDetectorPort, CutIndexPort, DeliveryPort, MediaProbePort};

/// Cuts this close to a window edge do not break visual continuity
const CUT_EDGE_MARGIN: f64 = 0.05;

/// Resolves covered timeline units to local playable clips
pub struct ClipAcquisitionEngine {
    catalog: Arc<dyn CatalogPort>,
    delivery: Arc<dyn DeliveryPort>,
    cut_index: Arc<dyn CutIndexPort>,
    cut_detector: Arc<dyn CutDetectorPort>,
    probe: Arc<dyn MediaProbePort>,
    config: RenderConfig,
}

impl ClipAcquisitionEngine {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        delivery: Arc<dyn DeliveryPort>,
        cut_index: Arc<dyn CutIndexPort>,
        cut_detector: Arc<dyn CutDetectorPort>,
        probe: Arc<dyn MediaProbePort>,
        config: RenderConfig,
    ) -> Self {
        Self {
            catalog,
            delivery,
            cut_index,
            cut_detector,
            probe,
            config,
        }
    }

    /// Acquire one clip per cover, in timeline order.
    ///
    /// Covers are processed in fixed-size concurrent batches, smaller when
    /// cut detection is active. Each batch is fully awaited before the
    /// next starts, so the shared used-key set never races across batches.
    pub async fn acquire_all(
        &self,
        plan: &Plan,
        ctx: &AcquisitionContext,
        workdir: &Path,
    ) -> SongcutResult<Vec<Clip>> {
        let mut covers: Vec<&Cover> = plan.covers.iter().collect();
        covers.sort_by_key(|c| c.first_index());

        let used = UsedKeys::new();
        // Seed with every planned window so replacements chosen later can
        // never collide with a slot that is still going to be fetched.
        for seg in &plan.segments {
            used.record(ClipKey::for_window(&seg.asset.video_id, seg.asset.start));
        }

        let batch_size = if plan.detect_cuts {
            self.config.batch_size_detecting
        } else {
            self.config.batch_size
        }
        .max(1);

        let mut clips = Vec::with_capacity(covers.len());
        for batch in covers.chunks(batch_size) {
            let tasks = batch
                .iter()
                .map(|cover| self.acquire_unit(plan, ctx, cover, &used, workdir));
            let results = futures::future::join_all(tasks).await;

            let mut failures: Vec<(usize, SongcutError)> = Vec::new();
            for (cover, result) in batch.iter().zip(results) {
                match result {
                    Ok(clip) => clips.push(clip),
                    Err(e) => failures.push((cover.first_index(), e)),
                }
            }
            if !failures.is_empty() {
                if failures.len() == 1 {
                    let (index, error) = failures.pop().expect("non-empty");
                    warn!(segment = index, "acquisition failed: {}", error);
                    return Err(error);
                }
                let mut failed_segments: Vec<usize> = Vec::new();
                for (index, error) in failures {
                    warn!(segment = index, "acquisition failed: {}", error);
                    failed_segments.push(index);
                }
                failed_segments.sort_unstable();
                return Err(SongcutError::Acquisition { failed_segments });
            }
        }

        info!(clips = clips.len(), used_keys = used.len(), "acquisition complete");
        Ok(clips)
    }

    async fn acquire_unit(
        &self,
        plan: &Plan,
        ctx: &AcquisitionContext,
        cover: &Cover,
        used: &UsedKeys,
        workdir: &Path,
    ) -> SongcutResult<Clip> {
        match cover {
            Cover::Composite {
                start,
                frame_count,
                source,
                ..
            } => self.acquire_composite(*start, *frame_count, source, workdir).await,
            Cover::Segment { index, .. } => {
                let segment = plan.segments[*index].clone();
                let segment = self.substitute_if_banned(ctx, segment, used);
                self.acquire_attempt(plan, ctx, segment, used, workdir, self.config.max_retries)
                    .await
            }
        }
    }

    /// A composite unit was rendered upstream; fetch it whole, no cut
    /// detection.
    async fn acquire_composite(
        &self,
        first_segment: usize,
        frame_count: u64,
        source: &AssetRef,
        workdir: &Path,
    ) -> SongcutResult<Clip> {
        let delivery_id = self.resolve_delivery_id(source).await;
        let dest = workdir.join(format!("comp{:03}.mp4", first_segment));
        self.delivery
            .fetch_range(&delivery_id, source.start, source.end, &dest)
            .await?;

        let measured = self.probe.probe(&dest).await?;
        if measured.frames < frame_count {
            return Err(SongcutError::FrameDeficit {
                segment_index: first_segment,
                required: frame_count,
                actual: measured.frames,
                deficit: frame_count - measured.frames,
            });
        }
        Ok(Clip {
            path: dest,
            target_frames: frame_count,
            actual_frames: measured.frames,
            actual_duration: measured.duration,
            source: ClipSource::Composite,
            first_segment,
        })
    }

    /// Pre-acquisition substitution: if the segment's window is banned,
    /// rebind to the first non-banned candidate with sufficient duration.
    fn substitute_if_banned(
        &self,
        ctx: &AcquisitionContext,
        segment: Segment,
        used: &UsedKeys,
    ) -> Segment {
        if !ctx.is_banned(&segment.asset) {
            return segment;
        }
        let needed = segment.asset.window_seconds();
        for candidate in &ctx.candidates {
            if ctx.is_banned(&candidate.asset) || candidate.asset.window_seconds() < needed {
                continue;
            }
            let key = ClipKey::for_window(&candidate.asset.video_id, candidate.asset.start);
            if !used.try_reserve(key) {
                continue;
            }
            let replacement = AssetRef {
                video_id: candidate.asset.video_id.clone(),
                catalog_id: candidate.asset.catalog_id.clone(),
                start: candidate.asset.start,
                end: candidate.asset.start + needed,
            };
            info!(
                segment = segment.index,
                banned = %segment.asset.video_id,
                substitute = %replacement.video_id,
                "substituting banned source"
            );
            return segment.with_asset(replacement);
        }
        warn!(
            segment = segment.index,
            asset = %segment.asset.video_id,
            "asset is banned but no substitute is available; keeping original"
        );
        segment
    }

    /// One fetch-measure-check attempt, recursing on a rebound segment
    /// while retries remain. Each retry carries a fresh immutable segment
    /// value; nothing upstream is mutated.
    fn acquire_attempt<'a>(
        &'a self,
        plan: &'a Plan,
        ctx: &'a AcquisitionContext,
        segment: Segment,
        used: &'a UsedKeys,
        workdir: &'a Path,
        retries_left: usize,
    ) -> BoxFuture<'a, SongcutResult<Clip>> {
        Box::pin(async move {
            let delivery_id = self.resolve_delivery_id(&segment.asset).await;
            let dest = attempt_path(workdir, &segment, retries_left);
            self.delivery
                .fetch_range(&delivery_id, segment.asset.start, segment.asset.end, &dest)
                .await?;

            let measured = self.probe.probe(&dest).await?;
            let required = segment.frame_count;
            if measured.frames < required {
                return Err(SongcutError::FrameDeficit {
                    segment_index: segment.index,
                    required,
                    actual: measured.frames,
                    deficit: required - measured.frames,
                });
            }

            let skip_detection = !plan.detect_cuts || segment.cut_free_verified;
            if !skip_detection && self.window_has_cut(&segment, &dest).await? {
                if retries_left > 0 {
                    if let Some(replacement) = self.find_replacement(ctx, &segment, used).await? {
                        debug!(
                            segment = segment.index,
                            retries_left,
                            from = %segment.asset.video_id,
                            to = %replacement.video_id,
                            "cut found, rebinding segment"
                        );
                        let _ = tokio::fs::remove_file(&dest).await;
                        return self
                            .acquire_attempt(
                                plan,
                                ctx,
                                segment.with_asset(replacement),
                                used,
                                workdir,
                                retries_left - 1,
                            )
                            .await;
                    }
                    warn!(
                        segment = segment.index,
                        "cut found but no replacement is available; proceeding"
                    );
                } else {
                    // Cut-freedom is best-effort, not a hard invariant.
                    warn!(
                        segment = segment.index,
                        "cut found and retries exhausted; proceeding with cut-containing media"
                    );
                }
            }

            used.record(ClipKey::for_window(
                &segment.asset.video_id,
                segment.asset.start,
            ));
            Ok(Clip {
                path: dest,
                target_frames: required,
                actual_frames: measured.frames,
                actual_duration: measured.duration,
                source: ClipSource::Downloaded,
                first_segment: segment.index,
            })
        })
    }

    /// Translate the internal id via the catalog; the raw id is a valid
    /// delivery identifier fallback when the lookup fails.
    async fn resolve_delivery_id(&self, asset: &AssetRef) -> String {
        match self
            .catalog
            .lookup(&asset.video_id, &asset.catalog_id)
            .await
        {
            Ok(entry) => entry.delivery_id,
            Err(e) => {
                warn!(
                    asset = %asset.video_id,
                    "catalog lookup failed ({}); falling back to raw id", e
                );
                asset.video_id.clone()
            }
        }
    }

    /// Whether the used sub-range contains a hard cut. Prefers the
    /// precomputed index; falls back to on-the-fly detection on the
    /// retrieved file when no index exists for the asset.
    async fn window_has_cut(&self, segment: &Segment, file: &Path) -> SongcutResult<bool> {
        let asset = &segment.asset;
        let indexed = self
            .cut_index
            .cuts_in_range(&asset.video_id, asset.start, asset.end)
            .await?;
        let has_cut = match indexed {
            Some(cuts) => cuts
                .iter()
                .any(|t| *t > asset.start + CUT_EDGE_MARGIN && *t < asset.end - CUT_EDGE_MARGIN),
            None => {
                let window = asset.window_seconds();
                let detected = self.cut_detector.detect_cuts(file).await?;
                detected
                    .iter()
                    .any(|t| *t > CUT_EDGE_MARGIN && *t < window - CUT_EDGE_MARGIN)
            }
        };
        Ok(has_cut)
    }

    /// Find a new window for a segment whose current one contains a cut:
    /// first a cut-free window in the same asset within the expanded
    /// neighborhood, then the candidate pool minus every used key.
    async fn find_replacement(
        &self,
        ctx: &AcquisitionContext,
        segment: &Segment,
        used: &UsedKeys,
    ) -> SongcutResult<Option<AssetRef>> {
        let asset = &segment.asset;
        let needed = asset.window_seconds();
        let margin = self.config.replacement_margin;

        let nearby = self
            .cut_index
            .cut_free_window(
                &asset.video_id,
                (asset.start - margin).max(0.0),
                asset.end + margin,
                needed,
            )
            .await?;
        if let Some((start, _)) = nearby {
            let key = ClipKey::for_window(&asset.video_id, start);
            if used.try_reserve(key) {
                return Ok(Some(AssetRef {
                    video_id: asset.video_id.clone(),
                    catalog_id: asset.catalog_id.clone(),
                    start,
                    end: start + needed,
                }));
            }
        }

        for candidate in &ctx.candidates {
            if ctx.is_banned(&candidate.asset) || candidate.asset.window_seconds() < needed {
                continue;
            }
            let key = ClipKey::for_window(&candidate.asset.video_id, candidate.asset.start);
            if !used.try_reserve(key) {
                continue;
            }
            return Ok(Some(AssetRef {
                video_id: candidate.asset.video_id.clone(),
                catalog_id: candidate.asset.catalog_id.clone(),
                start: candidate.asset.start,
                end: candidate.asset.start + needed,
            }));
        }
        Ok(None)
    }
}

fn attempt_path(workdir: &Path, segment: &Segment, retries_left: usize) -> PathBuf {
    workdir.join(format!("seg{:03}_r{}.mp4", segment.index, retries_left))
}
