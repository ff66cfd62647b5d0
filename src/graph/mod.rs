//! Filter graph construction
//!
//! Converts a validated plan plus its fully-acquired clips into one
//! deterministic composition graph: per-clip video chains, per-clip audio
//! chains, the song bed with volume automation, and the final mix.
//! Identical plan+clips always produce byte-identical graph text; the
//! graph is built fresh on every render and never cached.

pub mod volume;

use tracing::debug;

use crate::config::RenderConfig;
use crate::domain::model::{Clip, Cover, Plan, Segment};
use crate::error::{SongcutError, SongcutResult};
use crate::utils::time::{fmt_f64, frames_to_seconds};
pub use volume::{compute_volume_spans, VolumeSpan};

/// One labeled stage of the graph: `[in...]filters[out]`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    /// Input stream labels, without brackets
    pub inputs: Vec<String>,
    /// Comma-joined filter list
    pub filters: String,
    /// Output stream label, without brackets
    pub output: String,
}

impl FilterChain {
    fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(|i| format!("[{}]", i)).collect();
        format!("{}{}[{}]", inputs, self.filters, self.output)
    }
}

/// Intermediate representation of the whole composition
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    /// Ordered stages; rendering joins them with `;`
    pub chains: Vec<FilterChain>,
    /// The merged volume-automation intervals applied to the song bed
    pub volume_spans: Vec<VolumeSpan>,
}

impl FilterGraph {
    /// Render the textual `filter_complex` argument
    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Builds filter graphs for one fixed output format
pub struct FilterGraphBuilder {
    width: u32,
    height: u32,
    pad_color: String,
    debug_labels: bool,
}

impl FilterGraphBuilder {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            pad_color: config.pad_color.clone(),
            debug_labels: config.debug_labels,
        }
    }

    /// Build the graph for a plan and its acquired clips.
    ///
    /// `clips` must be in timeline order, one per cover. Input 0 is the
    /// song; clip i is transcoder input i+1.
    pub fn build(&self, plan: &Plan, clips: &[Clip]) -> SongcutResult<FilterGraph> {
        let mut covers: Vec<&Cover> = plan.covers.iter().collect();
        covers.sort_by_key(|c| c.first_index());
        if covers.len() != clips.len() {
            return Err(SongcutError::Graph {
                message: format!(
                    "plan has {} covers but {} clips were acquired",
                    covers.len(),
                    clips.len()
                ),
            });
        }

        let mut chains = Vec::new();

        // Per-clip video chains, strict timeline order.
        for (i, clip) in clips.iter().enumerate() {
            if clip.actual_frames < clip.target_frames {
                // Never silently truncate the timeline.
                return Err(SongcutError::Graph {
                    message: format!(
                        "clip {} holds {} verified frames but its slot needs {}",
                        i, clip.actual_frames, clip.target_frames
                    ),
                });
            }
            chains.push(self.video_chain(i, clip, plan.fps));
        }

        // Per-clip audio chains, only for slots with an audible clip volume.
        let starts = plan.segment_frame_starts();
        let mut clip_audio_labels = Vec::new();
        for (i, (clip, cover)) in clips.iter().zip(&covers).enumerate() {
            let lead_segment = &plan.segments[cover.first_index()];
            let volume = lead_segment.clip_volume();
            if volume <= 0.0 {
                continue;
            }
            let offset = frames_to_seconds(starts[cover.first_index()], plan.fps);
            chains.push(self.clip_audio_chain(i, clip, plan.fps, offset, volume));
            clip_audio_labels.push(format!("ca{}", i));
        }

        // Song bed and its volume automation.
        let volume_spans =
            compute_volume_spans(&plan.segments, plan.fps, plan.timeline_seconds());
        chains.extend(self.bed_chains(plan, &volume_spans));

        // Final mix: one video stream, one audio stream.
        chains.push(FilterChain {
            inputs: (0..clips.len()).map(|i| format!("v{}", i)).collect(),
            filters: format!("concat=n={}:v=1:a=0", clips.len()),
            output: "vout".to_string(),
        });
        chains.extend(self.final_audio_chains(&clip_audio_labels));

        debug!(
            chains = chains.len(),
            spans = volume_spans.len(),
            "filter graph constructed"
        );
        Ok(FilterGraph {
            chains,
            volume_spans,
        })
    }

    fn video_chain(&self, i: usize, clip: &Clip, fps: f64) -> FilterChain {
        // The integer frame count is the source of truth: normalize the
        // rate first, then trim by frames, so rounding never drifts.
        let mut filters = format!(
            "fps={fps},trim=end_frame={frames},setpts=PTS-STARTPTS,\
             scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={color}",
            fps = fmt_f64(fps),
            frames = clip.target_frames,
            w = self.width,
            h = self.height,
            color = self.pad_color,
        );
        if self.debug_labels {
            filters.push_str(&format!(
                ",drawtext=text='clip {} seg {}':x=16:y=16:fontsize=36:fontcolor=white",
                i, clip.first_segment
            ));
        }
        FilterChain {
            inputs: vec![format!("{}:v", i + 1)],
            filters,
            output: format!("v{}", i),
        }
    }

    fn clip_audio_chain(
        &self,
        i: usize,
        clip: &Clip,
        fps: f64,
        offset_seconds: f64,
        volume: f64,
    ) -> FilterChain {
        let duration = clip.target_seconds(fps);
        let delay_ms = (offset_seconds * 1000.0).round() as u64;
        FilterChain {
            inputs: vec![format!("{}:a", i + 1)],
            filters: format!(
                "atrim=0:{dur},asetpts=PTS-STARTPTS,adelay={ms}|{ms},volume={vol}",
                dur = fmt_f64(duration),
                ms = delay_ms,
                vol = fmt_f64(volume),
            ),
            output: format!("ca{}", i),
        }
    }

    /// The song bed: explicit chunks, a single full-length trim, or a
    /// silent base with chunks mixed on top — then volume automation.
    /// The bed is always exactly timeline-length.
    fn bed_chains(&self, plan: &Plan, spans: &[VolumeSpan]) -> Vec<FilterChain> {
        let timeline = plan.timeline_seconds();
        let any_pause = plan.segments.iter().any(Segment::pauses_music);
        let chunks = plan
            .audio_chunks
            .as_deref()
            .filter(|c| !c.is_empty());

        let mut chains = Vec::new();
        match chunks {
            Some(chunks) => {
                for (j, chunk) in chunks.iter().enumerate() {
                    let start = frames_to_seconds(chunk.start_frame, plan.fps);
                    let dur = frames_to_seconds(chunk.frame_count, plan.fps);
                    let delay_ms = (frames_to_seconds(chunk.video_offset_frame, plan.fps)
                        * 1000.0)
                        .round() as u64;
                    chains.push(FilterChain {
                        inputs: vec!["0:a".to_string()],
                        filters: format!(
                            "atrim={s}:{e},asetpts=PTS-STARTPTS,adelay={ms}|{ms}",
                            s = fmt_f64(start),
                            e = fmt_f64(start + dur),
                            ms = delay_ms,
                        ),
                        output: format!("sb{}", j),
                    });
                }
                if any_pause {
                    // Silent base guarantees an exactly timeline-length
                    // bed even when the chunks fall short of coverage.
                    chains.push(FilterChain {
                        inputs: vec![],
                        filters: format!(
                            "anullsrc=r=44100:cl=stereo,atrim=0:{}",
                            fmt_f64(timeline)
                        ),
                        output: "silence".to_string(),
                    });
                    let mut inputs = vec!["silence".to_string()];
                    inputs.extend((0..chunks.len()).map(|j| format!("sb{}", j)));
                    let n = inputs.len();
                    chains.push(FilterChain {
                        inputs,
                        filters: format!("amix=inputs={}:duration=longest:normalize=0", n),
                        output: "bedpre".to_string(),
                    });
                } else {
                    let inputs: Vec<String> =
                        (0..chunks.len()).map(|j| format!("sb{}", j)).collect();
                    let n = inputs.len();
                    chains.push(FilterChain {
                        inputs,
                        filters: format!("amix=inputs={}:duration=longest:normalize=0", n),
                        output: "bedpre".to_string(),
                    });
                }
            }
            None => {
                // No explicit cut list: one trim of the song covering the
                // full timeline. Pauses are realized by automation alone.
                chains.push(FilterChain {
                    inputs: vec!["0:a".to_string()],
                    filters: format!("atrim=0:{},asetpts=PTS-STARTPTS", fmt_f64(timeline)),
                    output: "bedpre".to_string(),
                });
            }
        }

        // One gain-automation stage per non-unity interval, chained.
        let stages: Vec<String> = spans
            .iter()
            .filter(|s| (s.volume - 1.0).abs() > f64::EPSILON)
            .map(|s| {
                format!(
                    "volume=enable='between(t,{},{})':volume={}",
                    fmt_f64(s.start),
                    fmt_f64(s.end),
                    fmt_f64(s.volume),
                )
            })
            .collect();
        chains.push(FilterChain {
            inputs: vec!["bedpre".to_string()],
            filters: if stages.is_empty() {
                "anull".to_string()
            } else {
                stages.join(",")
            },
            output: "bed".to_string(),
        });
        chains
    }

    /// Mix the clip audio into one sub-bus, then the sub-bus with the bed
    /// using longest-duration semantics; never truncate to the shortest
    /// input.
    fn final_audio_chains(&self, clip_audio_labels: &[String]) -> Vec<FilterChain> {
        if clip_audio_labels.is_empty() {
            return vec![FilterChain {
                inputs: vec!["bed".to_string()],
                filters: "anull".to_string(),
                output: "aout".to_string(),
            }];
        }
        vec![
            FilterChain {
                inputs: clip_audio_labels.to_vec(),
                filters: format!(
                    "amix=inputs={}:duration=longest:normalize=0",
                    clip_audio_labels.len()
                ),
                output: "cbus".to_string(),
            },
            FilterChain {
                inputs: vec!["bed".to_string(), "cbus".to_string()],
                filters: "amix=inputs=2:duration=longest:normalize=0".to_string(),
                output: "aout".to_string(),
            },
        ]
    }
}
