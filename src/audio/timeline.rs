use std::sync::Arc;

use crate::assets::decode::{AudioPcm, MediaDecoder};
use crate::assets::source::{ResourceFetcher, abbreviate};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::request::RenderRequest;

/// Where the authoritative duration came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationSource {
    /// Decoded narration length.
    Narration,
    /// `scenes * secs_per_scene` for a silent preview.
    Preview {
        /// Scene count.
        scenes: usize,
        /// Seconds per scene.
        secs_per_scene: f64,
    },
}

/// Decoded buffers plus the single duration every other component follows.
#[derive(Clone, Debug)]
pub struct AudioTimeline {
    /// Narration buffer (full renders only).
    pub narration: Option<Arc<AudioPcm>>,
    /// Background music buffer; loops for the whole duration.
    pub music: Option<Arc<AudioPcm>>,
    /// Total render duration in seconds; finite and > 0.
    pub total_duration: f64,
    /// How `total_duration` was derived.
    pub source: DurationSource,
}

impl AudioTimeline {
    /// Silent timeline of `scenes * secs_per_scene`.
    pub fn preview(scenes: usize, secs_per_scene: f64) -> ReelcastResult<Self> {
        let total_duration = validate_duration(scenes as f64 * secs_per_scene)?;
        Ok(Self {
            narration: None,
            music: None,
            total_duration,
            source: DurationSource::Preview {
                scenes,
                secs_per_scene,
            },
        })
    }

    /// Narrated timeline whose duration is exactly the narration's decoded duration.
    pub fn narrated(narration: AudioPcm, music: Option<AudioPcm>) -> ReelcastResult<Self> {
        let total_duration = validate_duration(narration.duration_secs())?;
        Ok(Self {
            narration: Some(Arc::new(narration)),
            music: music.map(Arc::new),
            total_duration,
            source: DurationSource::Narration,
        })
    }

    /// `true` when any audio buffer will be mixed into the output.
    pub fn has_audio(&self) -> bool {
        self.narration.is_some() || self.music.is_some()
    }
}

/// Reject durations that would never let the render loop reach its stop condition.
pub fn validate_duration(secs: f64) -> ReelcastResult<f64> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ReelcastError::InvalidAudioDuration(secs));
    }
    Ok(secs)
}

/// Fetches and decodes narration/music and establishes the render duration.
#[derive(Clone)]
pub struct TimelineBuilder {
    fetcher: Arc<dyn ResourceFetcher>,
    decoder: Arc<dyn MediaDecoder>,
}

impl TimelineBuilder {
    /// Create a builder over a fetcher/decoder pair.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { fetcher, decoder }
    }

    /// Build the timeline for `request`.
    ///
    /// Narration failures are fatal; music failures are logged and the music is skipped.
    #[tracing::instrument(skip_all, fields(preview = request.preview))]
    pub fn build(&self, request: &RenderRequest) -> ReelcastResult<AudioTimeline> {
        if request.preview {
            return AudioTimeline::preview(
                request.content.scenes.len(),
                request.preview_secs_per_scene,
            );
        }

        let narration_ref = request
            .narration
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ReelcastError::precondition("narration is required for a full render"))?;
        let narration = self.decode(narration_ref)?;

        let music = match request.music.as_deref().filter(|r| !r.is_empty()) {
            Some(r) => match self.decode(r) {
                Ok(m) if m.frames() > 0 => Some(m),
                Ok(_) => {
                    tracing::warn!(reference = %abbreviate(r), "music track is empty; skipping");
                    None
                }
                Err(e) => {
                    tracing::warn!(
                        reference = %abbreviate(r),
                        error = %e,
                        "failed to load music; skipping"
                    );
                    None
                }
            },
            None => None,
        };

        let timeline = AudioTimeline::narrated(narration, music)?;
        tracing::debug!(
            total_duration = timeline.total_duration,
            music = timeline.music.is_some(),
            "audio timeline ready"
        );
        Ok(timeline)
    }

    fn decode(&self, reference: &str) -> ReelcastResult<AudioPcm> {
        let fetched = self.fetcher.fetch(reference)?;
        self.decoder.decode_audio(&fetched)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/timeline.rs"]
mod tests;
