use std::path::Path;
use std::sync::Arc;

use crate::assets::decode::AudioPcm;
use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Gain applied to narration.
pub const NARRATION_GAIN: f32 = 1.0;
/// Gain applied to background music, relative to narration.
pub const MUSIC_GAIN: f32 = 0.2;

/// One buffer scheduled into the graph, starting at t=0.
#[derive(Clone, Debug)]
pub(crate) struct ScheduledSource {
    pub(crate) pcm: Arc<AudioPcm>,
    pub(crate) gain: f32,
    pub(crate) looped: bool,
}

/// The merged audio track handed to the recorder.
#[derive(Clone, Debug, PartialEq)]
pub struct MixedTrack {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` samples clamped to `[-1, 1]`.
    pub interleaved_f32: Vec<f32>,
}

impl MixedTrack {
    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Mixing graph: every scheduled source starts at t=0 and is summed into one output track.
///
/// Must be closed exactly once by its owner; a closed graph rejects new work.
#[derive(Debug)]
pub struct AudioGraph {
    sample_rate: u32,
    channels: u16,
    sources: Vec<ScheduledSource>,
    open: bool,
}

impl AudioGraph {
    /// Open a graph producing `channels` at `sample_rate`.
    pub fn open(sample_rate: u32, channels: u16) -> ReelcastResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(ReelcastError::validation(
                "audio graph sample rate and channel count must be non-zero",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            sources: Vec::new(),
            open: true,
        })
    }

    /// `true` until [`AudioGraph::close`] is called.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of scheduled sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Schedule `pcm` to start immediately with `gain`, optionally looping forever.
    pub fn schedule(&mut self, pcm: Arc<AudioPcm>, gain: f32, looped: bool) -> ReelcastResult<()> {
        if !self.open {
            return Err(ReelcastError::render("audio graph is closed"));
        }
        if pcm.channels == 0 || pcm.sample_rate == 0 {
            return Err(ReelcastError::decode(
                "scheduled audio has zero channels or sample rate",
            ));
        }
        self.sources.push(ScheduledSource { pcm, gain, looped });
        Ok(())
    }

    /// Render `duration_secs` of the merged output.
    pub fn render_merged(&self, duration_secs: f64) -> ReelcastResult<MixedTrack> {
        if !self.open {
            return Err(ReelcastError::render("audio graph is closed"));
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelcastError::InvalidAudioDuration(duration_secs));
        }
        let frames = (duration_secs * f64::from(self.sample_rate)).round() as usize;
        let mut out = vec![0.0f32; frames * usize::from(self.channels)];
        for src in &self.sources {
            mix_source(&mut out, self.sample_rate, self.channels, src);
        }
        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }
        Ok(MixedTrack {
            sample_rate: self.sample_rate,
            channels: self.channels,
            interleaved_f32: out,
        })
    }

    /// Release scheduled buffers and close the graph. Idempotent.
    pub fn close(&mut self) {
        self.sources.clear();
        self.open = false;
    }
}

fn mix_source(out: &mut [f32], sample_rate: u32, channels: u16, src: &ScheduledSource) {
    let pcm = src.pcm.as_ref();
    let src_channels = usize::from(pcm.channels);
    let src_frames = pcm.frames();
    if src_frames == 0 {
        return;
    }
    let data = pcm.interleaved_f32.as_slice();
    let out_channels = usize::from(channels);
    let out_frames = out.len() / out_channels;
    let step = f64::from(pcm.sample_rate) / f64::from(sample_rate);

    for dst_frame in 0..out_frames {
        let mut src_pos = dst_frame as f64 * step;
        if src.looped {
            src_pos %= src_frames as f64;
        } else if src_pos >= src_frames as f64 {
            break;
        }
        let f0 = src_pos.floor() as usize;
        let f1 = if src.looped {
            (f0 + 1) % src_frames
        } else {
            (f0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - f0 as f64) as f32;

        let sample = |frame: usize, ch: usize| -> f32 {
            data[frame * src_channels + ch.min(src_channels - 1)]
        };
        let dst = dst_frame * out_channels;
        for ch in 0..out_channels {
            let v0 = sample(f0, ch);
            let v1 = sample(f1, ch);
            out[dst + ch] += (v0 + (v1 - v0) * frac) * src.gain;
        }
    }
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub(crate) fn write_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelcastResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelcastError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
