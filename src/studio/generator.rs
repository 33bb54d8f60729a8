use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::assets::source::to_data_url;
use crate::audio::pcm::{RawPcm, SPEECH_SAMPLE_RATE};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::settings::AspectRatio;

/// Inputs for generating one scene image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePrompt<'a> {
    /// Content title.
    pub title: &'a str,
    /// Caption of the scene being illustrated.
    pub scene_text: &'a str,
    /// Visual hint; empty when the scene has none.
    pub suggestion: &'a str,
    /// Target aspect ratio.
    pub aspect_ratio: AspectRatio,
}

/// Narration returned by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioPayload {
    /// Already fetchable audio reference.
    Reference(String),
    /// Raw speech PCM that still needs a container.
    Pcm(RawPcm),
}

/// The external generative collaborator: produces scene images and narration on demand.
pub trait GenerativeBackend: Send + Sync {
    /// Generate an image for one scene and return a fetchable reference to it.
    fn generate_scene_image(&self, prompt: &ImagePrompt<'_>) -> ReelcastResult<String>;

    /// Synthesize narration for `script`.
    fn generate_narration(&self, script: &str) -> ReelcastResult<AudioPayload>;
}

/// Backend that needs no network: flat-colour PNG scenes and silent speech.
///
/// Narration lasts `secs_per_word` for every word of the script. Counts calls so callers can check
/// what was generated.
#[derive(Debug)]
pub struct OfflineBackend {
    secs_per_word: f64,
    palette: Vec<[u8; 3]>,
    image_calls: AtomicUsize,
    narration_calls: AtomicUsize,
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(0.4)
    }
}

impl OfflineBackend {
    /// Backend speaking `secs_per_word` per word.
    pub fn new(secs_per_word: f64) -> Self {
        Self {
            secs_per_word,
            palette: vec![[0x1e, 0x3a, 0x8a], [0x9a, 0x34, 0x12], [0x16, 0x65, 0x34]],
            image_calls: AtomicUsize::new(0),
            narration_calls: AtomicUsize::new(0),
        }
    }

    /// Scene images generated so far.
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::Relaxed)
    }

    /// Narrations generated so far.
    pub fn narration_calls(&self) -> usize {
        self.narration_calls.load(Ordering::Relaxed)
    }
}

impl GenerativeBackend for OfflineBackend {
    fn generate_scene_image(&self, prompt: &ImagePrompt<'_>) -> ReelcastResult<String> {
        let n = self.image_calls.fetch_add(1, Ordering::Relaxed);
        let (w, h) = match prompt.aspect_ratio {
            AspectRatio::Landscape => (64, 36),
            AspectRatio::Portrait => (36, 64),
        };
        let [r, g, b] = self.palette[n % self.palette.len()];
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([r, g, b, 255]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| ReelcastError::generation(format!("png encode failed: {e}")))?;
        Ok(to_data_url("image/png", png.get_ref()))
    }

    fn generate_narration(&self, script: &str) -> ReelcastResult<AudioPayload> {
        self.narration_calls.fetch_add(1, Ordering::Relaxed);
        let words = script.split_whitespace().count();
        if words == 0 {
            return Err(ReelcastError::generation("narration script is empty"));
        }
        let secs = words as f64 * self.secs_per_word;
        let samples = (secs * f64::from(SPEECH_SAMPLE_RATE)).round() as usize;
        Ok(AudioPayload::Pcm(RawPcm::speech(vec![0u8; samples * 2])))
    }
}
