use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::source::FetchedResource;
use crate::assets::svg_raster::{looks_like_svg, rasterize_svg};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster image in premultiplied RGBA8 form, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap already-premultiplied pixels.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }

    /// Solid-color bitmap, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, premul_rgba: [u8; 4]) -> Self {
        let mut px = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            px.extend_from_slice(&premul_rgba);
        }
        Self::from_premul_rgba8(width, height, px)
    }

    /// `true` when the bitmap has no drawable area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Height divided by width.
    pub fn aspect_h_over_w(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Decoded duration in seconds as reported by the buffer.
    ///
    /// A corrupt buffer with a zero sample rate yields NaN or infinity, which the timeline
    /// builder rejects.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decodes fetched bytes into drawable bitmaps and PCM buffers.
pub trait MediaDecoder: Send + Sync {
    /// Decode a raster or SVG image.
    fn decode_image(&self, res: &FetchedResource) -> ReelcastResult<Bitmap>;
    /// Decode an audio file.
    fn decode_audio(&self, res: &FetchedResource) -> ReelcastResult<AudioPcm>;
}

/// Decoder backed by `image`, `resvg` and `hound`, with `ffmpeg` for other audio containers when
/// the `media-ffmpeg` feature is enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeDecoder;

impl MediaDecoder for NativeDecoder {
    fn decode_image(&self, res: &FetchedResource) -> ReelcastResult<Bitmap> {
        let is_svg = res.mime.as_deref().is_some_and(|m| m.starts_with("image/svg"))
            || looks_like_svg(&res.bytes);
        if is_svg {
            rasterize_svg(&res.bytes)
        } else {
            decode_image(&res.bytes)
        }
    }

    fn decode_audio(&self, res: &FetchedResource) -> ReelcastResult<AudioPcm> {
        if is_wav(&res.bytes) {
            decode_wav(&res.bytes)
        } else {
            crate::assets::media::decode_audio_bytes_f32_stereo(
                &res.bytes,
                crate::assets::media::MIX_SAMPLE_RATE,
            )
        }
    }
}

/// Decode raster bytes (PNG, JPEG, WebP, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelcastResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(Bitmap::from_premul_rgba8(width, height, rgba8_premul))
}

/// `true` for RIFF/WAVE containers.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode a WAV file into interleaved `f32` PCM at its native rate and channel count.
pub fn decode_wav(bytes: &[u8]) -> ReelcastResult<AudioPcm> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| ReelcastError::decode(format!("invalid wav: {e}")))?;
    let spec = reader.spec();

    let interleaved_f32 = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReelcastError::decode(format!("wav sample read failed: {e}")))?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(ReelcastError::decode(format!(
                    "unsupported wav bit depth {}",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ReelcastError::decode(format!("wav sample read failed: {e}")))?
        }
    };

    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
