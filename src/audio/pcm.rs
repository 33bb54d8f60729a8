use std::io::Cursor;

use base64::Engine as _;

use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Default sample rate of synthesized speech.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Raw 16-bit little-endian PCM as returned by the speech collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved little-endian `i16` bytes.
    pub bytes: Vec<u8>,
}

impl RawPcm {
    /// Speech PCM at the default rate, mono.
    pub fn speech(bytes: Vec<u8>) -> Self {
        Self {
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
            bytes,
        }
    }

    /// Decode base64-encoded speech PCM.
    pub fn speech_from_base64(b64: &str) -> ReelcastResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| ReelcastError::decode(format!("invalid base64 pcm: {e}")))?;
        Ok(Self::speech(bytes))
    }

    /// Wrap the samples in a WAV container.
    pub fn to_wav(&self) -> ReelcastResult<Vec<u8>> {
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(ReelcastError::validation(
                "pcm sample rate and channel count must be non-zero",
            ));
        }
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::with_capacity(44 + self.bytes.len()));
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec)
                .map_err(|e| ReelcastError::encode(format!("wav header write failed: {e}")))?;
            // A trailing odd byte cannot form a sample and is dropped.
            for pair in self.bytes.chunks_exact(2) {
                writer
                    .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                    .map_err(|e| ReelcastError::encode(format!("wav sample write failed: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| ReelcastError::encode(format!("wav finalize failed: {e}")))?;
        }
        Ok(buf.into_inner())
    }
}
