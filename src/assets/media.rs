use std::path::PathBuf;

use crate::assets::decode::AudioPcm;
use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Internal audio mixing sample rate used across decode/mix/encode pipeline.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Name or path of the `ffmpeg` binary (`REELCAST_FFMPEG` overrides `ffmpeg` on `PATH`).
pub fn ffmpeg_bin() -> PathBuf {
    std::env::var_os("REELCAST_FFMPEG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

/// Return `true` when `ffmpeg` can be invoked.
pub fn is_ffmpeg_available() -> bool {
    std::process::Command::new(ffmpeg_bin())
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Unique scratch path in the system temp dir.
pub(crate) fn scratch_path(stem: &str, ext: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "reelcast_{stem}_{}_{nanos}_{}.{ext}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode an encoded audio file (MP3, AAC, Ogg, ...) to stereo interleaved `f32` PCM.
pub fn decode_audio_bytes_f32_stereo(bytes: &[u8], sample_rate: u32) -> ReelcastResult<AudioPcm> {
    let src = scratch_path("audio_in", "bin");
    std::fs::write(&src, bytes).map_err(|e| {
        ReelcastError::decode(format!(
            "failed to stage audio for decode at '{}': {e}",
            src.display()
        ))
    })?;

    let out = std::process::Command::new(ffmpeg_bin())
        .args(["-v", "error", "-i"])
        .arg(&src)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output();
    std::fs::remove_file(&src).ok();
    let out = out
        .map_err(|e| ReelcastError::decode(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelcastError::decode(format!(
            "ffmpeg audio decode failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelcastError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }

    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode an encoded audio file to stereo interleaved `f32` PCM.
///
/// Returns an error when `media-ffmpeg` feature is disabled; WAV input is decoded natively.
pub fn decode_audio_bytes_f32_stereo(_bytes: &[u8], _sample_rate: u32) -> ReelcastResult<AudioPcm> {
    Err(ReelcastError::decode(
        "non-WAV audio requires the 'media-ffmpeg' feature",
    ))
}
