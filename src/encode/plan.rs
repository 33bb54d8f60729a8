use std::collections::BTreeSet;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::assets::media::ffmpeg_bin;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::settings::{OutputFormat, Resolution, VideoSettings};

/// WebM with VP9, the default container and the first fallback.
pub const MIME_WEBM_VP9: &str = "video/webm;codecs=vp9";
/// Plain MP4.
pub const MIME_MP4: &str = "video/mp4";
/// MP4 with H.264.
pub const MIME_MP4_AVC1: &str = "video/mp4;codecs=avc1";

/// Video bitrate for 1080p output, bits per second.
pub const BITRATE_1080P: u32 = 5_000_000;
/// Video bitrate for everything else, bits per second.
pub const BITRATE_DEFAULT: u32 = 2_500_000;

/// Output container family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Matroska/WebM.
    Webm,
    /// ISO BMFF.
    Mp4,
}

impl Container {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// Container a MIME type belongs to: anything mentioning `mp4` is MP4, the rest WebM.
    pub fn from_mime(mime: &str) -> Self {
        if mime.contains("mp4") {
            Self::Mp4
        } else {
            Self::Webm
        }
    }
}

/// MIME types a media runtime can record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderCapabilities {
    supported: BTreeSet<String>,
}

impl EncoderCapabilities {
    /// Capabilities listing exactly `mimes`.
    pub fn new<I, S>(mimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported: mimes.into_iter().map(Into::into).collect(),
        }
    }

    /// Every MIME type negotiation can pick.
    pub fn all() -> Self {
        Self::new([MIME_WEBM_VP9, MIME_MP4, MIME_MP4_AVC1])
    }

    /// Only the WebM fallback.
    pub fn webm_only() -> Self {
        Self::new([MIME_WEBM_VP9])
    }

    /// `true` when `mime` can be recorded.
    pub fn is_type_supported(&self, mime: &str) -> bool {
        self.supported.contains(mime)
    }

    /// Ask the configured `ffmpeg` which encoders it was built with.
    ///
    /// Returns empty capabilities when `ffmpeg` cannot be run.
    pub fn probe_ffmpeg() -> Self {
        let out = Command::new(ffmpeg_bin())
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match out {
            Ok(o) if o.status.success() => {
                Self::from_encoder_listing(&String::from_utf8_lossy(&o.stdout))
            }
            Ok(o) => {
                tracing::warn!(status = %o.status, "ffmpeg -encoders failed");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ffmpeg is not available");
                Self::default()
            }
        }
    }

    /// Capabilities implied by `ffmpeg -encoders` output.
    pub fn from_encoder_listing(listing: &str) -> Self {
        let has = |name: &str| {
            listing
                .lines()
                .any(|l| l.split_whitespace().nth(1) == Some(name))
        };
        let mut mimes = Vec::new();
        if has("libvpx-vp9") && (has("libopus") || has("opus")) {
            mimes.push(MIME_WEBM_VP9);
        }
        if has("libx264") && has("aac") {
            mimes.push(MIME_MP4);
            mimes.push(MIME_MP4_AVC1);
        }
        Self::new(mimes)
    }
}

/// The resolved container/codec/bitrate decision for one render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodingPlan {
    /// Negotiated MIME type.
    pub mime: String,
    /// Container family of `mime`.
    pub container: Container,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u32,
    /// Capture frame rate.
    pub fps: Fps,
    /// Output canvas.
    pub canvas: Canvas,
    /// Caller preference, if any.
    pub requested: Option<OutputFormat>,
    /// `true` when the preference could not be honoured.
    pub fell_back: bool,
}

impl EncodingPlan {
    /// File extension of the negotiated container.
    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }
}

/// Fallbacks tried after the preferred candidates, in order.
const FALLBACKS: [&str; 3] = [MIME_WEBM_VP9, MIME_MP4, MIME_MP4_AVC1];

fn candidates(format: Option<OutputFormat>) -> &'static [&'static str] {
    match format {
        Some(OutputFormat::Mp4) => &[MIME_MP4, MIME_MP4_AVC1],
        Some(OutputFormat::Webm) | None => &[MIME_WEBM_VP9],
    }
}

/// Pick the encoding for `settings` given what the runtime supports.
///
/// An MP4 preference tries `video/mp4` then `video/mp4;codecs=avc1`; everything else tries WebM
/// VP9. When the preferred container is unavailable the other one is used and the fallback is
/// logged, never an error. Only a runtime that can record nothing at all is rejected.
pub fn negotiate(
    settings: &VideoSettings,
    caps: &EncoderCapabilities,
) -> ReelcastResult<EncodingPlan> {
    let fps = settings.fps()?;
    let canvas = settings.canvas();
    let video_bitrate = match settings.resolution {
        Resolution::P1080 => BITRATE_1080P,
        Resolution::P720 => BITRATE_DEFAULT,
    };

    let preferred = candidates(settings.format);
    let mime = preferred
        .iter()
        .chain(FALLBACKS.iter())
        .copied()
        .find(|m| caps.is_type_supported(m))
        .ok_or_else(|| ReelcastError::encode("media runtime supports no recordable format"))?;

    let fell_back = !preferred.contains(&mime);
    if fell_back {
        tracing::warn!(
            requested = ?settings.format,
            fallback = mime,
            "preferred format is not supported; falling back"
        );
    }

    Ok(EncodingPlan {
        mime: mime.to_string(),
        container: Container::from_mime(mime),
        video_bitrate,
        fps,
        canvas,
        requested: settings.format,
        fell_back,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/plan.rs"]
mod tests;
