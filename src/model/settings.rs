use serde::{Deserialize, Deserializer, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::ReelcastResult;

/// Target resolution tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720 (or 720x1280 in portrait).
    #[default]
    #[serde(rename = "720p")]
    P720,
    /// 1920x1080 (or 1080x1920 in portrait).
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    /// Wire name, also used in download file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

/// Output aspect ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

/// Preferred output container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// WebM (VP9).
    Webm,
    /// MP4 (H.264).
    Mp4,
}

/// Render configuration chosen by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    /// Resolution tier.
    pub resolution: Resolution,
    /// Aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Capture frame rate in whole frames per second. Accepts `30` or `"30"`.
    #[serde(deserialize_with = "de_frame_rate")]
    pub frame_rate: u32,
    /// Transition style; only affects preview hints.
    pub transition: String,
    /// Optional container preference. Unsupported values fall back silently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::P720,
            aspect_ratio: AspectRatio::Landscape,
            frame_rate: 30,
            transition: "fade".to_string(),
            format: None,
        }
    }
}

impl VideoSettings {
    /// Canvas size for the resolution tier and aspect ratio.
    pub fn canvas(&self) -> Canvas {
        let (long, short) = match self.resolution {
            Resolution::P720 => (1280, 720),
            Resolution::P1080 => (1920, 1080),
        };
        match self.aspect_ratio {
            AspectRatio::Landscape => Canvas {
                width: long,
                height: short,
            },
            AspectRatio::Portrait => Canvas {
                width: short,
                height: long,
            },
        }
    }

    /// Validated capture frame rate.
    pub fn fps(&self) -> ReelcastResult<Fps> {
        Fps::integer(self.frame_rate)
    }
}

fn de_frame_rate<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid frame rate '{s}': {e}"))),
    }
}

/// Avatar placement relative to the bottom-centre anchor.
///
/// `x`/`y` are percentages of canvas width/height. Positive `y` raises the avatar. Values outside
/// the nominal ranges are drawn as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Scale multiplier, nominally 0.1..=2.0.
    pub scale: f64,
    /// Horizontal offset in percent of canvas width, nominally -100..=100.
    pub x: f64,
    /// Vertical offset in percent of canvas height, nominally -100..=100.
    pub y: f64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl AvatarConfig {
    /// Scale with 0/NaN treated as 1.
    pub fn effective_scale(&self) -> f64 {
        if self.scale == 0.0 || self.scale.is_nan() {
            1.0
        } else {
            self.scale
        }
    }

    /// Offsets with NaN treated as 0.
    pub fn effective_offsets(&self) -> (f64, f64) {
        let fix = |v: f64| if v.is_nan() { 0.0 } else { v };
        (fix(self.x), fix(self.y))
    }
}

/// Watermark corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    #[default]
    BottomRight,
}

impl WatermarkPosition {
    /// Anchored to the right edge.
    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    /// Anchored to the bottom edge.
    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }
}

/// Watermark placement and blending.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Corner.
    pub position: WatermarkPosition,
    /// Opacity in 0..=1.
    pub opacity: f32,
    /// Width as a fraction of canvas width (0.1 / 0.15 / 0.2 in the UI).
    pub size: f64,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            position: WatermarkPosition::BottomRight,
            opacity: 0.5,
            size: 0.15,
        }
    }
}

/// Visual composition, selected once per render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One scene image per time slice.
    #[default]
    Slideshow,
    /// Fixed background plus a repositionable avatar for the whole duration.
    Avatar,
}

#[cfg(test)]
#[path = "../../tests/unit/model/settings.rs"]
mod tests;
