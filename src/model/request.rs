use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::content::RenderableContent;
use crate::model::settings::{AvatarConfig, RenderMode, VideoSettings, WatermarkSettings};

/// Seconds each scene lasts in a silent preview.
pub const PREVIEW_SECS_PER_SCENE: f64 = 4.0;

/// Immutable snapshot of everything one render needs.
///
/// The host owns mutable session state and hands a clone of it to the renderer, so edits made
/// while a render is in flight never reach the frames being drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Title plus ordered scenes.
    pub content: RenderableContent,
    /// Output configuration.
    #[serde(default)]
    pub settings: VideoSettings,
    /// Slideshow or avatar composition.
    #[serde(default)]
    pub mode: RenderMode,
    /// Silent preview: no narration, synthetic per-scene duration.
    #[serde(default)]
    pub preview: bool,
    /// Narration audio reference; required unless `preview`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Background music reference; looped under the narration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
    /// Avatar bitmap reference (avatar mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_image: Option<String>,
    /// Background bitmap reference (avatar mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_background: Option<String>,
    /// Avatar placement.
    #[serde(default)]
    pub avatar_config: AvatarConfig,
    /// Watermark bitmap reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_image: Option<String>,
    /// Watermark placement.
    #[serde(default)]
    pub watermark_settings: WatermarkSettings,
    /// Caption font reference (TTF/OTF). System fonts are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_font: Option<String>,
    /// Per-scene duration used by silent previews.
    #[serde(default = "default_preview_secs")]
    pub preview_secs_per_scene: f64,
}

fn default_preview_secs() -> f64 {
    PREVIEW_SECS_PER_SCENE
}

impl RenderRequest {
    /// Full render of `content` narrated by `narration`.
    pub fn full(
        content: RenderableContent,
        settings: VideoSettings,
        narration: impl Into<String>,
    ) -> Self {
        Self {
            preview: false,
            narration: Some(narration.into()),
            ..Self::preview(content, settings)
        }
    }

    /// Silent preview of `content`.
    pub fn preview(content: RenderableContent, settings: VideoSettings) -> Self {
        Self {
            content,
            settings,
            mode: RenderMode::Slideshow,
            preview: true,
            narration: None,
            music: None,
            avatar_image: None,
            avatar_background: None,
            avatar_config: AvatarConfig::default(),
            watermark_image: None,
            watermark_settings: WatermarkSettings::default(),
            caption_font: None,
            preview_secs_per_scene: PREVIEW_SECS_PER_SCENE,
        }
    }

    /// Load a request from a JSON file.
    pub fn from_json_path(path: &Path) -> ReelcastResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("open render request '{}'", path.display()))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ReelcastError::validation(format!(
                "parse render request '{}': {e}",
                path.display()
            ))
        })
    }

    /// Validate the parts that do not need any decoding.
    pub fn validate(&self) -> ReelcastResult<()> {
        if self.content.scenes.is_empty() {
            return Err(ReelcastError::precondition("content has no scenes"));
        }
        if !self.preview && self.narration.as_deref().is_none_or(str::is_empty) {
            return Err(ReelcastError::precondition(
                "narration is required for a full render",
            ));
        }
        if self.preview
            && (!self.preview_secs_per_scene.is_finite() || self.preview_secs_per_scene <= 0.0)
        {
            return Err(ReelcastError::validation(
                "preview seconds per scene must be finite and > 0",
            ));
        }
        self.settings.fps()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/request.rs"]
mod tests;
