use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{Bitmap, MediaDecoder};
use crate::assets::source::{ResourceFetcher, abbreviate};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::model::request::RenderRequest;
use crate::model::settings::RenderMode;

/// A decoded image, or the marker left behind by an absent or failed one.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ImageSlot {
    /// Decoded and drawable.
    Ready(Bitmap),
    /// Absent, undecodable or zero-sized.
    #[default]
    Missing,
}

impl ImageSlot {
    /// Borrow the bitmap when ready.
    pub fn ready(&self) -> Option<&Bitmap> {
        match self {
            Self::Ready(b) => Some(b),
            Self::Missing => None,
        }
    }

    /// `true` for [`ImageSlot::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Which declared asset a load result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetRole {
    /// Image of the scene at this index.
    Scene(usize),
    /// Avatar layer.
    Avatar,
    /// Avatar-mode background layer.
    Background,
    /// Watermark overlay.
    Watermark,
    /// Caption font bytes.
    CaptionFont,
}

/// A non-fatal failure recorded while loading.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetFailure {
    /// Which asset failed.
    pub role: AssetRole,
    /// Abbreviated reference.
    pub reference: String,
    /// Error message.
    pub error: String,
}

/// Everything the compositor draws, decoded up front.
#[derive(Clone, Debug, Default)]
pub struct LoadedAssets {
    /// One slot per scene, in scene order (slideshow mode only; empty in avatar mode).
    pub scenes: Vec<ImageSlot>,
    /// Avatar layer.
    pub avatar: ImageSlot,
    /// Avatar-mode background.
    pub background: ImageSlot,
    /// Watermark overlay.
    pub watermark: ImageSlot,
    /// Caption font bytes; system fonts are used when `None`.
    pub caption_font: Option<Arc<Vec<u8>>>,
    /// Individual failures that degraded to placeholders.
    pub failures: Vec<AssetFailure>,
}

impl LoadedAssets {
    /// Reject the load when the selected mode has nothing it must draw.
    ///
    /// Slideshow mode always has a drawable fallback (the solid fill); avatar mode needs both its
    /// layers.
    pub fn require_for_mode(&self, mode: RenderMode) -> ReelcastResult<()> {
        match mode {
            RenderMode::Slideshow => Ok(()),
            RenderMode::Avatar => {
                let mut missing = Vec::new();
                if self.avatar.is_missing() {
                    missing.push("avatar image");
                }
                if self.background.is_missing() {
                    missing.push("background image");
                }
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(ReelcastError::precondition(format!(
                        "avatar mode requires a decodable {}",
                        missing.join(" and ")
                    )))
                }
            }
        }
    }
}

enum Loaded {
    Image(ImageSlot),
    Font(Option<Arc<Vec<u8>>>),
}

/// Resolves declared image references into drawable bitmaps before the render loop starts.
#[derive(Clone)]
pub struct AssetLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    decoder: Arc<dyn MediaDecoder>,
}

impl AssetLoader {
    /// Create a loader over a fetcher/decoder pair.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { fetcher, decoder }
    }

    /// Decode every asset `request` declares for its mode.
    ///
    /// Decodes run in parallel; nothing is returned until all of them have settled. Individual
    /// failures become [`ImageSlot::Missing`] and are listed in [`LoadedAssets::failures`].
    #[tracing::instrument(
        skip_all,
        fields(mode = ?request.mode, scenes = request.content.scenes.len())
    )]
    pub fn load(&self, request: &RenderRequest) -> LoadedAssets {
        let mut jobs: Vec<(AssetRole, Option<&str>)> = Vec::new();
        match request.mode {
            RenderMode::Slideshow => {
                for (i, scene) in request.content.scenes.iter().enumerate() {
                    jobs.push((AssetRole::Scene(i), scene.image_url.as_deref()));
                }
            }
            RenderMode::Avatar => {
                jobs.push((AssetRole::Avatar, request.avatar_image.as_deref()));
                jobs.push((AssetRole::Background, request.avatar_background.as_deref()));
            }
        }
        jobs.push((AssetRole::Watermark, request.watermark_image.as_deref()));
        jobs.push((AssetRole::CaptionFont, request.caption_font.as_deref()));

        let results: Vec<(AssetRole, Result<Loaded, AssetFailure>)> = jobs
            .par_iter()
            .map(|&(role, reference)| (role, self.load_one(role, reference)))
            .collect();

        let mut out = LoadedAssets::default();
        if request.mode == RenderMode::Slideshow {
            out.scenes = vec![ImageSlot::Missing; request.content.scenes.len()];
        }
        for (role, result) in results {
            let loaded = match result {
                Ok(loaded) => loaded,
                Err(failure) => {
                    tracing::warn!(
                        role = ?failure.role,
                        reference = %failure.reference,
                        error = %failure.error,
                        "asset failed to load; using placeholder"
                    );
                    out.failures.push(failure);
                    continue;
                }
            };
            match (role, loaded) {
                (AssetRole::Scene(i), Loaded::Image(slot)) => out.scenes[i] = slot,
                (AssetRole::Avatar, Loaded::Image(slot)) => out.avatar = slot,
                (AssetRole::Background, Loaded::Image(slot)) => out.background = slot,
                (AssetRole::Watermark, Loaded::Image(slot)) => out.watermark = slot,
                (AssetRole::CaptionFont, Loaded::Font(font)) => out.caption_font = font,
                _ => {}
            }
        }
        out
    }

    fn load_one(&self, role: AssetRole, reference: Option<&str>) -> Result<Loaded, AssetFailure> {
        let Some(reference) = reference.filter(|r| !r.is_empty()) else {
            return Ok(match role {
                AssetRole::CaptionFont => Loaded::Font(None),
                _ => Loaded::Image(ImageSlot::Missing),
            });
        };
        let fail = |e: ReelcastError| AssetFailure {
            role,
            reference: abbreviate(reference),
            error: e.to_string(),
        };

        let fetched = self.fetcher.fetch(reference).map_err(fail)?;
        if role == AssetRole::CaptionFont {
            return Ok(Loaded::Font(Some(Arc::new(fetched.bytes))));
        }
        let bitmap = self.decoder.decode_image(&fetched).map_err(fail)?;
        if bitmap.is_empty() {
            return Err(fail(ReelcastError::decode("image has zero width or height")));
        }
        Ok(Loaded::Image(ImageSlot::Ready(bitmap)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
