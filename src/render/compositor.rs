//! Per-frame composition.
//!
//! [`compose_frame`] is a pure function from playback time and the resolved render inputs to an
//! ordered list of draw operations. Surfaces execute the list; nothing is carried from one
//! frame to the next.

use crate::assets::decode::Bitmap;
use crate::assets::loader::LoadedAssets;
use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use crate::foundation::error::ReelcastResult;
use crate::model::content::Scene;
use crate::model::request::RenderRequest;
use crate::model::settings::{AvatarConfig, RenderMode, WatermarkSettings};
use crate::render::backend::{FrameRGBA, RenderSurface};
use crate::render::caption::{TextMeasure, layout_caption};
use crate::render::layout::{
    CAPTION_BACKING, CAPTION_TEXT, SLIDESHOW_FILL, avatar_rect, cover_fit, scene_index_at,
    watermark_rect,
};

/// One drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill `rect` with a solid color.
    Fill {
        /// Target rectangle in canvas pixels.
        rect: Rect,
        /// Straight-alpha color.
        color: Rgba8,
    },
    /// Draw `bitmap` stretched into `dst`.
    Image {
        /// Source pixels.
        bitmap: Bitmap,
        /// Destination rectangle in canvas pixels, possibly extending past the canvas.
        dst: Rect,
    },
    /// Set the global alpha applied to subsequent operations.
    SetAlpha(f32),
    /// Draw one centred line of bold caption text.
    TextLine {
        /// Line text.
        text: String,
        /// Horizontal centre and vertical middle.
        center: Point,
        /// Font size in pixels.
        size_px: f32,
        /// Text color.
        color: Rgba8,
    },
}

/// Everything drawn for one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    /// Target canvas.
    pub canvas: Canvas,
    /// Scene whose caption (and, in slideshow mode, image) is shown.
    pub scene_index: usize,
    /// Operations in paint order.
    pub ops: Vec<DrawOp>,
}

/// Read-only inputs shared by every frame of one render.
#[derive(Clone, Copy, Debug)]
pub struct CompositorInput<'a> {
    /// Target canvas.
    pub canvas: Canvas,
    /// Slideshow or avatar.
    pub mode: RenderMode,
    /// Scenes in playback order.
    pub scenes: &'a [Scene],
    /// Decoded bitmaps.
    pub assets: &'a LoadedAssets,
    /// Avatar placement.
    pub avatar: AvatarConfig,
    /// Watermark placement.
    pub watermark: WatermarkSettings,
    /// Authoritative duration in seconds.
    pub total_duration: f64,
}

impl<'a> CompositorInput<'a> {
    /// Inputs for `request` with its decoded assets and timeline duration.
    pub fn from_request(
        request: &'a RenderRequest,
        assets: &'a LoadedAssets,
        total_duration: f64,
    ) -> Self {
        Self {
            canvas: request.settings.canvas(),
            mode: request.mode,
            scenes: &request.content.scenes,
            assets,
            avatar: request.avatar_config,
            watermark: request.watermark_settings,
            total_duration,
        }
    }
}

/// Plan the frame visible at `t` seconds.
///
/// Paint order is fixed: visuals, then the caption backing and text, then the watermark. The
/// watermark is wrapped in an alpha change that is always reset to `1.0`.
pub fn compose_frame(
    input: &CompositorInput<'_>,
    t: f64,
    measure: &mut dyn TextMeasure,
) -> FramePlan {
    let canvas = input.canvas;
    let scene_index = scene_index_at(t, input.total_duration, input.scenes.len());
    let mut ops = Vec::with_capacity(8);

    let avatar_layers = match input.mode {
        RenderMode::Avatar => input
            .assets
            .background
            .ready()
            .zip(input.assets.avatar.ready()),
        RenderMode::Slideshow => None,
    };

    if let Some((background, avatar)) = avatar_layers {
        ops.push(DrawOp::Image {
            bitmap: background.clone(),
            dst: cover_fit(canvas, background.width, background.height),
        });
        ops.push(DrawOp::Image {
            bitmap: avatar.clone(),
            dst: avatar_rect(canvas, avatar.width, avatar.height, &input.avatar),
        });
    } else {
        match input.assets.scenes.get(scene_index).and_then(|s| s.ready()) {
            Some(img) if img.width > 0 => ops.push(DrawOp::Image {
                bitmap: img.clone(),
                dst: cover_fit(canvas, img.width, img.height),
            }),
            _ => ops.push(DrawOp::Fill {
                rect: canvas.rect(),
                color: SLIDESHOW_FILL,
            }),
        }
    }

    if let Some(scene) = input.scenes.get(scene_index) {
        let block = layout_caption(&scene.text, canvas, measure);
        ops.push(DrawOp::Fill {
            rect: block.backing,
            color: CAPTION_BACKING,
        });
        for line in block.lines {
            ops.push(DrawOp::TextLine {
                text: line.text,
                center: line.center,
                size_px: block.font_size,
                color: CAPTION_TEXT,
            });
        }
    }

    if let Some(wm) = input.assets.watermark.ready().filter(|b| b.width > 0) {
        let opacity = if input.watermark.opacity.is_nan() {
            1.0
        } else {
            input.watermark.opacity.clamp(0.0, 1.0)
        };
        ops.push(DrawOp::SetAlpha(opacity));
        ops.push(DrawOp::Image {
            bitmap: wm.clone(),
            dst: watermark_rect(canvas, wm.width, wm.height, &input.watermark),
        });
        ops.push(DrawOp::SetAlpha(1.0));
    }

    FramePlan {
        canvas,
        scene_index,
        ops,
    }
}

/// Render the single frame visible at `t` seconds on `surface`.
pub fn render_still<S: RenderSurface + ?Sized>(
    surface: &mut S,
    input: &CompositorInput<'_>,
    t: f64,
) -> ReelcastResult<FrameRGBA> {
    let plan = compose_frame(input, t, surface.measurer());
    surface.execute(&plan)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
