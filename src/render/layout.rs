//! Frame geometry: scene timing, cover-fit, avatar anchoring, watermark corners and caption
//! presets. Everything here is pure arithmetic on canvas and image sizes.

use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::model::settings::{AvatarConfig, WatermarkSettings};

/// Solid fill drawn in place of a missing slideshow image.
pub const SLIDESHOW_FILL: Rgba8 = Rgba8::rgb(0x0f, 0x76, 0x6e);
/// Caption backing color (black at 60% alpha).
pub const CAPTION_BACKING: Rgba8 = Rgba8::rgba(0, 0, 0, 153);
/// Caption text color.
pub const CAPTION_TEXT: Rgba8 = Rgba8::WHITE;
/// Gap between the watermark and its canvas corner, in pixels.
pub const WATERMARK_PADDING: f64 = 20.0;

const AVATAR_BASE_SCALE_PORTRAIT: f64 = 0.6;
const AVATAR_BASE_SCALE_LANDSCAPE: f64 = 0.5;
const AVATAR_BOTTOM_OVERHANG: f64 = 0.1;

/// Index of the scene visible at `t` seconds.
///
/// Scenes split `total_duration` evenly. Boundaries belong to the later scene and the result is
/// clamped to the last scene, so `t >= total_duration` keeps showing it.
pub fn scene_index_at(t: f64, total_duration: f64, scene_count: usize) -> usize {
    if scene_count == 0 {
        return 0;
    }
    let last = scene_count - 1;
    if t.is_nan() || total_duration.is_nan() || total_duration <= 0.0 {
        return 0;
    }
    let scene_duration = total_duration / scene_count as f64;
    let idx = (t.max(0.0) / scene_duration).floor();
    if idx >= last as f64 {
        last
    } else {
        idx as usize
    }
}

/// Destination rectangle that scales an `img_w`×`img_h` image to cover `canvas`, centred.
///
/// The rectangle always contains the full canvas; overflow on one axis is cropped by the
/// surface.
pub fn cover_fit(canvas: Canvas, img_w: u32, img_h: u32) -> Rect {
    let (iw, ih) = (f64::from(img_w.max(1)), f64::from(img_h.max(1)));
    let ratio = (canvas.w() / iw).max(canvas.h() / ih);
    let (w, h) = (iw * ratio, ih * ratio);
    let x = (canvas.w() - w) / 2.0;
    let y = (canvas.h() - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Where the avatar lands for `config`.
///
/// Default anchor is bottom-centre with the lower 10% of the avatar below the canvas edge.
/// `config.x` shifts right by a percentage of canvas width; `config.y` shifts *up* by a
/// percentage of canvas height. Out-of-range values are not clamped.
pub fn avatar_rect(canvas: Canvas, img_w: u32, img_h: u32, config: &AvatarConfig) -> Rect {
    let base = if canvas.is_portrait() {
        AVATAR_BASE_SCALE_PORTRAIT
    } else {
        AVATAR_BASE_SCALE_LANDSCAPE
    };
    let scale = base * config.effective_scale();
    let av_w = canvas.w() * scale;
    let av_h = av_w * f64::from(img_h) / f64::from(img_w.max(1));

    let base_x = (canvas.w() - av_w) / 2.0;
    let base_y = canvas.h() - av_h + AVATAR_BOTTOM_OVERHANG * av_h;
    let (off_x, off_y) = config.effective_offsets();

    let x = base_x + off_x / 100.0 * canvas.w();
    let y = base_y - off_y / 100.0 * canvas.h();
    Rect::new(x, y, x + av_w, y + av_h)
}

/// Where the watermark lands: `size` of the canvas width wide, aspect preserved, in its corner.
pub fn watermark_rect(
    canvas: Canvas,
    img_w: u32,
    img_h: u32,
    settings: &WatermarkSettings,
) -> Rect {
    let wm_w = canvas.w() * settings.size;
    let wm_h = wm_w * f64::from(img_h) / f64::from(img_w.max(1));
    let pos = settings.position;

    let x = if pos.is_right() {
        canvas.w() - wm_w - WATERMARK_PADDING
    } else {
        WATERMARK_PADDING
    };
    let y = if pos.is_bottom() {
        canvas.h() - wm_h - WATERMARK_PADDING
    } else {
        WATERMARK_PADDING
    };
    Rect::new(x, y, x + wm_w, y + wm_h)
}

/// Caption sizing preset, chosen by canvas orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionStyle {
    /// Font size in pixels (bold).
    pub font_size: f32,
    /// Distance between line centres.
    pub line_height: f64,
    /// Horizontal padding on each side of the wrap width.
    pub side_padding: f64,
    /// Vertical anchor of the caption block.
    pub anchor_y: f64,
}

impl CaptionStyle {
    /// Preset for `canvas`.
    pub fn for_canvas(canvas: Canvas) -> Self {
        if canvas.is_portrait() {
            Self {
                font_size: 32.0,
                line_height: 45.0,
                side_padding: 40.0,
                anchor_y: canvas.h() * 0.8,
            }
        } else {
            Self {
                font_size: 48.0,
                line_height: 60.0,
                side_padding: 80.0,
                anchor_y: canvas.h() * 0.85,
            }
        }
    }

    /// Maximum measured line width.
    pub fn max_line_width(&self, canvas: Canvas) -> f64 {
        canvas.w() - self.side_padding * 2.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
