use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::Bitmap;
use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::render::backend::{FrameRGBA, RenderSurface};
use crate::render::caption::TextMeasure;
use crate::render::compositor::{DrawOp, FramePlan};

const LAYOUT_CACHE_CAP: usize = 1024;
const FALLBACK_FONT_STACK: &str = "sans-serif";

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrush([u8; 4]);

/// Stateful helper for shaping bold caption lines with Parley.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    cache: HashMap<(String, u32), Arc<parley::Layout<TextBrush>>>,
}

impl TextLayoutEngine {
    fn new(font_bytes: Option<&[u8]>) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let family = match font_bytes {
            Some(bytes) => registered_family(&mut font_ctx, bytes).unwrap_or_else(|| {
                tracing::warn!("caption font could not be registered; using system fonts");
                FALLBACK_FONT_STACK.to_string()
            }),
            None => FALLBACK_FONT_STACK.to_string(),
        };
        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            cache: HashMap::new(),
        }
    }

    fn layout(&mut self, text: &str, size_px: f32) -> Arc<parley::Layout<TextBrush>> {
        let key = (text.to_string(), size_px.to_bits());
        if let Some(layout) = self.cache.get(&key) {
            return Arc::clone(layout);
        }
        if self.cache.len() >= LAYOUT_CACHE_CAP {
            self.cache.clear();
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush([
            255, 255, 255, 255,
        ])));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);

        let layout = Arc::new(layout);
        self.cache.insert(key, Arc::clone(&layout));
        layout
    }

    fn advance(&mut self, text: &str, size_px: f32) -> f32 {
        if text.is_empty() || !size_px.is_finite() || size_px <= 0.0 {
            return 0.0;
        }
        self.layout(text, size_px)
            .lines()
            .map(|l| l.metrics().advance)
            .fold(0.0, f32::max)
    }
}

fn registered_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> Option<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families.first().map(|(id, _)| *id)?;
    font_ctx
        .collection
        .family_name(family_id)
        .map(str::to_string)
}

#[derive(Clone)]
struct ImagePaint {
    // Keeps the source allocation alive so its address stays a valid cache key.
    _source: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

/// CPU raster surface powered by `vello_cpu`, with Parley-shaped captions.
pub struct CpuSurface {
    canvas: Canvas,
    width: u16,
    height: u16,
    ctx: Option<vello_cpu::RenderContext>,
    alpha: f32,
    text: TextLayoutEngine,
    image_cache: HashMap<usize, ImagePaint>,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("canvas", &self.canvas)
            .field("alpha", &self.alpha)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    /// Surface for `canvas`, shaping captions with `caption_font` or system fonts when `None`.
    pub fn new(canvas: Canvas, caption_font: Option<&[u8]>) -> ReelcastResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelcastError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelcastError::validation("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ReelcastError::validation("canvas must be non-empty"));
        }
        Ok(Self {
            canvas,
            width,
            height,
            ctx: None,
            alpha: 1.0,
            text: TextLayoutEngine::new(caption_font),
            image_cache: HashMap::new(),
            font_cache: HashMap::new(),
        })
    }

    fn image_paint_for(&mut self, bitmap: &Bitmap) -> ReelcastResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&bitmap.rgba8_premul) as usize;
        if let Some(p) = self.image_cache.get(&key) {
            return Ok(p.paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&bitmap.rgba8_premul, bitmap.width, bitmap.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(
            key,
            ImagePaint {
                _source: Arc::clone(&bitmap.rgba8_premul),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    fn font_for_run(
        &mut self,
        blob_id: u64,
        index: u32,
        bytes: &[u8],
    ) -> vello_cpu::peniko::FontData {
        self.font_cache
            .entry((blob_id, index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.to_vec()),
                    index,
                )
            })
            .clone()
    }

    fn with_opacity(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) {
        let opacity = self.alpha.clamp(0.0, 1.0);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        draw(ctx);
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }

    fn draw_op(&mut self, ctx: &mut vello_cpu::RenderContext, op: &DrawOp) -> ReelcastResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match op {
            DrawOp::SetAlpha(a) => {
                self.alpha = *a;
            }
            DrawOp::Fill { rect, color } => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(color_to_cpu(*color));
                self.with_opacity(ctx, |ctx| ctx.fill_rect(&rect_to_cpu(*rect)));
            }
            DrawOp::Image { bitmap, dst } => {
                if bitmap.is_empty() || dst.width() <= 0.0 || dst.height() <= 0.0 {
                    return Ok(());
                }
                let paint = self.image_paint_for(bitmap)?;
                let (iw, ih) = (f64::from(bitmap.width), f64::from(bitmap.height));
                let tr = Affine::translate((dst.x0, dst.y0))
                    * Affine::scale_non_uniform(dst.width() / iw, dst.height() / ih);
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(paint);
                self.with_opacity(ctx, |ctx| {
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih))
                });
            }
            DrawOp::TextLine {
                text,
                center,
                size_px,
                color,
            } => {
                if text.is_empty() {
                    return Ok(());
                }
                self.draw_text_line(ctx, text, *center, *size_px, *color);
            }
        }
        Ok(())
    }

    fn draw_text_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        center: Point,
        size_px: f32,
        color: Rgba8,
    ) {
        let layout = self.text.layout(text, size_px);
        let Some(line) = layout.lines().next() else {
            return;
        };
        let m = line.metrics();
        // Middle baseline: centre the ascent/descent box on `center.y`.
        let dx = center.x - f64::from(m.advance) / 2.0;
        let dy = center.y - f64::from(m.baseline) + f64::from(m.ascent - m.descent) / 2.0;
        ctx.set_transform(affine_to_cpu(Affine::translate((dx, dy))));

        let opacity = self.alpha.clamp(0.0, 1.0);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let run_font = run.run().font();
                let font =
                    self.font_for_run(run_font.data.id(), run_font.index, run_font.data.data());
                ctx.set_paint(color_to_cpu(color));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }
}

impl TextMeasure for CpuSurface {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        self.text.advance(text, size_px)
    }
}

impl RenderSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn measurer(&mut self) -> &mut dyn TextMeasure {
        self
    }

    fn execute(&mut self, plan: &FramePlan) -> ReelcastResult<FrameRGBA> {
        if plan.canvas != self.canvas {
            return Err(ReelcastError::render(format!(
                "frame plan canvas {}x{} does not match surface {}x{}",
                plan.canvas.width, plan.canvas.height, self.canvas.width, self.canvas.height
            )));
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();

        let drawn = plan.ops.iter().try_for_each(|op| self.draw_op(&mut ctx, op));
        if let Err(e) = drawn {
            self.ctx = Some(ctx);
            return Err(e);
        }

        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn global_alpha(&self) -> f32 {
        self.alpha
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ReelcastResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelcastError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelcastError::render("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(ReelcastError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
