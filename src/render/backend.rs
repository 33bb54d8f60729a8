use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelcastError, ReelcastResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::caption::{MonospaceMeasure, TextMeasure};
use crate::render::compositor::{DrawOp, FramePlan};

/// A rendered frame as RGBA8 pixels.
///
/// Frames coming out of a surface are **premultiplied alpha**; the flag makes this explicit at
/// API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Transparent frame of `canvas` size.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.width as usize * canvas.height as usize * 4],
            premultiplied: true,
        }
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Opaque RGBA8 over black, the way a video encoder sees it.
    pub fn to_opaque_rgba8(&self) -> ReelcastResult<Vec<u8>> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(ReelcastError::render(format!(
                "frame buffer is {} bytes, expected {expected}",
                self.data.len()
            )));
        }
        let mut out = vec![0u8; expected];
        flatten_premul_over_bg(&mut out, &self.data, [0, 0, 0]);
        Ok(out)
    }
}

/// A drawing surface that executes [`FramePlan`]s.
///
/// The surface is exclusively owned by one render. Global alpha is the only state carried
/// between operations, and every plan the compositor emits leaves it at `1.0`.
pub trait RenderSurface {
    /// Canvas the surface draws into.
    fn canvas(&self) -> Canvas;

    /// Text measurer consistent with how this surface shapes caption text.
    fn measurer(&mut self) -> &mut dyn TextMeasure;

    /// Draw `plan` from a cleared surface and read the frame back.
    fn execute(&mut self, plan: &FramePlan) -> ReelcastResult<FrameRGBA>;

    /// Global alpha after the last executed operation.
    fn global_alpha(&self) -> f32;
}

/// Surface that tracks draw state without rasterising.
///
/// Frames come back transparent. Useful for driving the render loop when only timing, audio and
/// recorder behavior matter.
#[derive(Debug)]
pub struct HeadlessSurface {
    canvas: Canvas,
    measure: MonospaceMeasure,
    alpha: f32,
    plans_executed: u64,
    last_plan: Option<FramePlan>,
}

impl HeadlessSurface {
    /// Headless surface for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            measure: MonospaceMeasure::default(),
            alpha: 1.0,
            plans_executed: 0,
            last_plan: None,
        }
    }

    /// Number of plans executed so far.
    pub fn plans_executed(&self) -> u64 {
        self.plans_executed
    }

    /// Most recently executed plan.
    pub fn last_plan(&self) -> Option<&FramePlan> {
        self.last_plan.as_ref()
    }
}

impl RenderSurface for HeadlessSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn measurer(&mut self) -> &mut dyn TextMeasure {
        &mut self.measure
    }

    fn execute(&mut self, plan: &FramePlan) -> ReelcastResult<FrameRGBA> {
        if plan.canvas != self.canvas {
            return Err(ReelcastError::render("frame plan canvas does not match surface"));
        }
        for op in &plan.ops {
            if let DrawOp::SetAlpha(a) = op {
                self.alpha = *a;
            }
        }
        self.plans_executed += 1;
        self.last_plan = Some(plan.clone());
        Ok(FrameRGBA::transparent(self.canvas))
    }

    fn global_alpha(&self) -> f32 {
        self.alpha
    }
}

/// Available surface kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceKind {
    /// CPU raster surface powered by `vello_cpu`.
    #[default]
    Cpu,
    /// State-tracking surface that does not rasterise.
    Headless,
}

/// Create a drawing surface for `canvas`.
pub fn create_surface(
    kind: SurfaceKind,
    canvas: Canvas,
    caption_font: Option<&[u8]>,
) -> ReelcastResult<Box<dyn RenderSurface>> {
    match kind {
        SurfaceKind::Cpu => Ok(Box::new(crate::render::cpu::CpuSurface::new(
            canvas,
            caption_font,
        )?)),
        SurfaceKind::Headless => Ok(Box::new(HeadlessSurface::new(canvas))),
    }
}
