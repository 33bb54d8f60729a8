use crate::assets::decode::Bitmap;
use crate::foundation::error::{ReelcastError, ReelcastResult};

const MAX_DIM: u32 = 16_384;

/// `true` when the bytes look like an SVG document rather than a raster format.
pub(crate) fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let t = text.trim_start_matches('\u{feff}').trim_start();
    t.starts_with("<svg") || (t.starts_with("<?xml") && t.contains("<svg"))
}

/// Parse and rasterize an SVG at its intrinsic size into premultiplied RGBA8.
pub(crate) fn rasterize_svg(bytes: &[u8]) -> ReelcastResult<Bitmap> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| ReelcastError::decode(format!("parse svg tree: {e}")))?;

    fn to_px(v: f32) -> ReelcastResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ReelcastError::decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(ReelcastError::decode(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ReelcastError::decode("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    Ok(Bitmap::from_premul_rgba8(width, height, pixmap.data().to_vec()))
}
