use crate::foundation::core::{Canvas, Point, Rect};
use crate::render::layout::CaptionStyle;

/// Measures the advance width of a run of caption text.
///
/// Drawing surfaces implement this with their real shaper; [`MonospaceMeasure`] is a
/// shaper-free stand-in.
pub trait TextMeasure {
    /// Width in pixels of `text` set in the bold caption face at `size_px`.
    fn measure(&mut self, text: &str, size_px: f32) -> f32;
}

/// Fixed advance per character, in ems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Advance of each `char` as a fraction of the font size.
    pub advance_em: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * self.advance_em * size_px
    }
}

/// Greedy word wrap.
///
/// Each candidate line is the current line plus the next word and a trailing space. A word
/// moves to a new line when the candidate is wider than `max_width`, except for the very first
/// word, which always stays on the first line however wide it is. Returned lines keep their
/// trailing space; callers trim when drawing.
pub fn wrap_words(
    text: &str,
    max_width: f64,
    size_px: f32,
    measure: &mut dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for (n, word) in text.split(' ').enumerate() {
        let candidate = format!("{line}{word} ");
        let width = f64::from(measure.measure(&candidate, size_px));
        if width > max_width && n > 0 {
            lines.push(std::mem::take(&mut line));
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// One caption line, centred on `center`.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
    /// Trimmed line text.
    pub text: String,
    /// Horizontal centre and vertical middle of the line.
    pub center: Point,
}

/// Laid-out caption: the backing rectangle and the lines drawn over it.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionBlock {
    /// Semi-transparent backing, full canvas width.
    pub backing: Rect,
    /// Lines in top-to-bottom order.
    pub lines: Vec<CaptionLine>,
    /// Font size in pixels.
    pub font_size: f32,
}

/// Wrap and position `text` for `canvas`.
///
/// The block hangs from the style anchor when the anchor is in the top half of the canvas and
/// grows upward from it otherwise. A block that grows upward gets its backing raised by half a
/// line.
pub fn layout_caption(text: &str, canvas: Canvas, measure: &mut dyn TextMeasure) -> CaptionBlock {
    let style = CaptionStyle::for_canvas(canvas);
    let wrapped = wrap_words(text, style.max_line_width(canvas), style.font_size, measure);

    let total_height = wrapped.len() as f64 * style.line_height;
    let grows_up = style.anchor_y > canvas.h() / 2.0;
    let top = if grows_up {
        style.anchor_y - total_height
    } else {
        style.anchor_y
    };

    let backing_y = if grows_up {
        top - style.line_height / 2.0
    } else {
        top
    };
    let backing = Rect::new(
        0.0,
        backing_y,
        canvas.w(),
        backing_y + total_height + style.line_height,
    );

    let cx = canvas.w() / 2.0;
    let lines = wrapped
        .iter()
        .enumerate()
        .map(|(i, l)| CaptionLine {
            text: l.trim().to_string(),
            center: Point::new(
                cx,
                top + i as f64 * style.line_height + style.line_height / 2.0,
            ),
        })
        .collect();

    CaptionBlock {
        backing,
        lines,
        font_size: style.font_size,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/caption.rs"]
mod tests;
