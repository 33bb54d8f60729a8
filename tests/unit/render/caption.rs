use super::*;

/// Every char is 10px wide regardless of size.
struct TenPx;

impl TextMeasure for TenPx {
    fn measure(&mut self, text: &str, _size_px: f32) -> f32 {
        text.chars().count() as f32 * 10.0
    }
}

const LANDSCAPE: Canvas = Canvas {
    width: 1280,
    height: 720,
};

#[test]
fn wrap_breaks_when_candidate_exceeds_width() {
    // "aaa bbb " is 80px; adding "ccc " makes 120px.
    let lines = wrap_words("aaa bbb ccc ddd", 100.0, 10.0, &mut TenPx);
    assert_eq!(lines, vec!["aaa bbb ", "ccc ddd "]);
}

#[test]
fn wrap_keeps_long_first_word_on_first_line() {
    let lines = wrap_words("supercalifragilistic is long", 50.0, 10.0, &mut TenPx);
    assert_eq!(lines[0], "supercalifragilistic ");
    assert_eq!(lines.len(), 3);
}

#[test]
fn wrap_of_empty_text_yields_one_line() {
    let lines = wrap_words("", 100.0, 10.0, &mut TenPx);
    assert_eq!(lines, vec![" "]);
}

#[test]
fn single_line_block_grows_up_from_anchor() {
    let block = layout_caption("hello world", LANDSCAPE, &mut TenPx);
    assert_eq!(block.font_size, 48.0);
    assert_eq!(block.lines.len(), 1);
    let top = 720.0 * 0.85 - 60.0;
    assert!((block.lines[0].center.y - (top + 30.0)).abs() < 1e-9);
    assert_eq!(block.lines[0].center.x, 640.0);
    assert_eq!(block.lines[0].text, "hello world");
    assert!((block.backing.y0 - (top - 30.0)).abs() < 1e-9);
    assert!((block.backing.height() - 120.0).abs() < 1e-9);
    assert_eq!(block.backing.x0, 0.0);
    assert_eq!(block.backing.x1, 1280.0);
}

#[test]
fn multi_line_block_stacks_lines_by_line_height() {
    // 1120px max width at 10px/char: 112 chars per line.
    let word = "x".repeat(60);
    let text = format!("{word} {word} {word}");
    let block = layout_caption(&text, LANDSCAPE, &mut TenPx);
    assert_eq!(block.lines.len(), 3);
    for pair in block.lines.windows(2) {
        assert!((pair[1].center.y - pair[0].center.y - 60.0).abs() < 1e-9);
    }
    let last = block.lines.last().unwrap();
    assert!(last.center.y < 720.0 * 0.85);
    assert!(block.backing.y1 > last.center.y);
}

#[test]
fn monospace_measure_scales_with_size() {
    let mut m = MonospaceMeasure::default();
    assert!((m.measure("abcd", 10.0) - 24.0).abs() < 1e-5);
    assert!((m.measure("abcd", 20.0) - 48.0).abs() < 1e-5);
}
