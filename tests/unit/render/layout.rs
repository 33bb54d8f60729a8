use super::*;
use crate::model::settings::WatermarkPosition;

const LANDSCAPE: Canvas = Canvas {
    width: 1280,
    height: 720,
};
const PORTRAIT: Canvas = Canvas {
    width: 720,
    height: 1280,
};

#[test]
fn scene_index_uses_floor_and_clamps_to_last() {
    assert_eq!(scene_index_at(0.0, 12.0, 3), 0);
    assert_eq!(scene_index_at(3.999, 12.0, 3), 0);
    assert_eq!(scene_index_at(4.0, 12.0, 3), 1);
    assert_eq!(scene_index_at(5.0, 12.0, 3), 1);
    assert_eq!(scene_index_at(12.0 - 1e-9, 12.0, 3), 2);
    assert_eq!(scene_index_at(12.0, 12.0, 3), 2);
    assert_eq!(scene_index_at(99.0, 12.0, 3), 2);
    assert_eq!(scene_index_at(-1.0, 12.0, 3), 0);
    assert_eq!(scene_index_at(1.0, 12.0, 0), 0);
    assert_eq!(scene_index_at(f64::NAN, 12.0, 3), 0);
}

#[test]
fn scene_index_never_decreases() {
    let total = 17.5;
    let n = 7;
    let mut prev = 0;
    let mut t = 0.0;
    while t < total {
        let idx = scene_index_at(t, total, n);
        assert!(idx >= prev, "t={t}");
        assert!(idx < n);
        prev = idx;
        t += 0.01;
    }
    assert_eq!(scene_index_at(total - 1e-6, total, n), n - 1);
}

#[test]
fn cover_fit_always_covers_canvas() {
    for &(iw, ih) in &[(1, 1), (100, 50), (50, 100), (1920, 1080), (300, 3000), (7, 13)] {
        for canvas in [LANDSCAPE, PORTRAIT] {
            let r = cover_fit(canvas, iw, ih);
            assert!(r.x0 <= 1e-9 && r.y0 <= 1e-9, "{iw}x{ih} {r:?}");
            assert!(r.x1 >= canvas.w() - 1e-9 && r.y1 >= canvas.h() - 1e-9, "{iw}x{ih} {r:?}");
            assert!((r.x0 + r.x1 - canvas.w()).abs() < 1e-6);
            assert!((r.y0 + r.y1 - canvas.h()).abs() < 1e-6);
        }
    }
}

#[test]
fn cover_fit_crops_wide_image_horizontally() {
    let r = cover_fit(LANDSCAPE, 2000, 500);
    assert!((r.height() - 720.0).abs() < 1e-6);
    assert!((r.width() - 2880.0).abs() < 1e-6);
    assert!((r.x0 + 800.0).abs() < 1e-6);
}

#[test]
fn avatar_default_anchor_is_bottom_centre() {
    let r = avatar_rect(LANDSCAPE, 400, 800, &AvatarConfig::default());
    assert!((r.width() - 640.0).abs() < 1e-9);
    assert!((r.height() - 1280.0).abs() < 1e-9);
    assert!((r.x0 - 320.0).abs() < 1e-9);
    assert!((r.y0 - (720.0 - 1280.0 + 128.0)).abs() < 1e-9);

    let p = avatar_rect(PORTRAIT, 100, 100, &AvatarConfig::default());
    assert!((p.width() - 432.0).abs() < 1e-9);
}

#[test]
fn positive_y_raises_avatar_and_positive_x_moves_right() {
    let base = avatar_rect(LANDSCAPE, 100, 100, &AvatarConfig::default());
    let moved = avatar_rect(
        LANDSCAPE,
        100,
        100,
        &AvatarConfig {
            scale: 1.0,
            x: 10.0,
            y: 10.0,
        },
    );
    assert!((moved.x0 - (base.x0 + 128.0)).abs() < 1e-9);
    assert!((moved.y0 - (base.y0 - 72.0)).abs() < 1e-9);
}

#[test]
fn avatar_tolerates_out_of_range_and_nan_config() {
    let r = avatar_rect(
        LANDSCAPE,
        100,
        100,
        &AvatarConfig {
            scale: 5.0,
            x: -300.0,
            y: f64::NAN,
        },
    );
    assert!(r.x1 < 0.0);
    assert!(r.y0.is_finite());

    let zero = avatar_rect(
        LANDSCAPE,
        100,
        100,
        &AvatarConfig {
            scale: 0.0,
            x: 0.0,
            y: 0.0,
        },
    );
    assert_eq!(zero, avatar_rect(LANDSCAPE, 100, 100, &AvatarConfig::default()));
}

#[test]
fn watermark_bottom_right_on_720p() {
    let r = watermark_rect(LANDSCAPE, 200, 100, &WatermarkSettings::default());
    assert!((r.width() - 192.0).abs() < 1e-9);
    assert!((r.height() - 96.0).abs() < 1e-9);
    assert!((r.x0 - (1280.0 - 1280.0 * 0.15 - 20.0)).abs() < 1e-9);
    assert!((r.y0 - (720.0 - 96.0 - 20.0)).abs() < 1e-9);
}

#[test]
fn watermark_other_corners() {
    let mut s = WatermarkSettings::default();
    s.position = WatermarkPosition::TopLeft;
    let r = watermark_rect(LANDSCAPE, 100, 100, &s);
    assert_eq!((r.x0, r.y0), (20.0, 20.0));
    s.position = WatermarkPosition::TopRight;
    let r = watermark_rect(LANDSCAPE, 100, 100, &s);
    assert_eq!(r.y0, 20.0);
    assert!((r.x1 - 1260.0).abs() < 1e-9);
    s.position = WatermarkPosition::BottomLeft;
    let r = watermark_rect(LANDSCAPE, 100, 100, &s);
    assert_eq!(r.x0, 20.0);
    assert!((r.y1 - 700.0).abs() < 1e-9);
}

#[test]
fn caption_presets_follow_orientation() {
    let l = CaptionStyle::for_canvas(LANDSCAPE);
    assert_eq!(l.font_size, 48.0);
    assert_eq!(l.line_height, 60.0);
    assert_eq!(l.max_line_width(LANDSCAPE), 1120.0);
    assert!((l.anchor_y - 612.0).abs() < 1e-9);

    let p = CaptionStyle::for_canvas(PORTRAIT);
    assert_eq!(p.font_size, 32.0);
    assert_eq!(p.line_height, 45.0);
    assert_eq!(p.max_line_width(PORTRAIT), 640.0);
    assert!((p.anchor_y - 1024.0).abs() < 1e-9);
}
