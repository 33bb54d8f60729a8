use super::*;

const CANVAS: Canvas = Canvas {
    width: 64,
    height: 36,
};

fn plan(ops: Vec<DrawOp>) -> FramePlan {
    FramePlan {
        canvas: CANVAS,
        scene_index: 0,
        ops,
    }
}

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Bitmap {
    Bitmap::solid(w, h, rgba)
}

#[test]
fn cover_fit_image_leaves_no_unfilled_edge_pixels() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    for (iw, ih) in [(4, 2), (2, 4), (3, 3), (100, 7)] {
        let dst = crate::render::layout::cover_fit(CANVAS, iw, ih);
        let frame = s
            .execute(&plan(vec![DrawOp::Image {
                bitmap: solid(iw, ih, [200, 10, 10, 255]),
                dst,
            }]))
            .unwrap();
        for x in 0..CANVAS.width {
            assert_eq!(frame.pixel(x, 0).unwrap()[3], 255, "{iw}x{ih} top x={x}");
            let bottom = frame.pixel(x, CANVAS.height - 1).unwrap();
            assert_eq!(bottom[3], 255, "{iw}x{ih} bottom x={x}");
        }
        for y in 0..CANVAS.height {
            assert_eq!(frame.pixel(0, y).unwrap()[3], 255, "{iw}x{ih} left y={y}");
            assert_eq!(frame.pixel(CANVAS.width - 1, y).unwrap()[3], 255, "{iw}x{ih} right y={y}");
        }
    }
}

#[test]
fn watermark_alpha_does_not_leak_into_next_frame() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    let wm = Rect::new(40.0, 20.0, 60.0, 30.0);
    let first = s
        .execute(&plan(vec![
            DrawOp::Fill {
                rect: CANVAS.rect(),
                color: Rgba8::rgb(0, 0, 0),
            },
            DrawOp::SetAlpha(0.5),
            DrawOp::Image {
                bitmap: solid(2, 1, [255, 255, 255, 255]),
                dst: wm,
            },
            DrawOp::SetAlpha(1.0),
        ]))
        .unwrap();
    let px = first.pixel(50, 25).unwrap();
    assert!(px[0] > 100 && px[0] < 155, "half-opaque watermark, got {px:?}");
    assert_eq!(s.global_alpha(), 1.0);

    let second = s
        .execute(&plan(vec![DrawOp::Fill {
            rect: CANVAS.rect(),
            color: Rgba8::rgb(255, 255, 255),
        }]))
        .unwrap();
    assert_eq!(second.pixel(10, 10).unwrap(), [255, 255, 255, 255]);
}

#[test]
fn translucent_backing_keeps_partial_alpha() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    let frame = s
        .execute(&plan(vec![DrawOp::Fill {
            rect: CANVAS.rect(),
            color: crate::render::layout::CAPTION_BACKING,
        }]))
        .unwrap();
    let a = frame.pixel(5, 5).unwrap()[3];
    assert!((150..=156).contains(&a), "alpha {a}");
    let opaque = frame.to_opaque_rgba8().unwrap();
    assert_eq!(opaque[3], 255);
}

#[test]
fn frames_start_cleared() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    s.execute(&plan(vec![DrawOp::Fill {
        rect: CANVAS.rect(),
        color: Rgba8::rgb(255, 0, 0),
    }]))
    .unwrap();
    let empty = s.execute(&plan(Vec::new())).unwrap();
    assert!(empty.data.iter().all(|&b| b == 0));
}

#[test]
fn mismatched_plan_canvas_is_rejected() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    let mut p = plan(Vec::new());
    p.canvas = Canvas {
        width: 10,
        height: 10,
    };
    assert!(s.execute(&p).is_err());
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(
        CpuSurface::new(
            Canvas {
                width: 70_000,
                height: 10
            },
            None
        )
        .is_err()
    );
}

#[test]
fn measuring_is_monotonic_in_text_length() {
    let mut s = CpuSurface::new(CANVAS, None).unwrap();
    assert_eq!(s.measure("", 48.0), 0.0);
    let short = s.measure("ab ", 48.0);
    let long = s.measure("ab cd ", 48.0);
    assert!(long >= short);
    assert!(s.measure("ab cd ", 96.0) >= long);
}
