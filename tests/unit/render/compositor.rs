use super::*;
use crate::assets::loader::ImageSlot;
use crate::render::backend::HeadlessSurface;
use crate::render::caption::MonospaceMeasure;

const CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};

fn scenes(n: usize) -> Vec<Scene> {
    (0..n)
        .map(|i| Scene::new(format!("s{i}"), format!("caption {i}")))
        .collect()
}

fn input<'a>(
    scenes: &'a [Scene],
    assets: &'a LoadedAssets,
    mode: RenderMode,
) -> CompositorInput<'a> {
    CompositorInput {
        canvas: CANVAS,
        mode,
        scenes,
        assets,
        avatar: AvatarConfig::default(),
        watermark: WatermarkSettings::default(),
        total_duration: 12.0,
    }
}

fn kinds(plan: &FramePlan) -> Vec<&'static str> {
    plan.ops
        .iter()
        .map(|op| match op {
            DrawOp::Fill { .. } => "fill",
            DrawOp::Image { .. } => "image",
            DrawOp::SetAlpha(_) => "alpha",
            DrawOp::TextLine { .. } => "text",
        })
        .collect()
}

#[test]
fn slideshow_frame_at_five_seconds_shows_second_scene() {
    let scenes = scenes(3);
    let mut assets = LoadedAssets::default();
    assets.scenes = vec![
        ImageSlot::Ready(Bitmap::solid(4, 4, [255, 0, 0, 255])),
        ImageSlot::Ready(Bitmap::solid(8, 2, [0, 255, 0, 255])),
        ImageSlot::Missing,
    ];
    let input = input(&scenes, &assets, RenderMode::Slideshow);
    let plan = compose_frame(&input, 5.0, &mut MonospaceMeasure::default());
    assert_eq!(plan.scene_index, 1);
    match &plan.ops[0] {
        DrawOp::Image { bitmap, dst } => {
            assert_eq!(bitmap.width, 8);
            assert!(dst.x0 <= 0.0 && dst.x1 >= 1280.0);
        }
        other => panic!("expected image, got {other:?}"),
    }
    assert!(
        plan.ops
            .iter()
            .any(|op| matches!(op, DrawOp::TextLine { text, .. } if text == "caption 1"))
    );
}

#[test]
fn missing_slideshow_image_falls_back_to_brand_fill() {
    let scenes = scenes(3);
    let mut assets = LoadedAssets::default();
    assets.scenes = vec![ImageSlot::Missing; 3];
    let input = input(&scenes, &assets, RenderMode::Slideshow);
    let plan = compose_frame(&input, 11.0, &mut MonospaceMeasure::default());
    assert_eq!(plan.scene_index, 2);
    assert_eq!(
        plan.ops[0],
        DrawOp::Fill {
            rect: CANVAS.rect(),
            color: SLIDESHOW_FILL
        }
    );
}

#[test]
fn paint_order_is_visuals_caption_watermark() {
    let scenes = scenes(1);
    let mut assets = LoadedAssets::default();
    assets.avatar = ImageSlot::Ready(Bitmap::solid(2, 4, [0, 0, 255, 255]));
    assets.background = ImageSlot::Ready(Bitmap::solid(16, 9, [9, 9, 9, 255]));
    assets.watermark = ImageSlot::Ready(Bitmap::solid(10, 5, [255, 255, 255, 255]));
    let input = input(&scenes, &assets, RenderMode::Avatar);
    let plan = compose_frame(&input, 0.5, &mut MonospaceMeasure::default());
    assert_eq!(
        kinds(&plan),
        vec!["image", "image", "fill", "text", "alpha", "image", "alpha"]
    );
    assert_eq!(plan.ops[4], DrawOp::SetAlpha(0.5));
    assert_eq!(plan.ops.last(), Some(&DrawOp::SetAlpha(1.0)));
}

#[test]
fn avatar_mode_without_layers_draws_fill() {
    let scenes = scenes(2);
    let mut assets = LoadedAssets::default();
    assets.avatar = ImageSlot::Ready(Bitmap::solid(2, 4, [0, 0, 255, 255]));
    let input = input(&scenes, &assets, RenderMode::Avatar);
    let plan = compose_frame(&input, 0.0, &mut MonospaceMeasure::default());
    assert!(matches!(plan.ops[0], DrawOp::Fill { color, .. } if color == SLIDESHOW_FILL));
}

#[test]
fn composing_is_repeatable() {
    let scenes = scenes(3);
    let mut assets = LoadedAssets::default();
    assets.scenes = vec![ImageSlot::Missing; 3];
    assets.watermark = ImageSlot::Ready(Bitmap::solid(10, 5, [255, 255, 255, 255]));
    let input = input(&scenes, &assets, RenderMode::Slideshow);
    let mut m = MonospaceMeasure::default();
    assert_eq!(compose_frame(&input, 7.0, &mut m), compose_frame(&input, 7.0, &mut m));
}

#[test]
fn watermark_opacity_is_clamped_and_reset() {
    let scenes = scenes(1);
    let mut assets = LoadedAssets::default();
    assets.watermark = ImageSlot::Ready(Bitmap::solid(10, 5, [255, 255, 255, 255]));
    let mut input = input(&scenes, &assets, RenderMode::Slideshow);
    input.watermark.opacity = 3.0;
    let mut surface = HeadlessSurface::new(CANVAS);
    render_still(&mut surface, &input, 0.0).unwrap();
    let plan = surface.last_plan().unwrap();
    assert!(plan.ops.contains(&DrawOp::SetAlpha(1.0)));
    assert!(!plan.ops.iter().any(|op| matches!(op, DrawOp::SetAlpha(a) if *a > 1.0)));
    assert_eq!(surface.global_alpha(), 1.0);
}
