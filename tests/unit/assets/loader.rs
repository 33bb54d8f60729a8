use std::io::Cursor;

use super::*;
use crate::assets::decode::NativeDecoder;
use crate::assets::source::{LocalFetcher, to_data_url};
use crate::model::content::{RenderableContent, Scene};
use crate::model::settings::VideoSettings;

fn png_url(w: u32, h: u32) -> String {
    let img = image::RgbaImage::from_fn(w, h, |_, _| image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    to_data_url("image/png", &buf)
}

fn loader() -> AssetLoader {
    AssetLoader::new(Arc::new(LocalFetcher::default()), Arc::new(NativeDecoder))
}

#[test]
fn slideshow_failures_degrade_to_missing_slots() {
    let content = RenderableContent::new(
        "t",
        vec![
            Scene::new("a", "one").with_image(png_url(4, 2)),
            Scene::new("b", "two"),
            Scene::new("c", "three").with_image("data:image/png;base64,AAAA"),
        ],
    );
    let req = RenderRequest::preview(content, VideoSettings::default());
    let assets = loader().load(&req);

    assert_eq!(assets.scenes.len(), 3);
    assert_eq!(assets.scenes[0].ready().map(|b| b.width), Some(4));
    assert!(assets.scenes[1].is_missing());
    assert!(assets.scenes[2].is_missing());
    assert_eq!(assets.failures.len(), 1);
    assert_eq!(assets.failures[0].role, AssetRole::Scene(2));
    assert!(assets.watermark.is_missing());
    assert!(assets.caption_font.is_none());
    assets.require_for_mode(RenderMode::Slideshow).unwrap();
}

#[test]
fn avatar_mode_needs_both_layers() {
    let content = RenderableContent::new("t", vec![Scene::new("a", "one")]);
    let mut req = RenderRequest::preview(content, VideoSettings::default());
    req.mode = RenderMode::Avatar;
    req.avatar_image = Some(png_url(2, 4));

    let assets = loader().load(&req);
    assert!(assets.scenes.is_empty());
    assert!(assets.avatar.ready().is_some());
    let err = assets.require_for_mode(RenderMode::Avatar).unwrap_err();
    assert!(err.is_precondition());
    assert!(err.to_string().contains("background image"));

    req.avatar_background = Some(png_url(8, 8));
    let assets = loader().load(&req);
    assets.require_for_mode(RenderMode::Avatar).unwrap();
}

#[test]
fn caption_font_bytes_are_passed_through() {
    let content = RenderableContent::new("t", vec![Scene::new("a", "one")]);
    let mut req = RenderRequest::preview(content, VideoSettings::default());
    req.caption_font = Some(to_data_url("font/ttf", &[0, 1, 0, 0]));
    req.watermark_image = Some(png_url(5, 5));
    let assets = loader().load(&req);
    assert_eq!(assets.caption_font.as_deref().map(|v| v.len()), Some(4));
    assert!(assets.watermark.ready().is_some());
}
