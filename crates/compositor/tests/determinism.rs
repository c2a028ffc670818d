//! Identical inputs must encode to identical bytes.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use photomark_common::AssetConfig;
use photomark_compositor::{export_image, CompositingEngine, RenderRequest};
use photomark_model::{
    DisplayItems, ExifData, FrameCustomProperties, FrameSettings, FrameStyle, GpsCoordinates,
    LayoutMode, OutputFormat, OverlayPosition, OverlaySettings, PhotoMetadata, ShadowOffset,
};

fn source_jpeg() -> Arc<[u8]> {
    let img = RgbaImage::from_fn(320, 240, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    export_image(&img, OutputFormat::Jpeg, 0.9).unwrap().into()
}

fn metadata() -> PhotoMetadata {
    PhotoMetadata {
        file_name: "gradient.jpg".into(),
        exif: ExifData {
            make: Some("Canon".into()),
            model: Some("EOS R5".into()),
            f_number: Some(2.8),
            exposure_time: Some(1.0 / 125.0),
            iso: Some(200),
            date_time_original: Some("2024:06:01 09:15:00".into()),
            gps: Some(GpsCoordinates {
                latitude: 48.8584,
                longitude: 2.2945,
                altitude: None,
            }),
            ..ExifData::default()
        },
        ..PhotoMetadata::default()
    }
}

fn frame(style: FrameStyle) -> FrameSettings {
    FrameSettings {
        enabled: true,
        style,
        color: "#F0F0F0".into(),
        width: 12.0,
        opacity: 0.9,
        custom_properties: FrameCustomProperties {
            corner_radius: Some(6.0),
            shadow_blur: Some(3.0),
            shadow_offset: Some(ShadowOffset { x: 3.0, y: 4.0 }),
        },
    }
}

fn request(overlay: OverlaySettings, frame: FrameSettings, format: OutputFormat) -> RenderRequest {
    RenderRequest {
        source: source_jpeg(),
        metadata: metadata(),
        overlay,
        frame,
        format,
        quality: 0.85,
        max_width: None,
        max_height: None,
    }
}

fn assert_deterministic(engine: &CompositingEngine, req: &RenderRequest) {
    let a = engine.render(req).unwrap();
    let b = engine.render(req).unwrap();
    assert_eq!(a.bytes, b.bytes, "style {:?} format {}", req.frame.style, req.format);
    assert_eq!(a.surface, b.surface);
}

#[test]
fn every_frame_style_renders_identically_twice() {
    let engine = CompositingEngine::without_assets();
    let overlay = OverlaySettings {
        display_items: DisplayItems {
            location: true,
            ..DisplayItems::default()
        },
        ..OverlaySettings::default()
    };
    for style in FrameStyle::ALL {
        for format in [OutputFormat::Jpeg, OutputFormat::Png] {
            assert_deterministic(&engine, &request(overlay.clone(), frame(style), format));
        }
    }
}

#[test]
fn custom_layout_renders_identically_twice() {
    let engine = CompositingEngine::without_assets();
    let mut overlay = OverlaySettings {
        position: OverlayPosition::TopLeft,
        ..OverlaySettings::default()
    };
    overlay.switch_layout_mode(LayoutMode::Custom);
    if let Some(layout) = overlay.custom_layout.as_mut() {
        layout.snap_to_grid = true;
        layout.elements[0].position.x = 300.0;
    }
    assert_deterministic(
        &engine,
        &request(overlay, frame(FrameStyle::Simple), OutputFormat::Png),
    );
}

#[test]
fn separate_engines_agree() {
    // Two engines built from the same asset config produce the same bytes,
    // with real fonts when the machine has them.
    let a = CompositingEngine::from_config(&AssetConfig::default());
    let b = CompositingEngine::from_config(&AssetConfig::default());
    let req = request(
        OverlaySettings::default(),
        frame(FrameStyle::Polaroid),
        OutputFormat::Jpeg,
    );
    assert_eq!(a.render(&req).unwrap().bytes, b.render(&req).unwrap().bytes);
}

#[test]
fn settings_change_changes_output() {
    let engine = CompositingEngine::without_assets();
    let base = request(
        OverlaySettings::default(),
        FrameSettings::default(),
        OutputFormat::Png,
    );
    let mut moved = base.clone();
    moved.overlay.position = OverlayPosition::TopLeft;
    assert_ne!(
        engine.render(&base).unwrap().bytes,
        engine.render(&moved).unwrap().bytes
    );
}
