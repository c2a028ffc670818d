//! Metadata overlay drawing.

use image::{GrayImage, RgbaImage};

use photomark_common::{PhotomarkError, PhotomarkResult};
use photomark_model::{OverlaySettings, PhotoMetadata};

use crate::color::parse_color;
use crate::draw::{blend_mask, blit, mask_rounded_rect};
use crate::layout::{resolve_layout, FieldContent, ResolvedLayout};
use crate::text::FontAssets;

/// Draw the overlay described by `settings` onto a copy of `image`.
///
/// Panels are merged into one coverage mask before blending, so panels of
/// adjacent preset lines do not darken where they overlap. Fields whose
/// font or logo is unavailable keep their panel and skip the content.
pub fn apply_overlay(
    image: &RgbaImage,
    metadata: &PhotoMetadata,
    settings: &OverlaySettings,
    assets: &FontAssets,
) -> PhotomarkResult<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotomarkError::processing(format!(
            "Cannot draw overlay on a {width}x{height} image"
        )));
    }

    let settings = settings.normalized();
    let layout = resolve_layout(&settings, &metadata.exif, width, height, assets);
    let mut out = image.clone();
    if layout.is_empty() {
        return Ok(out);
    }

    draw_panels(&mut out, &layout, &settings)?;
    draw_contents(&mut out, &layout, assets)?;

    tracing::debug!(
        file = %metadata.file_name,
        fields = layout.fields.len(),
        mode = ?layout.mode,
        "Overlay applied"
    );
    Ok(out)
}

fn draw_panels(
    out: &mut RgbaImage,
    layout: &ResolvedLayout,
    settings: &OverlaySettings,
) -> PhotomarkResult<()> {
    let background = &settings.background;
    if background.opacity <= 0.0 {
        return Ok(());
    }
    let color = parse_color(&background.color, background.opacity)?;
    if color[3] == 0 {
        return Ok(());
    }

    let mut mask = GrayImage::new(out.width(), out.height());
    for field in &layout.fields {
        mask_rounded_rect(&mut mask, field.panel, background.border_radius);
    }
    blend_mask(out, &mask, color);
    Ok(())
}

fn draw_contents(
    out: &mut RgbaImage,
    layout: &ResolvedLayout,
    assets: &FontAssets,
) -> PhotomarkResult<()> {
    let mut warned_font = false;
    for field in &layout.fields {
        match &field.content {
            FieldContent::Text(text) => {
                let color = parse_color(&field.color, 1.0)?;
                let drawn = assets.draw_text(
                    out,
                    text,
                    field.bounds.x,
                    field.bounds.y,
                    field.font_size,
                    field.weight,
                    color,
                );
                if !drawn && !warned_font {
                    tracing::warn!("No font loaded; overlay text skipped");
                    warned_font = true;
                }
            }
            FieldContent::Logo(brand) => match assets.scaled_logo(brand, field.font_size) {
                Some(logo) => blit(out, &logo, field.bounds.x, field.bounds.y),
                None => tracing::warn!(brand = %brand, "Brand logo skipped"),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use photomark_model::{DisplayItem, DisplayItems, ExifData, OverlayPosition};

    fn metadata() -> PhotoMetadata {
        PhotoMetadata {
            file_name: "test.jpg".into(),
            exif: ExifData {
                make: Some("Canon".into()),
                model: Some("EOS R5".into()),
                ..ExifData::default()
            },
            ..PhotoMetadata::default()
        }
    }

    fn settings() -> OverlaySettings {
        OverlaySettings {
            position: OverlayPosition::BottomRight,
            display_items: DisplayItems::only(&[DisplayItem::Brand, DisplayItem::Model]),
            ..OverlaySettings::default()
        }
    }

    #[test]
    fn test_zero_area_is_processing_error() {
        let err = apply_overlay(
            &RgbaImage::new(0, 10),
            &metadata(),
            &settings(),
            &FontAssets::none(),
        )
        .unwrap_err();
        assert!(matches!(err, PhotomarkError::ImageProcessing { .. }));
    }

    #[test]
    fn test_input_is_not_mutated_and_panel_is_drawn() {
        let white = Rgba([255, 255, 255, 255]);
        let image = RgbaImage::from_pixel(400, 300, white);
        let out = apply_overlay(&image, &metadata(), &settings(), &FontAssets::none()).unwrap();

        assert!(image.pixels().all(|p| *p == white));
        // Bottom-right panel darkens the corner region, top-left untouched.
        assert_ne!(*out.get_pixel(385, 285), white);
        assert_eq!(*out.get_pixel(5, 5), white);
    }

    #[test]
    fn test_nothing_enabled_returns_copy() {
        let image = RgbaImage::from_pixel(50, 50, Rgba([1, 2, 3, 255]));
        let s = OverlaySettings {
            display_items: DisplayItems::NONE,
            ..OverlaySettings::default()
        };
        let out = apply_overlay(&image, &metadata(), &s, &FontAssets::none()).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_invalid_background_color_fails() {
        let mut s = settings();
        s.background.color = "not-a-color".into();
        let image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        assert!(apply_overlay(&image, &metadata(), &s, &FontAssets::none()).is_err());
    }
}
