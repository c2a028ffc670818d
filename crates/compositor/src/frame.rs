//! Frame decoration.
//!
//! Every style returns a new, larger canvas with the source pasted inside
//! the border. Areas outside rounded corners or around a shadow are left
//! transparent; JPEG export flattens them onto white.

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;

use photomark_common::{PhotomarkError, PhotomarkResult};
use photomark_model::{FrameSettings, FrameStyle};

use crate::color::parse_color;
use crate::draw::{blend, blend_mask, fill_rounded_rect, mask_rounded_rect, rounded_rect_contains, PixelRect};

/// Minimum height of the film strip bands holding the sprocket holes.
pub const FILM_BAND_MIN: u32 = 24;
/// Polaroid caption band height as a multiple of the border width.
pub const POLAROID_BOTTOM_FACTOR: u32 = 4;

/// Largest canvas a frame may produce, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

pub const DEFAULT_SHADOW_BLUR: f32 = 10.0;
pub const DEFAULT_SHADOW_OFFSET: (f32, f32) = (5.0, 5.0);

const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
const FILM_BASE: Rgba<u8> = Rgba([24, 24, 24, 255]);
const FILM_HOLE: Rgba<u8> = Rgba([235, 235, 235, 255]);
const VINTAGE_PAPER: Rgba<u8> = Rgba([238, 226, 200, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Insets {
    top: u64,
    right: u64,
    bottom: u64,
    left: u64,
}

impl Insets {
    fn uniform(width: u32) -> Self {
        let width = u64::from(width);
        Self {
            top: width,
            right: width,
            bottom: width,
            left: width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shadow {
    blur: f32,
    dx: i32,
    dy: i32,
}

impl Shadow {
    /// Space needed around the frame so the blurred shadow is not cut off.
    fn margin(&self) -> u64 {
        let offset = self.dx.unsigned_abs().max(self.dy.unsigned_abs());
        ((self.blur * 3.0).ceil() as u64).saturating_add(u64::from(offset))
    }
}

/// Canvas dimensions, or an error when the canvas cannot be allocated or
/// addressed with `i32` coordinates.
fn canvas_size(width: u64, height: u64) -> PhotomarkResult<(u32, u32)> {
    let addressable = |v: u64| v <= i32::MAX as u64;
    if !addressable(width) || !addressable(height) || width.saturating_mul(height) > MAX_CANVAS_PIXELS {
        return Err(PhotomarkError::processing(format!(
            "Frame canvas of {width}x{height} is too large"
        )));
    }
    Ok((width as u32, height as u32))
}

/// Decorate `surface` according to `frame`.
pub fn apply_frame(surface: &RgbaImage, frame: &FrameSettings) -> PhotomarkResult<RgbaImage> {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotomarkError::processing(format!(
            "Cannot frame a {width}x{height} image"
        )));
    }
    if !frame.enabled {
        return Ok(surface.clone());
    }

    let frame = frame.normalized();
    let border = frame.width.round() as u32;
    let props = &frame.custom_properties;
    let radius = props.corner_radius.unwrap_or(0.0);

    let out = match frame.style {
        FrameStyle::Simple => {
            let color = parse_color(&frame.color, frame.opacity)?;
            bordered(surface, Insets::uniform(border), &[color], radius, None)?
        }
        FrameStyle::Shadow => {
            let color = parse_color(&frame.color, frame.opacity)?;
            let (dx, dy) = props
                .shadow_offset
                .map(|o| (o.x, o.y))
                .unwrap_or(DEFAULT_SHADOW_OFFSET);
            let shadow = Shadow {
                blur: props.shadow_blur.unwrap_or(DEFAULT_SHADOW_BLUR),
                dx: dx.round() as i32,
                dy: dy.round() as i32,
            };
            bordered(surface, Insets::uniform(border), &[color], radius, Some(shadow))?
        }
        FrameStyle::Film => film(surface, border)?,
        FrameStyle::Polaroid => {
            let color = parse_color(&frame.color, frame.opacity)?;
            let insets = Insets {
                bottom: u64::from(border) * u64::from(POLAROID_BOTTOM_FACTOR),
                ..Insets::uniform(border)
            };
            let shadow = props.shadow_blur.filter(|b| *b > 0.0).map(|blur| {
                let (dx, dy) = props.shadow_offset.map(|o| (o.x, o.y)).unwrap_or((0.0, 0.0));
                Shadow {
                    blur,
                    dx: dx.round() as i32,
                    dy: dy.round() as i32,
                }
            });
            bordered(surface, insets, &[color], radius, shadow)?
        }
        FrameStyle::Vintage => {
            let tint = parse_color(&frame.color, frame.opacity)?;
            bordered(surface, Insets::uniform(border), &[VINTAGE_PAPER, tint], radius, None)?
        }
    };

    tracing::debug!(
        style = ?frame.style,
        border,
        width = out.width(),
        height = out.height(),
        "Frame applied"
    );
    Ok(out)
}

/// Border built from `layers` painted in order, optional drop shadow, and
/// the source clipped to the frame's rounded outline.
fn bordered(
    surface: &RgbaImage,
    insets: Insets,
    layers: &[Rgba<u8>],
    radius: f32,
    shadow: Option<Shadow>,
) -> PhotomarkResult<RgbaImage> {
    let frame_w = u64::from(surface.width()) + insets.left + insets.right;
    let frame_h = u64::from(surface.height()) + insets.top + insets.bottom;
    let margin = shadow.map(|s| s.margin()).unwrap_or(0);

    let (canvas_w, canvas_h) = canvas_size(
        frame_w.saturating_add(margin.saturating_mul(2)),
        frame_h.saturating_add(margin.saturating_mul(2)),
    )?;
    // Everything below fits inside the canvas, so the narrowing casts hold.
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let outline = PixelRect::new(margin as i32, margin as i32, frame_w as u32, frame_h as u32);

    if let Some(shadow) = shadow {
        let mut mask = GrayImage::new(canvas.width(), canvas.height());
        let cast = PixelRect {
            x: outline.x.saturating_add(shadow.dx),
            y: outline.y.saturating_add(shadow.dy),
            ..outline
        };
        mask_rounded_rect(&mut mask, cast, radius);
        if shadow.blur > 0.0 {
            mask = gaussian_blur_f32(&mask, shadow.blur);
        }
        blend_mask(&mut canvas, &mask, SHADOW_COLOR);
    }

    for color in layers {
        fill_rounded_rect(&mut canvas, outline, radius, *color);
    }

    paste_clipped(
        &mut canvas,
        surface,
        outline.x + insets.left as i32,
        outline.y + insets.top as i32,
        outline,
        radius,
    );
    Ok(canvas)
}

fn paste_clipped(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    x: i32,
    y: i32,
    clip: PixelRect,
    radius: f32,
) {
    for (sx, sy, px) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;
        if dx < 0 || dy < 0 || dx >= dst.width() as i32 || dy >= dst.height() as i32 {
            continue;
        }
        if radius > 0.0 && !rounded_rect_contains(clip, radius, dx, dy) {
            continue;
        }
        blend(dst.get_pixel_mut(dx as u32, dy as u32), *px, 255);
    }
}

/// Dark film strip: side borders of `border`, top and bottom bands with a
/// row of sprocket holes each.
fn film(surface: &RgbaImage, border: u32) -> PhotomarkResult<RgbaImage> {
    let band = border.max(FILM_BAND_MIN);
    let (width, height) = canvas_size(
        u64::from(surface.width()) + 2 * u64::from(border),
        u64::from(surface.height()) + 2 * u64::from(band),
    )?;

    let mut canvas = RgbaImage::new(width, height);
    draw_filled_rect_mut(&mut canvas, Rect::at(0, 0).of_size(width, height), FILM_BASE);

    let hole_h = (band * 2 / 5).max(2);
    let hole_w = (hole_h * 3 / 2).max(2);
    let pitch = hole_w * 2;
    let hole_radius = hole_h as f32 / 5.0;
    let top_y = ((band - hole_h) / 2) as i32;
    let bottom_y = (band + surface.height() + (band - hole_h) / 2) as i32;

    let mut x = pitch / 2;
    while x + hole_w <= width {
        for y in [top_y, bottom_y] {
            fill_rounded_rect(
                &mut canvas,
                PixelRect::new(x as i32, y, hole_w, hole_h),
                hole_radius,
                FILM_HOLE,
            );
        }
        x += pitch;
    }

    paste_clipped(
        &mut canvas,
        surface,
        border as i32,
        band as i32,
        PixelRect::new(0, 0, width, height),
        0.0,
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomark_model::{FrameCustomProperties, ShadowOffset};

    fn red(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255]))
    }

    fn frame(style: FrameStyle) -> FrameSettings {
        FrameSettings {
            enabled: true,
            style,
            color: "#FFFFFF".into(),
            width: 10.0,
            opacity: 1.0,
            custom_properties: FrameCustomProperties::default(),
        }
    }

    #[test]
    fn test_disabled_returns_copy() {
        let img = red(20, 10);
        let out = apply_frame(&img, &FrameSettings::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_simple_border_geometry() {
        let out = apply_frame(&red(20, 10), &frame(FrameStyle::Simple)).unwrap();
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(29, 19), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(30, 20), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_rounded_corners_are_transparent() {
        let mut settings = frame(FrameStyle::Simple);
        settings.custom_properties.corner_radius = Some(8.0);
        let out = apply_frame(&red(20, 20), &settings).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(20, 0)[3], 255);
    }

    #[test]
    fn test_shadow_extends_canvas_and_darkens_offset_side() {
        let mut settings = frame(FrameStyle::Shadow);
        settings.custom_properties.shadow_blur = Some(2.0);
        settings.custom_properties.shadow_offset = Some(ShadowOffset { x: 4.0, y: 4.0 });
        let out = apply_frame(&red(20, 20), &settings).unwrap();

        // margin = ceil(2 * 3) + 4 = 10 on each side.
        assert_eq!(out.dimensions(), (60, 60));
        let below_right = out.get_pixel(52, 52)[3];
        let above_left = out.get_pixel(7, 7)[3];
        assert!(below_right > above_left);
    }

    #[test]
    fn test_film_has_holes_and_fixed_base() {
        let out = apply_frame(&red(100, 50), &frame(FrameStyle::Film)).unwrap();
        assert_eq!(out.dimensions(), (120, 50 + 2 * FILM_BAND_MIN));
        assert_eq!(*out.get_pixel(0, 0), FILM_BASE);
        assert!(out.pixels().any(|p| *p == FILM_HOLE));
        assert_eq!(*out.get_pixel(10, FILM_BAND_MIN), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_polaroid_bottom_band() {
        let out = apply_frame(&red(20, 20), &frame(FrameStyle::Polaroid)).unwrap();
        assert_eq!(out.dimensions(), (40, 20 + 10 + 40));
    }

    #[test]
    fn test_vintage_tint_over_paper() {
        let mut settings = frame(FrameStyle::Vintage);
        settings.color = "#000000".into();
        settings.opacity = 0.5;
        let out = apply_frame(&red(10, 10), &settings).unwrap();
        let px = out.get_pixel(0, 0);
        assert_eq!(px[3], 255);
        assert!(px[0] < VINTAGE_PAPER[0] && px[0] > 0);
    }

    #[test]
    fn test_zero_area_surface_fails() {
        assert!(apply_frame(&RgbaImage::new(0, 0), &frame(FrameStyle::Simple)).is_err());
    }

    #[test]
    fn test_oversized_frames_fail_instead_of_overflowing() {
        let mut polaroid = frame(FrameStyle::Polaroid);
        polaroid.width = 2e9;
        assert!(matches!(
            apply_frame(&red(20, 20), &polaroid),
            Err(PhotomarkError::ImageProcessing { .. })
        ));

        let mut shadow = frame(FrameStyle::Shadow);
        shadow.custom_properties.shadow_offset = Some(ShadowOffset { x: 3e9, y: 0.0 });
        assert!(matches!(
            apply_frame(&red(20, 20), &shadow),
            Err(PhotomarkError::ImageProcessing { .. })
        ));

        let mut film = frame(FrameStyle::Film);
        film.width = f32::MAX;
        assert!(apply_frame(&red(20, 20), &film).is_err());
    }
}
