//! Pixel primitives.
//!
//! All blending is integer source-over so that two runs over the same input
//! produce the same bytes on every path.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Axis-aligned rectangle in image pixels. May extend past the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow by `by` pixels on every side.
    pub fn inflate(&self, by: u32) -> Self {
        Self {
            x: self.x - by as i32,
            y: self.y - by as i32,
            width: self.width + 2 * by,
            height: self.height + 2 * by,
        }
    }

    /// Whether any part lies inside a `width × height` image.
    pub fn intersects_image(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self.right() > 0
            && self.bottom() > 0
            && self.x < width as i32
            && self.y < height as i32
    }

    /// Pixel range `[x0, x1) × [y0, y1)` clipped to the image.
    fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if !self.intersects_image(width, height) {
            return None;
        }
        let x0 = self.x.max(0) as u32;
        let y0 = self.y.max(0) as u32;
        let x1 = (self.right().min(width as i32)) as u32;
        let y1 = (self.bottom().min(height as i32)) as u32;
        Some((x0, y0, x1, y1))
    }
}

#[inline]
fn mul_div255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

/// Source-over `src` onto `dst`, with `src` alpha scaled by `coverage`.
pub fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: u8) {
    let a = mul_div255(src[3] as u32, coverage as u32);
    if a == 0 {
        return;
    }
    if a == 255 {
        *dst = Rgba([src[0], src[1], src[2], 255]);
        return;
    }

    let inv = 255 - a;
    let da = dst[3] as u32;
    // Output alpha scaled by 255, kept exact until the final division.
    let out_a255 = a * 255 + da * inv;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let num = src[c] as u32 * a * 255 + dst[c] as u32 * da * inv;
        out[c] = ((num + out_a255 / 2) / out_a255) as u8;
    }
    out[3] = ((out_a255 + 127) / 255) as u8;
    *dst = Rgba(out);
}

/// Whether the center of pixel `(px, py)` lies inside `rect` with corners
/// rounded by `radius`.
pub fn rounded_rect_contains(rect: PixelRect, radius: f32, px: i32, py: i32) -> bool {
    let cx = px as f32 + 0.5;
    let cy = py as f32 + 0.5;
    let left = rect.x as f32;
    let top = rect.y as f32;
    let right = rect.right() as f32;
    let bottom = rect.bottom() as f32;
    if cx < left || cx >= right || cy < top || cy >= bottom {
        return false;
    }

    let r = radius
        .min(rect.width as f32 / 2.0)
        .min(rect.height as f32 / 2.0)
        .max(0.0);
    if r <= 0.0 {
        return true;
    }
    let qx = cx.clamp(left + r, right - r);
    let qy = cy.clamp(top + r, bottom - r);
    let (dx, dy) = (cx - qx, cy - qy);
    dx * dx + dy * dy <= r * r
}

/// Blend `color` over every pixel of a (possibly rounded) rectangle.
pub fn fill_rounded_rect(img: &mut RgbaImage, rect: PixelRect, radius: f32, color: Rgba<u8>) {
    let Some((x0, y0, x1, y1)) = rect.clip(img.width(), img.height()) else {
        return;
    };
    if radius <= 0.0 && color[3] == 255 {
        draw_filled_rect_mut(
            img,
            Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
            color,
        );
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            if rounded_rect_contains(rect, radius, x as i32, y as i32) {
                blend(img.get_pixel_mut(x, y), color, 255);
            }
        }
    }
}

/// Mark a (possibly rounded) rectangle in a coverage mask.
pub fn mask_rounded_rect(mask: &mut GrayImage, rect: PixelRect, radius: f32) {
    let Some((x0, y0, x1, y1)) = rect.clip(mask.width(), mask.height()) else {
        return;
    };
    if radius <= 0.0 {
        draw_filled_rect_mut(
            mask,
            Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
            Luma([255]),
        );
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            if rounded_rect_contains(rect, radius, x as i32, y as i32) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
}

/// Blend `color` through a coverage mask of the same size as `img`.
pub fn blend_mask(img: &mut RgbaImage, mask: &GrayImage, color: Rgba<u8>) {
    for (x, y, coverage) in mask.enumerate_pixels() {
        if coverage[0] > 0 {
            blend(img.get_pixel_mut(x, y), color, coverage[0]);
        }
    }
}

/// Blend `src` onto `dst` with its top-left at `(x, y)`, clipped.
pub fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let area = PixelRect::new(x, y, src.width(), src.height());
    let Some((x0, y0, x1, y1)) = area.clip(dst.width(), dst.height()) else {
        return;
    };
    for dy in y0..y1 {
        for dx in x0..x1 {
            let sx = (dx as i32 - x) as u32;
            let sy = (dy as i32 - y) as u32;
            blend(dst.get_pixel_mut(dx, dy), *src.get_pixel(sx, sy), 255);
        }
    }
}
