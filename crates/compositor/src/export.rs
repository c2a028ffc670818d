//! Decoding, resizing and encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use photomark_common::{PhotomarkError, PhotomarkResult};
use photomark_model::OutputFormat;

/// Decode encoded bytes into an RGBA surface.
pub fn decode_image(bytes: &[u8]) -> PhotomarkResult<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| PhotomarkError::decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(PhotomarkError::decode("image has zero area"));
    }
    Ok(rgba)
}

/// Downscale to fit inside `max_width × max_height`, keeping aspect ratio.
/// Images that already fit are returned unchanged.
pub fn resize_to_fit(img: &RgbaImage, max_width: Option<u32>, max_height: Option<u32>) -> RgbaImage {
    let (w, h) = img.dimensions();
    let max_w = max_width.unwrap_or(w).max(1);
    let max_h = max_height.unwrap_or(h).max(1);
    if w <= max_w && h <= max_h {
        return img.clone();
    }

    let ratio = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let nw = ((w as f64 * ratio).round() as u32).clamp(1, max_w);
    let nh = ((h as f64 * ratio).round() as u32).clamp(1, max_h);
    image::imageops::resize(img, nw, nh, FilterType::Lanczos3)
}

/// Encoder quality for a `[0, 1]` quality: linear onto `1..=100`.
pub fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_nan() { 1.0 } else { quality.clamp(0.0, 1.0) };
    (1.0 + q * 99.0).round() as u8
}

/// PNG is lossless; quality selects the compression effort instead.
pub fn png_compression(quality: f32) -> CompressionType {
    let q = if quality.is_nan() { 0.5 } else { quality.clamp(0.0, 1.0) };
    if q < 1.0 / 3.0 {
        CompressionType::Fast
    } else if q < 2.0 / 3.0 {
        CompressionType::Default
    } else {
        CompressionType::Best
    }
}

/// Encode `surface` as `format`.
pub fn export_image(surface: &RgbaImage, format: OutputFormat, quality: f32) -> PhotomarkResult<Vec<u8>> {
    let (w, h) = surface.dimensions();
    if w == 0 || h == 0 {
        return Err(PhotomarkError::encode("cannot encode an empty surface"));
    }

    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten_on_white(surface);
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality))
                .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| PhotomarkError::encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut buf, png_compression(quality), PngFilter::Adaptive)
                .write_image(surface.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| PhotomarkError::encode(e.to_string()))?;
        }
    }
    Ok(buf)
}

/// Composite onto opaque white and drop alpha.
fn flatten_on_white(surface: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(surface.width(), surface.height(), |x, y| {
        let [r, g, b, a] = surface.get_pixel(x, y).0;
        let a = a as u32;
        let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 90, 255]))
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.92), 92);
        assert_eq!(jpeg_quality(5.0), 100);
        assert!(matches!(png_compression(0.1), CompressionType::Fast));
        assert!(matches!(png_compression(0.5), CompressionType::Default));
        assert!(matches!(png_compression(0.9), CompressionType::Best));
    }

    #[test]
    fn test_png_is_lossless() {
        let img = gradient(16, 9);
        let bytes = export_image(&img, OutputFormat::Png, 0.5).unwrap();
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn test_jpeg_flattens_alpha_on_white() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let bytes = export_image(&img, OutputFormat::Jpeg, 1.0).unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert!(decoded.pixels().all(|p| p[0] > 240 && p[3] == 255));
    }

    #[test]
    fn test_resize_to_fit_keeps_aspect() {
        let img = gradient(400, 200);
        let out = resize_to_fit(&img, Some(100), Some(100));
        assert_eq!(out.dimensions(), (100, 50));
        assert_eq!(resize_to_fit(&img, None, None).dimensions(), (400, 200));
        assert_eq!(resize_to_fit(&img, Some(800), Some(800)).dimensions(), (400, 200));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PhotomarkError::ImageDecode { .. }));
    }
}
