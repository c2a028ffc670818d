//! EXIF extraction.

use std::io::Cursor;

use exif::{Exif, Field, In, Tag, Value};
use photomark_model::{ExifData, GpsCoordinates, SourceFile};

/// MIME types the pipeline can decode.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/tiff", "image/webp"];

/// Reads camera metadata from a source file.
///
/// Extraction never fails: files without readable EXIF yield an empty
/// [`ExifData`].
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, file: &SourceFile) -> ExifData;

    fn is_supported(&self, mime_type: &str) -> bool {
        SUPPORTED_MIME_TYPES.contains(&mime_type)
    }
}

/// [`MetadataExtractor`] backed by `kamadak-exif`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl MetadataExtractor for ExifExtractor {
    fn extract(&self, file: &SourceFile) -> ExifData {
        let mut cursor = Cursor::new(&file.bytes[..]);
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif_data_from(&exif),
            Err(e) => {
                tracing::debug!(file = %file.file_name, error = %e, "No EXIF data");
                ExifData::default()
            }
        }
    }
}

fn exif_data_from(exif: &Exif) -> ExifData {
    let field = |tag: Tag| exif.get_field(tag, In::PRIMARY);

    ExifData {
        make: field(Tag::Make).and_then(ascii),
        model: field(Tag::Model).and_then(ascii),
        lens_model: field(Tag::LensModel).and_then(ascii),
        f_number: field(Tag::FNumber).and_then(rational),
        exposure_time: field(Tag::ExposureTime).and_then(rational),
        iso: field(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
        focal_length: field(Tag::FocalLength).and_then(rational),
        date_time_original: field(Tag::DateTimeOriginal)
            .or_else(|| field(Tag::DateTime))
            .and_then(ascii),
        gps: gps(exif),
    }
}

fn ascii(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => {
            let raw = parts.first()?;
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn rational(field: &Field) -> Option<f64> {
    match &field.value {
        Value::Rational(values) => {
            let r = values.first()?;
            (r.denom != 0).then(|| r.num as f64 / r.denom as f64)
        }
        _ => None,
    }
}

fn gps(exif: &Exif) -> Option<GpsCoordinates> {
    let get = |tag: Tag| exif.get_field(tag, In::PRIMARY);

    let latitude = dms(get(Tag::GPSLatitude)?, get(Tag::GPSLatitudeRef)?)?;
    let longitude = dms(get(Tag::GPSLongitude)?, get(Tag::GPSLongitudeRef)?)?;
    let altitude = get(Tag::GPSAltitude).and_then(rational).map(|alt| {
        let below_sea = get(Tag::GPSAltitudeRef)
            .and_then(|f| f.value.get_uint(0))
            .is_some_and(|r| r == 1);
        if below_sea {
            -alt
        } else {
            alt
        }
    });

    Some(GpsCoordinates {
        latitude,
        longitude,
        altitude,
    })
}

/// Degrees/minutes/seconds plus a hemisphere reference to signed degrees.
fn dms(coord: &Field, reference: &Field) -> Option<f64> {
    let values = match &coord.value {
        Value::Rational(values) if values.len() >= 3 => values,
        _ => return None,
    };
    let part = |i: usize| {
        let r = &values[i];
        if r.denom == 0 {
            0.0
        } else {
            r.num as f64 / r.denom as f64
        }
    };
    let degrees = part(0) + part(1) / 60.0 + part(2) / 3600.0;

    match ascii(reference).as_deref() {
        Some("S") | Some("W") => Some(-degrees),
        _ => Some(degrees),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_image_bytes_yield_empty_exif() {
        let file = SourceFile::from_bytes("notes.txt", b"hello".to_vec(), 0);
        assert!(ExifExtractor.extract(&file).is_empty());
    }

    #[test]
    fn test_png_without_exif_yields_empty() {
        let img = image::RgbaImage::new(4, 4);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let file = SourceFile::from_bytes("blank.png", bytes, 0);
        assert!(ExifExtractor.extract(&file).is_empty());
    }

    #[test]
    fn test_supported_mime_types() {
        assert!(ExifExtractor.is_supported("image/jpeg"));
        assert!(ExifExtractor.is_supported("image/webp"));
        assert!(!ExifExtractor.is_supported("image/gif"));
        assert!(!ExifExtractor.is_supported("video/mp4"));
    }
}
