//! Source loading: bytes, MIME detection, dimensions and content hash.

use std::io::Cursor;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use photomark_common::{sha256_hex, PhotomarkError, PhotomarkResult};
use photomark_model::{Dimensions, PhotoMetadata, SourceFile};

use crate::extract::MetadataExtractor;

/// Read a file from disk and describe it.
pub fn load_source(
    path: &Path,
    extractor: &dyn MetadataExtractor,
) -> PhotomarkResult<(SourceFile, PhotoMetadata)> {
    let fs_meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PhotomarkError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PhotomarkError::Io(e),
    })?;
    let bytes = std::fs::read(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let modified = fs_meta.modified().ok();
    let last_modified_ms = modified.map(system_time_ms).unwrap_or(0);

    let source = SourceFile::from_bytes(file_name, bytes, last_modified_ms).with_path(path);
    let mut metadata = describe_source(&source, extractor)?;
    metadata.created_at = fs_meta.created().ok().map(rfc3339).unwrap_or_default();

    tracing::debug!(
        file = %source.file_name,
        mime = %metadata.mime_type,
        width = metadata.dimensions.width,
        height = metadata.dimensions.height,
        "Loaded source"
    );
    Ok((source, metadata))
}

/// Build the metadata record for an in-memory source.
pub fn describe_source(
    source: &SourceFile,
    extractor: &dyn MetadataExtractor,
) -> PhotomarkResult<PhotoMetadata> {
    let mime_type = detect_mime(&source.bytes)?;
    if !extractor.is_supported(mime_type) {
        return Err(PhotomarkError::unsupported_format(mime_type));
    }

    let (width, height) = image::ImageReader::new(Cursor::new(&source.bytes[..]))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| PhotomarkError::decode(format!("{}: {e}", source.file_name)))?;

    Ok(PhotoMetadata {
        file_name: source.file_name.clone(),
        file_path: source
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        file_size: source.size,
        dimensions: Dimensions::new(width, height),
        exif: extractor.extract(source),
        created_at: String::new(),
        modified_at: DateTime::<Utc>::from_timestamp_millis(source.last_modified_ms)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        mime_type: mime_type.to_string(),
        hash: content_hash(&source.bytes, source.size, source.last_modified_ms),
    })
}

/// MIME type sniffed from magic bytes.
pub fn detect_mime(bytes: &[u8]) -> PhotomarkResult<&'static str> {
    let format = image::guess_format(bytes)
        .map_err(|_| PhotomarkError::unsupported_format("application/octet-stream"))?;
    Ok(format.to_mime_type())
}

/// Hex SHA-256 over `bytes ‖ size ‖ mtime`.
pub fn content_hash(bytes: &[u8], size: u64, last_modified_ms: i64) -> String {
    sha256_hex([
        bytes,
        &size.to_le_bytes()[..],
        &last_modified_ms.to_le_bytes()[..],
    ])
}

fn system_time_ms(t: SystemTime) -> i64 {
    DateTime::<Utc>::from(t).timestamp_millis()
}

fn rfc3339(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExifExtractor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = content_hash(b"abc", 3, 1000);
        assert_eq!(a, content_hash(b"abc", 3, 1000));
        assert_ne!(a, content_hash(b"abd", 3, 1000));
        assert_ne!(a, content_hash(b"abc", 4, 1000));
        assert_ne!(a, content_hash(b"abc", 3, 1001));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_describe_in_memory_png() {
        let source = SourceFile::from_bytes("tile.png", png_bytes(32, 16), 1_700_000_000_000);
        let meta = describe_source(&source, &ExifExtractor).unwrap();
        assert_eq!(meta.mime_type, "image/png");
        assert_eq!(meta.dimensions, Dimensions::new(32, 16));
        assert_eq!(meta.file_size, source.size);
        assert!(meta.modified_at.starts_with("2023-11-14"));
    }

    #[test]
    fn test_unknown_bytes_are_unsupported() {
        let source = SourceFile::from_bytes("notes.txt", b"plain text".to_vec(), 0);
        let err = describe_source(&source, &ExifExtractor).unwrap_err();
        assert!(matches!(err, PhotomarkError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_gif_is_rejected_by_extractor() {
        let img = image::RgbaImage::new(2, 2);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Gif)
            .unwrap();
        let source = SourceFile::from_bytes("anim.gif", bytes, 0);
        let err = describe_source(&source, &ExifExtractor).unwrap_err();
        assert!(matches!(err, PhotomarkError::UnsupportedFormat { ref mime_type } if mime_type == "image/gif"));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("photomark_does_not_exist.jpg");
        let err = load_source(&path, &ExifExtractor).unwrap_err();
        assert!(matches!(err, PhotomarkError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("photomark_load_{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(8, 8)).unwrap();
        let (source, meta) = load_source(&path, &ExifExtractor).unwrap();
        assert_eq!(source.path.as_deref(), Some(path.as_path()));
        assert_eq!(meta.file_path, path.display().to_string());
        assert_eq!(meta.hash, content_hash(&source.bytes, source.size, source.last_modified_ms));
        std::fs::remove_file(&path).ok();
    }
}
