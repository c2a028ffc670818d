//! Per-photo metadata and the source byte buffer every pipeline stage reads.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Immutable per-file record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub dimensions: Dimensions,
    pub exif: ExifData,

    /// Creation time (RFC 3339), empty when unknown.
    pub created_at: String,

    /// Last modification time (RFC 3339).
    pub modified_at: String,

    pub mime_type: String,

    /// Content hash over bytes, size and modification time (hex SHA-256).
    pub hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Camera and shooting data. Every field is optional; an empty record is
/// what extraction yields for files without EXIF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,

    /// Aperture as an f-number (e.g. 2.8).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_number: Option<f64>,

    /// Exposure time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// Focal length in millimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,

    /// Capture time as stored by the camera (`YYYY:MM:DD HH:MM:SS`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinates>,
}

/// Decimal-degree coordinates; south and west are negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A photo's identity plus its immutable encoded bytes.
#[derive(Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub path: Option<PathBuf>,
    pub size: u64,

    /// Modification time in milliseconds since the Unix epoch.
    pub last_modified_ms: i64,

    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Wrap in-memory bytes that have no backing file.
    pub fn from_bytes(
        file_name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        last_modified_ms: i64,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            file_name: file_name.into(),
            path: None,
            size: bytes.len() as u64,
            last_modified_ms,
            bytes,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("file_name", &self.file_name)
            .field("path", &self.path)
            .field("size", &self.size)
            .field("last_modified_ms", &self.last_modified_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_exif_serializes_to_empty_object() {
        let json = serde_json::to_string(&ExifData::default()).unwrap();
        assert_eq!(json, "{}");
        let parsed: ExifData = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_metadata_json_is_camel_case() {
        let meta = PhotoMetadata {
            file_name: "a.jpg".into(),
            exif: ExifData {
                f_number: Some(2.8),
                ..ExifData::default()
            },
            ..PhotoMetadata::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["fileName"], "a.jpg");
        assert_eq!(json["exif"]["fNumber"], 2.8);
    }

    #[test]
    fn test_source_from_bytes_records_size() {
        let source = SourceFile::from_bytes("x.png", vec![1u8, 2, 3], 42);
        assert_eq!(source.size, 3);
        assert!(source.path.is_none());
        assert!(format!("{source:?}").contains("x.png"));
    }
}
