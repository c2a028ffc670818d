//! Error types shared across Photomark crates.

use std::path::PathBuf;

/// Top-level error type for Photomark operations.
#[derive(Debug, thiserror::Error)]
pub enum PhotomarkError {
    #[error("Unsupported format: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    #[error("Image decode error: {message}")]
    ImageDecode { message: String },

    #[error("Image processing error: {message}")]
    ImageProcessing { message: String },

    #[error("Export encode error: {message}")]
    ExportEncode { message: String },

    #[error("Preview render error: {message}")]
    CacheRender { message: String },

    #[error("Batch error for {file_name}: {message}")]
    BatchFile { file_name: String, message: String },

    #[error("Batch aborted: {message}")]
    BatchAbort { message: String },

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PhotomarkError.
pub type PhotomarkResult<T> = Result<T, PhotomarkError>;

impl PhotomarkError {
    pub fn unsupported_format(mime_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            mime_type: mime_type.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::ImageProcessing {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::ExportEncode {
            message: msg.into(),
        }
    }

    pub fn cache_render(msg: impl Into<String>) -> Self {
        Self::CacheRender {
            message: msg.into(),
        }
    }

    pub fn batch_file(file_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::BatchFile {
            file_name: file_name.into(),
            message: msg.into(),
        }
    }

    pub fn batch_abort(msg: impl Into<String>) -> Self {
        Self::BatchAbort {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Save-dialog dismissal and similar user choices are not failures.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }
}
