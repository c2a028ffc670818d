//! On-disk settings directory.
//!
//! Layout:
//! ```text
//! <root>/
//!   overlay.json
//!   frame.json
//! ```
//! Missing files load as defaults. Contents are passed through without
//! validation beyond what deserialization enforces.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::frame::FrameSettings;
use crate::overlay::OverlaySettings;

pub const OVERLAY_FILE: &str = "overlay.json";
pub const FRAME_FILE: &str = "frame.json";

/// Overlay and frame settings loaded from a directory.
#[derive(Debug, Clone)]
pub struct SettingsDir {
    pub root: PathBuf,
    pub overlay: OverlaySettings,
    pub frame: FrameSettings,
}

impl SettingsDir {
    /// Load both settings files, using defaults for any that are missing.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let root = root.as_ref().to_path_buf();
        let overlay = read_or_default(&root.join(OVERLAY_FILE))?;
        let frame = read_or_default(&root.join(FRAME_FILE))?;
        Ok(Self {
            root,
            overlay,
            frame,
        })
    }

    /// Write both settings files, creating the directory if needed.
    pub fn save(&self) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.root).map_err(|e| SettingsError::IoError {
            path: self.root.clone(),
            source: e,
        })?;
        write_json(&self.root.join(OVERLAY_FILE), &self.overlay)?;
        write_json(&self.root.join(FRAME_FILE), &self.frame)?;
        Ok(())
    }

    /// Create a directory holding default settings.
    pub fn create(root: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let dir = Self {
            root: root.as_ref().to_path_buf(),
            overlay: OverlaySettings::default(),
            frame: FrameSettings::default(),
        };
        dir.save()?;
        Ok(dir)
    }
}

pub fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, SettingsError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let json = std::fs::read_to_string(path).map_err(|e| SettingsError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| SettingsError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SettingsError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| SettingsError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur reading or writing settings files.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}
