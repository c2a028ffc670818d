//! Settings persistence.

use std::path::{Path, PathBuf};

use photomark_common::{PhotomarkError, PhotomarkResult};
use photomark_model::{
    read_or_default, write_json, FrameSettings, OverlaySettings, SettingsError, FRAME_FILE,
    OVERLAY_FILE,
};

/// Loads and saves the two settings objects. Values pass through
/// unvalidated; callers normalize before rendering.
pub trait SettingsStore: Send + Sync {
    fn load_overlay_settings(&self) -> PhotomarkResult<OverlaySettings>;
    fn save_overlay_settings(&self, settings: &OverlaySettings) -> PhotomarkResult<()>;
    fn load_frame_settings(&self) -> PhotomarkResult<FrameSettings>;
    fn save_frame_settings(&self, settings: &FrameSettings) -> PhotomarkResult<()>;
}

/// [`SettingsStore`] over a directory of JSON files.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    root: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the user config directory.
    pub fn default_location() -> Self {
        let config = photomark_common::config_file_path();
        let root = config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write<T: serde::Serialize>(&self, file: &str, value: &T) -> PhotomarkResult<()> {
        std::fs::create_dir_all(&self.root)?;
        write_json(&self.root.join(file), value).map_err(settings_error)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load_overlay_settings(&self) -> PhotomarkResult<OverlaySettings> {
        read_or_default(&self.root.join(OVERLAY_FILE)).map_err(settings_error)
    }

    fn save_overlay_settings(&self, settings: &OverlaySettings) -> PhotomarkResult<()> {
        self.write(OVERLAY_FILE, settings)
    }

    fn load_frame_settings(&self) -> PhotomarkResult<FrameSettings> {
        read_or_default(&self.root.join(FRAME_FILE)).map_err(settings_error)
    }

    fn save_frame_settings(&self, settings: &FrameSettings) -> PhotomarkResult<()> {
        self.write(FRAME_FILE, settings)
    }
}

fn settings_error(e: SettingsError) -> PhotomarkError {
    match e {
        SettingsError::IoError { source, .. } => PhotomarkError::Io(source),
        SettingsError::ParseError { .. } => PhotomarkError::config(e.to_string()),
    }
}
