pub mod batch;
pub mod check;
pub mod info;
pub mod init;
pub mod preview;
pub mod render;

use std::path::Path;

use serde::de::DeserializeOwned;

use photomark_io::{JsonSettingsStore, SettingsStore};
use photomark_model::{FrameSettings, OverlaySettings};

use crate::SettingsArgs;

/// Resolve overlay and frame settings: explicit files win over the settings
/// directory, which defaults to the user config directory.
pub fn load_settings(args: &SettingsArgs) -> anyhow::Result<(OverlaySettings, FrameSettings)> {
    let store = match &args.settings {
        Some(dir) => JsonSettingsStore::new(dir),
        None => JsonSettingsStore::default_location(),
    };

    let overlay = match &args.overlay {
        Some(path) => read_json(path)?,
        None => store.load_overlay_settings()?,
    };
    let frame = match &args.frame {
        Some(path) => read_json(path)?,
        None => store.load_frame_settings()?,
    };

    tracing::debug!(
        store = %store.root().display(),
        layout = ?overlay.layout_mode,
        frame_enabled = frame.enabled,
        "Settings loaded"
    );
    Ok((overlay, frame))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid settings in {}: {e}", path.display()))
}
