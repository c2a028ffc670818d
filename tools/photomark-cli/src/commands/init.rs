//! Write default settings files.

use std::path::PathBuf;

use photomark_common::{config_file_path, AppConfig};
use photomark_model::{SettingsDir, FRAME_FILE, OVERLAY_FILE};

pub fn run(config: &AppConfig, dir: PathBuf, with_config: bool) -> anyhow::Result<()> {
    println!("Creating settings at {}", dir.display());

    let settings =
        SettingsDir::create(&dir).map_err(|e| anyhow::anyhow!("Failed to create settings: {e}"))?;

    println!("Settings created:");
    println!("  {}/", settings.root.display());
    println!("  ├── {OVERLAY_FILE}   (layout, font, background, fields)");
    println!("  └── {FRAME_FILE}     (style, color, width, opacity)");

    if with_config {
        let path = config_file_path();
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            config.save()?;
            println!("Config written: {}", path.display());
        }
    }

    println!();
    println!("Use with: photomark render <IMAGE> --settings {}", dir.display());
    Ok(())
}
