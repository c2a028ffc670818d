//! Check fonts, logos and configuration.

use photomark_common::{config_file_path, AppConfig};
use photomark_compositor::FontAssets;
use photomark_io::{ExifExtractor, JsonSettingsStore, MetadataExtractor, SUPPORTED_MIME_TYPES};
use photomark_model::{FRAME_FILE, OVERLAY_FILE};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Photomark System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }

    let assets = FontAssets::load(&config.assets);
    if assets.has_font() {
        println!("[OK] Overlay font loaded");
    } else {
        println!("[WARN] No font found; overlay text will be skipped");
        println!("       Set assets.font_paths in the config file");
    }

    match &config.assets.logo_dir {
        Some(dir) if dir.is_dir() => println!("[OK] Logo directory: {}", dir.display()),
        Some(dir) => println!("[WARN] Logo directory missing: {}", dir.display()),
        None => println!("[INFO] No logo directory configured"),
    }

    let store = JsonSettingsStore::default_location();
    for file in [OVERLAY_FILE, FRAME_FILE] {
        let path = store.root().join(file);
        if path.exists() {
            println!("[OK] Settings: {}", path.display());
        } else {
            println!("[INFO] Settings: defaults ({} not found)", path.display());
        }
    }

    let extractor = ExifExtractor;
    let formats: Vec<&str> = SUPPORTED_MIME_TYPES
        .iter()
        .copied()
        .filter(|m| extractor.is_supported(m))
        .collect();
    println!("[OK] Input formats: {}", formats.join(", "));
    println!("[OK] Output formats: jpeg, png");

    println!();
    println!(
        "Preview cache: {} entries, {}ms debounce; batch: {} worker(s), {} retr(ies)",
        config.preview.max_cache_size,
        config.preview.debounce_ms,
        config.batch.concurrency,
        config.batch.retry_attempts
    );

    Ok(())
}
