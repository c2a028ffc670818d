//! Render one photo and save it.

use std::path::PathBuf;

use photomark_common::AppConfig;
use photomark_compositor::{CompositingEngine, RenderRequest};
use photomark_io::{
    load_source, save_or_cancel, suggested_file_name, DirectorySaveTarget, ExifExtractor,
};
use photomark_model::OutputFormat;

use crate::SettingsArgs;

pub async fn run(
    config: &AppConfig,
    image: PathBuf,
    settings: SettingsArgs,
    output: Option<PathBuf>,
    format: Option<String>,
    quality: Option<f32>,
) -> anyhow::Result<()> {
    let (overlay, frame) = super::load_settings(&settings)?;

    let format = match format {
        Some(f) => f.parse::<OutputFormat>().map_err(|e| anyhow::anyhow!(e))?,
        None => output
            .as_ref()
            .and_then(|o| o.extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default(),
    };
    let quality = quality.unwrap_or(config.batch.quality);

    println!("Rendering: {}", image.display());
    let (source, metadata) = load_source(&image, &ExifExtractor)?;
    let engine = CompositingEngine::from_config(&config.assets);

    let request = RenderRequest {
        source: source.bytes,
        metadata: metadata.clone(),
        overlay,
        frame,
        format,
        quality,
        max_width: None,
        max_height: None,
    };
    let out = tokio::task::spawn_blocking(move || engine.render(&request)).await??;

    let saved = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &out.bytes)?;
            path
        }
        None => {
            let dir = image
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = suggested_file_name(&metadata.file_name, format);
            save_or_cancel(&DirectorySaveTarget::new(dir), &out.bytes, &name).await?
        }
    };

    println!(
        "  Output: {} ({}x{}, {} bytes, {format})",
        saved.display(),
        out.surface.width(),
        out.surface.height(),
        out.bytes.len()
    );
    Ok(())
}
