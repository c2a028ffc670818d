//! Render through the preview cache, optionally checking that the backend
//! and local paths agree.

use std::path::PathBuf;
use std::sync::Arc;

use photomark_common::AppConfig;
use photomark_compositor::CompositingEngine;
use photomark_io::{load_source, ExifExtractor};
use photomark_preview::{
    BackendRenderer, EngineBackend, FallbackChain, LocalRenderer, PreviewCache, PreviewConfig,
    PreviewJob, PreviewRenderer,
};

use crate::SettingsArgs;

pub async fn run(
    config: &AppConfig,
    image: PathBuf,
    settings: SettingsArgs,
    output: Option<PathBuf>,
    verify: bool,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> anyhow::Result<()> {
    let (overlay, frame) = super::load_settings(&settings)?;
    let (source, metadata) = load_source(&image, &ExifExtractor)?;

    let mut preview_config = PreviewConfig::try_from(&config.preview)?;
    preview_config.render.max_width = max_width.or(preview_config.render.max_width);
    preview_config.render.max_height = max_height.or(preview_config.render.max_height);

    let engine = CompositingEngine::from_config(&config.assets);
    let cache = PreviewCache::new(
        Arc::new(FallbackChain::with_engine(engine.clone())),
        preview_config,
    );

    println!("Preview: {}", image.display());
    let first = cache
        .get_or_render(&metadata, &source, &overlay, &frame)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Preview render already in flight"))?;
    // Same inputs again: served from the cache.
    cache.get_or_render(&metadata, &source, &overlay, &frame).await?;

    let stats = cache.stats();
    println!(
        "  Surface: {}x{}, {} bytes ({})",
        first.surface.width(),
        first.surface.height(),
        first.bytes.len(),
        preview_config.render.format
    );
    println!(
        "  Cache: {} hit(s), {} miss(es), {} entr(ies)",
        stats.hits, stats.misses, stats.entries
    );

    if verify {
        let job = PreviewJob {
            metadata: metadata.clone(),
            file: source.clone(),
            overlay: overlay.clone(),
            frame: frame.clone(),
            options: preview_config.render,
        };
        let backend = BackendRenderer::new(Arc::new(EngineBackend::new(engine.clone())));
        let local = LocalRenderer::new(engine);
        let a = backend.render(&job).await?;
        let b = local.render(&job).await?;
        if a.bytes == b.bytes {
            println!("  [OK] Backend and local renders are byte-identical");
        } else {
            anyhow::bail!(
                "backend ({} bytes) and local ({} bytes) renders differ",
                a.bytes.len(),
                b.bytes.len()
            );
        }
    }

    if let Some(path) = output {
        std::fs::write(&path, &*first.bytes)?;
        println!("  Written: {}", path.display());
    }
    Ok(())
}
