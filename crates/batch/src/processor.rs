//! Per-file work performed by batch workers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use photomark_common::{BatchDefaults, PhotomarkError, PhotomarkResult};
use photomark_compositor::{CompositingEngine, RenderRequest};
use photomark_io::{load_source, suggested_file_name, MetadataExtractor, SaveTarget};
use photomark_model::{FrameSettings, OutputFormat, OverlaySettings, PhotoMetadata};

/// Output of one successful file.
#[derive(Debug, Clone, Default)]
pub struct FileOutput {
    pub metadata: PhotoMetadata,
    pub blob: Vec<u8>,
    pub saved_path: Option<PathBuf>,
}

/// Processes a single file. Errors are per-file: the orchestrator records
/// them and moves on.
#[async_trait]
pub trait FileProcessor: Send + Sync {
    async fn process(
        &self,
        path: &Path,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<FileOutput>;
}

/// Loads the file, renders it through the compositing engine on the
/// blocking pool and optionally hands the blob to a save target.
pub struct EngineProcessor {
    engine: CompositingEngine,
    extractor: Arc<dyn MetadataExtractor>,
    format: OutputFormat,
    quality: f32,
    save: Option<Arc<dyn SaveTarget>>,
}

impl EngineProcessor {
    pub fn new(
        engine: CompositingEngine,
        extractor: Arc<dyn MetadataExtractor>,
        format: OutputFormat,
        quality: f32,
    ) -> Self {
        Self {
            engine,
            extractor,
            format,
            quality,
            save: None,
        }
    }

    pub fn from_defaults(
        engine: CompositingEngine,
        extractor: Arc<dyn MetadataExtractor>,
        defaults: &BatchDefaults,
    ) -> PhotomarkResult<Self> {
        let format = defaults
            .output_format
            .parse::<OutputFormat>()
            .map_err(PhotomarkError::config)?;
        Ok(Self::new(engine, extractor, format, defaults.quality))
    }

    pub fn with_save_target(mut self, target: Arc<dyn SaveTarget>) -> Self {
        self.save = Some(target);
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[async_trait]
impl FileProcessor for EngineProcessor {
    async fn process(
        &self,
        path: &Path,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<FileOutput> {
        let engine = self.engine.clone();
        let extractor = Arc::clone(&self.extractor);
        let path = path.to_path_buf();
        let overlay = overlay.clone();
        let frame = frame.clone();
        let format = self.format;
        let quality = self.quality;

        let (metadata, blob) = tokio::task::spawn_blocking(move || {
            let (source, metadata) = load_source(&path, extractor.as_ref())?;
            let out = engine.render(&RenderRequest {
                source: source.bytes,
                metadata: metadata.clone(),
                overlay,
                frame,
                format,
                quality,
                max_width: None,
                max_height: None,
            })?;
            Ok::<_, PhotomarkError>((metadata, out.bytes))
        })
        .await
        .map_err(|e| PhotomarkError::processing(format!("render task failed: {e}")))??;

        let saved_path = match &self.save {
            Some(target) => {
                let name = suggested_file_name(&metadata.file_name, self.format);
                let saved = target.save(&blob, &name).await?;
                if saved.is_none() {
                    tracing::info!(file = %metadata.file_name, "Save dismissed");
                }
                saved
            }
            None => None,
        };

        Ok(FileOutput {
            metadata,
            blob,
            saved_path,
        })
    }
}
