//! Compositing engine: the full decode → overlay → frame → encode pipeline.

use std::sync::Arc;

use image::RgbaImage;

use photomark_common::{AssetConfig, PhotomarkResult, RunClock};
use photomark_model::{FrameSettings, OutputFormat, OverlaySettings, PhotoMetadata};

use crate::export::{decode_image, export_image, resize_to_fit};
use crate::text::FontAssets;

/// Everything needed to render one image.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Encoded source bytes.
    pub source: Arc<[u8]>,
    pub metadata: PhotoMetadata,
    pub overlay: OverlaySettings,
    pub frame: FrameSettings,
    pub format: OutputFormat,
    pub quality: f32,

    /// Optional bounding box applied before compositing.
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Result of a render: the encoded blob and the surface it was encoded from.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub surface: Arc<RgbaImage>,
}

/// Stateless apart from its immutable assets; cheap to clone and share
/// across threads.
#[derive(Debug, Clone)]
pub struct CompositingEngine {
    assets: Arc<FontAssets>,
}

impl CompositingEngine {
    pub fn new(assets: FontAssets) -> Self {
        Self {
            assets: Arc::new(assets),
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(FontAssets::load(config))
    }

    /// Engine without fonts or logos; text fields get panels only.
    pub fn without_assets() -> Self {
        Self::new(FontAssets::none())
    }

    pub fn assets(&self) -> &FontAssets {
        &self.assets
    }

    pub fn apply_overlay(
        &self,
        image: &RgbaImage,
        metadata: &PhotoMetadata,
        settings: &OverlaySettings,
    ) -> PhotomarkResult<RgbaImage> {
        crate::overlay::apply_overlay(image, metadata, settings, &self.assets)
    }

    pub fn apply_frame(
        &self,
        surface: &RgbaImage,
        settings: &FrameSettings,
    ) -> PhotomarkResult<RgbaImage> {
        crate::frame::apply_frame(surface, settings)
    }

    pub fn export_image(
        &self,
        surface: &RgbaImage,
        format: OutputFormat,
        quality: f32,
    ) -> PhotomarkResult<Vec<u8>> {
        export_image(surface, format, quality)
    }

    /// Run the whole pipeline. Blocking; call from a blocking context.
    pub fn render(&self, request: &RenderRequest) -> PhotomarkResult<RenderOutput> {
        let clock = RunClock::start();

        let decoded = decode_image(&request.source)?;
        let sized = resize_to_fit(&decoded, request.max_width, request.max_height);
        let overlaid = self.apply_overlay(&sized, &request.metadata, &request.overlay)?;
        let framed = self.apply_frame(&overlaid, &request.frame)?;
        let bytes = self.export_image(&framed, request.format, request.quality)?;

        tracing::debug!(
            file = %request.metadata.file_name,
            format = %request.format,
            width = framed.width(),
            height = framed.height(),
            bytes = bytes.len(),
            elapsed_ms = clock.elapsed_ms(),
            "Rendered"
        );

        Ok(RenderOutput {
            bytes,
            surface: Arc::new(framed),
        })
    }
}
