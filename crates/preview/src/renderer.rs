//! Render paths behind the preview cache.
//!
//! Two paths produce a preview: the in-process compositing engine
//! ([`LocalRenderer`]) and a [`PreviewBackend`] reached through the wire
//! mapping ([`BackendRenderer`]). [`FallbackChain`] tries one and falls back
//! to the other. Both paths must yield identical bytes for identical inputs,
//! otherwise the preview would not match the saved file.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use photomark_common::{PhotomarkError, PhotomarkResult, PreviewDefaults};
use photomark_compositor::{decode_image, CompositingEngine, RenderOutput, RenderRequest};
use photomark_model::wire::WireRenderRequest;
use photomark_model::{FrameSettings, OutputFormat, OverlaySettings, PhotoMetadata, SourceFile};

/// Encoding and sizing applied to every preview render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub quality: f32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 0.92,
            max_width: None,
            max_height: None,
        }
    }
}

impl TryFrom<&PreviewDefaults> for RenderOptions {
    type Error = PhotomarkError;

    fn try_from(defaults: &PreviewDefaults) -> PhotomarkResult<Self> {
        let format = defaults
            .format
            .parse::<OutputFormat>()
            .map_err(PhotomarkError::config)?;
        Ok(Self {
            format,
            quality: defaults.quality,
            max_width: defaults.max_width,
            max_height: defaults.max_height,
        })
    }
}

/// One preview render: the photo and the settings to draw it with.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    pub metadata: PhotoMetadata,
    pub file: SourceFile,
    pub overlay: OverlaySettings,
    pub frame: FrameSettings,
    pub options: RenderOptions,
}

impl PreviewJob {
    /// Request for the in-process engine.
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            source: Arc::clone(&self.file.bytes),
            metadata: self.metadata.clone(),
            overlay: self.overlay.clone(),
            frame: self.frame.clone(),
            format: self.options.format,
            quality: self.options.quality,
            max_width: self.options.max_width,
            max_height: self.options.max_height,
        }
    }

    /// Request in the backend's wire shape.
    pub fn wire_request(&self) -> WireRenderRequest {
        WireRenderRequest {
            max_width: self.options.max_width,
            max_height: self.options.max_height,
            overlay_settings: (&self.overlay).into(),
            frame_settings: (&self.frame).into(),
            exif: (&self.metadata.exif).into(),
            format: self.options.format.into(),
            quality: self.options.quality,
        }
    }

    /// Backends prefer reading the file themselves; in-memory sources are
    /// handed over as bytes.
    pub fn backend_source(&self) -> BackendSource {
        match &self.file.path {
            Some(path) => BackendSource::Path(path.clone()),
            None => BackendSource::Bytes(Arc::clone(&self.file.bytes)),
        }
    }
}

/// Something that turns a [`PreviewJob`] into pixels.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render(&self, job: &PreviewJob) -> PhotomarkResult<RenderOutput>;

    /// Renderer name, for logs.
    fn name(&self) -> &str;
}

/// Where a backend reads the source image from.
#[derive(Debug, Clone)]
pub enum BackendSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Trait for high-fidelity render backends reached over the wire mapping.
#[async_trait]
pub trait PreviewBackend: Send + Sync {
    /// Render and encode; returns the encoded blob.
    async fn render(
        &self,
        request: WireRenderRequest,
        source: BackendSource,
    ) -> PhotomarkResult<Vec<u8>>;

    /// Check if this backend can currently take requests.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Renders with the compositing engine on the blocking pool. For lossy
/// formats the surface is decoded back from the blob, so it matches what a
/// backend render shows.
#[derive(Debug, Clone)]
pub struct LocalRenderer {
    engine: CompositingEngine,
}

impl LocalRenderer {
    pub fn new(engine: CompositingEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PreviewRenderer for LocalRenderer {
    async fn render(&self, job: &PreviewJob) -> PhotomarkResult<RenderOutput> {
        let engine = self.engine.clone();
        let request = job.render_request();
        tokio::task::spawn_blocking(move || -> PhotomarkResult<RenderOutput> {
            let out = engine.render(&request)?;
            if request.format == OutputFormat::Png {
                return Ok(out);
            }
            let surface = decode_image(&out.bytes)?;
            Ok(RenderOutput {
                surface: Arc::new(surface),
                ..out
            })
        })
        .await
        .map_err(join_error)?
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// In-process backend: rebuilds domain settings from the wire request and
/// runs the same engine.
#[derive(Debug, Clone)]
pub struct EngineBackend {
    engine: CompositingEngine,
}

impl EngineBackend {
    pub fn new(engine: CompositingEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PreviewBackend for EngineBackend {
    async fn render(
        &self,
        request: WireRenderRequest,
        source: BackendSource,
    ) -> PhotomarkResult<Vec<u8>> {
        let (bytes, file_name): (Arc<[u8]>, String) = match source {
            BackendSource::Path(path) => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        PhotomarkError::FileNotFound { path: path.clone() }
                    } else {
                        PhotomarkError::Io(e)
                    }
                })?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (bytes.into(), name)
            }
            BackendSource::Bytes(bytes) => (bytes, String::new()),
        };

        let render = RenderRequest {
            source: bytes,
            metadata: PhotoMetadata {
                file_name,
                exif: request.exif.into(),
                ..PhotoMetadata::default()
            },
            overlay: request.overlay_settings.into(),
            frame: request.frame_settings.into(),
            format: request.format.into(),
            quality: request.quality,
            max_width: request.max_width,
            max_height: request.max_height,
        };

        let engine = self.engine.clone();
        let out = tokio::task::spawn_blocking(move || engine.render(&render))
            .await
            .map_err(join_error)??;
        Ok(out.bytes)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "engine"
    }
}

/// Adapts a [`PreviewBackend`] to [`PreviewRenderer`]. The backend returns
/// only the blob, so the surface is decoded from it.
#[derive(Clone)]
pub struct BackendRenderer {
    backend: Arc<dyn PreviewBackend>,
}

impl BackendRenderer {
    pub fn new(backend: Arc<dyn PreviewBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PreviewRenderer for BackendRenderer {
    async fn render(&self, job: &PreviewJob) -> PhotomarkResult<RenderOutput> {
        if !self.backend.is_available() {
            return Err(PhotomarkError::cache_render(format!(
                "backend '{}' is unavailable",
                self.backend.name()
            )));
        }

        let bytes = self
            .backend
            .render(job.wire_request(), job.backend_source())
            .await?;

        tokio::task::spawn_blocking(move || -> PhotomarkResult<RenderOutput> {
            let surface = decode_image(&bytes)?;
            Ok(RenderOutput {
                bytes,
                surface: Arc::new(surface),
            })
        })
        .await
        .map_err(join_error)?
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}

/// Try `primary`, then `fallback` if it errors.
#[derive(Clone)]
pub struct FallbackChain {
    primary: Arc<dyn PreviewRenderer>,
    fallback: Arc<dyn PreviewRenderer>,
}

impl FallbackChain {
    pub fn new(primary: Arc<dyn PreviewRenderer>, fallback: Arc<dyn PreviewRenderer>) -> Self {
        Self { primary, fallback }
    }

    /// Engine backend first, local engine second.
    pub fn with_engine(engine: CompositingEngine) -> Self {
        Self::new(
            Arc::new(BackendRenderer::new(Arc::new(EngineBackend::new(
                engine.clone(),
            )))),
            Arc::new(LocalRenderer::new(engine)),
        )
    }
}

#[async_trait]
impl PreviewRenderer for FallbackChain {
    async fn render(&self, job: &PreviewJob) -> PhotomarkResult<RenderOutput> {
        match self.primary.render(job).await {
            Ok(out) => Ok(out),
            Err(e) => {
                tracing::warn!(
                    renderer = self.primary.name(),
                    fallback = self.fallback.name(),
                    file = %job.file.file_name,
                    error = %e,
                    "Preview renderer failed, falling back"
                );
                self.fallback.render(job).await
            }
        }
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

fn join_error(e: tokio::task::JoinError) -> PhotomarkError {
    PhotomarkError::cache_render(format!("render task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use photomark_compositor::export_image;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct OfflineBackend;

    #[async_trait]
    impl PreviewBackend for OfflineBackend {
        async fn render(&self, _: WireRenderRequest, _: BackendSource) -> PhotomarkResult<Vec<u8>> {
            unreachable!("unavailable backends are never called")
        }

        fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    struct CountingRenderer {
        calls: AtomicUsize,
        inner: LocalRenderer,
    }

    #[async_trait]
    impl PreviewRenderer for CountingRenderer {
        async fn render(&self, job: &PreviewJob) -> PhotomarkResult<RenderOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.render(job).await
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn job() -> PreviewJob {
        let img = RgbaImage::from_pixel(40, 30, Rgba([10, 120, 200, 255]));
        let bytes = export_image(&img, OutputFormat::Png, 0.5).unwrap();
        PreviewJob {
            metadata: PhotoMetadata::default(),
            file: SourceFile::from_bytes("mem.png", bytes, 0),
            overlay: OverlaySettings::default(),
            frame: FrameSettings::default(),
            options: RenderOptions::default(),
        }
    }

    #[test]
    fn test_options_from_defaults() {
        let options = RenderOptions::try_from(&PreviewDefaults::default()).unwrap();
        assert_eq!(options.format, OutputFormat::Png);

        let bad = PreviewDefaults {
            format: "gif".into(),
            ..PreviewDefaults::default()
        };
        assert!(matches!(
            RenderOptions::try_from(&bad),
            Err(PhotomarkError::Config { .. })
        ));
    }

    #[test]
    fn test_in_memory_source_goes_as_bytes() {
        assert!(matches!(job().backend_source(), BackendSource::Bytes(_)));
        let mut j = job();
        j.file = j.file.with_path("/tmp/x.png");
        assert!(matches!(j.backend_source(), BackendSource::Path(_)));
    }

    #[tokio::test]
    async fn test_unavailable_backend_falls_back() {
        let local = Arc::new(CountingRenderer {
            calls: AtomicUsize::new(0),
            inner: LocalRenderer::new(CompositingEngine::without_assets()),
        });
        let chain = FallbackChain::new(
            Arc::new(BackendRenderer::new(Arc::new(OfflineBackend))),
            local.clone(),
        );

        let out = chain.render(&job()).await.unwrap();
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.surface.dimensions(), (40, 30));
    }

    #[tokio::test]
    async fn test_engine_backend_missing_path() {
        let backend = EngineBackend::new(CompositingEngine::without_assets());
        let err = backend
            .render(
                job().wire_request(),
                BackendSource::Path(PathBuf::from("/nonexistent/photomark/missing.jpg")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PhotomarkError::FileNotFound { .. }));
    }
}
