//! The preview cache controller.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use photomark_common::{PhotomarkError, PhotomarkResult, PreviewDefaults};
use photomark_model::{FrameSettings, OverlaySettings, PhotoMetadata, SourceFile};

use crate::key::cache_key;
use crate::renderer::{PreviewJob, PreviewRenderer, RenderOptions};
use crate::state::{CacheState, PreviewOutput};

pub const DEFAULT_MAX_CACHE_SIZE: usize = 10;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Cache sizing and timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewConfig {
    pub max_cache_size: usize,
    pub debounce: Duration,
    pub render: RenderOptions,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            render: RenderOptions::default(),
        }
    }
}

impl TryFrom<&PreviewDefaults> for PreviewConfig {
    type Error = PhotomarkError;

    fn try_from(defaults: &PreviewDefaults) -> PhotomarkResult<Self> {
        Ok(Self {
            max_cache_size: defaults.max_cache_size,
            debounce: Duration::from_millis(defaults.debounce_ms),
            render: RenderOptions::try_from(defaults)?,
        })
    }
}

/// What a preview surface shows right now.
#[derive(Debug, Clone, Default)]
pub struct PreviewStatus {
    /// A render is pending (debounce timer) or running.
    pub is_processing: bool,

    /// Last successful render for the most recent request.
    pub current: Option<PreviewOutput>,

    /// Message of the last failed render, cleared on success.
    pub error: Option<String>,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Owned inputs for a scheduled render.
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub metadata: PhotoMetadata,
    pub file: SourceFile,
    pub overlay: OverlaySettings,
    pub frame: FrameSettings,
}

/// Content-and-settings keyed preview cache.
///
/// Misses go to the configured [`PreviewRenderer`]. Only one render runs per
/// cache at a time: a miss that arrives while another render is in flight
/// returns `None` instead of queueing. Scheduled renders wait for the
/// in-flight one instead.
pub struct PreviewCache {
    renderer: Arc<dyn PreviewRenderer>,
    config: PreviewConfig,
    state: Mutex<CacheState>,
    in_flight: AtomicBool,
    render_done: Notify,
    pending: Mutex<Option<Scheduled>>,
    /// Scheduled tasks that have not finished, sleeping or rendering.
    scheduled: AtomicUsize,
    status: watch::Sender<PreviewStatus>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl PreviewCache {
    pub fn new(renderer: Arc<dyn PreviewRenderer>, config: PreviewConfig) -> Self {
        let (status, _) = watch::channel(PreviewStatus::default());
        Self {
            renderer,
            state: Mutex::new(CacheState::new(config.max_cache_size)),
            config,
            in_flight: AtomicBool::new(false),
            render_done: Notify::new(),
            pending: Mutex::new(None),
            scheduled: AtomicUsize::new(0),
            status,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<PreviewStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> PreviewStatus {
        self.status.borrow().clone()
    }

    pub fn is_processing(&self) -> bool {
        self.status.borrow().is_processing
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.lock_state().len(),
        }
    }

    /// Return the cached render for these inputs, or render it.
    ///
    /// `Ok(None)` means another render was already in flight and this call
    /// did nothing.
    pub async fn get_or_render(
        &self,
        photo: &PhotoMetadata,
        file: &SourceFile,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<Option<PreviewOutput>> {
        let key = cache_key(file, overlay, frame)?;

        let cached = self.lock_state().get(&key).cloned();
        if let Some(hit) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(file = %file.file_name, "Preview cache hit");
            let busy = self.in_flight.load(Ordering::SeqCst) || self.has_scheduled();
            self.status.send_modify(|s| {
                s.is_processing = busy;
                s.current = Some(hit.clone());
                s.error = None;
            });
            return Ok(Some(hit));
        }

        let Some(_guard) = RenderGuard::acquire(&self.in_flight, &self.render_done) else {
            tracing::debug!(file = %file.file_name, "Render already in flight, skipping");
            return Ok(None);
        };
        self.render_into_cache(key, photo, file, overlay, frame)
            .await
            .map(Some)
    }

    /// Drop the entry for these inputs and render again. Other entries are
    /// kept.
    pub async fn force_refresh(
        &self,
        photo: &PhotoMetadata,
        file: &SourceFile,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<Option<PreviewOutput>> {
        let key = cache_key(file, overlay, frame)?;
        let Some(_guard) = RenderGuard::acquire(&self.in_flight, &self.render_done) else {
            return Ok(None);
        };
        if self.lock_state().evict(&key).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(file = %file.file_name, "Forced preview refresh");
        self.render_into_cache(key, photo, file, overlay, frame)
            .await
            .map(Some)
    }

    /// Render after the debounce delay. Each call cancels the previously
    /// scheduled render while it is still waiting out its delay, so only the
    /// last of a burst of changes renders. A scheduled render that already
    /// started is left to finish and its result is cached; the newer request
    /// renders after it.
    pub fn schedule_render(self: &Arc<Self>, request: PreviewRequest) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.cancel_if_waiting();
        }

        let ticket = ScheduledTicket::issue(Arc::clone(self));
        self.status.send_modify(|s| s.is_processing = true);

        let armed = Arc::new(AtomicBool::new(true));
        let task_armed = Arc::clone(&armed);
        let debounce = self.config.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !task_armed.swap(false, Ordering::SeqCst) {
                return;
            }
            let PreviewRequest {
                metadata,
                file,
                overlay,
                frame,
            } = request;
            let cache = &ticket.0;
            loop {
                let done = cache.render_done.notified();
                tokio::pin!(done);
                done.as_mut().enable();
                // Failures are already published on the status channel.
                match cache.get_or_render(&metadata, &file, &overlay, &frame).await {
                    Ok(None) => done.await,
                    _ => break,
                }
            }
        });
        *pending = Some(Scheduled { handle, armed });
    }

    /// Cancel a scheduled render that is still waiting out its delay.
    pub fn cancel_scheduled(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(scheduled) = pending {
            scheduled.cancel_if_waiting();
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        let dropped = state.len() as u64;
        state.clear();
        self.evictions.fetch_add(dropped, Ordering::Relaxed);
    }

    async fn render_into_cache(
        &self,
        key: String,
        photo: &PhotoMetadata,
        file: &SourceFile,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<PreviewOutput> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.status.send_modify(|s| s.is_processing = true);

        let job = PreviewJob {
            metadata: photo.clone(),
            file: file.clone(),
            overlay: overlay.clone(),
            frame: frame.clone(),
            options: self.config.render,
        };

        match self.renderer.render(&job).await {
            Ok(out) => {
                let out = PreviewOutput::from(out);
                let evicted = self.lock_state().put(key, out.clone());
                self.evictions
                    .fetch_add(evicted.len() as u64, Ordering::Relaxed);
                tracing::debug!(
                    file = %file.file_name,
                    renderer = self.renderer.name(),
                    bytes = out.bytes.len(),
                    evicted = evicted.len(),
                    "Preview rendered"
                );
                let busy = self.has_scheduled();
                self.status.send_modify(|s| {
                    s.is_processing = busy;
                    s.current = Some(out.clone());
                    s.error = None;
                });
                Ok(out)
            }
            Err(e) => {
                tracing::warn!(
                    file = %file.file_name,
                    renderer = self.renderer.name(),
                    error = %e,
                    "Preview render failed"
                );
                let message = e.to_string();
                let busy = self.has_scheduled();
                self.status.send_modify(|s| {
                    s.is_processing = busy;
                    s.error = Some(message);
                });
                Err(e)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn has_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst) > 0
    }

    fn settle_processing(&self) {
        let busy = self.in_flight.load(Ordering::SeqCst) || self.has_scheduled();
        self.status.send_if_modified(|s| {
            if s.is_processing == busy {
                false
            } else {
                s.is_processing = busy;
                true
            }
        });
    }
}

impl Drop for PreviewCache {
    fn drop(&mut self) {
        if let Some(scheduled) = self
            .pending
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            scheduled.handle.abort();
        }
    }
}

/// A debounced render task. `armed` is cleared exactly once, either by the
/// task when its delay ends or by a canceller.
struct Scheduled {
    handle: JoinHandle<()>,
    armed: Arc<AtomicBool>,
}

impl Scheduled {
    fn cancel_if_waiting(self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.handle.abort();
        }
    }
}

/// Counts a scheduled task from spawn until its future is dropped, whether it
/// finished or was aborted before its first poll.
struct ScheduledTicket(Arc<PreviewCache>);

impl ScheduledTicket {
    fn issue(cache: Arc<PreviewCache>) -> Self {
        cache.scheduled.fetch_add(1, Ordering::SeqCst);
        Self(cache)
    }
}

impl Drop for ScheduledTicket {
    fn drop(&mut self) {
        self.0.scheduled.fetch_sub(1, Ordering::SeqCst);
        self.0.settle_processing();
    }
}

/// Holds the in-flight flag; clears it on drop, including when the owning
/// future is aborted, and wakes scheduled renders waiting for it.
struct RenderGuard<'a> {
    flag: &'a AtomicBool,
    done: &'a Notify,
}

impl<'a> RenderGuard<'a> {
    fn acquire(flag: &'a AtomicBool, done: &'a Notify) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag, done })
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.done.notify_waiters();
    }
}
