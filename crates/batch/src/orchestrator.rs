//! Batch orchestration.
//!
//! A run splits the file list across `concurrency` workers by stripes:
//! worker `i` handles indices `i, i + c, i + 2c, …`, one file at a time, so
//! at most `c` files are in flight. Workers send per-file outcomes to the
//! dispatching task, which records them, updates the ETA and publishes
//! progress after every file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use photomark_common::{wall_clock_now, BatchDefaults, PhotomarkError, PhotomarkResult, RunClock};
use photomark_model::{
    BatchProcessingError, BatchProcessingProgress, BatchProcessingResults, BatchStatus,
    FrameSettings, OverlaySettings, PhotoMetadata, ProcessedFile,
};

use crate::control::RunControl;
use crate::processor::{FileOutput, FileProcessor};
use crate::progress::EtaEstimator;

/// Progress callback, invoked after every file.
pub type ProgressCallback = Box<dyn Fn(BatchProcessingProgress) + Send + Sync>;

/// Worker and retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of concurrent workers (at least 1).
    pub concurrency: usize,

    /// Extra attempts after a failed one.
    pub retry_attempts: u32,

    /// Fixed delay before each retry.
    pub retry_backoff: Duration,

    /// Rolling ETA window; `None` averages the whole run.
    pub eta_window: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retry_attempts: 0,
            retry_backoff: Duration::ZERO,
            eta_window: None,
        }
    }
}

impl From<&BatchDefaults> for BatchConfig {
    fn from(defaults: &BatchDefaults) -> Self {
        Self {
            concurrency: defaults.concurrency.max(1),
            retry_attempts: defaults.retry_attempts,
            retry_backoff: Duration::from_millis(defaults.retry_backoff_ms),
            eta_window: defaults.eta_window,
        }
    }
}

/// Runs batches through a [`FileProcessor`].
///
/// Share it behind an `Arc` to call [`pause_processing`](Self::pause_processing)
/// and friends while [`start_processing`](Self::start_processing) is running.
pub struct BatchOrchestrator {
    processor: Arc<dyn FileProcessor>,
    config: BatchConfig,
    run: Mutex<ActiveRun>,
    status: watch::Sender<BatchStatus>,
    progress: watch::Sender<BatchProcessingProgress>,
    callback: Option<ProgressCallback>,
}

/// Control signal of the latest run, tagged with that run's generation.
/// A run only touches status and progress while its generation is current.
#[derive(Default)]
struct ActiveRun {
    control: RunControl,
    generation: u64,
}

/// What a worker reports for one file.
struct FileOutcome {
    index: usize,
    file_name: String,
    path: PathBuf,
    elapsed_ms: u64,
    result: PhotomarkResult<FileOutput>,
}

impl BatchOrchestrator {
    pub fn new(processor: Arc<dyn FileProcessor>, config: BatchConfig) -> Self {
        let (status, _) = watch::channel(BatchStatus::Idle);
        let (progress, _) = watch::channel(BatchProcessingProgress::default());
        Self {
            processor,
            config: BatchConfig {
                concurrency: config.concurrency.max(1),
                ..config
            },
            run: Mutex::new(ActiveRun::default()),
            status,
            progress,
            callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn status(&self) -> BatchStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<BatchStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<BatchProcessingProgress> {
        self.progress.subscribe()
    }

    /// Process every file and summarize the run.
    ///
    /// Returns `Ok(None)` when the run was cancelled. Per-file failures are
    /// recorded in the results; only a failure of the run itself (a worker
    /// dying) returns an error, with status `Cancelled`.
    pub async fn start_processing(
        &self,
        files: Vec<PathBuf>,
        overlay: &OverlaySettings,
        frame: &FrameSettings,
    ) -> PhotomarkResult<Option<BatchProcessingResults>> {
        let total = files.len();
        if total == 0 {
            tracing::info!("Empty batch, nothing to do");
            return Ok(Some(BatchProcessingResults::collect(0, Vec::new(), Vec::new(), 0)));
        }

        let (control, generation) = self.begin_run()?;
        let clock = RunClock::start();
        let workers = self.config.concurrency.min(total);
        tracing::info!(total, workers, retries = self.config.retry_attempts, "Batch started");

        self.progress.send_replace(BatchProcessingProgress {
            total,
            status: BatchStatus::Processing,
            ..BatchProcessingProgress::default()
        });

        let files: Arc<[PathBuf]> = files.into();
        let overlay = Arc::new(overlay.clone());
        let frame = Arc::new(frame.clone());
        let (tx, mut rx) = mpsc::unbounded_channel::<FileOutcome>();

        let mut set = JoinSet::new();
        for worker in 0..workers {
            set.spawn(run_worker(
                worker,
                workers,
                Arc::clone(&files),
                Arc::clone(&self.processor),
                Arc::clone(&overlay),
                Arc::clone(&frame),
                self.config,
                control.clone(),
                tx.clone(),
            ));
        }
        drop(tx);

        let mut eta = EtaEstimator::new(self.config.eta_window);
        let mut processed = Vec::with_capacity(total);
        let mut errors = Vec::new();

        loop {
            tokio::select! {
                outcome = rx.recv() => {
                    let Some(outcome) = outcome else { break };
                    if control.is_cancelled() {
                        continue;
                    }
                    eta.record(outcome.elapsed_ms);
                    let file_name = outcome.file_name.clone();
                    let (file, error) = into_records(outcome);
                    processed.push(file);
                    errors.extend(error);
                    self.publish_progress(generation, processed.len(), total, file_name, &eta);
                }
                Some(joined) = set.join_next() => {
                    if let Err(e) = joined {
                        return Err(self.abort_run(generation, &control, &mut set, e));
                    }
                }
            }
        }
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                return Err(self.abort_run(generation, &control, &mut set, e));
            }
        }

        if control.is_cancelled() {
            self.finish(generation, BatchStatus::Cancelled);
            tracing::info!(
                finished = processed.len(),
                total,
                elapsed_ms = clock.elapsed_ms(),
                "Batch cancelled"
            );
            return Ok(None);
        }

        let results = BatchProcessingResults::collect(total, processed, errors, clock.elapsed_ms());
        self.finish(generation, BatchStatus::Completed);
        tracing::info!(
            total,
            successful = results.successful,
            failed = results.failed,
            duration_ms = results.duration_ms,
            "Batch completed"
        );
        Ok(Some(results))
    }

    /// Stop dispatching new files. Files already running finish.
    pub fn pause_processing(&self) -> bool {
        let run = self.lock_run();
        let paused = self.status.send_if_modified(|s| {
            if *s == BatchStatus::Processing {
                *s = BatchStatus::Paused;
                true
            } else {
                false
            }
        });
        if paused {
            run.control.pause();
            self.progress.send_modify(|p| p.status = BatchStatus::Paused);
            tracing::info!("Batch paused");
        }
        paused
    }

    pub fn resume_processing(&self) -> bool {
        let run = self.lock_run();
        let resumed = self.status.send_if_modified(|s| {
            if *s == BatchStatus::Paused {
                *s = BatchStatus::Processing;
                true
            } else {
                false
            }
        });
        if resumed {
            run.control.resume();
            self.progress.send_modify(|p| p.status = BatchStatus::Processing);
            tracing::info!("Batch resumed");
        }
        resumed
    }

    /// Cancel the active run. No file starts after this returns, and output
    /// of files still in flight is discarded.
    pub fn cancel_processing(&self) -> bool {
        let run = self.lock_run();
        let cancelled = self.status.send_if_modified(|s| {
            if s.is_active() {
                *s = BatchStatus::Cancelled;
                true
            } else {
                false
            }
        });
        if cancelled {
            run.control.cancel();
            self.progress.send_modify(|p| p.status = BatchStatus::Cancelled);
            tracing::info!("Batch cancelled by caller");
        }
        cancelled
    }

    /// Cancel any active run and go back to idle with empty progress. The
    /// cancelled run no longer reports status or progress.
    pub fn reset_processing(&self) {
        let mut run = self.lock_run();
        run.control.cancel();
        run.generation += 1;
        self.status.send_replace(BatchStatus::Idle);
        self.progress.send_replace(BatchProcessingProgress::default());
    }

    fn begin_run(&self) -> PhotomarkResult<(RunControl, u64)> {
        let mut run = self.lock_run();
        let started = self.status.send_if_modified(|s| {
            if s.is_active() {
                false
            } else {
                *s = BatchStatus::Processing;
                true
            }
        });
        if !started {
            return Err(PhotomarkError::batch_abort("a batch is already running"));
        }
        run.control = RunControl::new();
        run.generation += 1;
        Ok((run.control.clone(), run.generation))
    }

    /// Move an active run to `terminal`; a cancel or reset that already
    /// moved it on wins.
    fn finish(&self, generation: u64, terminal: BatchStatus) {
        let run = self.lock_run();
        if run.generation != generation {
            return;
        }
        let changed = self.status.send_if_modified(|s| {
            if s.is_active() {
                *s = terminal;
                true
            } else {
                false
            }
        });
        if changed {
            self.progress.send_modify(|p| p.status = terminal);
        }
    }

    fn abort_run(
        &self,
        generation: u64,
        control: &RunControl,
        set: &mut JoinSet<()>,
        error: tokio::task::JoinError,
    ) -> PhotomarkError {
        control.cancel();
        set.abort_all();
        self.finish(generation, BatchStatus::Cancelled);
        tracing::error!(error = %error, "Batch worker failed, run aborted");
        PhotomarkError::batch_abort(format!("worker failed: {error}"))
    }

    fn publish_progress(
        &self,
        generation: u64,
        current: usize,
        total: usize,
        file_name: String,
        eta: &EtaEstimator,
    ) {
        let run = self.lock_run();
        if run.generation != generation {
            return;
        }
        let progress = BatchProcessingProgress {
            current,
            total,
            current_file: file_name,
            percentage: BatchProcessingProgress::percentage_of(current, total),
            status: self.status(),
            estimated_time_remaining_ms: eta.estimate_ms(total - current),
        };
        tracing::debug!(
            current,
            total,
            file = %progress.current_file,
            eta_ms = progress.estimated_time_remaining_ms,
            "Batch progress"
        );
        self.progress.send_replace(progress.clone());
        drop(run);
        if let Some(callback) = &self.callback {
            callback(progress);
        }
    }

    fn lock_run(&self) -> MutexGuard<'_, ActiveRun> {
        self.run.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_worker(
    worker: usize,
    stride: usize,
    files: Arc<[PathBuf]>,
    processor: Arc<dyn FileProcessor>,
    overlay: Arc<OverlaySettings>,
    frame: Arc<FrameSettings>,
    config: BatchConfig,
    control: RunControl,
    tx: mpsc::UnboundedSender<FileOutcome>,
) {
    for index in (worker..files.len()).step_by(stride) {
        if !control.wait_runnable().await {
            break;
        }
        let path = &files[index];
        let clock = RunClock::start();

        let result = tokio::select! {
            biased;
            _ = control.cancelled() => break,
            result = process_with_retry(processor.as_ref(), path, &overlay, &frame, &config) => result,
        };

        let outcome = FileOutcome {
            index,
            file_name: display_name(path),
            path: path.clone(),
            elapsed_ms: clock.elapsed_ms(),
            result,
        };
        if tx.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!(worker, "Batch worker finished");
}

/// Attempt once, then up to `retry_attempts` more times.
async fn process_with_retry(
    processor: &dyn FileProcessor,
    path: &Path,
    overlay: &OverlaySettings,
    frame: &FrameSettings,
    config: &BatchConfig,
) -> PhotomarkResult<FileOutput> {
    let mut attempt = 0u32;
    loop {
        match processor.process(path, overlay, frame).await {
            Ok(out) => return Ok(out),
            Err(e) if attempt < config.retry_attempts => {
                attempt += 1;
                tracing::warn!(
                    file = %path.display(),
                    attempt,
                    max = config.retry_attempts,
                    error = %e,
                    "Retrying file"
                );
                if !config.retry_backoff.is_zero() {
                    tokio::time::sleep(config.retry_backoff).await;
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn into_records(outcome: FileOutcome) -> (ProcessedFile, Option<BatchProcessingError>) {
    match outcome.result {
        Ok(out) => (
            ProcessedFile {
                original: out.metadata,
                blob: out.blob,
                success: true,
                error: None,
                processing_time_ms: outcome.elapsed_ms,
                saved_path: out.saved_path,
                file_index: outcome.index,
            },
            None,
        ),
        Err(e) => {
            let message = e.to_string();
            tracing::warn!(file = %outcome.file_name, index = outcome.index, error = %message, "File failed");
            let original = PhotoMetadata {
                file_name: outcome.file_name.clone(),
                file_path: outcome.path.display().to_string(),
                ..PhotoMetadata::default()
            };
            (
                ProcessedFile {
                    original,
                    success: false,
                    error: Some(message.clone()),
                    processing_time_ms: outcome.elapsed_ms,
                    file_index: outcome.index,
                    ..ProcessedFile::default()
                },
                Some(BatchProcessingError {
                    file_name: outcome.file_name,
                    error: message,
                    timestamp: wall_clock_now(),
                    file_index: outcome.index,
                }),
            )
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl FileProcessor for Echo {
        async fn process(
            &self,
            path: &Path,
            _: &OverlaySettings,
            _: &FrameSettings,
        ) -> PhotomarkResult<FileOutput> {
            Ok(FileOutput {
                metadata: PhotoMetadata {
                    file_name: display_name(path),
                    ..PhotoMetadata::default()
                },
                blob: path.to_string_lossy().as_bytes().to_vec(),
                saved_path: None,
            })
        }
    }

    #[test]
    fn test_config_from_defaults() {
        let config = BatchConfig::from(&BatchDefaults {
            concurrency: 0,
            retry_backoff_ms: 250,
            ..BatchDefaults::default()
        });
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.retry_backoff, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_empty_batch_stays_idle() {
        let orchestrator = BatchOrchestrator::new(Arc::new(Echo), BatchConfig::default());
        let results = orchestrator
            .start_processing(Vec::new(), &OverlaySettings::default(), &FrameSettings::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(results.total, 0);
        assert_eq!(orchestrator.status(), BatchStatus::Idle);
    }

    #[tokio::test]
    async fn test_results_are_ordered_by_index() {
        let orchestrator = BatchOrchestrator::new(
            Arc::new(Echo),
            BatchConfig {
                concurrency: 3,
                ..BatchConfig::default()
            },
        );
        let files: Vec<PathBuf> = (0..7).map(|i| PathBuf::from(format!("f{i}.jpg"))).collect();
        let results = orchestrator
            .start_processing(files, &OverlaySettings::default(), &FrameSettings::default())
            .await
            .unwrap()
            .unwrap();

        let indices: Vec<usize> = results.processed_files.iter().map(|f| f.file_index).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
        assert_eq!(results.processed_files[4].blob, b"f4.jpg");
        assert_eq!(orchestrator.status(), BatchStatus::Completed);

        let progress = orchestrator.subscribe_progress().borrow().clone();
        assert_eq!(progress.current, 7);
        assert_eq!(progress.percentage, 100.0);
        assert_eq!(progress.status, BatchStatus::Completed);
    }

    #[test]
    fn test_controls_without_a_run_are_no_ops() {
        let orchestrator = BatchOrchestrator::new(Arc::new(Echo), BatchConfig::default());
        assert!(!orchestrator.pause_processing());
        assert!(!orchestrator.resume_processing());
        assert!(!orchestrator.cancel_processing());
        orchestrator.reset_processing();
        assert_eq!(orchestrator.status(), BatchStatus::Idle);
    }
}
