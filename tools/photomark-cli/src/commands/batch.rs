//! Render many photos into a directory.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use photomark_batch::{BatchConfig, BatchOrchestrator, EngineProcessor, ProgressCallback};
use photomark_common::AppConfig;
use photomark_compositor::CompositingEngine;
use photomark_io::{DirectorySaveTarget, ExifExtractor};

use crate::SettingsArgs;

pub async fn run(
    config: &AppConfig,
    paths: Vec<PathBuf>,
    settings: SettingsArgs,
    output: PathBuf,
) -> anyhow::Result<()> {
    let (overlay, frame) = super::load_settings(&settings)?;

    let processor = EngineProcessor::from_defaults(
        CompositingEngine::from_config(&config.assets),
        Arc::new(ExifExtractor),
        &config.batch,
    )?
    .with_save_target(Arc::new(DirectorySaveTarget::new(&output)));
    let batch_config = BatchConfig::from(&config.batch);

    println!("Batch: {} file(s) -> {}", paths.len(), output.display());
    println!(
        "  Format: {}, workers: {}, retries: {}",
        processor.format(),
        batch_config.concurrency,
        batch_config.retry_attempts
    );

    let progress_cb: ProgressCallback = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{}, ETA: {:.0}s) {}    ",
            p.percentage,
            p.current,
            p.total,
            p.estimated_time_remaining_ms as f64 / 1000.0,
            p.current_file,
        );
        let _ = std::io::stdout().flush();
    });
    let orchestrator = Arc::new(
        BatchOrchestrator::new(Arc::new(processor), batch_config).with_progress_callback(progress_cb),
    );

    let ctrl_c = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                orchestrator.cancel_processing();
            }
        })
    };

    let result = orchestrator
        .start_processing(paths, &overlay, &frame)
        .await;
    ctrl_c.abort();
    println!();

    match result? {
        Some(results) => {
            println!(
                "Batch complete: {} succeeded, {} failed of {} in {:.1}s (avg {:.0}ms/file)",
                results.successful,
                results.failed,
                results.total,
                results.duration_ms as f64 / 1000.0,
                results.average_processing_time_ms
            );
            for error in &results.errors {
                println!("  [FAIL] #{} {}: {}", error.file_index, error.file_name, error.error);
            }
        }
        None => println!("Batch cancelled."),
    }
    Ok(())
}
