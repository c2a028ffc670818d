//! Batch run results and progress reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metadata::PhotoMetadata;

/// Run state as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Idle,
    Processing,
    Paused,
    Completed,
    Cancelled,
}

impl BatchStatus {
    /// Whether a run is live (processing or paused).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Processing | Self::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Emitted after every file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessingProgress {
    /// Files finished so far (success or failure).
    pub current: usize,
    pub total: usize,

    /// Name of the file that just finished.
    pub current_file: String,

    /// `current / total * 100`.
    pub percentage: f64,

    pub status: BatchStatus,

    /// Mean recorded duration times remaining files.
    pub estimated_time_remaining_ms: u64,
}

impl BatchProcessingProgress {
    pub fn percentage_of(current: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        current as f64 / total as f64 * 100.0
    }
}

/// A per-file failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessingError {
    pub file_name: String,
    pub error: String,

    /// When the final attempt failed (RFC 3339).
    pub timestamp: String,

    /// Position in the submitted file list.
    pub file_index: usize,
}

/// Outcome of compositing one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub original: PhotoMetadata,

    /// Encoded output; empty on failure.
    #[serde(skip)]
    pub blob: Vec<u8>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub processing_time_ms: u64,

    /// Where the output was written, when a save target accepted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,

    /// Position in the submitted file list.
    pub file_index: usize,
}

/// Summary handed back when a run completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessingResults {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<BatchProcessingError>,

    /// One entry per attempted file, ordered by `file_index`.
    pub processed_files: Vec<ProcessedFile>,

    pub duration_ms: u64,

    /// Mean processing time of successful files.
    pub average_processing_time_ms: f64,
}

impl BatchProcessingResults {
    /// Assemble a summary; files and errors are sorted by index.
    pub fn collect(
        total: usize,
        mut processed_files: Vec<ProcessedFile>,
        mut errors: Vec<BatchProcessingError>,
        duration_ms: u64,
    ) -> Self {
        processed_files.sort_by_key(|f| f.file_index);
        errors.sort_by_key(|e| e.file_index);

        let successful: Vec<u64> = processed_files
            .iter()
            .filter(|f| f.success)
            .map(|f| f.processing_time_ms)
            .collect();
        let average_processing_time_ms = if successful.is_empty() {
            0.0
        } else {
            successful.iter().sum::<u64>() as f64 / successful.len() as f64
        };

        Self {
            total,
            successful: successful.len(),
            failed: errors.len(),
            errors,
            processed_files,
            duration_ms,
            average_processing_time_ms,
        }
    }
}
