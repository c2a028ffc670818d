//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PhotomarkError, PhotomarkResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interactive preview parameters.
    #[serde(default)]
    pub preview: PreviewDefaults,

    /// Batch export parameters.
    #[serde(default)]
    pub batch: BatchDefaults,

    /// Font and logo assets.
    #[serde(default)]
    pub assets: AssetConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default preview cache parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewDefaults {
    /// Maximum number of cached renders (FIFO eviction beyond this).
    pub max_cache_size: usize,

    /// Delay between the last settings change and the render it triggers.
    pub debounce_ms: u64,

    /// Optional preview bounding box. `None` renders at source resolution,
    /// which keeps preview bytes identical to the saved file.
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,

    /// Encoding used for preview blobs (`png` or `jpeg`).
    pub format: String,

    /// Encoder quality in `[0.0, 1.0]`.
    pub quality: f32,
}

/// Default batch parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchDefaults {
    /// Number of concurrent workers (1 = serial).
    pub concurrency: usize,

    /// Extra attempts after a per-file failure.
    pub retry_attempts: u32,

    /// Fixed delay between attempts (0 = retry immediately).
    pub retry_backoff_ms: u64,

    /// Rolling window for the ETA estimator. `None` averages the whole run.
    pub eta_window: Option<usize>,

    /// Output encoding (`jpeg` or `png`).
    pub output_format: String,

    /// Encoder quality in `[0.0, 1.0]`.
    pub quality: f32,
}

/// Font and logo asset locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Font files tried before the system font locations.
    pub font_paths: Vec<PathBuf>,

    /// Bold font files tried before synthesizing bold.
    pub bold_font_paths: Vec<PathBuf>,

    /// Directory holding brand logos named `<brand>.png` (lowercase).
    pub logo_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "photomark_batch=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PreviewDefaults {
    fn default() -> Self {
        Self {
            max_cache_size: 10,
            debounce_ms: 100,
            max_width: None,
            max_height: None,
            format: "png".to_string(),
            quality: 0.92,
        }
    }
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retry_attempts: 0,
            retry_backoff_ms: 0,
            eta_window: None,
            output_format: "jpeg".to_string(),
            quality: 0.92,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> PhotomarkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PhotomarkError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("photomark").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.preview.max_cache_size, 10);
        assert_eq!(config.preview.debounce_ms, 100);
        assert_eq!(config.batch.concurrency, 1);
        assert_eq!(config.batch.retry_attempts, 0);
        assert!(config.batch.eta_window.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "batch": { "concurrency": 4 } }"#).unwrap();
        assert_eq!(parsed.batch.concurrency, 4);
        assert_eq!(parsed.batch.output_format, "jpeg");
        assert_eq!(parsed.preview.max_cache_size, 10);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let path = std::env::temp_dir().join("photomark_bad_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, PhotomarkError::Config { .. }));
        std::fs::remove_file(&path).ok();
    }
}
