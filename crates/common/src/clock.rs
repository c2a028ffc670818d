//! Timing utilities for batch runs and per-file processing.
//!
//! Durations are measured on the monotonic clock; wall-clock strings are
//! only used for reporting (error timestamps, run start).

use std::time::{Duration, Instant};

/// A clock anchored at the start of a run or a single file's processing.
#[derive(Debug, Clone)]
pub struct RunClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl RunClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: wall_clock_now(),
        }
    }

    /// Time elapsed since start.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Milliseconds elapsed since start.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Seconds elapsed since start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a millisecond value to seconds.
    pub fn ms_to_secs(ms: u64) -> f64 {
        ms as f64 / 1_000.0
    }
}

/// Current wall-clock time as an RFC 3339 string.
pub fn wall_clock_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = RunClock::start();
        assert!(clock.elapsed_ms() < 1_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_ms_to_secs_conversion() {
        assert!((RunClock::ms_to_secs(1_500) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_wall_clock_is_rfc3339() {
        let now = wall_clock_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
