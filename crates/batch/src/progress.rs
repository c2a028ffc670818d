//! Remaining-time estimation.

use std::collections::VecDeque;

/// Mean of recorded per-file durations times the files left.
///
/// Without a window the whole run is averaged, so early outliers weigh on
/// the estimate until enough files have finished. With `Some(k)` only the
/// last `k` durations count.
#[derive(Debug, Clone, Default)]
pub struct EtaEstimator {
    durations_ms: VecDeque<u64>,
    sum_ms: u64,
    window: Option<usize>,
}

impl EtaEstimator {
    pub fn new(window: Option<usize>) -> Self {
        Self {
            durations_ms: VecDeque::new(),
            sum_ms: 0,
            window: window.filter(|w| *w > 0),
        }
    }

    pub fn record(&mut self, duration_ms: u64) {
        self.durations_ms.push_back(duration_ms);
        self.sum_ms += duration_ms;
        if let Some(window) = self.window {
            while self.durations_ms.len() > window {
                if let Some(old) = self.durations_ms.pop_front() {
                    self.sum_ms -= old;
                }
            }
        }
    }

    pub fn samples(&self) -> usize {
        self.durations_ms.len()
    }

    pub fn mean_ms(&self) -> Option<f64> {
        if self.durations_ms.is_empty() {
            None
        } else {
            Some(self.sum_ms as f64 / self.durations_ms.len() as f64)
        }
    }

    /// Zero until the first duration is recorded.
    pub fn estimate_ms(&self, remaining: usize) -> u64 {
        self.mean_ms()
            .map(|mean| (mean * remaining as f64).round() as u64)
            .unwrap_or(0)
    }
}
