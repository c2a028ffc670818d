//! Run control signal shared by the dispatch loop and its callers.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSignal {
    Running,
    Paused,
    Cancelled,
}

/// One per run. Clones share the same signal; cancellation is final.
#[derive(Debug, Clone)]
pub struct RunControl {
    tx: Arc<watch::Sender<RunSignal>>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RunSignal::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> RunSignal {
        *self.tx.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal() == RunSignal::Cancelled
    }

    /// Returns whether the signal changed.
    pub fn pause(&self) -> bool {
        self.transition(RunSignal::Running, RunSignal::Paused)
    }

    pub fn resume(&self) -> bool {
        self.transition(RunSignal::Paused, RunSignal::Running)
    }

    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|s| {
            if *s == RunSignal::Cancelled {
                false
            } else {
                *s = RunSignal::Cancelled;
                true
            }
        })
    }

    /// Wait while paused. Returns `false` once the run is cancelled.
    pub async fn wait_runnable(&self) -> bool {
        let mut rx = self.tx.subscribe();
        let runnable = match rx.wait_for(|s| *s != RunSignal::Paused).await {
            Ok(signal) => *signal == RunSignal::Running,
            Err(_) => false,
        };
        runnable
    }

    /// Resolves when the run is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns on cancellation.
        let _ = rx.wait_for(|s| *s == RunSignal::Cancelled).await;
    }

    fn transition(&self, from: RunSignal, to: RunSignal) -> bool {
        self.tx.send_if_modified(|s| {
            if *s == from {
                *s = to;
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transitions() {
        let control = RunControl::new();
        assert!(!control.resume());
        assert!(control.pause());
        assert!(!control.pause());
        assert!(control.resume());
        assert!(control.cancel());
        assert!(!control.cancel());
        assert!(!control.pause());
        assert!(!control.resume());
        assert!(control.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_runnable_blocks_until_resume() {
        let control = RunControl::new();
        control.pause();

        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.wait_runnable().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        control.resume();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_wakes_paused_waiters() {
        let control = RunControl::new();
        control.pause();
        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.wait_runnable().await })
        };
        control.cancel();
        assert!(!waiter.await.unwrap());

        tokio::time::timeout(Duration::from_secs(1), control.cancelled())
            .await
            .unwrap();
    }
}
