//! Simulated upload progress as an owned, cancellable timer task.
//!
//! [`UploadProgress::start`] spawns a tokio task that advances a percentage
//! on a fixed interval and publishes it through a `watch` channel. The task
//! stops on its own at 100%, when [`UploadProgress::cancel`] is called, or
//! when the handle is dropped.

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::ProgressConfig;

/// Observable state of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Running(u8),
    Complete,
    /// Stopped before completion at the given percentage.
    Cancelled(u8),
}

impl UploadStatus {
    /// Percentage reached; `Complete` is 100.
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            UploadStatus::Running(p) | UploadStatus::Cancelled(p) => p,
            UploadStatus::Complete => 100,
        }
    }

    /// Whether the ticker has stopped.
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, UploadStatus::Running(_))
    }
}

/// Handle to a running progress ticker.
#[derive(Debug)]
pub struct UploadProgress {
    status: watch::Receiver<UploadStatus>,
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl UploadProgress {
    /// Spawns the ticker. Must be called within a tokio runtime.
    ///
    /// A zero step or interval is raised to the smallest usable value.
    #[must_use]
    pub fn start(config: &ProgressConfig) -> Self {
        let (status_tx, status_rx) = watch::channel(UploadStatus::Running(0));
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let step = config.step_percent.max(1);
        let period = config.tick_interval().max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; progress starts one period in.
            ticker.tick().await;
            let mut percent: u8 = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        percent = percent.saturating_add(step).min(100);
                        if percent == 100 {
                            let _ = status_tx.send(UploadStatus::Complete);
                            break;
                        }
                        let _ = status_tx.send(UploadStatus::Running(percent));
                    }
                    _ = &mut cancel_rx => {
                        let _ = status_tx.send(UploadStatus::Cancelled(percent));
                        break;
                    }
                }
            }
            tracing::debug!(percent, "upload ticker stopped");
        });

        Self {
            status: status_rx,
            cancel_tx: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    /// Latest published status.
    #[must_use]
    pub fn status(&self) -> UploadStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.status().percent()
    }

    /// A receiver for observing progress from elsewhere.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status.clone()
    }

    /// Stops the ticker and waits for it to exit. No-op once finished.
    pub async fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Waits until the upload completes or is cancelled.
    pub async fn finished(&mut self) -> UploadStatus {
        // Err means the ticker is gone; whatever it sent last is final.
        let _ = self.status.wait_for(|status| status.is_finished()).await;
        self.status()
    }
}

impl Drop for UploadProgress {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProgressConfig {
        ProgressConfig {
            tick_interval_ms: 100,
            step_percent: 25,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_to_completion() {
        let mut progress = UploadProgress::start(&config());
        assert_eq!(progress.status(), UploadStatus::Running(0));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(progress.percent(), 25);

        assert_eq!(progress.finished().await, UploadStatus::Complete);
        assert_eq!(progress.percent(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let mut progress = UploadProgress::start(&config());
        tokio::time::sleep(Duration::from_millis(250)).await;
        progress.cancel().await;
        assert_eq!(progress.status(), UploadStatus::Cancelled(50));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(progress.status(), UploadStatus::Cancelled(50));
        assert_eq!(progress.finished().await, UploadStatus::Cancelled(50));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_the_ticker() {
        let progress = UploadProgress::start(&config());
        let mut observer = progress.subscribe();
        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(progress);

        // The sender lives in the aborted task, so the channel closes.
        tokio::time::timeout(Duration::from_secs(1), async {
            while observer.changed().await.is_ok() {}
        })
        .await
        .unwrap();
        assert_eq!(*observer.borrow(), UploadStatus::Running(25));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_step_still_progresses() {
        let mut progress = UploadProgress::start(&ProgressConfig {
            tick_interval_ms: 10,
            step_percent: 0,
        });
        assert_eq!(progress.finished().await, UploadStatus::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_still_completes() {
        let mut progress = UploadProgress::start(&ProgressConfig {
            tick_interval_ms: 0,
            step_percent: 10,
        });
        assert_eq!(progress.finished().await, UploadStatus::Complete);
    }
}
