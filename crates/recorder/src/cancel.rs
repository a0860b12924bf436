//! Bridges the operator interrupt to an in-flight download.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sensorlog_client::SensorClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Turns a cancellation signal into a graceful stop of the recording.
///
/// Armed while a download stream is open. On cancellation the controller
/// asks the sensor to stop recording; the sensor then closes the stream and
/// the transfer loop finishes on an empty read. If the stop request fails,
/// the abort flag is set instead, guaranteeing the loop terminates even
/// though the stream stays open.
pub struct CancellationController {
    abort: Arc<AtomicBool>,
    cancel: CancellationToken,
    watcher: Option<JoinHandle<()>>,
}

impl CancellationController {
    /// Arms the controller: watches `cancel` until disarmed.
    pub fn arm(client: SensorClient, cancel: CancellationToken) -> Self {
        let abort = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&abort);
        let token = cancel.clone();
        let watcher = tokio::spawn(async move {
            token.cancelled().await;
            info!("***** Stop logging. Please wait... *****");
            match client.stop_recording().await {
                Ok(ack) => debug!(?ack, "stop acknowledged"),
                Err(err) => {
                    warn!(%err, "stop request failed, forcing local abort");
                    flag.store(true, Ordering::SeqCst);
                }
            }
        });
        Self {
            abort,
            cancel,
            watcher: Some(watcher),
        }
    }

    /// The abort flag the transfer loop polls. Set at most once, never
    /// cleared.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Disarms the controller once the transfer loop has returned.
    ///
    /// A stop request already in flight is allowed to finish, so the
    /// returned forced-abort state is final: `true` means the stop request
    /// failed and the local abort cut the transfer short.
    pub async fn disarm(mut self) -> bool {
        if let Some(watcher) = self.watcher.take() {
            if self.cancel.is_cancelled() {
                let _ = watcher.await;
            } else {
                watcher.abort();
            }
        }
        self.abort.load(Ordering::SeqCst)
    }
}

impl Drop for CancellationController {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
