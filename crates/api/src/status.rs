// Role-status polling for admin surfaces.
//
// The backend reports which roles are actually running via
// `GET /api/admin/cameras/{id}/status`; surfaces poll it on a fixed cadence
// to reflect reality rather than what they last requested. The poller is a
// cancellable task so a closing view can stop it deterministically instead
// of leaving a free-running timer behind.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::ApiClient;
use crate::models::RoleStatus;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct StatusPoller {
    rx: watch::Receiver<RoleStatus>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Start polling a camera's role status. The first poll fires
    /// immediately; afterwards one poll per `interval`. A failed poll keeps
    /// the last published value so consumers do not flip state on a blip.
    pub fn spawn(
        client: Arc<ApiClient>,
        camera_id: u64,
        interval: Duration,
        token: CancellationToken,
    ) -> Self {
        let (tx, rx) = watch::channel(RoleStatus::default());
        let loop_token = token.clone();
        let handle = tokio::spawn(async move {
            loop {
                if loop_token.is_cancelled() {
                    break;
                }
                match client.camera_status(camera_id).await {
                    Ok(status) => {
                        // A completion that raced cancellation is stale;
                        // do not publish it.
                        if loop_token.is_cancelled() {
                            break;
                        }
                        tx.send_replace(status);
                    }
                    Err(err) => {
                        debug!(camera_id, error = %err, "status poll failed, keeping last value");
                    }
                }
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!(camera_id, "status poller stopped");
        });
        Self {
            rx,
            token,
            handle: Some(handle),
        }
    }

    /// Watch side of the polled status. The receiver outlives the poller and
    /// simply stops updating once it is cancelled.
    pub fn subscribe(&self) -> watch::Receiver<RoleStatus> {
        self.rx.clone()
    }

    pub fn current(&self) -> RoleStatus {
        self.rx.borrow().clone()
    }

    /// Stop polling. Idempotent; pending request completions are dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the poll task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    // The poller hits real HTTP, so these tests only cover lifecycle against
    // an unreachable server: polls fail, the last value sticks, and
    // cancellation is prompt even mid-interval.

    #[tokio::test]
    async fn failed_polls_keep_default_value() {
        let client = Arc::new(ApiClient::new("http://127.0.0.1:1").unwrap());
        let poller = StatusPoller::spawn(
            client,
            7,
            Duration::from_millis(50),
            CancellationToken::new(),
        );
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(poller.current(), RoleStatus::default());
        poller.shutdown().await;
    }

    #[tokio::test]
    async fn cancel_stops_promptly_during_sleep() {
        let client = Arc::new(ApiClient::new("http://127.0.0.1:1").unwrap());
        let poller = StatusPoller::spawn(
            client,
            7,
            Duration::from_secs(3600),
            CancellationToken::new(),
        );
        // Let the first poll fail and the task settle into its sleep.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        poller.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
