// Readiness probing for role playlists.
//
// Role activation is asynchronous server-side: the pipeline takes time to
// produce its first playlist, and attaching a player before that makes the
// streaming engine error out immediately. The prober gates attachment with
// lightweight existence checks on a fixed cadence until the playlist is
// servable or the wall-clock budget elapses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::config::ProberConfig;
use crate::error::PlaybackError;

/// Outcome of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    TimedOut,
}

/// One existence check against a playlist URL. Implementations must treat
/// individual failures as "not yet ready", never as fatal.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn exists(&self, url: &Url) -> bool;
}

/// HEAD-based existence check; any 2xx means the playlist is servable.
#[async_trait]
impl ProbeTransport for reqwest::Client {
    async fn exists(&self, url: &Url) -> bool {
        match self.head(url.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                trace!(%url, error = %err, "existence check failed, treating as not ready");
                false
            }
        }
    }
}

pub struct ReadinessProber {
    transport: Arc<dyn ProbeTransport>,
    config: ProberConfig,
}

impl ReadinessProber {
    pub fn new(transport: Arc<dyn ProbeTransport>, config: ProberConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Check `url` immediately, then on the configured interval, until a
    /// check succeeds or the timeout elapses. Elapsed wall-clock time is the
    /// only thing that ends the loop unsuccessfully; a timed-out wait
    /// returns no earlier than the timeout and no later than one interval
    /// past it. The deadline races every in-flight check, so a transport
    /// that hangs cannot extend the wait. Cancellation wins over any
    /// in-flight check, and late completions are never acted on.
    pub async fn wait_until_ready(
        &self,
        url: &Url,
        token: &CancellationToken,
    ) -> Result<ProbeOutcome, PlaybackError> {
        let deadline = Instant::now() + self.config.timeout;
        let mut attempts = 0u32;

        loop {
            if token.is_cancelled() {
                return Err(PlaybackError::Cancelled);
            }

            attempts += 1;
            let ready = tokio::select! {
                _ = token.cancelled() => return Err(PlaybackError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(%url, attempts, "abandoning in-flight check at the deadline");
                    return Ok(ProbeOutcome::TimedOut);
                }
                ready = self.transport.exists(url) => ready,
            };
            if ready {
                debug!(%url, attempts, "playlist ready");
                return Ok(ProbeOutcome::Ready);
            }
            if Instant::now() >= deadline {
                debug!(%url, attempts, timeout_ms = self.config.timeout.as_millis() as u64,
                    "playlist never became ready");
                return Ok(ProbeOutcome::TimedOut);
            }

            tokio::select! {
                _ = token.cancelled() => return Err(PlaybackError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct ScriptedTransport {
        calls: AtomicU32,
        /// Succeed on the nth call (1-based); 0 never succeeds.
        ready_on_call: u32,
    }

    impl ScriptedTransport {
        fn ready_after(n: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                ready_on_call: n,
            })
        }

        fn never_ready() -> Arc<Self> {
            Self::ready_after(0)
        }
    }

    #[async_trait]
    impl ProbeTransport for ScriptedTransport {
        async fn exists(&self, _url: &Url) -> bool {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.ready_on_call != 0 && call >= self.ready_on_call
        }
    }

    fn url() -> Url {
        Url::parse("http://nvr.local/live/front/high/index.m3u8").unwrap()
    }

    fn config(timeout_ms: u64, interval_ms: u64) -> ProberConfig {
        ProberConfig {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(interval_ms),
        }
    }

    #[tokio::test]
    async fn first_check_fires_immediately() {
        let transport = ScriptedTransport::ready_after(1);
        let prober = ReadinessProber::new(transport.clone(), config(15_000, 450));
        let outcome = prober
            .wait_until_ready(&url(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::Ready);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn becomes_ready_after_a_few_polls() {
        let transport = ScriptedTransport::ready_after(4);
        let prober = ReadinessProber::new(transport.clone(), config(15_000, 400));
        let started = Instant::now();
        let outcome = prober
            .wait_until_ready(&url(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::Ready);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
        // 3 sleeps of 400ms before the succeeding check.
        assert_eq!(started.elapsed(), Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_window_is_bounded_by_one_interval() {
        // Scenario: 15000 ms budget at 400 ms polling and a playlist that
        // never appears. The wait must end in [15000, 15400] ms.
        let prober = ReadinessProber::new(ScriptedTransport::never_ready(), config(15_000, 400));
        let started = Instant::now();
        let outcome = prober
            .wait_until_ready(&url(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(15_000), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(15_400), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_check_cannot_outlive_the_deadline() {
        // A transport that never resolves (dead server, no request timeout)
        // must not stall the wait past the hard timeout.
        struct Hanging;

        #[async_trait]
        impl ProbeTransport for Hanging {
            async fn exists(&self, _url: &Url) -> bool {
                std::future::pending().await
            }
        }

        let prober = ReadinessProber::new(Arc::new(Hanging), config(15_000, 400));
        let started = Instant::now();
        let outcome = prober
            .wait_until_ready(&url(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_mid_wait() {
        let transport = ScriptedTransport::never_ready();
        let prober = ReadinessProber::new(transport.clone(), config(15_000, 400));
        let token = CancellationToken::new();
        let cancel = token.clone();
        let wait = tokio::spawn({
            let url = url();
            async move { prober.wait_until_ready(&url, &cancel).await }
        });
        tokio::time::sleep(Duration::from_millis(1000)).await;
        token.cancel();
        let result = wait.await.unwrap();
        assert!(matches!(result, Err(PlaybackError::Cancelled)));
        // No further polling happens after cancellation.
        let calls = transport.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_swallowed_until_success() {
        // A transport that errors internally just reports false; the loop
        // keeps going and succeeds later.
        struct FlakyThenReady {
            flipped: AtomicBool,
        }

        #[async_trait]
        impl ProbeTransport for FlakyThenReady {
            async fn exists(&self, _url: &Url) -> bool {
                self.flipped.swap(true, Ordering::SeqCst)
            }
        }

        let prober = ReadinessProber::new(
            Arc::new(FlakyThenReady {
                flipped: AtomicBool::new(false),
            }),
            config(15_000, 400),
        );
        let outcome = prober
            .wait_until_ready(&url(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::Ready);
    }
}
