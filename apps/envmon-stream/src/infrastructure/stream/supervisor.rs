//! Session Supervisor
//!
//! Replaces finished sessions according to the reconnect policy until the
//! policy gives up or the cancellation token fires.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::live::LiveState;
use super::reconnect::{ReconnectDecision, ReconnectPolicy};
use super::session::{SessionConfig, SessionOutcome, SessionState, StreamSession};
use crate::application::ports::{CredentialProvider, EventSource};

/// Runs consecutive stream sessions against one source.
pub struct Supervisor {
    session_config: SessionConfig,
    credentials: Arc<dyn CredentialProvider>,
    source: Arc<dyn EventSource>,
    live: Arc<LiveState>,
    cancel: CancellationToken,
    policy: ReconnectPolicy,
}

impl Supervisor {
    /// Create a supervisor.
    #[must_use]
    pub fn new(
        session_config: SessionConfig,
        credentials: Arc<dyn CredentialProvider>,
        source: Arc<dyn EventSource>,
        live: Arc<LiveState>,
        cancel: CancellationToken,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            session_config,
            credentials,
            source,
            live,
            cancel,
            policy,
        }
    }

    /// Run sessions until the policy gives up or cancellation.
    ///
    /// Returns the outcome of the last session.
    pub async fn run(mut self) -> SessionOutcome {
        loop {
            let session = StreamSession::new(
                self.session_config,
                Arc::clone(&self.credentials),
                Arc::clone(&self.source),
                Arc::clone(&self.live),
                self.cancel.clone(),
            );
            let outcome = session.run().await;

            let delay = match self.policy.after(&outcome) {
                ReconnectDecision::GiveUp => {
                    tracing::info!(
                        state = outcome.state.as_str(),
                        attempts = self.policy.attempts(),
                        "Not reconnecting"
                    );
                    return outcome;
                }
                ReconnectDecision::RetryAfter(delay) => delay,
            };

            tracing::info!(
                state = outcome.state.as_str(),
                attempt = self.policy.attempts(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting after backoff"
            );

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    self.live.publish_status(SessionState::Aborted);
                    return SessionOutcome {
                        state: SessionState::Aborted,
                        ..outcome
                    };
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        BearerToken, ByteStream, MockCredentialProvider, OpenError, TransportError,
    };
    use crate::infrastructure::stream::ReconnectConfig;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const FRAME: &str = r#"{"temperature": 22.0, "humidity": 40.0, "co_level": 1.0, "timestamp": "2024-05-17T09:30:00Z", "device_id": "esp32-1"}"#;

    /// Rejects every open except number `failures`, which serves one frame.
    struct FlakySource {
        failures: usize,
        opened: AtomicUsize,
    }

    #[async_trait]
    impl EventSource for FlakySource {
        async fn open(&self, _token: &BearerToken) -> Result<ByteStream, OpenError> {
            let n = self.opened.fetch_add(1, Ordering::SeqCst);
            if n != self.failures {
                return Err(TransportError::ConnectionFailed("refused".to_string()).into());
            }
            let items: Vec<Result<Vec<u8>, TransportError>> =
                vec![Ok(format!("data: {FRAME}\n").into_bytes())];
            Ok(Box::pin(stream::iter(items)))
        }
    }

    fn credentials() -> Arc<MockCredentialProvider> {
        let mut creds = MockCredentialProvider::new();
        creds
            .expect_bearer_token()
            .returning(|| BearerToken::new("token"));
        Arc::new(creds)
    }

    fn policy(max_attempts: u32, initial_delay: Duration) -> ReconnectPolicy {
        ReconnectPolicy::new(ReconnectConfig {
            initial_delay,
            max_delay: initial_delay,
            multiplier: 1.0,
            jitter_factor: 0.0,
            max_attempts,
        })
    }

    fn supervisor(
        source: Arc<FlakySource>,
        live: &Arc<LiveState>,
        cancel: &CancellationToken,
        policy: ReconnectPolicy,
    ) -> Supervisor {
        Supervisor::new(
            SessionConfig::default(),
            credentials(),
            source,
            Arc::clone(live),
            cancel.clone(),
            policy,
        )
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let source = Arc::new(FlakySource {
            failures: usize::MAX,
            opened: AtomicUsize::new(0),
        });
        let live = Arc::new(LiveState::new());

        let outcome = supervisor(
            Arc::clone(&source),
            &live,
            &CancellationToken::new(),
            policy(2, Duration::from_millis(1)),
        )
        .run()
        .await;

        assert_eq!(outcome.state, SessionState::Error);
        assert_eq!(source.opened.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_after_failures() {
        let source = Arc::new(FlakySource {
            failures: 2,
            opened: AtomicUsize::new(0),
        });
        let live = Arc::new(LiveState::new());

        // Two failures, one productive session that resets the budget, then
        // three more failures exhaust it.
        let outcome = supervisor(
            Arc::clone(&source),
            &live,
            &CancellationToken::new(),
            policy(3, Duration::from_millis(1)),
        )
        .run()
        .await;

        assert_eq!(outcome.state, SessionState::Error);
        assert_eq!(live.history().len(), 1);
        assert_eq!(source.opened.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn cancel_during_backoff_aborts() {
        let source = Arc::new(FlakySource {
            failures: usize::MAX,
            opened: AtomicUsize::new(0),
        });
        let live = Arc::new(LiveState::new());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(
            supervisor(
                Arc::clone(&source),
                &live,
                &cancel,
                policy(0, Duration::from_secs(3600)),
            )
            .run(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let outcome = handle.await.unwrap();

        assert_eq!(outcome.state, SessionState::Aborted);
        assert_eq!(live.status(), SessionState::Aborted);
        assert_eq!(source.opened.load(Ordering::SeqCst), 1);
    }
}
