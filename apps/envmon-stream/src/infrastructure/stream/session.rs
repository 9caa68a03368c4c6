//! Stream Session
//!
//! One lifetime of a telemetry stream connection: authenticate, open the
//! event stream, then decode and classify frames until the stream ends,
//! fails, stalls, or the session is cancelled.
//!
//! # State Machine
//!
//! ```text
//! Idle → Authenticating → Connecting → Connected → Disconnected
//!             │                │            └────→ Error
//!             └→ Unauthenticated ←┘ (401/403)
//!                              └→ Error
//! any non-terminal ──cancel──→ Aborted
//! ```
//!
//! Sessions never retry. [`StreamSession::run`] consumes the session and
//! returns its terminal state; reconnecting means building a new session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::live::LiveState;
use super::payload::FrameDecoder;
use super::sse::{SseFrameParser, Utf8Decoder};
use crate::application::ports::{
    ByteStream, CredentialProvider, EventSource, OpenError, TransportError,
};
use crate::domain::history::HistoryBuffer;
use crate::infrastructure::metrics;

/// Default bound on the gap between body chunks.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(45);

/// Connection status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Constructed, not yet running.
    #[default]
    Idle,
    /// Obtaining a bearer credential.
    Authenticating,
    /// Opening the event stream.
    Connecting,
    /// Receiving frames.
    Connected,
    /// The remote closed the stream cleanly.
    Disconnected,
    /// The credential was missing or rejected.
    Unauthenticated,
    /// Transport failure, unexpected status, or stall.
    Error,
    /// Cancelled by the owner.
    Aborted,
}

impl SessionState {
    /// Whether the session has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::Unauthenticated | Self::Error | Self::Aborted
        )
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Unauthenticated => "unauthenticated",
            Self::Error => "error",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Longest wait for the next body chunk before the stream counts as stalled.
    pub stall_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Session identifier.
    pub id: Uuid,
    /// Terminal state.
    pub state: SessionState,
    /// Whether the stream was ever opened.
    pub connected: bool,
    /// Readings published during the session.
    pub readings: u64,
}

/// A single stream connection attempt.
pub struct StreamSession {
    id: Uuid,
    config: SessionConfig,
    credentials: Arc<dyn CredentialProvider>,
    source: Arc<dyn EventSource>,
    live: Arc<LiveState>,
    cancel: CancellationToken,
    history: HistoryBuffer,
    state: SessionState,
    connected: bool,
    readings: u64,
}

impl StreamSession {
    /// Create a session. History continues from what `live` already holds.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        credentials: Arc<dyn CredentialProvider>,
        source: Arc<dyn EventSource>,
        live: Arc<LiveState>,
        cancel: CancellationToken,
    ) -> Self {
        let mut history = HistoryBuffer::new();
        for reading in live.history().iter() {
            history.push(reading.clone());
        }

        Self {
            id: Uuid::new_v4(),
            config,
            credentials,
            source,
            live,
            cancel,
            history,
            state: SessionState::Idle,
            connected: false,
            readings: 0,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Run the session to a terminal state.
    pub async fn run(mut self) -> SessionOutcome {
        let span = tracing::info_span!("stream_session", session_id = %self.id);
        let state = self.drive().instrument(span).await;
        SessionOutcome {
            id: self.id,
            state,
            connected: self.connected,
            readings: self.readings,
        }
    }

    async fn drive(&mut self) -> SessionState {
        if self.cancel.is_cancelled() {
            return self.finish(SessionState::Aborted);
        }

        let cancel = self.cancel.clone();

        self.transition(SessionState::Authenticating);
        let token = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            token = self.credentials.bearer_token() => Some(token),
        };
        let token = match token {
            None => return self.finish(SessionState::Aborted),
            Some(Ok(token)) => token,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "No usable credential");
                return self.finish(SessionState::Unauthenticated);
            }
        };

        self.transition(SessionState::Connecting);
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            opened = self.source.open(&token) => Some(opened),
        };
        let stream = match opened {
            None => return self.finish(SessionState::Aborted),
            Some(Ok(stream)) => stream,
            Some(Err(OpenError::Unauthorized { status })) => {
                tracing::warn!(status, "Stream rejected credential");
                return self.finish(SessionState::Unauthenticated);
            }
            Some(Err(OpenError::Transport(e))) => {
                tracing::warn!(error = %e, "Failed to open stream");
                return self.finish(SessionState::Error);
            }
        };

        self.connected = true;
        self.transition(SessionState::Connected);
        let terminal = self.read_loop(stream).await;
        self.finish(terminal)
    }

    async fn read_loop(&mut self, mut stream: ByteStream) -> SessionState {
        let mut utf8 = Utf8Decoder::new();
        let mut parser = SseFrameParser::new();
        let decoder = FrameDecoder::new();
        let stall_timeout = self.config.stall_timeout;
        let cancel = self.cancel.clone();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return SessionState::Aborted,
                next = tokio::time::timeout(stall_timeout, stream.next()) => next,
            };

            let chunk = match next {
                Err(_) => {
                    let err = TransportError::Stalled(stall_timeout);
                    tracing::warn!(error = %err, "Stream stalled");
                    return SessionState::Error;
                }
                Ok(None) => {
                    let truncated = utf8.finish();
                    let discarded = parser.remainder().len() + truncated.len();
                    if discarded > 0 {
                        tracing::debug!(
                            bytes = discarded,
                            truncated_utf8 = !truncated.is_empty(),
                            "Discarding unterminated line at end of stream"
                        );
                    }
                    tracing::info!(readings = self.readings, "Stream ended");
                    return SessionState::Disconnected;
                }
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Stream read failed");
                    return SessionState::Error;
                }
                Ok(Some(Ok(chunk))) => chunk,
            };

            metrics::record_chunk_bytes(chunk.len());
            let text = utf8.decode(&chunk);
            for payload in parser.feed(&text) {
                if cancel.is_cancelled() {
                    return SessionState::Aborted;
                }
                self.handle_frame(&decoder, &payload);
            }
        }
    }

    fn handle_frame(&mut self, decoder: &FrameDecoder, payload: &str) {
        metrics::record_frame_received();

        let frame = match decoder.decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                metrics::record_frame_rejected();
                tracing::warn!(error = %e, "Skipping malformed frame");
                return;
            }
        };

        let reading = frame.reading;
        tracing::trace!(
            device_id = reading.device_id(),
            status = %reading.status(),
            "Reading received"
        );
        metrics::record_reading(reading.status().as_str());

        self.history.push(reading.clone());
        self.live.publish_reading(reading, self.history.shared_snapshot());
        self.readings += 1;

        if let Some(forecast) = frame.forecast {
            let alert = forecast.alert();
            if alert.is_anomaly {
                metrics::record_anomaly_alert();
                tracing::info!(
                    action = %forecast.recommended_action,
                    "Anomaly forecast received"
                );
            }
            self.live.publish_alert(alert);
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
        metrics::record_session_transition(next.as_str());
        self.live.publish_status(next);
    }

    fn finish(&mut self, terminal: SessionState) -> SessionState {
        self.transition(terminal);
        tracing::info!(state = %terminal, readings = self.readings, "Session finished");
        terminal
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("readings", &self.readings)
            .finish_non_exhaustive()
    }
}
