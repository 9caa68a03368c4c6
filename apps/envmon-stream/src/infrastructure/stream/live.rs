//! Live Display State
//!
//! Observable state a stream session publishes into. Each field is a
//! `watch` channel so readers can take a cheap snapshot or await the next
//! change. The state outlives individual sessions: a reconnecting
//! supervisor hands the same `LiveState` to every new session.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use super::session::SessionState;
use crate::domain::reading::{AnomalyAlert, Reading};

/// Point-in-time copy of the live state.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSnapshot {
    /// Connection status of the most recent session.
    pub status: SessionState,
    /// Most recent reading.
    pub reading: Option<Reading>,
    /// Most recent forecast alert.
    pub alert: Option<AnomalyAlert>,
    /// Recent readings, oldest first.
    pub history: Arc<[Reading]>,
}

/// Caller-owned container for live session output.
#[derive(Debug)]
pub struct LiveState {
    status: watch::Sender<SessionState>,
    reading: watch::Sender<Option<Reading>>,
    alert: watch::Sender<Option<AnomalyAlert>>,
    history: watch::Sender<Arc<[Reading]>>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveState {
    /// Create an idle, empty state.
    #[must_use]
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionState::Idle);
        let (reading, _) = watch::channel(None);
        let (alert, _) = watch::channel(None);
        let (history, _) = watch::channel(Arc::from(Vec::new()));
        Self {
            status,
            reading,
            alert,
            history,
        }
    }

    // -------------------------------------------------------------------------
    // Publication (session side)
    // -------------------------------------------------------------------------

    pub(crate) fn publish_status(&self, state: SessionState) {
        self.status.send_replace(state);
    }

    pub(crate) fn publish_reading(&self, reading: Reading, history: Arc<[Reading]>) {
        self.reading.send_replace(Some(reading));
        self.history.send_replace(history);
    }

    pub(crate) fn publish_alert(&self, alert: AnomalyAlert) {
        self.alert.send_replace(Some(alert));
    }

    // -------------------------------------------------------------------------
    // Observation (reader side)
    // -------------------------------------------------------------------------

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> SessionState {
        *self.status.borrow()
    }

    /// Most recent reading.
    #[must_use]
    pub fn reading(&self) -> Option<Reading> {
        self.reading.borrow().clone()
    }

    /// Most recent alert.
    #[must_use]
    pub fn alert(&self) -> Option<AnomalyAlert> {
        self.alert.borrow().clone()
    }

    /// Recent readings, oldest first.
    #[must_use]
    pub fn history(&self) -> Arc<[Reading]> {
        Arc::clone(&self.history.borrow())
    }

    /// Copy of everything at once.
    #[must_use]
    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            status: self.status(),
            reading: self.reading(),
            alert: self.alert(),
            history: self.history(),
        }
    }

    /// Subscribe to status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SessionState> {
        self.status.subscribe()
    }

    /// Subscribe to new readings.
    #[must_use]
    pub fn subscribe_readings(&self) -> watch::Receiver<Option<Reading>> {
        self.reading.subscribe()
    }

    /// Subscribe to alert changes.
    #[must_use]
    pub fn subscribe_alerts(&self) -> watch::Receiver<Option<AnomalyAlert>> {
        self.alert.subscribe()
    }

    /// Subscribe to history snapshots.
    #[must_use]
    pub fn subscribe_history(&self) -> watch::Receiver<Arc<[Reading]>> {
        self.history.subscribe()
    }
}
