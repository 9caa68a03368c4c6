//! Prometheus Metrics Module
//!
//! Exposes client metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Frames**: `data:` frames received and rejected
//! - **Readings**: classified readings by status, anomaly alerts
//! - **Sessions**: state transitions by target state
//! - **Requests**: history queries and actuator commands by outcome
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! before [`init_metrics`] is a no-op.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder, or return the existing handle.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "envmon_frames_received_total",
        "Total data frames received from the sensor stream"
    );
    describe_counter!(
        "envmon_frames_rejected_total",
        "Total data frames dropped as malformed"
    );
    describe_counter!(
        "envmon_readings_total",
        "Total classified readings by status"
    );
    describe_counter!(
        "envmon_session_transitions_total",
        "Total stream session state transitions by target state"
    );
    describe_counter!(
        "envmon_anomaly_alerts_total",
        "Total non-normal anomaly forecasts received"
    );
    describe_counter!(
        "envmon_history_queries_total",
        "Total historical queries by kind and outcome"
    );
    describe_counter!(
        "envmon_actuator_commands_total",
        "Total actuator commands by outcome"
    );
    describe_histogram!("envmon_chunk_bytes", "Size of stream body chunks in bytes");
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Request outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request succeeded.
    Ok,
    /// The request failed.
    Error,
}

impl Outcome {
    /// Outcome of a result.
    #[must_use]
    pub const fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() { Self::Ok } else { Self::Error }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Record a received `data:` frame.
pub fn record_frame_received() {
    counter!("envmon_frames_received_total").increment(1);
}

/// Record a frame dropped as malformed.
pub fn record_frame_rejected() {
    counter!("envmon_frames_rejected_total").increment(1);
}

/// Record a classified reading.
pub fn record_reading(status: &'static str) {
    counter!("envmon_readings_total", "status" => status).increment(1);
}

/// Record a session state transition.
pub fn record_session_transition(state: &'static str) {
    counter!("envmon_session_transitions_total", "state" => state).increment(1);
}

/// Record a non-normal anomaly forecast.
pub fn record_anomaly_alert() {
    counter!("envmon_anomaly_alerts_total").increment(1);
}

/// Record a historical query.
pub fn record_history_query(kind: &'static str, outcome: Outcome) {
    counter!(
        "envmon_history_queries_total",
        "kind" => kind,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record an actuator command.
pub fn record_actuator_command(outcome: Outcome) {
    counter!("envmon_actuator_commands_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record the size of a body chunk.
pub fn record_chunk_bytes(len: usize) {
    #[allow(clippy::cast_precision_loss)]
    histogram!("envmon_chunk_bytes").record(len as f64);
}

// =============================================================================
// Tests
// =============================================================================
