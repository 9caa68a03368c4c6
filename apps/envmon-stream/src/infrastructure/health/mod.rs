//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, stream status, live readings, and
//! Prometheus metrics.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /readyz` - Readiness probe (stream connected)
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /live` - Current reading, alert, and recent history as JSON
//! - `GET /actuators` - Local actuator states as JSON
//! - `POST /actuators/{id}` - Switch an actuator with `{"on": bool}`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::CommandError;
use crate::application::services::ActuatorGateway;
use crate::domain::reading::ReadingStatus;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::stream::{LiveState, SessionState};

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Client version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Stream status.
    pub stream: StreamInfo,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Stream connected.
    Healthy,
    /// Stream (re)connecting or between sessions.
    Degraded,
    /// Stream cannot recover without intervention.
    Unhealthy,
}

/// Stream status.
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    /// Session state.
    pub state: SessionState,
    /// Whether the stream is connected.
    pub connected: bool,
    /// Timestamp of the latest reading.
    pub last_reading_at: Option<DateTime<Utc>>,
    /// Status of the latest reading.
    pub last_reading_status: Option<ReadingStatus>,
    /// Readings held in the live history.
    pub history_len: usize,
}

/// Body of `POST /actuators/{id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SwitchRequest {
    /// Desired position.
    pub on: bool,
}

/// Answer to an actuator switch.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchResponse {
    /// Actuator name.
    pub actuator: String,
    /// Local state after the command settled.
    pub on: Option<bool>,
    /// Failure reason, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Actuator control exposed by the health server.
struct ActuatorControl {
    gateway: Arc<ActuatorGateway>,
    device_id: Option<String>,
}

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    live: Arc<LiveState>,
    actuators: Option<ActuatorControl>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(version: String, live: Arc<LiveState>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            live,
            actuators: None,
        }
    }

    /// Serve actuator routes through `gateway`, targeting `device_id`.
    #[must_use]
    pub fn with_actuators(
        mut self,
        gateway: Arc<ActuatorGateway>,
        device_id: Option<String>,
    ) -> Self {
        self.actuators = Some(ActuatorControl { gateway, device_id });
        self
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Routes served by the health server.
#[must_use]
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/live", get(live_handler))
        .route("/actuators", get(actuators_handler))
        .route("/actuators/{id}", post(switch_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.live.status() == SessionState::Connected {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

async fn live_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    Json(state.live.snapshot())
}

async fn actuators_handler(State(state): State<Arc<HealthServerState>>) -> Response {
    match &state.actuators {
        Some(control) => Json(control.gateway.snapshot()).into_response(),
        None => (StatusCode::NOT_FOUND, "Actuator control disabled").into_response(),
    }
}

async fn switch_handler(
    State(state): State<Arc<HealthServerState>>,
    Path(id): Path<String>,
    Json(request): Json<SwitchRequest>,
) -> Response {
    let Some(control) = &state.actuators else {
        return (StatusCode::NOT_FOUND, "Actuator control disabled").into_response();
    };
    if control.gateway.state(&id).is_none() {
        return (StatusCode::NOT_FOUND, "Unknown actuator").into_response();
    }

    let result = control
        .gateway
        .set_state(&id, request.on, control.device_id.as_deref())
        .await;

    let status = result.as_ref().map_or_else(command_status, |_| StatusCode::OK);
    let body = SwitchResponse {
        on: control.gateway.state(&id),
        actuator: id,
        error: result.err().map(|e| e.to_string()),
    };
    (status, Json(body)).into_response()
}

const fn command_status(error: &CommandError) -> StatusCode {
    match error {
        CommandError::Unauthorized => StatusCode::UNAUTHORIZED,
        CommandError::RequestFailed(_) | CommandError::Rejected { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let session = state.live.status();
    let latest = state.live.reading();

    HealthResponse {
        status: determine_health_status(session),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        stream: StreamInfo {
            state: session,
            connected: session == SessionState::Connected,
            last_reading_at: latest.as_ref().map(|r| r.timestamp()),
            last_reading_status: latest.as_ref().map(|r| r.status()),
            history_len: state.live.history().len(),
        },
    }
}

const fn determine_health_status(session: SessionState) -> HealthStatus {
    match session {
        SessionState::Connected => HealthStatus::Healthy,
        SessionState::Unauthenticated | SessionState::Aborted => HealthStatus::Unhealthy,
        SessionState::Idle
        | SessionState::Authenticating
        | SessionState::Connecting
        | SessionState::Disconnected
        | SessionState::Error => HealthStatus::Degraded,
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockActuatorPort;
    use crate::application::services::DEFAULT_ACTUATORS;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use test_case::test_case;
    use tower::ServiceExt;

    fn state(live: Arc<LiveState>) -> Arc<HealthServerState> {
        Arc::new(HealthServerState::new("test".to_string(), live))
    }

    fn actuator_state(port: MockActuatorPort, device_id: Option<&str>) -> Arc<HealthServerState> {
        let gateway = Arc::new(ActuatorGateway::with_actuators(
            Arc::new(port),
            DEFAULT_ACTUATORS,
        ));
        Arc::new(
            HealthServerState::new("test".to_string(), Arc::new(LiveState::new()))
                .with_actuators(gateway, device_id.map(str::to_string)),
        )
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        send(app, Request::builder().uri(path).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test_case(SessionState::Connected, HealthStatus::Healthy)]
    #[test_case(SessionState::Connecting, HealthStatus::Degraded)]
    #[test_case(SessionState::Error, HealthStatus::Degraded)]
    #[test_case(SessionState::Unauthenticated, HealthStatus::Unhealthy)]
    #[test_case(SessionState::Aborted, HealthStatus::Unhealthy)]
    fn health_status_from_session(session: SessionState, expected: HealthStatus) {
        assert_eq!(determine_health_status(session), expected);
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[tokio::test]
    async fn readyz_follows_connection() {
        let live = Arc::new(LiveState::new());
        let app = router(state(Arc::clone(&live)));

        let (status, body) = get_path(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "NOT READY");

        live.publish_status(SessionState::Connected);
        let (status, body) = get_path(app, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "READY");
    }

    #[tokio::test]
    async fn health_reports_unhealthy_when_unauthenticated() {
        let live = Arc::new(LiveState::new());
        live.publish_status(SessionState::Unauthenticated);

        let (status, body) = get_path(router(state(live)), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["stream"]["state"], "unauthenticated");
        assert_eq!(json["stream"]["connected"], false);
    }

    #[tokio::test]
    async fn live_returns_snapshot() {
        let live = Arc::new(LiveState::new());
        let (status, body) = get_path(router(state(live)), "/live").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "idle");
        assert!(json["reading"].is_null());
    }

    #[tokio::test]
    async fn switch_forwards_configured_device_id() {
        let mut port = MockActuatorPort::new();
        port.expect_send()
            .withf(|cmd| {
                cmd.device == "fan"
                    && cmd.action.as_str() == "on"
                    && cmd.device_id.as_deref() == Some("esp32-1")
            })
            .times(1)
            .returning(|_| Ok(()));
        let app = router(actuator_state(port, Some("esp32-1")));

        let (status, body) = post_json(app.clone(), "/actuators/fan", r#"{"on": true}"#).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["actuator"], "fan");
        assert_eq!(json["on"], true);
        assert!(json.get("error").is_none());

        let (_, body) = get_path(app, "/actuators").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["fan"], true);
        assert_eq!(json["heater"], false);
    }

    #[tokio::test]
    async fn switch_without_device_id_omits_it() {
        let mut port = MockActuatorPort::new();
        port.expect_send()
            .withf(|cmd| cmd.device_id.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let app = router(actuator_state(port, None));

        let (status, _) = post_json(app, "/actuators/heater", r#"{"on": true}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejected_switch_reports_reverted_state() {
        let mut port = MockActuatorPort::new();
        port.expect_send().times(1).returning(|_| {
            Err(CommandError::Rejected {
                status: 500,
                message: "relay fault".to_string(),
            })
        });
        let app = router(actuator_state(port, Some("esp32-1")));

        let (status, body) = post_json(app, "/actuators/purifier", r#"{"on": true}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["on"], false);
        assert!(json["error"].as_str().unwrap().contains("relay fault"));
    }

    #[tokio::test]
    async fn unauthorized_switch_maps_to_401() {
        let mut port = MockActuatorPort::new();
        port.expect_send()
            .times(1)
            .returning(|_| Err(CommandError::Unauthorized));
        let app = router(actuator_state(port, None));

        let (status, _) = post_json(app, "/actuators/fan", r#"{"on": false}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_actuator_is_not_sent() {
        let mut port = MockActuatorPort::new();
        port.expect_send().times(0);
        let app = router(actuator_state(port, None));

        let (status, _) = post_json(app, "/actuators/sprinkler", r#"{"on": true}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn actuator_routes_disabled_without_gateway() {
        let live = Arc::new(LiveState::new());
        let (status, _) = get_path(router(state(live)), "/actuators").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
