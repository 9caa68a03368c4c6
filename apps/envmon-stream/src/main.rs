//! Environmental Monitor Stream Client Binary
//!
//! Streams live sensor readings and serves their state and actuator
//! control over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin envmon-stream
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ENVMON_API_URL`: Base URL of the sensor API
//!
//! ## Optional
//! - `ENVMON_API_TOKEN`: Bearer token (sessions end unauthenticated without it)
//! - `ENVMON_DEVICE_ID`: Device targeted by `POST /actuators/{id}` commands
//! - `ENVMON_STALL_TIMEOUT_SECS`: Longest gap between stream chunks (default: 45)
//! - `ENVMON_REQUEST_TIMEOUT_SECS`: Timeout for history and control requests (default: 10)
//! - `ENVMON_CONNECT_TIMEOUT_SECS`: TCP connect timeout (default: 10)
//! - `ENVMON_RECONNECT_DELAY_INITIAL_MS`: First reconnect delay (default: 1000)
//! - `ENVMON_RECONNECT_DELAY_MAX_SECS`: Reconnect delay cap (default: 60)
//! - `ENVMON_RECONNECT_DELAY_MULTIPLIER`: Backoff growth factor (default: 2.0)
//! - `ENVMON_MAX_RECONNECT_ATTEMPTS`: 0 for unlimited (default: 0)
//! - `ENVMON_SERIES_LIMIT`: Point cap for chart series (default: 50000)
//! - `ENVMON_PAGE_SIZE`: Rows per table page (default: 20)
//! - `ENVMON_HEALTH_PORT`: Health check HTTP port, 0 disables (default: 8085)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use envmon_stream::application::ports::{
    ActuatorPort, CredentialProvider, EventSource, HistoryStore,
};
use envmon_stream::application::services::DEFAULT_ACTUATORS;
use envmon_stream::infrastructure::health::{HealthServer, HealthServerState};
use envmon_stream::infrastructure::telemetry;
use envmon_stream::{
    ActuatorGateway, ApiClient, HistoryQueryConfig, HistoryQueryService, HttpActuatorPort,
    HttpEventSource, HttpHistoryStore, LiveState, MonitorConfig, ReconnectConfig, ReconnectPolicy, SessionConfig,
    StaticTokenProvider, Supervisor, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("a rustls crypto provider was already installed");
    }

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting environmental monitor stream client");

    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = MonitorConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let client = ApiClient::new(&config.api).context("failed to build HTTP client")?;
    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(StaticTokenProvider::from_credentials(&config.credentials));
    let source: Arc<dyn EventSource> = Arc::new(HttpEventSource::new(client.clone()));
    let store: Arc<dyn HistoryStore> =
        Arc::new(HttpHistoryStore::new(client.clone(), Arc::clone(&credentials)));
    let actuator_port: Arc<dyn ActuatorPort> =
        Arc::new(HttpActuatorPort::new(client, Arc::clone(&credentials)));
    let actuators = Arc::new(ActuatorGateway::with_actuators(
        actuator_port,
        DEFAULT_ACTUATORS,
    ));
    let history = HistoryQueryService::new(
        store,
        HistoryQueryConfig {
            series_limit: config.query.series_limit,
            page_size: config.query.page_size,
        },
    );

    let live = Arc::new(LiveState::new());

    if config.server.health_port != 0 {
        let health_state = Arc::new(
            HealthServerState::new(env!("CARGO_PKG_VERSION").to_string(), Arc::clone(&live))
                .with_actuators(
                    Arc::clone(&actuators),
                    config.credentials.device_id().map(str::to_string),
                ),
        );
        let health_server =
            HealthServer::new(config.server.health_port, health_state, shutdown_token.clone());
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
    }

    match history.fetch_latest().await {
        Ok(Some(reading)) => tracing::info!(
            timestamp = %reading.timestamp(),
            status = reading.status().as_str(),
            device_id = reading.device_id(),
            "Latest stored reading"
        ),
        Ok(None) => tracing::info!("No stored readings yet"),
        Err(e) => tracing::warn!(error = %e, "Could not fetch latest stored reading"),
    }

    let supervisor = Supervisor::new(
        SessionConfig {
            stall_timeout: config.stream.stall_timeout,
        },
        credentials,
        source,
        Arc::clone(&live),
        shutdown_token.clone(),
        ReconnectPolicy::new(ReconnectConfig::from_stream_settings(&config.stream)),
    );
    let mut supervisor_task = tokio::spawn(supervisor.run());

    tracing::info!("Stream client ready");

    tokio::select! {
        () = await_shutdown(shutdown_token.clone()) => {
            if let Ok(outcome) = supervisor_task.await {
                tracing::info!(state = outcome.state.as_str(), "Stream session stopped");
            }
        }
        outcome = &mut supervisor_task => {
            let outcome = outcome.context("stream supervisor panicked")?;
            tracing::warn!(
                state = outcome.state.as_str(),
                readings = outcome.readings,
                "Stream supervisor gave up"
            );
            shutdown_token.cancel();
        }
    }

    tracing::info!("Stream client stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &MonitorConfig) {
    tracing::info!(
        api_url = %config.api.base_url,
        token_configured = config.credentials.api_token().is_some(),
        device_id = config.credentials.device_id().unwrap_or("-"),
        health_port = config.server.health_port,
        "Configuration loaded"
    );
    tracing::debug!(
        stall_timeout_secs = config.stream.stall_timeout.as_secs(),
        max_reconnect_attempts = config.stream.max_reconnect_attempts,
        series_limit = config.query.series_limit,
        page_size = config.query.page_size,
        "Stream and query settings"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT), then cancel the token.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
