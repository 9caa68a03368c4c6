//! Monitor Configuration Settings
//!
//! Configuration types for the stream client, loaded from environment variables.

use std::time::Duration;

use crate::domain::window::{DEFAULT_PAGE_SIZE, DEFAULT_SERIES_LIMIT};

const API_URL: &str = "ENVMON_API_URL";
const API_TOKEN: &str = "ENVMON_API_TOKEN";
const DEVICE_ID: &str = "ENVMON_DEVICE_ID";

/// Bearer credential and device selection.
#[derive(Clone, Default)]
pub struct Credentials {
    api_token: Option<String>,
    device_id: Option<String>,
}

impl Credentials {
    /// Create new credentials. Blank values count as absent.
    #[must_use]
    pub fn new(api_token: Option<String>, device_id: Option<String>) -> Self {
        Self {
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            device_id: device_id.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Get the API token, if configured.
    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Get the target device, if configured.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Remote API settings.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL without trailing slash, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    /// Timeout for bounded requests (history, control).
    pub request_timeout: Duration,
    /// TCP connect timeout for all requests.
    pub connect_timeout: Duration,
}

impl ApiSettings {
    /// Default request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Settings for `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Absolute URL for an API path such as `/stream`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Stream session and reconnect settings.
///
/// Values loaded from the environment are clamped to the `MIN_*` floors so
/// a misconfiguration can never produce a busy reconnect loop.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Longest gap between body chunks before the stream counts as stalled.
    pub stall_timeout: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum consecutive reconnection attempts (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl StreamSettings {
    /// Shortest accepted stall timeout.
    pub const MIN_STALL_TIMEOUT: Duration = Duration::from_secs(1);
    /// Shortest accepted initial reconnect delay.
    pub const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(100);
    /// Smallest accepted backoff multiplier; delays never shrink.
    pub const MIN_RECONNECT_MULTIPLIER: f64 = 1.0;
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(45),
            reconnect_delay_initial: Duration::from_millis(1000),
            reconnect_delay_max: Duration::from_secs(60),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 0, // Unlimited
        }
    }
}

/// Historical query settings.
#[derive(Debug, Clone, Copy)]
pub struct QuerySettings {
    /// Point cap for unpaginated chart series.
    pub series_limit: u32,
    /// Rows per table page.
    pub page_size: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            series_limit: DEFAULT_SERIES_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Health check HTTP port (0 = disabled).
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8085 }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Remote API settings.
    pub api: ApiSettings,
    /// Credentials.
    pub credentials: Credentials,
    /// Stream settings.
    pub stream: StreamSettings,
    /// Query settings.
    pub query: QuerySettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required keys are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL).ok_or_else(|| ConfigError::MissingEnvVar(API_URL.to_string()))?;
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyValue(API_URL.to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(base_url.to_string()));
        }

        let api = ApiSettings {
            request_timeout: parse_duration_secs(
                &lookup,
                "ENVMON_REQUEST_TIMEOUT_SECS",
                ApiSettings::DEFAULT_REQUEST_TIMEOUT,
            ),
            connect_timeout: parse_duration_secs(
                &lookup,
                "ENVMON_CONNECT_TIMEOUT_SECS",
                ApiSettings::DEFAULT_CONNECT_TIMEOUT,
            ),
            ..ApiSettings::new(base_url)
        };

        let credentials = Credentials::new(lookup(API_TOKEN), lookup(DEVICE_ID));

        let defaults = StreamSettings::default();
        let reconnect_delay_initial = parse_duration_millis(
            &lookup,
            "ENVMON_RECONNECT_DELAY_INITIAL_MS",
            defaults.reconnect_delay_initial,
        )
        .max(StreamSettings::MIN_RECONNECT_DELAY);
        let stream = StreamSettings {
            stall_timeout: parse_duration_secs(
                &lookup,
                "ENVMON_STALL_TIMEOUT_SECS",
                defaults.stall_timeout,
            )
            .max(StreamSettings::MIN_STALL_TIMEOUT),
            reconnect_delay_initial,
            reconnect_delay_max: parse_duration_secs(
                &lookup,
                "ENVMON_RECONNECT_DELAY_MAX_SECS",
                defaults.reconnect_delay_max,
            )
            .max(reconnect_delay_initial),
            // f64::max also maps NaN to the floor.
            reconnect_delay_multiplier: parse_or(
                &lookup,
                "ENVMON_RECONNECT_DELAY_MULTIPLIER",
                defaults.reconnect_delay_multiplier,
            )
            .max(StreamSettings::MIN_RECONNECT_MULTIPLIER),
            max_reconnect_attempts: parse_or(
                &lookup,
                "ENVMON_MAX_RECONNECT_ATTEMPTS",
                defaults.max_reconnect_attempts,
            ),
        };

        let query = QuerySettings {
            series_limit: parse_or(
                &lookup,
                "ENVMON_SERIES_LIMIT",
                QuerySettings::default().series_limit,
            )
            .max(1),
            page_size: parse_or(&lookup, "ENVMON_PAGE_SIZE", QuerySettings::default().page_size)
                .max(1),
        };

        let server = ServerSettings {
            health_port: parse_or(
                &lookup,
                "ENVMON_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        Ok(Self {
            api,
            credentials,
            stream,
            query,
            server,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Base URL is not an HTTP(S) URL.
    #[error("invalid API URL (expected http:// or https://): {0}")]
    InvalidUrl(String),
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
