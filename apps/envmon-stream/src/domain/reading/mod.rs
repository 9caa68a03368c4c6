//! Sensor Reading Types
//!
//! Domain types for one classified environmental sample and the optional
//! anomaly forecast that upstream analysis may attach to it.
//!
//! # Classification
//!
//! Status is derived from fixed thresholds and is never set externally:
//!
//! | Condition                         | Status   |
//! |-----------------------------------|----------|
//! | gas > 50 ppm                      | `Danger` |
//! | gas <= 50 ppm, temperature > 35°C | `Warn`   |
//! | otherwise                         | `Ok`     |
//!
//! The gas threshold dominates when both thresholds are exceeded.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

// =============================================================================
// Thresholds
// =============================================================================

/// Gas concentration (ppm) above which a reading is dangerous.
pub const GAS_DANGER_PPM: f64 = 50.0;

/// Temperature (°C) above which a reading is a warning.
pub const TEMPERATURE_WARN_C: f64 = 35.0;

/// Device identifier used when the source omits one.
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Recommended action reported by the forecaster when nothing is wrong.
pub const NORMAL_ACTION: &str = "normal";

// =============================================================================
// Status
// =============================================================================

/// Safety status derived from a reading's measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReadingStatus {
    /// All measurements within limits.
    Ok,
    /// Temperature above the warning threshold.
    Warn,
    /// Gas concentration above the danger threshold.
    Danger,
}

impl ReadingStatus {
    /// Get the status label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Danger => "DANGER",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, unclassified measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Gas (CO) concentration in ppm.
    pub gas_level: f64,
}

impl Measurements {
    /// Create a new set of measurements.
    #[must_use]
    pub const fn new(temperature: f64, humidity: f64, gas_level: f64) -> Self {
        Self {
            temperature,
            humidity,
            gas_level,
        }
    }
}

/// Classify raw measurements against the safety thresholds.
///
/// Total and side-effect free. Humidity does not influence the result.
#[must_use]
pub fn classify(raw: &Measurements) -> ReadingStatus {
    if raw.gas_level > GAS_DANGER_PPM {
        ReadingStatus::Danger
    } else if raw.temperature > TEMPERATURE_WARN_C {
        ReadingStatus::Warn
    } else {
        ReadingStatus::Ok
    }
}

// =============================================================================
// Reading
// =============================================================================

/// One timestamped, classified sensor sample.
///
/// Immutable once constructed. The only constructor derives `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    timestamp: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    gas_level: f64,
    device_id: String,
    status: ReadingStatus,
}

impl Reading {
    /// Build a reading, deriving its status from the measurements.
    ///
    /// An empty device identifier is replaced with [`UNKNOWN_DEVICE`].
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        measurements: Measurements,
        device_id: impl Into<String>,
    ) -> Self {
        let device_id = device_id.into();
        let device_id = if device_id.is_empty() {
            UNKNOWN_DEVICE.to_string()
        } else {
            device_id
        };

        Self {
            timestamp,
            temperature: measurements.temperature,
            humidity: measurements.humidity,
            gas_level: measurements.gas_level,
            device_id,
            status: classify(&measurements),
        }
    }

    /// When the sample was taken.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Temperature in °C.
    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity in %.
    #[must_use]
    pub const fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Gas concentration in ppm.
    #[must_use]
    pub const fn gas_level(&self) -> f64 {
        self.gas_level
    }

    /// Reporting device.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Derived safety status.
    #[must_use]
    pub const fn status(&self) -> ReadingStatus {
        self.status
    }
}

// =============================================================================
// Anomaly Forecast
// =============================================================================

/// Predictive annotation attached to a reading by upstream analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyForecast {
    /// Action the forecaster recommends (`"normal"` when nothing is wrong).
    pub recommended_action: String,
    /// Predicted temperature in °C.
    pub predicted_temperature: f64,
    /// Predicted humidity in %.
    pub predicted_humidity: f64,
    /// Predicted gas concentration in ppm.
    pub predicted_gas_level: f64,
}

impl AnomalyForecast {
    /// Whether the forecaster considers conditions normal.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.recommended_action == NORMAL_ACTION
    }

    /// Derive the operator-facing alert for this forecast.
    #[must_use]
    pub fn alert(&self) -> AnomalyAlert {
        if self.is_normal() {
            AnomalyAlert {
                is_anomaly: false,
                message: "SYSTEM NORMAL".to_string(),
                detail: format!(
                    "Predicted: {}°C, {} PPM",
                    self.predicted_temperature, self.predicted_gas_level
                ),
            }
        } else {
            AnomalyAlert {
                is_anomaly: true,
                message: format!(
                    "AI ALERT: {}",
                    self.recommended_action.replace('_', " ").to_uppercase()
                ),
                detail: format!("Recommended: {}", self.recommended_action),
            }
        }
    }
}

/// Alert derived from an anomaly forecast.
///
/// Informational only: it never changes a reading's [`ReadingStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyAlert {
    /// True when the forecast recommends a non-normal action.
    pub is_anomaly: bool,
    /// Headline, e.g. `AI ALERT: TURN ON FAN`.
    pub message: String,
    /// Supporting detail.
    pub detail: String,
}
