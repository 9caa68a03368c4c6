//! Sensor Frame Payloads
//!
//! Wire types for the JSON carried in each `data:` frame, and conversion
//! into domain readings.
//!
//! # Format
//!
//! ```json
//! {"temperature": 28.4, "humidity": 61.0, "co_level": 12.5,
//!  "timestamp": "2024-05-17T09:30:00Z", "device_id": "esp32-1",
//!  "ai_prediction": {"status": "success", "recommended_action": "turn_on_fan",
//!    "future_environment": {"temperature_C": 29.1, "humidity_%": 60.2, "CO_ppm": 14.0}}}
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::reading::{AnomalyForecast, Measurements, Reading};

/// Forecast status marking a usable prediction.
const PREDICTION_SUCCESS: &str = "success";

/// Frame payload errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame carried no payload.
    #[error("empty frame payload")]
    Empty,

    /// The payload was not valid sensor JSON.
    #[error("malformed frame payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// Wire Types
// =============================================================================

/// One sensor frame as sent upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorFrame {
    /// Sample time.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Gas concentration in ppm.
    pub co_level: f64,
    /// Reporting device.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Optional forecast from upstream analysis.
    #[serde(default)]
    pub ai_prediction: Option<PredictionPayload>,
}

/// Forecast block attached to a frame.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionPayload {
    /// `"success"` when the forecast is usable.
    pub status: String,
    /// Recommended action, e.g. `turn_on_fan`.
    #[serde(default)]
    pub recommended_action: Option<String>,
    /// Predicted environment.
    #[serde(default)]
    pub future_environment: Option<FutureEnvironment>,
}

/// Predicted environment values.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FutureEnvironment {
    /// Predicted temperature in °C.
    #[serde(rename = "temperature_C")]
    pub temperature: f64,
    /// Predicted humidity in %.
    #[serde(rename = "humidity_%", default)]
    pub humidity: f64,
    /// Predicted gas concentration in ppm.
    #[serde(rename = "CO_ppm")]
    pub gas_level: f64,
}

impl SensorFrame {
    /// Classified reading for this frame.
    #[must_use]
    pub fn reading(&self) -> Reading {
        Reading::new(
            self.timestamp,
            Measurements::new(self.temperature, self.humidity, self.co_level),
            self.device_id.clone().unwrap_or_default(),
        )
    }

    /// Forecast, when a successful prediction is attached.
    #[must_use]
    pub fn forecast(&self) -> Option<AnomalyForecast> {
        let prediction = self.ai_prediction.as_ref()?;
        if prediction.status != PREDICTION_SUCCESS {
            return None;
        }
        let env = prediction.future_environment?;
        Some(AnomalyForecast {
            recommended_action: prediction.recommended_action.clone()?,
            predicted_temperature: env.temperature,
            predicted_humidity: env.humidity,
            predicted_gas_level: env.gas_level,
        })
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Decoded frame content.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Classified reading.
    pub reading: Reading,
    /// Attached forecast, if any.
    pub forecast: Option<AnomalyForecast>,
}

/// Decoder from `data:` payload text to domain values.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameDecoder;

impl FrameDecoder {
    /// Create a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for empty or malformed payloads.
    pub fn decode(&self, payload: &str) -> Result<DecodedFrame, ProtocolError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let frame: SensorFrame = serde_json::from_str(payload)?;
        Ok(DecodedFrame {
            reading: frame.reading(),
            forecast: frame.forecast(),
        })
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Parse an ISO-8601 timestamp; offset-less values are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for [`parse_timestamp`].
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}
