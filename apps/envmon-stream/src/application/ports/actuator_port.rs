//! Actuator Port (Driven Port)
//!
//! Interface for forwarding desired device states to the control endpoint.

use async_trait::async_trait;
use serde::Serialize;

/// Desired switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchAction {
    /// Turn the actuator on.
    On,
    /// Turn the actuator off.
    Off,
}

impl SwitchAction {
    /// Action for a boolean desired state.
    #[must_use]
    pub const fn from_bool(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// Wire label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Command body sent to the control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlCommand {
    /// Actuator name, e.g. `fan`.
    pub device: String,
    /// Desired position.
    pub action: SwitchAction,
    /// Target device, when more than one controller is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl ControlCommand {
    /// Build a command.
    #[must_use]
    pub fn new(device: impl Into<String>, on: bool, device_id: Option<String>) -> Self {
        Self {
            device: device.into(),
            action: SwitchAction::from_bool(on),
            device_id,
        }
    }
}

/// Actuator command errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The request could not be sent.
    #[error("control request failed: {0}")]
    RequestFailed(String),

    /// The credential was missing or rejected.
    #[error("control request unauthorized")]
    Unauthorized,

    /// The remote refused the command.
    #[error("command rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the remote.
        message: String,
    },
}

/// Port for sending actuator commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActuatorPort: Send + Sync {
    /// Forward a command. No retries.
    async fn send(&self, command: &ControlCommand) -> Result<(), CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serializes_without_device_id() {
        let cmd = ControlCommand::new("fan", true, None);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json, serde_json::json!({"device": "fan", "action": "on"}));
    }

    #[test]
    fn command_serializes_with_device_id() {
        let cmd = ControlCommand::new("heater", false, Some("esp32-1".to_string()));
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"device": "heater", "action": "off", "device_id": "esp32-1"})
        );
    }
}
