//! HTTP Actuator Adapter
//!
//! Forwards device switch commands to `POST /control`.

use std::sync::Arc;

use async_trait::async_trait;

use super::client::{ApiClient, StatusCategory, categorize_status, error_message};
use crate::application::ports::{
    ActuatorPort, AuthError, CommandError, ControlCommand, CredentialProvider,
};
use crate::infrastructure::metrics::{self, Outcome};

/// Path of the control endpoint.
pub const CONTROL_PATH: &str = "/control";

/// Actuator port backed by the sensor API.
pub struct HttpActuatorPort {
    client: ApiClient,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpActuatorPort {
    /// Create a new actuator adapter.
    #[must_use]
    pub fn new(client: ApiClient, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn post(&self, command: &ControlCommand) -> Result<(), CommandError> {
        let token = self
            .credentials
            .bearer_token()
            .await
            .map_err(|AuthError::MissingCredential| CommandError::Unauthorized)?;

        let response = self
            .client
            .post(CONTROL_PATH, &token)
            .json(command)
            .send()
            .await
            .map_err(|e| CommandError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if categorize_status(status) == StatusCategory::Unauthorized {
            return Err(CommandError::Unauthorized);
        }
        Err(CommandError::Rejected {
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }
}

#[async_trait]
impl ActuatorPort for HttpActuatorPort {
    #[tracing::instrument(skip(self), fields(device = %command.device, action = command.action.as_str()))]
    async fn send(&self, command: &ControlCommand) -> Result<(), CommandError> {
        let result = self.post(command).await;
        metrics::record_actuator_command(Outcome::of(&result));
        match &result {
            Ok(()) => tracing::info!("Actuator command accepted"),
            Err(e) => tracing::warn!(error = %e, "Actuator command failed"),
        }
        result
    }
}
