//! Actuator Command Gateway
//!
//! Optimistic actuator switching: the local view changes immediately and
//! falls back to the last value the control endpoint accepted if a command
//! is rejected or the endpoint is unreachable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::ports::{ActuatorPort, CommandError, ControlCommand};

/// Actuators known to the control endpoint.
pub const DEFAULT_ACTUATORS: [&str; 3] = ["fan", "heater", "purifier"];

/// Local view of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActuatorEntry {
    /// Value shown to callers, possibly optimistic.
    displayed: bool,
    /// Last value accepted by the endpoint, `None` if never known.
    confirmed: Option<bool>,
    /// Generation of the most recently applied command.
    generation: u64,
    /// Commands sent but not yet answered.
    in_flight: u32,
}

impl ActuatorEntry {
    const fn known(value: bool) -> Self {
        Self {
            displayed: value,
            confirmed: Some(value),
            generation: 0,
            in_flight: 0,
        }
    }
}

/// Optimistic change awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingChange {
    actuator: String,
    generation: u64,
    desired: bool,
}

/// Gateway between local actuator state and the control endpoint.
pub struct ActuatorGateway {
    port: Arc<dyn ActuatorPort>,
    states: RwLock<HashMap<String, ActuatorEntry>>,
}

impl ActuatorGateway {
    /// Create a gateway with no known actuator state.
    #[must_use]
    pub fn new(port: Arc<dyn ActuatorPort>) -> Self {
        Self {
            port,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Create a gateway with the given actuators initially off.
    #[must_use]
    pub fn with_actuators<I, S>(port: Arc<dyn ActuatorPort>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let states = ids
            .into_iter()
            .map(|id| (id.into(), ActuatorEntry::known(false)))
            .collect();
        Self {
            port,
            states: RwLock::new(states),
        }
    }

    /// Current local state of one actuator, `None` if never set.
    #[must_use]
    pub fn state(&self, actuator: &str) -> Option<bool> {
        self.states.read().get(actuator).map(|e| e.displayed)
    }

    /// Sorted copy of all known actuator states.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.states
            .read()
            .iter()
            .map(|(k, e)| (k.clone(), e.displayed))
            .collect()
    }

    /// Set an actuator to `on`, falling back to the last accepted value on
    /// failure.
    ///
    /// `device_id` selects the target controller when several are attached.
    ///
    /// # Errors
    ///
    /// Returns the port's [`CommandError`] after the fallback.
    pub async fn set_state(
        &self,
        actuator: &str,
        on: bool,
        device_id: Option<&str>,
    ) -> Result<(), CommandError> {
        let pending = self.apply(actuator, on);
        let command = ControlCommand::new(actuator, on, device_id.map(str::to_string));

        let result = self.port.send(&command).await;
        self.settle(&pending, result.is_ok());

        match &result {
            Ok(()) => {
                tracing::info!(actuator, action = command.action.as_str(), "Actuator command accepted");
            }
            Err(e) => {
                tracing::warn!(
                    actuator,
                    action = command.action.as_str(),
                    error = %e,
                    "Actuator command failed, local state reverted"
                );
            }
        }
        result
    }

    /// Flip an actuator; an unknown actuator is treated as off.
    ///
    /// Returns the new state on success.
    ///
    /// # Errors
    ///
    /// Returns the port's [`CommandError`] after the fallback.
    pub async fn toggle(
        &self,
        actuator: &str,
        device_id: Option<&str>,
    ) -> Result<bool, CommandError> {
        let desired = !self.state(actuator).unwrap_or(false);
        self.set_state(actuator, desired, device_id).await?;
        Ok(desired)
    }

    fn apply(&self, actuator: &str, desired: bool) -> PendingChange {
        let mut states = self.states.write();
        let entry = states.entry(actuator.to_string()).or_insert(ActuatorEntry {
            displayed: desired,
            confirmed: None,
            generation: 0,
            in_flight: 0,
        });
        entry.generation += 1;
        entry.in_flight += 1;
        entry.displayed = desired;
        PendingChange {
            actuator: actuator.to_string(),
            generation: entry.generation,
            desired,
        }
    }

    /// Record the endpoint's answer to a pending change.
    ///
    /// Once no command is in flight the view equals the last accepted value,
    /// or the actuator is forgotten if no value was ever accepted. A failed
    /// latest command shows the last accepted value while older ones finish.
    fn settle(&self, pending: &PendingChange, accepted: bool) {
        let mut states = self.states.write();
        let Some(entry) = states.get_mut(&pending.actuator) else {
            return;
        };
        entry.in_flight = entry.in_flight.saturating_sub(1);
        if accepted {
            entry.confirmed = Some(pending.desired);
        }

        let fall_back =
            entry.in_flight == 0 || (!accepted && pending.generation == entry.generation);
        if !fall_back {
            return;
        }
        if let Some(value) = entry.confirmed {
            entry.displayed = value;
        } else if entry.in_flight == 0 {
            states.remove(&pending.actuator);
        }
    }
}

impl std::fmt::Debug for ActuatorGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorGateway")
            .field("states", &*self.states.read())
            .finish_non_exhaustive()
    }
}
