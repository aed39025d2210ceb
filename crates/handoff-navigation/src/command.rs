//! Command-enablement binding
//!
//! A command pairs an action with a [`Computed<bool>`] that says whether the
//! action may currently run. UI layers bind a button's enabled flag to
//! [`Command::subscribe_enabled`].

use crate::signal::{Computed, Subscription};
use std::rc::Rc;

/// Command failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Executed while disabled
    #[error("command `{0}` is disabled")]
    Disabled(String),

    /// Action reported a failure
    #[error("command `{command}` failed: {reason}")]
    Failed {
        /// Command name
        command: String,
        /// Failure description
        reason: String,
    },
}

type Action = Rc<dyn Fn() -> Result<(), CommandError>>;

/// Executable action gated by an enablement signal
#[derive(Clone)]
pub struct Command {
    name: String,
    enabled: Computed<bool>,
    action: Action,
}

impl Command {
    /// Create command
    pub fn new(
        name: impl Into<String>,
        enabled: Computed<bool>,
        action: impl Fn() -> Result<(), CommandError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            enabled,
            action: Rc::new(action),
        }
    }

    /// Command name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the command may run now
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enablement signal
    #[must_use]
    pub fn enabled(&self) -> &Computed<bool> {
        &self.enabled
    }

    /// Observe enablement changes
    pub fn subscribe_enabled(&self, f: impl Fn(bool) + 'static) -> Subscription {
        self.enabled.subscribe(move |enabled| f(*enabled))
    }

    /// Run the action if enabled, surfacing failures
    ///
    /// # Errors
    /// - `CommandError::Disabled` if the command is disabled
    /// - any error returned by the action
    pub fn try_execute(&self) -> Result<(), CommandError> {
        if !self.is_enabled() {
            return Err(CommandError::Disabled(self.name.clone()));
        }
        (self.action)()
    }

    /// Run the action if enabled; failures are logged, never propagated
    ///
    /// Returns whether the action ran and succeeded.
    pub fn execute(&self) -> bool {
        match self.try_execute() {
            Ok(()) => true,
            Err(CommandError::Disabled(_)) => {
                tracing::debug!(command = %self.name, "ignoring disabled command");
                false
            }
            Err(e) => {
                tracing::error!(command = %self.name, error = %e, "command failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
