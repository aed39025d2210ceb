//! Error types for the intervention broker
//!
//! All broker errors are contract violations reported synchronously to the
//! misusing caller. A resolution that loses a race is not an error; see
//! [`Settle::AlreadyHandled`](crate::Settle::AlreadyHandled).

use crate::types::InterventionId;

/// Broker errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Handle was never issued by this broker
    #[error("unknown intervention handle: {0}")]
    UnknownHandle(InterventionId),

    /// Too many unhandled interventions
    #[error("intervention broker saturated (max pending: {limit})")]
    Saturated {
        /// Configured `max_pending`
        limit: usize,
    },
}

impl BrokerError {
    /// Check if error is a handle contract violation
    #[inline]
    #[must_use]
    pub fn is_unknown_handle(&self) -> bool {
        matches!(self, Self::UnknownHandle(_))
    }
}
