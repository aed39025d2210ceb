//! Handoff Intervention - worker-to-human decision broker
//!
//! Lets a background worker publish a typed request for user input and
//! block until a response or cancellation arrives:
//! - Publication never blocks
//! - Waiting parks the worker (thread or task) without polling
//! - The first resolution wins; later ones are silent no-ops
//! - Timeouts and abandoned waits are cancellations
//!
//! # Example
//!
//! ```rust,ignore
//! use handoff_intervention::{InterventionBroker, InterventionRequest, InterventionResponse};
//!
//! let broker = InterventionBroker::new();
//! let handle = broker.publish(InterventionRequest::yes_no("Overwrite existing install?"))?;
//!
//! // Responder side (another thread)
//! broker.resolve(handle.id(), InterventionResponse::Answer(true))?;
//!
//! // Worker side
//! let resolution = handle.wait_blocking();
//! ```

#![warn(unreachable_pub)]

pub mod broker;
pub mod error;
pub mod feed;
pub mod handle;
mod slot;
pub mod types;

// Re-exports for convenience
pub use broker::InterventionBroker;
pub use error::BrokerError;
pub use feed::PendingFeed;
pub use handle::InterventionHandle;
pub use types::{
    BrokerConfig, BrokerId, BrokerStats, CancelReason, Intervention, InterventionId,
    InterventionKind, InterventionRequest, InterventionResponse, Resolution, Settle,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with interventions
    pub use crate::{
        BrokerConfig, CancelReason, Intervention, InterventionBroker, InterventionHandle,
        InterventionId, InterventionRequest, InterventionResponse, Resolution, Settle,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
