//! Handoff Core - application glue for interventions and navigation
//!
//! Ties the two building blocks together:
//! - [`config`]: TOML configuration for the broker and logging
//! - [`logging`]: `tracing` subscriber bootstrap
//! - [`shell`]: shows pending interventions as panes and navigates back
//! - [`simulation`]: a seeded worker/responder pipeline used by the CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use handoff_core::prelude::*;
//!
//! let config = HandoffConfig::load("handoff.toml")?;
//! init_tracing(&config.logging);
//!
//! let broker = InterventionBroker::with_config(config.broker);
//! let mut shell = InterventionShell::new(broker.clone(), NavigationCoordinator::default());
//!
//! // UI loop: whenever the pending feed yields
//! shell.sync();
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod logging;
pub mod shell;
pub mod simulation;

// Re-exports for convenience
pub use config::{HandoffConfig, LoggingConfig, LOG_ENV};
pub use error::{ConfigError, HandoffError};
pub use logging::init_tracing;
pub use shell::{InterventionShell, ShellEvent};
pub use simulation::{
    simulate, Decision, RandomResponder, Responder, SimulationConfig, SimulationReport,
};

pub use handoff_intervention as intervention;
pub use handoff_navigation as navigation;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building an application on Handoff
    pub use crate::{init_tracing, HandoffConfig, HandoffError, InterventionShell, ShellEvent};
    pub use handoff_intervention::prelude::*;
    pub use handoff_navigation::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
