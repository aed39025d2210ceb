//! Handoff Navigation - reactive pane navigation state
//!
//! Tracks which pane is active and whether "back" is possible from a pane,
//! exposing both as continuously updated values:
//! - [`Signal`] / [`Computed`]: synchronous single-threaded reactivity
//! - [`Pane`] / [`PaneRegistry`]: application-owned panes with back targets
//! - [`NavigationCoordinator`]: active pane, `is_active`, `can_navigate_back`, `go_back`
//! - [`Command`]: an action bound to an enablement value
//!
//! # Example
//!
//! ```rust,ignore
//! use handoff_navigation::NavigationCoordinator;
//!
//! let nav = NavigationCoordinator::default();
//! let settings = nav.register("Settings");
//! let details = nav.register("Details");
//! details.set_back_target(Some(&settings));
//!
//! let back = nav.back_command(&details);
//! nav.navigate_to(&details);
//! assert!(back.execute());
//! assert!(nav.is_active(&settings).get());
//! ```

#![warn(unreachable_pub)]

pub mod command;
pub mod coordinator;
pub mod pane;
pub mod signal;

// Re-exports for convenience
pub use command::{Command, CommandError};
pub use coordinator::{NavigationCoordinator, BACK_COMMAND};
pub use pane::{Pane, PaneId, PaneRegistry};
pub use signal::{Computed, Signal, Subscription};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with navigation state
    pub use crate::{Command, Computed, NavigationCoordinator, Pane, PaneId, PaneRegistry, Signal};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
