//! Navigation coordinator
//!
//! Single source of truth for:
//! - Which pane is active
//! - Whether each pane is the active one
//! - Whether "back" is currently possible from a pane
//!
//! All state lives on the UI context. Derived values are [`Computed`] views,
//! so callers bind to them instead of recomputing after every mutation.

use crate::command::{Command, CommandError};
use crate::pane::{Pane, PaneId, PaneRegistry};
use crate::signal::{Computed, Signal};
use std::cell::RefCell;
use std::rc::Rc;

/// Name of the command returned by [`NavigationCoordinator::back_command`]
pub const BACK_COMMAND: &str = "back";

struct CoordinatorInner {
    registry: RefCell<PaneRegistry>,
    active: Signal<Option<PaneId>>,
}

/// Tracks the active pane and derives navigation state from it
///
/// Clones share state.
#[derive(Clone)]
pub struct NavigationCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl NavigationCoordinator {
    /// Create coordinator over the caller's panes; no pane is active
    #[must_use]
    pub fn new(registry: PaneRegistry) -> Self {
        Self {
            inner: Rc::new(CoordinatorInner {
                registry: RefCell::new(registry),
                active: Signal::new(None),
            }),
        }
    }

    /// Create and register a pane
    pub fn register(&self, title: impl Into<String>) -> Pane {
        self.inner.registry.borrow_mut().register(title)
    }

    /// Register an existing pane
    pub fn insert(&self, pane: Pane) -> Option<Pane> {
        self.inner.registry.borrow_mut().insert(pane)
    }

    /// Unregister a pane
    ///
    /// Removing the active pane leaves no pane active.
    pub fn remove(&self, id: PaneId) -> Option<Pane> {
        let removed = self.inner.registry.borrow_mut().remove(id);
        if removed.is_some() && self.active_id() == Some(id) {
            self.inner.active.set(None);
            tracing::debug!(pane = %id, "active pane removed");
        }
        removed
    }

    /// Look up a registered pane
    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<Pane> {
        self.inner.registry.borrow().get(id)
    }

    /// All registered panes in registration order
    #[must_use]
    pub fn panes(&self) -> Vec<Pane> {
        self.inner.registry.borrow().iter().cloned().collect()
    }

    /// Back-target chain from `pane`
    #[must_use]
    pub fn back_chain(&self, pane: &Pane) -> Vec<Pane> {
        self.inner.registry.borrow().back_chain(pane.id())
    }

    /// Make `pane` the active pane, registering it if needed
    pub fn navigate_to(&self, pane: &Pane) {
        {
            let mut registry = self.inner.registry.borrow_mut();
            if !registry.contains(pane.id()) {
                registry.insert(pane.clone());
            }
        }
        let previous = self.inner.active.replace(Some(pane.id()));
        tracing::debug!(
            pane = %pane.id(),
            title = pane.title(),
            previous = ?previous,
            "navigated"
        );
    }

    /// Make the registered pane `id` active
    ///
    /// Returns false, leaving the active pane unchanged, if `id` is not
    /// registered.
    pub fn navigate_to_id(&self, id: PaneId) -> bool {
        let Some(pane) = self.pane(id) else {
            tracing::warn!(pane = %id, "navigation target is not registered");
            return false;
        };
        self.navigate_to(&pane);
        true
    }

    /// Id of the active pane
    #[must_use]
    pub fn active_id(&self) -> Option<PaneId> {
        self.inner.active.get()
    }

    /// Active pane
    #[must_use]
    pub fn active_pane(&self) -> Option<Pane> {
        self.active_id().and_then(|id| self.pane(id))
    }

    /// Observable active pane id
    #[must_use]
    pub fn active(&self) -> Computed<Option<PaneId>> {
        self.inner.active.computed()
    }

    /// `true` while `pane` is the active pane
    #[must_use]
    pub fn is_active(&self, pane: &Pane) -> Computed<bool> {
        let id = pane.id();
        self.inner.active.map(move |active| *active == Some(id))
    }

    /// `true` while `pane` has a back target
    #[must_use]
    pub fn can_navigate_back(&self, pane: &Pane) -> Computed<bool> {
        pane.can_navigate_back()
    }

    /// Navigate to `pane`'s back target
    ///
    /// Succeeds whenever [`can_navigate_back`](Self::can_navigate_back) is
    /// true; a target that is not registered is registered on the way, as
    /// with [`navigate_to`](Self::navigate_to). A no-op returning false when
    /// there is no back target.
    pub fn go_back(&self, pane: &Pane) -> bool {
        let Some(target) = pane.back_pane() else {
            tracing::debug!(pane = %pane.id(), "no back target");
            return false;
        };
        self.navigate_to(&target);
        true
    }

    /// "Back" command for `pane`, enabled while a back target is set
    #[must_use]
    pub fn back_command(&self, pane: &Pane) -> Command {
        let coordinator = self.clone();
        let source = pane.clone();
        Command::new(BACK_COMMAND, pane.can_navigate_back(), move || {
            if coordinator.go_back(&source) {
                Ok(())
            } else {
                Err(CommandError::Failed {
                    command: BACK_COMMAND.to_string(),
                    reason: format!("pane {} has no back target", source.id()),
                })
            }
        })
    }
}

impl Default for NavigationCoordinator {
    fn default() -> Self {
        Self::new(PaneRegistry::default())
    }
}

impl std::fmt::Debug for NavigationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationCoordinator")
            .field("active", &self.active_id())
            .field("panes", &self.inner.registry.borrow().len())
            .finish()
    }
}
