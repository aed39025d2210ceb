//! Panes and the pane registry
//!
//! A pane is owned by the application. The coordinator only needs its
//! identity and its back target.

use crate::signal::{Computed, Signal};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use ulid::Ulid;

/// Stable pane identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaneId(pub Ulid);

impl PaneId {
    /// Generate new pane ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct PaneState {
    id: PaneId,
    back_target: Signal<Option<Pane>>,
}

impl Drop for PaneState {
    fn drop(&mut self) {
        let _ = LIVE_PANES.try_with(|live| {
            if let Ok(mut live) = live.try_borrow_mut() {
                if live.get(&self.id).is_some_and(|w| w.strong_count() == 0) {
                    live.remove(&self.id);
                }
            }
        });
    }
}

thread_local! {
    /// Navigation state of every live pane on this thread, by id
    static LIVE_PANES: RefCell<HashMap<PaneId, Weak<PaneState>>> = RefCell::new(HashMap::new());
}

fn pane_state(id: PaneId) -> Rc<PaneState> {
    LIVE_PANES.with(|live| {
        let mut live = live.borrow_mut();
        if let Some(state) = live.get(&id).and_then(Weak::upgrade) {
            return state;
        }
        let state = Rc::new(PaneState {
            id,
            back_target: Signal::new(None),
        });
        live.insert(id, Rc::downgrade(&state));
        state
    })
}

/// Shared handle to a navigable pane
///
/// Identity is the [`PaneId`]. Every handle with the same id, including
/// ones created separately through [`Pane::with_id`], shares one back
/// target. Only the title belongs to the handle.
///
/// A back target keeps its pane alive. A cycle of back targets therefore
/// keeps every pane in it alive until one of them is cleared.
#[derive(Clone)]
pub struct Pane {
    state: Rc<PaneState>,
    title: Rc<str>,
}

impl Pane {
    /// Create pane with a fresh id
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(PaneId::new(), title)
    }

    /// Handle for the pane `id`, sharing its back target with every other
    /// live handle for that id
    #[must_use]
    pub fn with_id(id: PaneId, title: impl Into<String>) -> Self {
        let title: String = title.into();
        Self {
            state: pane_state(id),
            title: Rc::from(title),
        }
    }

    /// Pane identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> PaneId {
        self.state.id
    }

    /// Display title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Id of the pane "back" leads to
    #[must_use]
    pub fn back_target(&self) -> Option<PaneId> {
        self.state.back_target.with(|target| target.as_ref().map(Pane::id))
    }

    /// Pane "back" leads to
    #[must_use]
    pub fn back_pane(&self) -> Option<Pane> {
        self.state.back_target.get()
    }

    /// Observable back target
    #[inline]
    #[must_use]
    pub fn back_target_signal(&self) -> &Signal<Option<Pane>> {
        &self.state.back_target
    }

    /// Point "back" at `target`, or remove it with `None`
    ///
    /// Returns whether the back target changed.
    pub fn set_back_target(&self, target: Option<&Pane>) -> bool {
        self.state.back_target.set(target.cloned())
    }

    /// Remove the back target
    pub fn clear_back_target(&self) -> bool {
        self.state.back_target.set(None)
    }

    /// `true` while a back target is set
    #[must_use]
    pub fn can_navigate_back(&self) -> Computed<bool> {
        self.state.back_target.map(Option::is_some)
    }
}

impl PartialEq for Pane {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Pane {}

impl std::fmt::Debug for Pane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pane")
            .field("id", &self.id())
            .field("title", &self.title())
            .field("back_target", &self.back_target())
            .finish()
    }
}

/// Panes known to a coordinator, in registration order
#[derive(Debug, Default, Clone)]
pub struct PaneRegistry {
    panes: IndexMap<PaneId, Pane>,
}

impl PaneRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a pane
    pub fn register(&mut self, title: impl Into<String>) -> Pane {
        let pane = Pane::new(title);
        self.panes.insert(pane.id(), pane.clone());
        pane
    }

    /// Register an existing pane, returning any pane it replaced
    pub fn insert(&mut self, pane: Pane) -> Option<Pane> {
        self.panes.insert(pane.id(), pane)
    }

    /// Look up a pane
    #[must_use]
    pub fn get(&self, id: PaneId) -> Option<Pane> {
        self.panes.get(&id).cloned()
    }

    /// Unregister a pane
    pub fn remove(&mut self, id: PaneId) -> Option<Pane> {
        self.panes.shift_remove(&id)
    }

    /// Check if registered
    #[must_use]
    pub fn contains(&self, id: PaneId) -> bool {
        self.panes.contains_key(&id)
    }

    /// Number of panes
    #[must_use]
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    /// Iterate panes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Pane> {
        self.panes.values()
    }

    /// Follow back targets starting at the registered pane `start`
    ///
    /// The chain includes `start` and every pane reached through back
    /// targets, registered or not. A cycle ends the walk at the first
    /// repeated pane.
    #[must_use]
    pub fn back_chain(&self, start: PaneId) -> Vec<Pane> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = self.get(start);

        while let Some(pane) = next {
            if !seen.insert(pane.id()) {
                tracing::warn!(pane = %pane.id(), "cyclic back-target chain");
                break;
            }
            next = pane.back_pane();
            chain.push(pane);
        }
        chain
    }
}
