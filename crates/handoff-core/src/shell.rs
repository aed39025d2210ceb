//! Intervention shell
//!
//! Surfaces pending interventions as panes. Showing an intervention pushes
//! a pane whose back target is whatever was active before, so once the
//! intervention is handled "back" returns the user to where they were.
//!
//! Runs on the UI context; call [`InterventionShell::sync`] whenever the
//! broker's pending feed yields.

use crate::error::HandoffError;
use handoff_intervention::{
    Intervention, InterventionBroker, InterventionId, InterventionResponse, Settle,
};
use handoff_navigation::{NavigationCoordinator, Pane};

/// What a call to [`InterventionShell::sync`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    /// Nothing changed
    Unchanged,
    /// An intervention was put on screen
    Opened(InterventionId),
    /// The shown intervention was handled elsewhere and taken down
    Closed(InterventionId),
    /// The shown intervention was taken down and the next one opened
    Advanced {
        /// Intervention taken down
        closed: InterventionId,
        /// Intervention now shown
        opened: InterventionId,
    },
}

#[derive(Debug)]
struct Showing {
    intervention: Intervention,
    pane: Pane,
}

/// Presents the front pending intervention as the active pane
#[derive(Debug)]
pub struct InterventionShell {
    broker: InterventionBroker,
    nav: NavigationCoordinator,
    showing: Option<Showing>,
}

impl InterventionShell {
    /// Create shell over a broker and the application's coordinator
    #[must_use]
    pub fn new(broker: InterventionBroker, nav: NavigationCoordinator) -> Self {
        Self {
            broker,
            nav,
            showing: None,
        }
    }

    /// Broker this shell watches
    #[inline]
    #[must_use]
    pub fn broker(&self) -> &InterventionBroker {
        &self.broker
    }

    /// Coordinator this shell navigates
    #[inline]
    #[must_use]
    pub fn navigation(&self) -> &NavigationCoordinator {
        &self.nav
    }

    /// Intervention on screen
    #[must_use]
    pub fn current(&self) -> Option<&Intervention> {
        self.showing.as_ref().map(|s| &s.intervention)
    }

    /// Pane showing the current intervention
    #[must_use]
    pub fn current_pane(&self) -> Option<&Pane> {
        self.showing.as_ref().map(|s| &s.pane)
    }

    /// Reconcile the screen with the broker's pending set
    pub fn sync(&mut self) -> ShellEvent {
        let pending = self.broker.pending();

        let still_pending = self
            .showing
            .as_ref()
            .is_some_and(|s| pending.iter().any(|i| i.id == s.intervention.id));
        if still_pending {
            return ShellEvent::Unchanged;
        }
        let closed = self.close();

        let opened = pending.into_iter().next().map(|front| self.open(front));

        match (closed, opened) {
            (None, None) => ShellEvent::Unchanged,
            (None, Some(opened)) => ShellEvent::Opened(opened),
            (Some(closed), None) => ShellEvent::Closed(closed),
            (Some(closed), Some(opened)) => ShellEvent::Advanced { closed, opened },
        }
    }

    /// Answer the shown intervention, go back, and show the next one
    ///
    /// # Errors
    /// - `HandoffError::NothingShown` if no intervention is on screen
    /// - `HandoffError::Broker` if the broker rejects the id
    pub fn respond(&mut self, response: InterventionResponse) -> Result<Settle, HandoffError> {
        let id = self.shown_id()?;
        let settle = self.broker.resolve(id, response)?;
        self.sync();
        Ok(settle)
    }

    /// Cancel the shown intervention, go back, and show the next one
    ///
    /// # Errors
    /// - `HandoffError::NothingShown` if no intervention is on screen
    /// - `HandoffError::Broker` if the broker rejects the id
    pub fn dismiss(&mut self) -> Result<Settle, HandoffError> {
        let id = self.shown_id()?;
        let settle = self.broker.cancel(id)?;
        self.sync();
        Ok(settle)
    }

    fn shown_id(&self) -> Result<InterventionId, HandoffError> {
        self.showing
            .as_ref()
            .map(|s| s.intervention.id)
            .ok_or(HandoffError::NothingShown)
    }

    fn open(&mut self, intervention: Intervention) -> InterventionId {
        let id = intervention.id;
        let pane = Pane::new(intervention.request.short_description.clone());
        pane.set_back_target(self.nav.active_pane().as_ref());
        self.nav.navigate_to(&pane);
        tracing::debug!(intervention = %id, pane = %pane.id(), "showing intervention");

        self.showing = Some(Showing { intervention, pane });
        id
    }

    fn close(&mut self) -> Option<InterventionId> {
        let showing = self.showing.take()?;
        if self.nav.is_active(&showing.pane).get() {
            self.leave(&showing.pane);
        }
        self.nav.remove(showing.pane.id());
        tracing::debug!(intervention = %showing.intervention.id, "intervention taken down");
        Some(showing.intervention.id)
    }

    /// Navigate away from an intervention pane that is about to go
    ///
    /// Prefers the pane it was opened over, while that is still registered,
    /// and otherwise the most recently registered other pane.
    fn leave(&self, pane: &Pane) {
        let back = pane
            .back_pane()
            .filter(|target| self.nav.pane(target.id()).is_some());
        if back.is_some() {
            self.nav.go_back(pane);
            return;
        }
        match self.nav.panes().into_iter().rev().find(|p| p != pane) {
            Some(fallback) => {
                tracing::debug!(pane = %pane.id(), fallback = %fallback.id(), "back target gone");
                self.nav.navigate_to(&fallback);
            }
            None => tracing::debug!(pane = %pane.id(), "no pane to return to"),
        }
    }
}
