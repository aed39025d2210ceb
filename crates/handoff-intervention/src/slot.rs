//! Set-once resolution cell shared by a broker entry and its waiter
//!
//! Blocking waiters park on a condition variable, async waiters on a
//! notifier. Both re-check the cell after every wake.

use crate::types::Resolution;
use parking_lot::{Condvar, Mutex};
use std::time::Instant;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct Slot {
    state: Mutex<Option<Resolution>>,
    ready: Condvar,
    notify: Notify,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store the resolution; returns false if one was already stored
    pub(crate) fn settle(&self, resolution: Resolution) -> bool {
        {
            let mut state = self.state.lock();
            if state.is_some() {
                return false;
            }
            *state = Some(resolution);
        }
        self.ready.notify_all();
        self.notify.notify_waiters();
        true
    }

    pub(crate) fn peek(&self) -> Option<Resolution> {
        self.state.lock().clone()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.state.lock().is_some()
    }

    pub(crate) fn wait_blocking(&self) -> Resolution {
        let mut state = self.state.lock();
        loop {
            if let Some(resolution) = state.as_ref() {
                return resolution.clone();
            }
            self.ready.wait(&mut state);
        }
    }

    /// Wait until settled or `deadline` passes
    pub(crate) fn wait_blocking_until(&self, deadline: Instant) -> Option<Resolution> {
        let mut state = self.state.lock();
        loop {
            if let Some(resolution) = state.as_ref() {
                return Some(resolution.clone());
            }
            if self.ready.wait_until(&mut state, deadline).timed_out() {
                return state.clone();
            }
        }
    }

    pub(crate) async fn wait(&self) -> Resolution {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register before checking so a settle between the check and the
            // await still wakes us.
            notified.as_mut().enable();
            if let Some(resolution) = self.peek() {
                return resolution;
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }
}
