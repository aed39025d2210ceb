//! Worker-side handle to a published intervention

use crate::broker::Shared;
use crate::slot::Slot;
use crate::types::{CancelReason, InterventionId, Resolution, Settle};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle a worker waits on
///
/// Dropping a handle before its intervention is handled cancels the
/// intervention with [`CancelReason::Abandoned`]. This covers a worker
/// thread unwinding and an async wait being aborted.
#[derive(Debug)]
#[must_use = "dropping the handle abandons the intervention"]
pub struct InterventionHandle {
    id: InterventionId,
    slot: Arc<Slot>,
    shared: Arc<Shared>,
}

impl InterventionHandle {
    pub(crate) fn new(id: InterventionId, slot: Arc<Slot>, shared: Arc<Shared>) -> Self {
        Self { id, slot, shared }
    }

    /// Intervention id to hand to the responder
    #[inline]
    #[must_use]
    pub fn id(&self) -> InterventionId {
        self.id
    }

    /// Whether a resolution has been recorded
    #[inline]
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.slot.is_settled()
    }

    /// Resolution, if already recorded
    #[must_use]
    pub fn try_resolution(&self) -> Option<Resolution> {
        self.slot.peek()
    }

    /// Cancel the intervention from the worker side
    ///
    /// Waiters observe [`CancelReason::Requested`]. Returns
    /// `Settle::AlreadyHandled` if a resolution was already recorded.
    pub fn cancel(&self) -> Settle {
        // The id was issued by this handle's own broker, so settling cannot
        // fail with `UnknownHandle`.
        self.shared
            .settle(self.id, Resolution::Cancelled(CancelReason::Requested))
            .unwrap_or(Settle::AlreadyHandled)
    }

    /// Wait for the resolution
    pub async fn wait(self) -> Resolution {
        self.slot.wait().await
    }

    /// Wait for the resolution, cancelling with `TimedOut` after `timeout`
    ///
    /// A response that wins the race against the timeout is returned.
    pub async fn wait_timeout(self, timeout: Duration) -> Resolution {
        match tokio::time::timeout(timeout, self.slot.wait()).await {
            Ok(resolution) => resolution,
            Err(_) => self.expire(),
        }
    }

    /// Park the current thread until the resolution arrives
    ///
    /// Must not be called from inside an async task.
    #[must_use]
    pub fn wait_blocking(self) -> Resolution {
        self.slot.wait_blocking()
    }

    /// Blocking wait with timeout
    #[must_use]
    pub fn wait_blocking_timeout(self, timeout: Duration) -> Resolution {
        match self.slot.wait_blocking_until(Instant::now() + timeout) {
            Some(resolution) => resolution,
            None => self.expire(),
        }
    }

    fn expire(&self) -> Resolution {
        // Unknown is impossible: our own broker issued this id.
        let _ = self
            .shared
            .settle(self.id, Resolution::Cancelled(CancelReason::TimedOut));
        self.slot
            .peek()
            .unwrap_or(Resolution::Cancelled(CancelReason::TimedOut))
    }
}

impl Drop for InterventionHandle {
    fn drop(&mut self) {
        if !self.slot.is_settled() {
            let _ = self
                .shared
                .settle(self.id, Resolution::Cancelled(CancelReason::Abandoned));
        }
    }
}
