//! Intervention broker
//!
//! Decouples a blocked worker from a human-paced responder:
//! - Workers publish requests and wait on the returned handle
//! - Responders enumerate pending interventions and resolve or cancel them
//! - The first resolution wins; later ones are silent no-ops
//!
//! Handled records are dropped from the pending set immediately. Staleness
//! is decided from the id's sequence number alone.

use crate::error::BrokerError;
use crate::feed::PendingFeed;
use crate::handle::InterventionHandle;
use crate::slot::Slot;
use crate::types::{
    BrokerConfig, BrokerId, BrokerStats, CancelReason, Intervention, InterventionId,
    InterventionRequest, InterventionResponse, Resolution, Settle,
};
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot type carried by the pending feed
pub(crate) type PendingSnapshot = Arc<[Intervention]>;

#[derive(Debug)]
struct Entry {
    record: Intervention,
    slot: Arc<Slot>,
}

#[derive(Debug, Default)]
struct BrokerState {
    next_seq: u64,
    /// Unhandled interventions in publication order
    pending: IndexMap<u64, Entry>,
    stats: BrokerStats,
}

impl BrokerState {
    fn snapshot(&self) -> PendingSnapshot {
        self.pending
            .values()
            .map(|e| e.record.clone())
            .collect::<Vec<_>>()
            .into()
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    id: BrokerId,
    config: BrokerConfig,
    state: Mutex<BrokerState>,
    feed: watch::Sender<PendingSnapshot>,
}

impl Shared {
    fn check_issued(&self, id: InterventionId, next_seq: u64) -> Result<(), BrokerError> {
        if id.broker != self.id || id.seq >= next_seq {
            tracing::warn!(intervention = %id, broker = %self.id, "unknown intervention handle");
            return Err(BrokerError::UnknownHandle(id));
        }
        Ok(())
    }

    /// Record the outcome for `id` if it is still pending
    pub(crate) fn settle(
        &self,
        id: InterventionId,
        resolution: Resolution,
    ) -> Result<Settle, BrokerError> {
        let mut state = self.state.lock();
        self.check_issued(id, state.next_seq)?;

        let Some(entry) = state.pending.shift_remove(&id.seq) else {
            tracing::debug!(intervention = %id, "intervention already handled");
            return Ok(Settle::AlreadyHandled);
        };

        match &resolution {
            Resolution::Responded(_) => state.stats.responded += 1,
            Resolution::Cancelled(CancelReason::TimedOut) => state.stats.timed_out += 1,
            Resolution::Cancelled(CancelReason::Abandoned) => state.stats.abandoned += 1,
            Resolution::Cancelled(CancelReason::Requested | CancelReason::Shutdown) => {
                state.stats.cancelled += 1;
            }
        }

        match &resolution {
            Resolution::Responded(_) => {
                tracing::info!(intervention = %id, kind = entry.record.kind().label(), "intervention resolved");
            }
            Resolution::Cancelled(CancelReason::Abandoned) => {
                tracing::warn!(intervention = %id, kind = entry.record.kind().label(), "intervention abandoned by its worker");
            }
            Resolution::Cancelled(reason) => {
                tracing::info!(intervention = %id, kind = entry.record.kind().label(), %reason, "intervention cancelled");
            }
        }

        entry.slot.settle(resolution);
        self.feed.send_replace(state.snapshot());
        Ok(Settle::Applied)
    }
}

/// Broker shared between workers and the responder
///
/// Cloning is cheap; all clones refer to the same pending set.
#[derive(Debug, Clone)]
pub struct InterventionBroker {
    shared: Arc<Shared>,
}

impl InterventionBroker {
    /// Create broker with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create broker with custom configuration
    #[must_use]
    pub fn with_config(config: BrokerConfig) -> Self {
        let (feed, _) = watch::channel(PendingSnapshot::from(Vec::new()));
        Self {
            shared: Arc::new(Shared {
                id: BrokerId::new(),
                config,
                state: Mutex::new(BrokerState::default()),
                feed,
            }),
        }
    }

    /// Broker identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> BrokerId {
        self.shared.id
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.shared.config
    }

    /// Register a new intervention and return the handle to wait on
    ///
    /// Never blocks.
    ///
    /// # Errors
    /// - `BrokerError::Saturated` if `max_pending` interventions are unhandled
    pub fn publish(&self, request: InterventionRequest) -> Result<InterventionHandle, BrokerError> {
        let mut state = self.shared.state.lock();
        if state.pending.len() >= self.shared.config.max_pending {
            tracing::warn!(limit = self.shared.config.max_pending, "intervention broker saturated");
            return Err(BrokerError::Saturated {
                limit: self.shared.config.max_pending,
            });
        }

        let id = InterventionId {
            broker: self.shared.id,
            seq: state.next_seq,
        };
        state.next_seq += 1;

        let record = Intervention {
            id,
            request,
            created_at: Utc::now(),
        };
        tracing::debug!(
            intervention = %id,
            kind = record.kind().label(),
            summary = %record.request.short_description,
            "intervention published"
        );

        let slot = Arc::new(Slot::new());
        state.pending.insert(
            id.seq,
            Entry {
                record,
                slot: Arc::clone(&slot),
            },
        );
        state.stats.published += 1;
        self.shared.feed.send_replace(state.snapshot());
        drop(state);

        Ok(InterventionHandle::new(id, slot, Arc::clone(&self.shared)))
    }

    /// Suspend until the handle's intervention is handled
    ///
    /// # Errors
    /// - `BrokerError::UnknownHandle` if the handle came from another broker
    pub async fn await_resolution(
        &self,
        handle: InterventionHandle,
    ) -> Result<Resolution, BrokerError> {
        if handle.id().broker != self.shared.id {
            return Err(BrokerError::UnknownHandle(handle.id()));
        }
        Ok(handle.wait().await)
    }

    /// Publish and wait, applying the configured default timeout
    ///
    /// # Errors
    /// - `BrokerError::Saturated` if the request cannot be published
    pub async fn raise(&self, request: InterventionRequest) -> Result<Resolution, BrokerError> {
        let handle = self.publish(request)?;
        Ok(match self.shared.config.default_timeout {
            Some(timeout) => handle.wait_timeout(timeout).await,
            None => handle.wait().await,
        })
    }

    /// Blocking variant of [`raise`](Self::raise) for plain worker threads
    ///
    /// # Errors
    /// - `BrokerError::Saturated` if the request cannot be published
    pub fn raise_blocking(&self, request: InterventionRequest) -> Result<Resolution, BrokerError> {
        let handle = self.publish(request)?;
        Ok(match self.shared.config.default_timeout {
            Some(timeout) => handle.wait_blocking_timeout(timeout),
            None => handle.wait_blocking(),
        })
    }

    /// Answer an intervention
    ///
    /// Returns `Settle::AlreadyHandled` if another resolution won the race.
    ///
    /// # Errors
    /// - `BrokerError::UnknownHandle` if the id was never issued here
    pub fn resolve(
        &self,
        id: InterventionId,
        response: InterventionResponse,
    ) -> Result<Settle, BrokerError> {
        self.shared.settle(id, Resolution::Responded(response))
    }

    /// Cancel an intervention
    ///
    /// # Errors
    /// - `BrokerError::UnknownHandle` if the id was never issued here
    pub fn cancel(&self, id: InterventionId) -> Result<Settle, BrokerError> {
        self.shared
            .settle(id, Resolution::Cancelled(CancelReason::Requested))
    }

    /// Cancel every pending intervention; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<InterventionId> = self
            .shared
            .state
            .lock()
            .pending
            .values()
            .map(|e| e.record.id)
            .collect();

        ids.into_iter()
            .filter(|id| {
                matches!(
                    self.shared
                        .settle(*id, Resolution::Cancelled(CancelReason::Shutdown)),
                    Ok(Settle::Applied)
                )
            })
            .count()
    }

    /// Unhandled interventions in publication order
    #[must_use]
    pub fn pending(&self) -> Vec<Intervention> {
        self.shared
            .state
            .lock()
            .pending
            .values()
            .map(|e| e.record.clone())
            .collect()
    }

    /// Continuously updated feed of pending snapshots
    #[must_use]
    pub fn pending_sequence(&self) -> PendingFeed {
        PendingFeed::new(self.shared.feed.subscribe())
    }

    /// Look up a pending intervention
    #[must_use]
    pub fn get(&self, id: InterventionId) -> Option<Intervention> {
        if id.broker != self.shared.id {
            return None;
        }
        self.shared
            .state
            .lock()
            .pending
            .get(&id.seq)
            .map(|e| e.record.clone())
    }

    /// Whether the intervention has been handled
    ///
    /// # Errors
    /// - `BrokerError::UnknownHandle` if the id was never issued here
    pub fn is_handled(&self, id: InterventionId) -> Result<bool, BrokerError> {
        let state = self.shared.state.lock();
        self.shared.check_issued(id, state.next_seq)?;
        Ok(!state.pending.contains_key(&id.seq))
    }

    /// Number of unhandled interventions
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Get broker statistics
    #[must_use]
    pub fn stats(&self) -> BrokerStats {
        let state = self.shared.state.lock();
        BrokerStats {
            pending: state.pending.len(),
            ..state.stats.clone()
        }
    }
}

impl Default for InterventionBroker {
    fn default() -> Self {
        Self::new()
    }
}
