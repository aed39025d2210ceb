//! Pending-intervention feed for watchers
//!
//! Yields the current pending snapshot immediately, then a fresh snapshot
//! whenever the pending set changes. Bursts of changes between polls are
//! coalesced into the latest snapshot. The feed ends once every broker
//! clone and every outstanding `InterventionHandle` has been dropped, since
//! handles share the broker's state.

use crate::broker::PendingSnapshot;
use crate::types::Intervention;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;

/// Stream of pending snapshots, in publication order
pub struct PendingFeed {
    inner: BoxStream<'static, Vec<Intervention>>,
}

impl PendingFeed {
    pub(crate) fn new(rx: watch::Receiver<PendingSnapshot>) -> Self {
        let inner = futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let snapshot = rx.borrow_and_update().to_vec();
            Some((snapshot, (rx, false)))
        })
        .boxed();
        Self { inner }
    }
}

impl std::fmt::Debug for PendingFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFeed").finish_non_exhaustive()
    }
}

impl Stream for PendingFeed {
    type Item = Vec<Intervention>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{InterventionRequest, InterventionResponse};
    use crate::InterventionBroker;
    use futures::StreamExt;

    #[tokio::test]
    async fn feed_starts_with_current_snapshot() {
        let broker = InterventionBroker::new();
        let a = broker
            .publish(InterventionRequest::confirmation("a"))
            .unwrap();

        let mut feed = broker.pending_sequence();
        let first = feed.next().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, a.id());
    }

    #[tokio::test]
    async fn feed_follows_changes() {
        let broker = InterventionBroker::new();
        let mut feed = broker.pending_sequence();
        assert!(feed.next().await.unwrap().is_empty());

        let a = broker
            .publish(InterventionRequest::confirmation("a"))
            .unwrap();
        let snapshot = feed.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        broker.resolve(a.id(), InterventionResponse::Confirmed).unwrap();
        let snapshot = feed.next().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn feed_ends_when_broker_dropped() {
        let broker = InterventionBroker::new();
        let mut feed = broker.pending_sequence();
        assert!(feed.next().await.is_some());

        drop(broker);
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn outstanding_handle_keeps_feed_open() {
        let broker = InterventionBroker::new();
        let handle = broker
            .publish(InterventionRequest::confirmation("a"))
            .unwrap();
        let mut feed = broker.pending_sequence();
        assert_eq!(feed.next().await.unwrap().len(), 1);

        drop(broker);
        let still_open =
            tokio::time::timeout(std::time::Duration::from_millis(20), feed.next()).await;
        assert!(still_open.is_err());

        // Dropping the last handle abandons it and closes the feed
        drop(handle);
        let rest: Vec<Vec<_>> = feed.collect().await;
        assert!(rest.iter().all(Vec::is_empty));
    }
}
