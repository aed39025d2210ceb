//! Testing utilities for the Handoff workspace
//!
//! Shared fixtures for brokers, requests and pane chains.

#![allow(missing_docs)]

use handoff_intervention::{
    InterventionBroker, InterventionKind, InterventionRequest, Resolution,
};
use handoff_navigation::{NavigationCoordinator, Pane};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One request of every kind, in a fixed order
pub fn sample_requests() -> Vec<InterventionRequest> {
    vec![
        InterventionRequest::confirmation("Overwrite existing output?"),
        InterventionRequest::yes_no("Retry failed transfer?"),
        InterventionRequest::choice("Pick a profile", ["default", "minimal", "full"]),
        InterventionRequest::new(
            InterventionKind::ManualFileSelection {
                suggested_name: "archive.7z".to_string(),
                url: Some("https://example.invalid/archive.7z".to_string()),
                expected_hash: None,
            },
            "Manual download required",
        )
        .with_details("The host does not allow direct downloads"),
        InterventionRequest::new(InterventionKind::Acknowledge, "Finished with warnings"),
    ]
}

/// Register `n` panes where each one's back target is the previous
///
/// Returns them in registration order; the first has no back target.
pub fn pane_chain(nav: &NavigationCoordinator, n: usize) -> Vec<Pane> {
    let mut panes: Vec<Pane> = Vec::with_capacity(n);
    for i in 0..n {
        let pane = nav.register(format!("pane {i}"));
        pane.set_back_target(panes.last());
        panes.push(pane);
    }
    panes
}

/// Raise `request` from a new OS thread, blocking it until resolved
pub fn spawn_blocking_worker(
    broker: &InterventionBroker,
    request: InterventionRequest,
) -> JoinHandle<Resolution> {
    let broker = broker.clone();
    thread::spawn(move || {
        broker
            .raise_blocking(request)
            .unwrap_or_else(|e| panic!("raise failed: {e}"))
    })
}

/// Longest [`wait_for_pending`] waits before failing the test
pub const PENDING_WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Block until the broker has at least `count` pending interventions
///
/// # Panics
/// If that does not happen within [`PENDING_WAIT_LIMIT`].
pub fn wait_for_pending(broker: &InterventionBroker, count: usize) {
    let deadline = Instant::now() + PENDING_WAIT_LIMIT;
    while broker.pending_count() < count {
        assert!(
            Instant::now() < deadline,
            "expected {count} pending interventions, found {} after {:?}",
            broker.pending_count(),
            PENDING_WAIT_LIMIT
        );
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_for_pending_returns_once_published() {
        let broker = InterventionBroker::new();
        let worker = spawn_blocking_worker(&broker, sample_requests().remove(0));
        wait_for_pending(&broker, 1);

        let id = broker.pending()[0].id;
        assert!(broker.cancel(id).unwrap().applied());
        assert!(worker.join().unwrap().is_cancelled());
    }

    #[test]
    #[should_panic(expected = "expected 1 pending interventions")]
    fn wait_for_pending_gives_up() {
        wait_for_pending(&InterventionBroker::new(), 1);
    }

    #[test]
    fn pane_chain_links_back_targets() {
        let nav = NavigationCoordinator::default();
        let panes = pane_chain(&nav, 3);
        assert_eq!(panes[0].back_target(), None);
        assert_eq!(panes[2].back_target(), Some(panes[1].id()));
    }
}
