//! Broker Tests
//!
//! Cross-thread handoff, race resolution and pending-set properties.

use handoff_intervention::prelude::*;
use handoff_intervention::BrokerError;
use proptest::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Resolve(bool),
    Cancel,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<bool>().prop_map(Op::Resolve), Just(Op::Cancel)]
}

#[test]
fn test_worker_receives_concurrent_response() {
    let broker = InterventionBroker::new();
    let handle = broker
        .publish(InterventionRequest::yes_no("Replace modified files?"))
        .unwrap();
    let id = handle.id();

    let worker = thread::spawn(move || handle.wait_blocking());

    let responder = {
        let broker = broker.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            broker.resolve(id, InterventionResponse::Text("yes".into()))
        })
    };

    assert_eq!(responder.join().unwrap().unwrap(), Settle::Applied);
    assert_eq!(
        worker.join().unwrap(),
        Resolution::Responded(InterventionResponse::Text("yes".into()))
    );

    // Late cancel changes nothing
    assert_eq!(broker.cancel(id).unwrap(), Settle::AlreadyHandled);
    assert_eq!(broker.stats().responded, 1);
    assert_eq!(broker.stats().cancelled, 0);
}

#[test]
fn test_racing_resolutions_have_single_winner() {
    for _ in 0..50 {
        let broker = InterventionBroker::new();
        let handle = broker
            .publish(InterventionRequest::confirmation("Continue install?"))
            .unwrap();
        let id = handle.id();
        let barrier = Arc::new(Barrier::new(2));

        let resolver = {
            let broker = broker.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                broker.resolve(id, InterventionResponse::Confirmed).unwrap()
            })
        };
        let canceller = {
            let broker = broker.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                broker.cancel(id).unwrap()
            })
        };

        let resolved = resolver.join().unwrap();
        let cancelled = canceller.join().unwrap();
        assert_ne!(resolved.applied(), cancelled.applied());

        let outcome = handle.wait_blocking();
        if resolved.applied() {
            assert_eq!(outcome, Resolution::Responded(InterventionResponse::Confirmed));
        } else {
            assert_eq!(outcome, Resolution::Cancelled(CancelReason::Requested));
        }
    }
}

#[test]
fn test_worker_panic_abandons_intervention() {
    let broker = InterventionBroker::new();
    let (tx, rx) = std::sync::mpsc::channel();

    let worker = {
        let broker = broker.clone();
        thread::spawn(move || {
            let handle = broker
                .publish(InterventionRequest::confirmation("never answered"))
                .unwrap();
            tx.send(handle.id()).unwrap();
            panic!("pipeline stage failed");
        })
    };

    let id = rx.recv().unwrap();
    assert!(worker.join().is_err());
    assert!(broker.is_handled(id).unwrap());
    assert!(broker.pending().is_empty());
    assert_eq!(broker.stats().abandoned, 1);
}

#[tokio::test]
async fn test_aborted_task_abandons_intervention() {
    let broker = InterventionBroker::new();
    let handle = broker
        .publish(InterventionRequest::confirmation("wait forever"))
        .unwrap();
    let id = handle.id();

    let task = tokio::spawn(async move { handle.wait().await });
    tokio::task::yield_now().await;
    task.abort();
    let _ = task.await;

    assert!(broker.is_handled(id).unwrap());
    assert_eq!(broker.stats().abandoned, 1);
}

#[tokio::test]
async fn test_raise_with_default_timeout() {
    let broker = InterventionBroker::with_config(
        BrokerConfig::new().with_default_timeout(Duration::from_millis(20)),
    );

    let resolution = broker
        .raise(InterventionRequest::confirmation("nobody is watching"))
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Cancelled(CancelReason::TimedOut));
    assert_eq!(broker.pending_count(), 0);
}

#[tokio::test]
async fn test_raise_answered_from_feed() {
    use futures::StreamExt;

    let broker = InterventionBroker::new();
    let responder = {
        let broker = broker.clone();
        tokio::spawn(async move {
            let mut feed = broker.pending_sequence();
            while let Some(snapshot) = feed.next().await {
                if let Some(front) = snapshot.first() {
                    return broker.resolve(front.id, InterventionResponse::Chosen(1));
                }
            }
            unreachable!("feed ended before an intervention appeared")
        })
    };

    let resolution = broker
        .raise(InterventionRequest::choice("Pick", ["a", "b"]))
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Responded(InterventionResponse::Chosen(1)));
    assert_eq!(responder.await.unwrap().unwrap(), Settle::Applied);
}

#[test]
fn test_raise_blocking_saturated() {
    let broker = InterventionBroker::with_config(BrokerConfig::new().with_max_pending(0));
    let err = broker
        .raise_blocking(InterventionRequest::confirmation("x"))
        .unwrap_err();
    assert_eq!(err, BrokerError::Saturated { limit: 0 });
}

proptest! {
    #[test]
    fn prop_first_resolution_decides_outcome(ops in prop::collection::vec(op_strategy(), 1..8)) {
        let broker = InterventionBroker::new();
        let handle = broker.publish(InterventionRequest::yes_no("q")).unwrap();
        let id = handle.id();

        let settles: Vec<Settle> = ops
            .iter()
            .map(|op| match op {
                Op::Resolve(answer) => broker.resolve(id, InterventionResponse::Answer(*answer)).unwrap(),
                Op::Cancel => broker.cancel(id).unwrap(),
            })
            .collect();

        prop_assert_eq!(settles[0], Settle::Applied);
        prop_assert!(settles[1..].iter().all(|s| *s == Settle::AlreadyHandled));

        let expected = match &ops[0] {
            Op::Resolve(answer) => Resolution::Responded(InterventionResponse::Answer(*answer)),
            Op::Cancel => Resolution::Cancelled(CancelReason::Requested),
        };
        prop_assert_eq!(handle.wait_blocking(), expected);
    }

    #[test]
    fn prop_pending_never_contains_handled(
        count in 1usize..12,
        resolved in prop::collection::vec(any::<bool>(), 12),
    ) {
        let broker = InterventionBroker::new();
        let handles: Vec<_> = (0..count)
            .map(|i| broker.publish(InterventionRequest::confirmation(format!("step {i}"))).unwrap())
            .collect();

        for (handle, resolve) in handles.iter().zip(&resolved) {
            if *resolve {
                broker.cancel(handle.id()).unwrap();
            }
        }

        let pending = broker.pending();
        for intervention in &pending {
            prop_assert!(!broker.is_handled(intervention.id).unwrap());
        }
        for handle in &handles {
            let listed = pending.iter().any(|i| i.id == handle.id());
            prop_assert_eq!(listed, !handle.is_handled());
        }
        let expected = resolved.iter().take(count).filter(|r| !**r).count();
        prop_assert_eq!(pending.len(), expected);

        // Publication order is preserved among the survivors
        let seqs: Vec<u64> = pending.iter().map(|i| i.id.seq).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        prop_assert_eq!(seqs, sorted);
    }
}
