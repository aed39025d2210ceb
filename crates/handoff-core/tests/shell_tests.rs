//! Shell Tests
//!
//! Worker threads blocking on interventions while the UI side shows them
//! as panes and navigates back once they are handled.

use handoff_core::prelude::*;
use handoff_core::ShellEvent;
use handoff_test_utils::{pane_chain, sample_requests, spawn_blocking_worker, wait_for_pending};
use pretty_assertions::assert_eq;

#[test]
fn test_worker_answer_round_trip() {
    let broker = InterventionBroker::new();
    let nav = NavigationCoordinator::default();
    let home = nav.register("home");
    nav.navigate_to(&home);
    let mut shell = InterventionShell::new(broker.clone(), nav.clone());

    let worker = spawn_blocking_worker(&broker, InterventionRequest::yes_no("Retry?"));
    wait_for_pending(&broker, 1);

    let ShellEvent::Opened(id) = shell.sync() else {
        panic!("expected an intervention to open");
    };
    assert_eq!(shell.current().map(|i| i.id), Some(id));
    assert_eq!(shell.current_pane().unwrap().title(), "Retry?");

    shell.respond(InterventionResponse::Answer(false)).unwrap();

    assert_eq!(
        worker.join().unwrap(),
        Resolution::Responded(InterventionResponse::Answer(false))
    );
    assert!(nav.is_active(&home).get());
    assert_eq!(nav.panes().len(), 1);
}

#[test]
fn test_queued_interventions_shown_in_order() {
    let broker = InterventionBroker::new();
    let nav = NavigationCoordinator::default();
    let panes = pane_chain(&nav, 2);
    nav.navigate_to(&panes[1]);
    let mut shell = InterventionShell::new(broker.clone(), nav.clone());

    let requests = sample_requests();
    let handles: Vec<_> = requests
        .iter()
        .take(3)
        .map(|r| broker.publish(r.clone()).unwrap())
        .collect();

    assert_eq!(shell.sync(), ShellEvent::Opened(handles[0].id()));
    shell.respond(InterventionResponse::Confirmed).unwrap();
    assert_eq!(shell.current().map(|i| i.id), Some(handles[1].id()));

    // Each intervention pane goes back to where the user was
    let pane = shell.current_pane().unwrap().clone();
    assert_eq!(pane.back_target(), Some(panes[1].id()));

    shell.dismiss().unwrap();
    assert_eq!(shell.current().map(|i| i.id), Some(handles[2].id()));
    shell.respond(InterventionResponse::Chosen(2)).unwrap();

    assert!(shell.current().is_none());
    assert!(nav.is_active(&panes[1]).get());

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.wait_blocking()).collect();
    assert_eq!(
        outcomes,
        vec![
            Resolution::Responded(InterventionResponse::Confirmed),
            Resolution::Cancelled(CancelReason::Requested),
            Resolution::Responded(InterventionResponse::Chosen(2)),
        ]
    );
}

#[test]
fn test_resolved_elsewhere_closes_pane() {
    let broker = InterventionBroker::new();
    let nav = NavigationCoordinator::default();
    let home = nav.register("home");
    nav.navigate_to(&home);
    let mut shell = InterventionShell::new(broker.clone(), nav.clone());

    let handle = broker
        .publish(InterventionRequest::confirmation("Proceed?"))
        .unwrap();
    assert_eq!(shell.sync(), ShellEvent::Opened(handle.id()));

    broker.cancel(handle.id()).unwrap();
    assert_eq!(shell.sync(), ShellEvent::Closed(handle.id()));
    assert!(nav.is_active(&home).get());

    assert!(matches!(
        shell.respond(InterventionResponse::Confirmed),
        Err(HandoffError::NothingShown)
    ));
}

#[test]
fn test_user_navigated_away_keeps_active_pane() {
    let broker = InterventionBroker::new();
    let nav = NavigationCoordinator::default();
    let home = nav.register("home");
    let other = nav.register("other");
    nav.navigate_to(&home);
    let mut shell = InterventionShell::new(broker.clone(), nav.clone());

    let handle = broker
        .publish(InterventionRequest::yes_no("Keep going?"))
        .unwrap();
    shell.sync();
    nav.navigate_to(&other);

    shell.respond(InterventionResponse::Answer(true)).unwrap();
    assert!(nav.is_active(&other).get());
    assert_eq!(
        handle.wait_blocking(),
        Resolution::Responded(InterventionResponse::Answer(true))
    );
}

#[test]
fn test_next_intervention_replaces_advanced_one() {
    let broker = InterventionBroker::new();
    let nav = NavigationCoordinator::default();
    let mut shell = InterventionShell::new(broker.clone(), nav.clone());

    let first = broker
        .publish(InterventionRequest::confirmation("First"))
        .unwrap();
    let second = broker
        .publish(InterventionRequest::confirmation("Second"))
        .unwrap();
    shell.sync();

    broker
        .resolve(first.id(), InterventionResponse::Confirmed)
        .unwrap();
    assert_eq!(
        shell.sync(),
        ShellEvent::Advanced {
            closed: first.id(),
            opened: second.id(),
        }
    );
    let second_id = second.id();
    drop(second);
    assert_eq!(shell.sync(), ShellEvent::Closed(second_id));
    assert_eq!(broker.stats().abandoned, 1);
}
