//! Simulation Tests
//!
//! Seeded pipeline runs must account for every intervention and drain.

use handoff_core::simulation::{respond_from_feed, Decision, Responder};
use handoff_core::{simulate, SimulationConfig};
use handoff_intervention::{Intervention, InterventionBroker, InterventionResponse, Resolution};
use handoff_test_utils::sample_requests;
use std::time::Duration;

struct ConfirmAll;

#[async_trait::async_trait]
impl Responder for ConfirmAll {
    async fn decide(&self, _intervention: &Intervention) -> Decision {
        Decision::Respond(InterventionResponse::Acknowledged)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_seeded_run_passes() {
    let report = simulate(SimulationConfig {
        seed: 7,
        workers: 3,
        stages_per_worker: 12,
        intervention_rate: 0.4,
        timeout: Duration::from_millis(25),
        ..SimulationConfig::default()
    })
    .await;

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stages_run, 36);
    assert_eq!(report.pending_after, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_interventions() {
    let report = simulate(SimulationConfig {
        intervention_rate: 0.0,
        ..SimulationConfig::default()
    })
    .await;

    assert!(report.passed());
    assert_eq!(report.interventions_raised, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_custom_responder_answers_everything() {
    let broker = InterventionBroker::new();
    let responder = tokio::spawn({
        let broker = broker.clone();
        async move { respond_from_feed(broker, &ConfirmAll).await }
    });

    let mut waits = Vec::new();
    for request in sample_requests() {
        let handle = broker.publish(request).unwrap();
        waits.push(handle.wait_timeout(Duration::from_secs(5)));
    }
    for wait in waits {
        assert_eq!(
            wait.await,
            Resolution::Responded(InterventionResponse::Acknowledged)
        );
    }

    responder.abort();
    assert_eq!(broker.stats().responded, 5);
}
