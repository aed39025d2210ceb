//! Pipeline simulator
//!
//! Drives the broker the way a real application does: worker threads run
//! pipeline stages and occasionally block on an intervention, while a
//! responder on the async side watches the pending feed and answers,
//! cancels, or ignores each one (ignored interventions run into the
//! timeout).
//!
//! The report checks that every raised intervention reached exactly one
//! outcome and that the broker drained.

use futures::StreamExt;
use handoff_intervention::{
    BrokerConfig, BrokerStats, CancelReason, Intervention, InterventionBroker, InterventionId,
    InterventionKind, InterventionRequest, InterventionResponse, Resolution,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of worker threads
    pub workers: usize,
    /// Stages run by each worker
    pub stages_per_worker: usize,
    /// Probability that a stage raises an intervention
    pub intervention_rate: f64,
    /// Probability that the responder cancels instead of answering
    pub cancel_rate: f64,
    /// Probability that the responder ignores an intervention
    pub ignore_rate: f64,
    /// Timeout applied to every raised intervention
    pub timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            workers: 4,
            stages_per_worker: 25,
            intervention_rate: 0.3,
            cancel_rate: 0.1,
            ignore_rate: 0.1,
            timeout: Duration::from_millis(50),
        }
    }
}

/// Parse a probability in `0.0..=1.0`
///
/// # Errors
/// Returns a message for text that is not a number, is not finite, or is
/// outside the range.
pub fn parse_rate(text: &str) -> Result<f64, String> {
    let rate: f64 = text
        .trim()
        .parse()
        .map_err(|e| format!("`{text}` is not a number: {e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("`{text}` is not a probability between 0 and 1"));
    }
    Ok(rate)
}

/// `rate` limited to `0.0..=1.0`; NaN counts as zero
fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

/// What the responder does with an intervention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer it
    Respond(InterventionResponse),
    /// Cancel it
    Cancel,
    /// Leave it to time out
    Ignore,
}

/// Stand-in for the human on the other side of the broker
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Decide what to do with a newly pending intervention
    async fn decide(&self, intervention: &Intervention) -> Decision;
}

/// Responder drawing decisions from a seeded RNG
#[derive(Debug)]
pub struct RandomResponder {
    rng: Mutex<StdRng>,
    cancel_rate: f64,
    ignore_rate: f64,
}

impl RandomResponder {
    /// Create responder
    #[must_use]
    pub fn new(seed: u64, cancel_rate: f64, ignore_rate: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            cancel_rate: probability(cancel_rate),
            ignore_rate: probability(ignore_rate),
        }
    }
}

#[async_trait::async_trait]
impl Responder for RandomResponder {
    async fn decide(&self, intervention: &Intervention) -> Decision {
        let mut rng = self.rng.lock();
        let roll: f64 = rng.gen();
        if roll < self.ignore_rate {
            Decision::Ignore
        } else if roll < self.ignore_rate + self.cancel_rate {
            Decision::Cancel
        } else {
            Decision::Respond(answer_for(intervention.kind(), &mut *rng))
        }
    }
}

/// A plausible answer for `kind`
pub fn answer_for(kind: &InterventionKind, rng: &mut impl Rng) -> InterventionResponse {
    match kind {
        InterventionKind::Confirmation => InterventionResponse::Confirmed,
        InterventionKind::YesNo => InterventionResponse::Answer(rng.gen()),
        InterventionKind::Choice { options } if !options.is_empty() => {
            InterventionResponse::Chosen(rng.gen_range(0..options.len()))
        }
        InterventionKind::Choice { .. } => InterventionResponse::Chosen(0),
        InterventionKind::ManualFileSelection { suggested_name, .. } => {
            InterventionResponse::File(PathBuf::from("downloads").join(suggested_name))
        }
        InterventionKind::Acknowledge => InterventionResponse::Acknowledged,
    }
}

fn request_for_stage(worker: usize, stage: usize, rng: &mut impl Rng) -> InterventionRequest {
    let summary = format!("worker {worker} stage {stage}");
    match rng.gen_range(0..5) {
        0 => InterventionRequest::confirmation(format!("{summary}: overwrite existing output?")),
        1 => InterventionRequest::yes_no(format!("{summary}: retry failed transfer?")),
        2 => InterventionRequest::choice(
            format!("{summary}: pick a profile"),
            ["default", "minimal", "full"],
        ),
        3 => InterventionRequest::new(
            InterventionKind::ManualFileSelection {
                suggested_name: format!("archive-{worker}-{stage}.7z"),
                url: Some(format!("https://example.invalid/files/{worker}/{stage}")),
                expected_hash: None,
            },
            format!("{summary}: manual download required"),
        ),
        _ => InterventionRequest::new(InterventionKind::Acknowledge, format!("{summary}: notice"))
            .with_details("Stage finished with warnings"),
    }
}

/// Outcome tally for one worker
#[derive(Debug, Default, Clone, Copy)]
struct WorkerTally {
    stages: u64,
    raised: u64,
    responded: u64,
    cancelled: u64,
    timed_out: u64,
    abandoned: u64,
}

impl WorkerTally {
    fn record(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Responded(_) => self.responded += 1,
            Resolution::Cancelled(CancelReason::TimedOut) => self.timed_out += 1,
            Resolution::Cancelled(CancelReason::Abandoned) => self.abandoned += 1,
            Resolution::Cancelled(CancelReason::Requested | CancelReason::Shutdown) => {
                self.cancelled += 1;
            }
        }
    }

    fn merge(&mut self, other: WorkerTally) {
        self.stages += other.stages;
        self.raised += other.raised;
        self.responded += other.responded;
        self.cancelled += other.cancelled;
        self.timed_out += other.timed_out;
        self.abandoned += other.abandoned;
    }
}

/// Simulation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed used
    pub seed: u64,
    /// Stages executed across all workers
    pub stages_run: u64,
    /// Interventions raised by workers
    pub interventions_raised: u64,
    /// Worker saw a response
    pub responded: u64,
    /// Worker saw a cancellation
    pub cancelled: u64,
    /// Worker's wait timed out
    pub timed_out: u64,
    /// Worker's wait was abandoned
    pub abandoned: u64,
    /// Interventions still pending when workers finished
    pub pending_after: usize,
    /// Worker-side counts disagreeing with broker statistics
    pub mismatches: Vec<String>,
    /// Wall time
    pub elapsed_ms: u64,
}

impl SimulationReport {
    /// Every intervention reached exactly one outcome and the broker drained
    #[must_use]
    pub fn passed(&self) -> bool {
        self.pending_after == 0
            && self.mismatches.is_empty()
            && self.interventions_raised
                == self.responded + self.cancelled + self.timed_out + self.abandoned
    }

    /// Human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Simulation Report:\n");
        out.push_str(&format!("  Seed: {}\n", self.seed));
        out.push_str(&format!("  Stages: {}\n", self.stages_run));
        out.push_str(&format!("  Interventions: {}\n", self.interventions_raised));
        out.push_str(&format!("    Responded: {}\n", self.responded));
        out.push_str(&format!("    Cancelled: {}\n", self.cancelled));
        out.push_str(&format!("    Timed out: {}\n", self.timed_out));
        out.push_str(&format!("    Abandoned: {}\n", self.abandoned));
        out.push_str(&format!("  Pending after run: {}\n", self.pending_after));
        for mismatch in &self.mismatches {
            out.push_str(&format!("  MISMATCH: {mismatch}\n"));
        }
        out.push_str(&format!("  Elapsed: {}ms\n", self.elapsed_ms));
        out.push_str(&format!(
            "  Status: {}\n",
            if self.passed() { "PASSED" } else { "FAILED" }
        ));
        out
    }

    fn compare(&mut self, stats: &BrokerStats) {
        let pairs = [
            ("published", self.interventions_raised, stats.published),
            ("responded", self.responded, stats.responded),
            ("cancelled", self.cancelled, stats.cancelled),
            ("timed_out", self.timed_out, stats.timed_out),
            ("abandoned", self.abandoned, stats.abandoned),
        ];
        for (name, workers, broker) in pairs {
            if workers != broker {
                self.mismatches
                    .push(format!("{name}: workers saw {workers}, broker counted {broker}"));
            }
        }
    }
}

/// Answer interventions from the pending feed until it ends
pub async fn respond_from_feed<R: Responder + ?Sized>(broker: InterventionBroker, responder: &R) {
    let mut feed = broker.pending_sequence();
    let mut seen: HashSet<InterventionId> = HashSet::new();

    while let Some(snapshot) = feed.next().await {
        seen.retain(|id| snapshot.iter().any(|i| i.id == *id));
        for intervention in snapshot {
            if !seen.insert(intervention.id) {
                continue;
            }
            let settled = match responder.decide(&intervention).await {
                Decision::Respond(response) => broker.resolve(intervention.id, response),
                Decision::Cancel => broker.cancel(intervention.id),
                Decision::Ignore => continue,
            };
            if let Err(e) = settled {
                tracing::error!(intervention = %intervention.id, error = %e, "responder misused broker");
            }
        }
    }
}

/// Run the simulation
pub async fn simulate(config: SimulationConfig) -> SimulationReport {
    let start = Instant::now();
    let broker =
        InterventionBroker::with_config(BrokerConfig::new().with_default_timeout(config.timeout));
    tracing::info!(
        seed = config.seed,
        workers = config.workers,
        stages = config.stages_per_worker,
        "starting simulation"
    );

    let responder = {
        let broker = broker.clone();
        let responder = RandomResponder::new(
            config.seed.wrapping_add(u64::MAX / 2),
            config.cancel_rate,
            config.ignore_rate,
        );
        tokio::spawn(async move { respond_from_feed(broker, &responder).await })
    };

    let workers: Vec<_> = (0..config.workers)
        .map(|worker| {
            let broker = broker.clone();
            let config = config.clone();
            tokio::task::spawn_blocking(move || run_worker(&broker, worker, &config))
        })
        .collect();

    let mut tally = WorkerTally::default();
    for worker in workers {
        match worker.await {
            Ok(worker_tally) => tally.merge(worker_tally),
            Err(e) => tracing::error!(error = %e, "worker failed"),
        }
    }

    let pending_after = broker.pending_count();
    responder.abort();

    let mut report = SimulationReport {
        seed: config.seed,
        stages_run: tally.stages,
        interventions_raised: tally.raised,
        responded: tally.responded,
        cancelled: tally.cancelled,
        timed_out: tally.timed_out,
        abandoned: tally.abandoned,
        pending_after,
        mismatches: Vec::new(),
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    report.compare(&broker.stats());
    tracing::info!(passed = report.passed(), "simulation finished");
    report
}

fn run_worker(broker: &InterventionBroker, worker: usize, config: &SimulationConfig) -> WorkerTally {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(worker as u64));
    let mut tally = WorkerTally::default();
    let rate = probability(config.intervention_rate);

    for stage in 0..config.stages_per_worker {
        tally.stages += 1;
        if !rng.gen_bool(rate) {
            continue;
        }
        let request = request_for_stage(worker, stage, &mut rng);
        match broker.raise_blocking(request) {
            Ok(resolution) => {
                tally.raised += 1;
                tally.record(&resolution);
            }
            Err(e) => tracing::warn!(worker, stage, error = %e, "could not raise intervention"),
        }
    }
    tally
}
