//! The background dynamics cycle: decay, feedback flush, wisdom synthesis,
//! attractor dynamics, prune, tier rebalance, and periodic checkpoint, run
//! in that order on an interval by a dedicated scheduler thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::external::Summarizer;
use crate::index::Indices;
use crate::storage::TieredStore;

use super::attractor::{self, Attractor};
use super::decay;
use super::feedback::FeedbackQueue;
use super::prune;

use crate::error::Result;

/// Multiple of `decay_interval_ms` a node may sit untouched in Hot before
/// becoming eligible for demotion to Warm.
pub const HOT_AGE_MULTIPLIER: i64 = 10;
/// Same, for Warm -> Cold.
pub const WARM_AGE_MULTIPLIER: i64 = 100;

/// Summary of one dynamics cycle, logged and returned to callers that invoke
/// it explicitly (mirrors the teacher's `ConsolidationResult`/`RecoveryReport`
/// style summary types).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub decayed: usize,
    pub truth_maintained: usize,
    pub feedback_applied: usize,
    pub synthesized: usize,
    pub settled: usize,
    pub pruned: usize,
    pub demoted_to_warm: usize,
    pub demoted_to_cold: usize,
    pub checkpointed: bool,
}

/// Runs exactly one cycle, in the order spec'd: decay, feedback flush,
/// wisdom synthesis, attractor dynamics, prune, tier rebalance, and an
/// optional checkpoint.
pub fn run_cycle(
    store: &TieredStore,
    indices: &mut Indices,
    feedback: &FeedbackQueue,
    summarizer: &dyn Summarizer,
    decay_interval_ms: u64,
    prune_threshold: f32,
    skip_bm25: bool,
    do_checkpoint: bool,
) -> Result<CycleReport> {
    let mut report = CycleReport::default();

    report.decayed = decay::run_decay(store, decay_interval_ms as i64)?;
    report.truth_maintained = decay::run_truth_maintenance(store)?;

    let aggregated = feedback.drain_aggregated();
    for (id, delta) in &aggregated {
        store.apply_confidence_evidence(id, *delta)?;
    }
    report.feedback_applied = aggregated.len();

    report.synthesized = super::wisdom::synthesize_wisdom(store, indices, summarizer, skip_bm25)?;

    let attractors: Vec<Attractor> = attractor::find_attractors(store, indices)?;
    report.settled = attractor::run_attractor_dynamics(store, &attractors, 0.1)?;

    report.pruned = prune::run_prune(store, indices, prune_threshold)?;

    let hot_age_ms = decay_interval_ms as i64 * HOT_AGE_MULTIPLIER;
    let warm_age_ms = decay_interval_ms as i64 * WARM_AGE_MULTIPLIER;
    let (demoted_to_warm, demoted_to_cold) = store.rebalance_tiers(hot_age_ms, warm_age_ms)?;
    report.demoted_to_warm = demoted_to_warm;
    report.demoted_to_cold = demoted_to_cold;

    if do_checkpoint {
        store.checkpoint()?;
        report.checkpointed = true;
    }

    info!(
        decayed = report.decayed,
        truth_maintained = report.truth_maintained,
        feedback_applied = report.feedback_applied,
        synthesized = report.synthesized,
        settled = report.settled,
        pruned = report.pruned,
        demoted_to_warm = report.demoted_to_warm,
        demoted_to_cold = report.demoted_to_cold,
        checkpointed = report.checkpointed,
        "dynamics cycle complete"
    );

    Ok(report)
}

/// Owns the background thread driving [`run_cycle`] at `decay_interval_ms`,
/// checkpointing every `checkpoint_interval_ms`.
pub struct Scheduler {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        store: Arc<TieredStore>,
        indices: Arc<RwLock<Indices>>,
        feedback: Arc<FeedbackQueue>,
        summarizer: Arc<dyn Summarizer>,
        decay_interval_ms: u64,
        checkpoint_interval_ms: u64,
        prune_threshold: f32,
        skip_bm25: bool,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let last_checkpoint = Mutex::new(std::time::Instant::now());

        let handle = std::thread::spawn(move || {
            while !stop_clone.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(decay_interval_ms.max(1)));
                if stop_clone.load(Ordering::SeqCst) {
                    break;
                }
                let do_checkpoint = {
                    let mut last = last_checkpoint.lock().unwrap_or_else(|e| e.into_inner());
                    if last.elapsed() >= Duration::from_millis(checkpoint_interval_ms.max(1)) {
                        *last = std::time::Instant::now();
                        true
                    } else {
                        false
                    }
                };
                let mut guard = match indices.write() {
                    Ok(g) => g,
                    Err(e) => e.into_inner(),
                };
                if let Err(e) = run_cycle(
                    &store,
                    &mut guard,
                    &feedback,
                    summarizer.as_ref(),
                    decay_interval_ms,
                    prune_threshold,
                    skip_bm25,
                    do_checkpoint,
                ) {
                    tracing::warn!(error = %e, "dynamics cycle failed");
                }
            }
        });

        Scheduler {
            handle: Some(handle),
            stop,
        }
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}
