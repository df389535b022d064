//! A single satisfiability check under a wall-clock budget.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use log::{debug, warn};
use varisat::{
    checker::{CheckedProofStep, CheckerData, ProofProcessor},
    solver::SolverError,
    Solver,
};

use super::{encoding::Encoding, Placement, Problem};
use crate::error::{KitchenError, Result};

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A schedule fits; one placement per vertex
    Satisfiable(Vec<Placement>),
    /// Proven not to fit
    Unsatisfiable,
    /// The budget ran out before the solver answered
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, ProbeOutcome::Satisfiable(_))
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Satisfiable(placements) => {
                write!(f, "satisfiable ({} placements)", placements.len())
            }
            ProbeOutcome::Unsatisfiable => write!(f, "unsatisfiable"),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Counts solver threads that have not exited yet.
#[derive(Debug, Clone, Default)]
pub(super) struct LiveProbes(Arc<AtomicUsize>);

impl LiveProbes {
    pub(super) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> LiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        LiveGuard(Arc::clone(&self.0))
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Aborts the solver at its next proof step once the flag is raised.
///
/// varisat checks every learned clause against the attached processors, so
/// this bounds how long a cancelled solve keeps running to one conflict.
struct StopOnCancel<'c> {
    cancel: &'c AtomicBool,
}

impl ProofProcessor for StopOnCancel<'_> {
    fn process_step(
        &mut self,
        _step: &CheckedProofStep,
        _data: CheckerData,
    ) -> anyhow::Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            anyhow::bail!("probe cancelled");
        }
        Ok(())
    }
}

/// Encodes and solves `problem` with `slots` slots on a worker thread.
///
/// The caller gets an answer within `timeout`. On timeout the worker's
/// cancellation flag is raised; clause generation and the solver both watch
/// it, so the thread winds down shortly after and its answer is dropped.
pub(super) fn run(
    problem: Arc<Problem>,
    slots: usize,
    timeout: Duration,
    live: &LiveProbes,
) -> Result<ProbeOutcome> {
    if slots == 0 {
        return Ok(ProbeOutcome::Unsatisfiable);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let worker_cancel = Arc::clone(&cancel);
    let guard = live.enter();

    thread::Builder::new()
        .name("sat-probe".to_string())
        .spawn(move || {
            let _guard = guard;
            let outcome = solve(&problem, slots, &worker_cancel);
            // The receiver is gone once the probe timed out.
            let _ = tx.send(outcome);
        })
        .map_err(|e| KitchenError::configuration(format!("failed to spawn solver thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            warn!(
                "solver probe with {slots} slots exceeded {}ms, cancelling its worker ({} still running)",
                timeout.as_millis(),
                live.count()
            );
            Ok(ProbeOutcome::TimedOut)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(KitchenError::configuration(
            "solver thread exited without an answer",
        )),
    }
}

fn solve(problem: &Problem, slots: usize, cancel: &AtomicBool) -> Result<ProbeOutcome> {
    let Some(encoding) = Encoding::build(problem, slots, cancel) else {
        return Ok(ProbeOutcome::TimedOut);
    };
    debug!(
        "encoded {} vertices over {slots} slots into {} clauses",
        problem.vertices.len(),
        encoding.clause_count()
    );

    let mut stop = StopOnCancel { cancel };
    let mut solver = Solver::new();
    // Must be attached before any clause is added.
    solver.add_proof_processor(&mut stop);
    solver.add_formula(encoding.formula());

    let satisfiable = match solver.solve() {
        Ok(satisfiable) => satisfiable,
        Err(SolverError::ProofProcessorError { .. }) if cancel.load(Ordering::Relaxed) => {
            debug!("solver stopped after cancellation at {slots} slots");
            return Ok(ProbeOutcome::TimedOut);
        }
        Err(e) => return Err(KitchenError::configuration(format!("solver failed: {e}"))),
    };
    if !satisfiable {
        return Ok(ProbeOutcome::Unsatisfiable);
    }

    let model = solver
        .model()
        .ok_or_else(|| KitchenError::configuration("solver reported SAT without a model"))?;
    Ok(ProbeOutcome::Satisfiable(encoding.decode(problem, &model)))
}
