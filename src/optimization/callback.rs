use crate::error::OptimizeError;
use crate::optimization::solvers::traits::{ProgressCallback, Snapshot};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Callback that ignores all progress. The default for callers that only
/// care about the final result.
pub struct NopCallback;

impl ProgressCallback for NopCallback {
    fn on_evaluation(&mut self, _snapshot: &Snapshot<'_>) -> Result<(), OptimizeError> {
        Ok(())
    }
}

/// One recorded progress snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub cost: f64,
    pub best_cost: f64,
}

/// Callback for tracking optimization progress.
///
/// Records every snapshot it sees; serialize the history from a wrapping
/// callback (or after the run) to checkpoint a long optimization - the
/// solvers themselves persist nothing.
#[derive(Default)]
pub struct HistoryCallback {
    verbose: bool,
    history: Vec<IterationRecord>,
}

impl HistoryCallback {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            history: Vec::new(),
        }
    }

    /// Get recorded history.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<IterationRecord> {
        self.history
    }

    /// Log a run summary at info level.
    pub fn log_summary(&self, solver: &str) {
        info!("=== {} summary: {} evaluations recorded ===", solver, self.history.len());
        if let Some(last) = self.history.last() {
            info!(
                "final cost {:.6e}, best cost {:.6e} at iteration {}",
                last.cost, last.best_cost, last.iteration
            );
        }
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_evaluation(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OptimizeError> {
        if self.verbose {
            debug!(
                "iter {:4}: cost {:.6e}, best {:.6e}",
                snapshot.iteration, snapshot.cost, snapshot.best_cost
            );
        }
        self.history.push(IterationRecord {
            iteration: snapshot.iteration,
            cost: snapshot.cost,
            best_cost: snapshot.best_cost,
        });
        Ok(())
    }
}
