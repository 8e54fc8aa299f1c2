use crate::error::OptimizeError;
use serde::{Deserialize, Serialize};

/// Final state of a solver run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverResult {
    pub cost: f64,
    pub iterations: u32,
    pub message: String,
    pub solution: Vec<u8>,
    pub cost_evals: usize,
    /// Cost trace over the run. DBS records one entry per perturbation slot
    /// (`max_iteration * num_pixels`); the population solvers record one
    /// entry per generation.
    pub convergence: Vec<f64>,
}

/// Immutable view of optimizer progress handed to the callback.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    /// Pass (DBS) or generation (BPS/BBA) counter, starting at 0.
    pub iteration: u32,
    /// Cost of the current accepted solution / population sweep.
    pub cost: f64,
    /// Best cost seen so far under the run's direction.
    pub best_cost: f64,
    /// Best layout seen so far.
    pub best_solution: &'a [u8],
}

/// Callback interface for optimization progress.
///
/// Invoked after every trial evaluation (DBS) or after every generation
/// (BPS/BBA), synchronously on the solver's stack. Returning an error aborts
/// the run; whatever the callback persisted up to that point is the only
/// recoverable progress. Logging, checkpointing to disk, and live plotting
/// all hang off this hook - the solvers persist nothing themselves.
pub trait ProgressCallback {
    fn on_evaluation(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OptimizeError>;
}

/// Core problem definition - just the essentials.
pub trait Problem {
    /// Evaluate cost for a full candidate layout (runs the simulation).
    /// Expensive: the solvers call this exactly once per trial and never
    /// cache or skip evaluations.
    fn cost(&self, layout: &[u8]) -> Result<f64, OptimizeError>;

    /// Number of pixels in the flattened layout.
    fn num_pixels(&self) -> usize;

    /// Row count of the layout grid, used for symmetry reshaping.
    fn rows(&self) -> usize {
        1
    }

    /// Starting layout. `None` seeds a uniform random binary vector.
    fn initial_layout(&self) -> Option<&[u8]> {
        None
    }
}

/// Solver interface - takes problem and callback.
///
/// Instances are single-use: a second `solve` on the same instance fails with
/// [`OptimizeError::AlreadyRun`]. State accessors on the concrete solvers
/// stay valid after the run completes.
pub trait Solver {
    fn name(&self) -> &str;

    /// Run the optimization to completion, blocking until `max_iteration`
    /// passes/generations finish or an error propagates.
    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn ProgressCallback,
    ) -> Result<SolverResult, OptimizeError>;
}
