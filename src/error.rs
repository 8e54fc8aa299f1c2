use thiserror::Error;

/// Errors produced by the optimizer core.
///
/// Cost-function and callback failures are never retried: an external EM
/// simulation that fails should stop the run rather than keep optimizing
/// against poisoned cost values.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Candidate vector length does not match the number of mask-enabled positions.
    #[error("candidate has {got} entries but the mask enables {expected} positions")]
    MaskMismatch { expected: usize, got: usize },

    /// Provided initial layout does not match the problem's pixel count.
    #[error("initial layout has {got} entries, expected {expected}")]
    SolutionLength { expected: usize, got: usize },

    /// A hyperparameter is outside its valid range.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),

    /// A solver instance was asked to run a second time.
    #[error("solver '{0}' has already run; construct a new instance per optimization run")]
    AlreadyRun(String),

    /// The cost function failed (e.g. the external simulation round-trip broke).
    #[error("cost function failed: {0}")]
    Cost(String),

    /// The progress callback asked to abort the run.
    #[error("callback aborted the run: {0}")]
    Callback(String),

    /// Unknown solver name passed to the facade.
    #[error("unknown solver '{0}' (expected one of: auto, dbs, bps, bba)")]
    UnknownSolver(String),
}

impl OptimizeError {
    /// Convenience constructor for cost-function implementors.
    pub fn cost(msg: impl Into<String>) -> Self {
        Self::Cost(msg.into())
    }
}
