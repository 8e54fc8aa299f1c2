//! Discrete optimizers for pixelated RF/microwave layouts.
//!
//! A layout is a flattened binary matrix of metal-on/metal-off cells scored
//! by an expensive, opaque cost function - typically an electromagnetic
//! simulation round-trip. Three interchangeable strategies search that
//! space: [`DirectBinarySearch`] (greedy pixel flips, optional x-axis
//! symmetry), [`BinaryParticleSwarm`], and [`BinaryBatAlgorithm`]. The
//! [`Optimizer`] facade wires a named solver to a [`Problem`] and a
//! history-recording callback; [`PixelUpdatePolicy`] resolves candidate
//! vectors against a frozen-pixel mask before the simulator sees them.

mod error;
mod layout;
mod optimization;
mod optimizer;
mod types;

pub use error::OptimizeError;
pub use layout::PixelUpdatePolicy;
pub use optimization::{
    select_solver, BinaryBatAlgorithm, BinaryParticleSwarm, DirectBinarySearch, FnProblem,
    HistoryCallback, IterationRecord, LayoutProblem, NopCallback, Problem, ProgressCallback,
    Snapshot, Solver, SolverResult,
};
pub use optimizer::Optimizer;
pub use types::{Direction, OptimizationResult, PixelGrid, Symmetry};
