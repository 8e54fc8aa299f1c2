pub mod callback;
pub mod problem;
pub mod solvers;

pub use callback::{HistoryCallback, IterationRecord, NopCallback};
pub use problem::{FnProblem, LayoutProblem};
pub use solvers::{
    select_solver, BinaryBatAlgorithm, BinaryParticleSwarm, DirectBinarySearch, Problem,
    ProgressCallback, Snapshot, Solver, SolverResult,
};
