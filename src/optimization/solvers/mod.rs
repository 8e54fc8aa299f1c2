mod bba;
mod bps;
mod dbs;
pub mod traits;

pub use bba::BinaryBatAlgorithm;
pub use bps::BinaryParticleSwarm;
pub use dbs::DirectBinarySearch;
pub use traits::{Problem, ProgressCallback, Snapshot, Solver, SolverResult};

use crate::types::Direction;

/// Pick a solver for a layout of `num_pixels` cells with a budget of
/// `max_iterations` passes/generations.
///
/// DBS spends one simulation per pixel per pass, so it only pays off while
/// exhaustive per-pixel sweeps stay affordable; past that the population
/// methods cover the space at a fixed per-generation budget.
pub fn select_solver(
    num_pixels: usize,
    direction: Direction,
    max_iterations: u32,
) -> (Box<dyn Solver>, String) {
    let (solver, reason): (Box<dyn Solver>, String) = if num_pixels <= 256 {
        (
            Box::new(DirectBinarySearch::new(direction, max_iterations)),
            format!(
                "Auto: {} pixels → DBS ({} simulations per pass is affordable)",
                num_pixels, num_pixels
            ),
        )
    } else if num_pixels <= 1024 {
        let pop_size = (10 + num_pixels / 32).min(40);
        (
            Box::new(
                BinaryParticleSwarm::new(direction, max_iterations)
                    .with_population_size(pop_size),
            ),
            format!(
                "Auto: {} pixels → BPS (pop={}, fixed budget per generation)",
                num_pixels, pop_size
            ),
        )
    } else {
        (
            Box::new(BinaryBatAlgorithm::new(direction, max_iterations).with_population_size(30)),
            format!(
                "Auto: {} pixels → BBA (pulse-rate exploitation for large grids)",
                num_pixels
            ),
        )
    };

    (solver, reason)
}
