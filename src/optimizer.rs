use crate::error::OptimizeError;
use crate::optimization::callback::HistoryCallback;
use crate::optimization::solvers::{
    select_solver, BinaryBatAlgorithm, BinaryParticleSwarm, DirectBinarySearch, Problem, Solver,
};
use crate::types::{Direction, OptimizationResult, Symmetry};
use log::info;

/// High-level entry point: picks a solver by name ("auto", "dbs", "bps",
/// "bba"), runs it against a [`Problem`], and returns a packaged
/// [`OptimizationResult`].
///
/// The solver-specific builders remain available for callers that need the
/// full hyperparameter surface; the facade covers the common run shape.
pub struct Optimizer {
    pub solver: String,
    pub direction: Direction,
    pub max_iterations: u32,
    pub simul_positions: usize,
    pub population_size: usize,
    pub symmetry: Symmetry,
    pub seed: Option<u64>,
    pub verbose: bool,
}

impl Optimizer {
    pub fn new(direction: Direction) -> Self {
        Self {
            solver: "auto".into(),
            direction,
            max_iterations: 10,
            simul_positions: 1,
            population_size: 20,
            symmetry: Symmetry::None,
            seed: None,
            verbose: false,
        }
    }

    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = solver.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_simul_positions(mut self, simul_positions: usize) -> Self {
        self.simul_positions = simul_positions;
        self
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn build_solver(&self, num_pixels: usize) -> Result<(Box<dyn Solver>, String), OptimizeError> {
        let built: (Box<dyn Solver>, String) = match self.solver.as_str() {
            "dbs" => {
                let mut dbs = DirectBinarySearch::new(self.direction, self.max_iterations)
                    .with_simul_positions(self.simul_positions)
                    .with_symmetry(self.symmetry);
                if let Some(seed) = self.seed {
                    dbs = dbs.with_seed(seed);
                }
                (Box::new(dbs), "configured: dbs".into())
            }
            "bps" => {
                let mut bps = BinaryParticleSwarm::new(self.direction, self.max_iterations)
                    .with_population_size(self.population_size);
                if let Some(seed) = self.seed {
                    bps = bps.with_seed(seed);
                }
                (Box::new(bps), "configured: bps".into())
            }
            "bba" => {
                let mut bba = BinaryBatAlgorithm::new(self.direction, self.max_iterations)
                    .with_population_size(self.population_size);
                if let Some(seed) = self.seed {
                    bba = bba.with_seed(seed);
                }
                (Box::new(bba), "configured: bba".into())
            }
            "auto" => select_solver(num_pixels, self.direction, self.max_iterations),
            other => return Err(OptimizeError::UnknownSolver(other.into())),
        };
        Ok(built)
    }

    /// Run the optimization to completion.
    pub fn optimize(&self, problem: &dyn Problem) -> Result<OptimizationResult, OptimizeError> {
        let (mut solver, reason) = self.build_solver(problem.num_pixels())?;

        if self.verbose {
            info!("=== optimization start ===");
            info!("solver: {} ({})", solver.name(), reason);
            info!(
                "{} pixels, {} iterations, {:?}",
                problem.num_pixels(),
                self.max_iterations,
                self.direction
            );
        }

        let mut callback = HistoryCallback::new(self.verbose);
        let result = solver.solve(problem, &mut callback)?;

        if self.verbose {
            callback.log_summary(solver.name());
            info!(
                "=== optimization complete: cost {:.6e} after {} evaluations ===",
                result.cost, result.cost_evals
            );
        }

        Ok(OptimizationResult {
            cost: result.cost,
            iterations: result.iterations,
            message: result.message,
            solution: result.solution,
            cost_evals: result.cost_evals,
            convergence: result.convergence,
            solver: solver.name().into(),
        })
    }
}
