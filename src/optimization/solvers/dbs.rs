use super::traits::{Problem, ProgressCallback, Snapshot, Solver, SolverResult};
use crate::error::OptimizeError;
use crate::types::{Direction, PixelGrid, Symmetry};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Direct Binary Search - greedy local search over a binary pixel layout.
///
/// Each pass walks the whole position space in strides of `simul_positions`,
/// toggling randomly chosen not-yet-tried pixels and accepting any trial that
/// is at least as good as the current accepted solution. Under x-axis
/// symmetry every toggle is mirrored across the grid's horizontal midline, so
/// accepted layouts never go asymmetric.
pub struct DirectBinarySearch {
    max_iteration: u32,
    simul_positions: usize,
    symmetry: Symmetry,
    direction: Direction,
    seed: Option<u64>,

    // Run state, valid after solve()
    solution: Vec<u8>,
    cost: f64,
    best_solution: Vec<u8>,
    best_cost: f64,
    convergence: Vec<f64>,
    iteration: u32,
    undisturbed: Vec<usize>,
    consumed: bool,
}

impl DirectBinarySearch {
    pub fn new(direction: Direction, max_iteration: u32) -> Self {
        Self {
            max_iteration,
            simul_positions: 1,
            symmetry: Symmetry::None,
            direction,
            seed: None,
            solution: Vec::new(),
            cost: direction.worst_cost(),
            best_solution: Vec::new(),
            best_cost: direction.worst_cost(),
            convergence: Vec::new(),
            iteration: 0,
            undisturbed: Vec::new(),
            consumed: false,
        }
    }

    /// Number of pixels toggled per trial (default: 1). Each batch costs a
    /// single simulation regardless of how many pixels it flips.
    pub fn with_simul_positions(mut self, simul_positions: usize) -> Self {
        self.simul_positions = simul_positions;
        self
    }

    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Fix the RNG seed so a run is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ===== STATE ACCESSORS =====

    /// Passes completed so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Cost of the current accepted solution.
    pub fn current_cost(&self) -> f64 {
        self.cost
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn best_solution(&self) -> &[u8] {
        &self.best_solution
    }

    /// Positions not yet tried in the most recent pass.
    pub fn undisturbed(&self) -> &[usize] {
        &self.undisturbed
    }

    pub fn undisturbed_len(&self) -> usize {
        self.undisturbed.len()
    }

    /// Cost trace, one slot per perturbation step
    /// (`max_iteration * num_pixels` entries).
    pub fn convergence(&self) -> &[f64] {
        &self.convergence
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Pick the next trial position: uniform over the undisturbed set, the
    /// sole survivor when only one remains, `None` once the set is exhausted.
    fn pick_position(&self, rng: &mut StdRng) -> Option<usize> {
        match self.undisturbed.len() {
            0 => None,
            1 => Some(self.undisturbed[0]),
            n => Some(self.undisturbed[rng.gen_range(0..n)]),
        }
    }
}

impl Solver for DirectBinarySearch {
    fn name(&self) -> &str {
        "DBS"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn ProgressCallback,
    ) -> Result<SolverResult, OptimizeError> {
        if self.consumed {
            return Err(OptimizeError::AlreadyRun(self.name().into()));
        }
        if self.simul_positions == 0 {
            return Err(OptimizeError::InvalidConfig(
                "simul_positions must be at least 1".into(),
            ));
        }
        // Config checks fire before the guard; a rejected configuration does
        // not consume the instance.
        self.consumed = true;

        let num_pixels = problem.num_pixels();
        let grid = PixelGrid::new(num_pixels, problem.rows());
        let mut rng = self.rng();

        self.solution = match problem.initial_layout() {
            Some(initial) => {
                if initial.len() != num_pixels {
                    return Err(OptimizeError::SolutionLength {
                        expected: num_pixels,
                        got: initial.len(),
                    });
                }
                initial.to_vec()
            }
            None => (0..num_pixels).map(|_| rng.gen_range(0..=1u8)).collect(),
        };

        // Evaluate the starting layout once; it is both current and best.
        self.cost = problem.cost(&self.solution)?;
        let mut cost_evals = 1usize;
        self.best_solution = self.solution.clone();
        self.best_cost = self.cost;
        self.convergence = vec![0.0; self.max_iteration as usize * num_pixels];
        self.iteration = 0;

        // Mirrored positions move together, so a symmetric pass only walks
        // the first half of the rows.
        let pass_range = match self.symmetry {
            Symmetry::XAxis => grid.half_pixels(),
            _ => num_pixels,
        };

        debug!(
            "DBS start: {} pixels ({}x{}), {:?}, pass range {}, initial cost {:.6e}",
            num_pixels, grid.rows, grid.cols, self.symmetry, pass_range, self.cost
        );

        for _ in 0..self.max_iteration {
            self.undisturbed = (0..pass_range).collect();

            let mut offset = 0;
            while offset < pass_range {
                // Exhaustion mid-pass is not an error; the pass just ends
                // early and the next one re-seeds the full set.
                if self.undisturbed.is_empty() {
                    break;
                }

                let mut trial = self.solution.clone();
                for _ in 0..self.simul_positions {
                    let position = match self.pick_position(&mut rng) {
                        Some(position) => position,
                        None => break,
                    };

                    trial[position] ^= 1;
                    if self.symmetry == Symmetry::XAxis {
                        // The mirrored flip does not consume the undisturbed
                        // slot; a position may be drawn again within a pass.
                        trial[grid.mirror_x(position)] ^= 1;
                    } else {
                        self.undisturbed.retain(|&p| p != position);
                    }
                }

                // One simulation per batch, not one per flipped pixel.
                let trial_cost = problem.cost(&trial)?;
                cost_evals += 1;

                if self.direction.at_least_as_good(trial_cost, self.cost) {
                    self.solution = trial;
                    self.cost = trial_cost;
                    if self.direction.at_least_as_good(trial_cost, self.best_cost) {
                        self.best_cost = trial_cost;
                        self.best_solution = self.solution.clone();
                    }
                }

                self.convergence
                    [(self.iteration as usize * num_pixels + offset) / self.simul_positions] =
                    self.cost;

                callback.on_evaluation(&Snapshot {
                    iteration: self.iteration,
                    cost: self.cost,
                    best_cost: self.best_cost,
                    best_solution: &self.best_solution,
                })?;

                offset += self.simul_positions;
            }

            self.iteration += 1;
            debug!(
                "DBS pass {}/{}: cost {:.6e}, best {:.6e}",
                self.iteration, self.max_iteration, self.cost, self.best_cost
            );
        }

        Ok(SolverResult {
            cost: self.best_cost,
            iterations: self.iteration,
            message: format!("Completed {} passes", self.iteration),
            solution: self.best_solution.clone(),
            cost_evals,
            convergence: self.convergence.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::callback::NopCallback;
    use crate::optimization::problem::FnProblem;

    fn popcount(layout: &[u8]) -> f64 {
        layout.iter().map(|&b| f64::from(b)).sum()
    }

    #[test]
    fn fills_a_2x2_grid_in_one_pass() {
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)))
            .with_rows(2)
            .with_initial_layout(vec![0, 0, 0, 0]);
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 1).with_seed(7);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        assert_eq!(result.solution, vec![1, 1, 1, 1]);
        assert_eq!(result.cost, 4.0);
        assert_eq!(result.cost_evals, 5); // initial + one per pixel
        // Every single flip is an improvement and lands in pass order.
        assert_eq!(result.convergence, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rejected_trial_leaves_solution_untouched() {
        // Minimizing the popcount from all-zero: every flip worsens the cost
        // and must be rejected without leaving a partial mutation behind.
        let problem = FnProblem::new(6, |layout| Ok(popcount(layout)))
            .with_initial_layout(vec![0; 6]);
        let mut solver = DirectBinarySearch::new(Direction::Minimize, 2).with_seed(3);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        assert_eq!(result.solution, vec![0; 6]);
        assert_eq!(result.cost, 0.0);
        assert!(result.convergence.iter().all(|&c| c == 0.0));
        assert_eq!(solver.current_cost(), 0.0);
        assert_eq!(solver.iteration(), 2);
    }

    #[test]
    fn convergence_curve_length_is_passes_times_pixels() {
        let problem = FnProblem::new(9, |layout| Ok(popcount(layout))).with_rows(3);
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 3).with_seed(1);
        let result = solver.solve(&problem, &mut NopCallback).unwrap();
        assert_eq!(result.convergence.len(), 27);
    }

    #[test]
    fn batched_flips_evaluate_once_per_batch() {
        let problem = FnProblem::new(8, |layout| Ok(popcount(layout)))
            .with_initial_layout(vec![0; 8]);
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 1)
            .with_simul_positions(2)
            .with_seed(11);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        // 8 positions in strides of 2: four trials plus the initial evaluation.
        assert_eq!(result.cost_evals, 5);
        assert_eq!(result.convergence.len(), 8);
        // Curve slots beyond the stride count stay at their preallocated value.
        assert!(result.convergence[4..].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn x_axis_symmetry_holds_at_every_accepted_state() {
        struct SymmetryChecker;
        impl ProgressCallback for SymmetryChecker {
            fn on_evaluation(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OptimizeError> {
                let grid = PixelGrid::new(snapshot.best_solution.len(), 4);
                for p in 0..snapshot.best_solution.len() {
                    assert_eq!(
                        snapshot.best_solution[p],
                        snapshot.best_solution[grid.mirror_x(p)]
                    );
                }
                Ok(())
            }
        }

        let problem = FnProblem::new(12, |layout| Ok(popcount(layout)))
            .with_rows(4)
            .with_initial_layout(vec![0; 12]);
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 3)
            .with_symmetry(Symmetry::XAxis)
            .with_seed(42);

        let result = solver.solve(&problem, &mut SymmetryChecker).unwrap();

        let grid = PixelGrid::new(12, 4);
        for p in 0..12 {
            assert_eq!(result.solution[p], result.solution[grid.mirror_x(p)]);
        }
        // Mirrored flips always move pixel pairs, so the best popcount is even.
        assert_eq!(result.cost % 2.0, 0.0);
    }

    #[test]
    fn symmetric_pass_walks_half_the_grid() {
        let problem = FnProblem::new(12, |layout| Ok(popcount(layout)))
            .with_rows(4)
            .with_initial_layout(vec![0; 12]);
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 1)
            .with_symmetry(Symmetry::XAxis)
            .with_seed(5);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        // 6 half-grid trials plus the initial evaluation; positions are
        // sampled with replacement under symmetry, so coverage of all six
        // pairs is not guaranteed - but the evaluation budget is fixed.
        assert_eq!(result.cost_evals, 7);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let cost = |layout: &[u8]| {
            // Not monotone in the popcount, so acceptance order matters.
            let on = popcount(layout);
            Ok((on - 3.0).abs() + f64::from(layout[0]) * 0.25)
        };

        let run = || {
            let problem = FnProblem::new(8, cost);
            let mut solver = DirectBinarySearch::new(Direction::Minimize, 2).with_seed(99);
            solver.solve(&problem, &mut NopCallback).unwrap()
        };

        let (a, b) = (run(), run());
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.convergence, b.convergence);
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn second_solve_is_rejected() {
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)));
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 1).with_seed(0);
        solver.solve(&problem, &mut NopCallback).unwrap();
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::AlreadyRun(_)));
    }

    #[test]
    fn cost_failure_aborts_the_run() {
        let problem = FnProblem::new(4, |_| Err(OptimizeError::cost("simulator crashed")));
        let mut solver = DirectBinarySearch::new(Direction::Minimize, 1).with_seed(0);
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::Cost(_)));
    }

    #[test]
    fn zero_simul_positions_is_invalid() {
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)));
        let mut solver = DirectBinarySearch::new(Direction::Minimize, 1)
            .with_simul_positions(0);
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfig(_)));

        // A rejected configuration does not consume the instance: the retry
        // reports the config problem again, not AlreadyRun.
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfig(_)));
    }

    #[test]
    fn callback_abort_propagates() {
        struct AbortAfter(u32);
        impl ProgressCallback for AbortAfter {
            fn on_evaluation(&mut self, _: &Snapshot<'_>) -> Result<(), OptimizeError> {
                if self.0 == 0 {
                    return Err(OptimizeError::Callback("stop".into()));
                }
                self.0 -= 1;
                Ok(())
            }
        }

        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)));
        let mut solver = DirectBinarySearch::new(Direction::Maximize, 2).with_seed(0);
        let err = solver.solve(&problem, &mut AbortAfter(2)).unwrap_err();
        assert!(matches!(err, OptimizeError::Callback(_)));
        // Two trials went through before the abort.
        assert_eq!(solver.iteration(), 0);
    }
}
