use super::traits::{Problem, ProgressCallback, Snapshot, Solver, SolverResult};
use crate::error::OptimizeError;
use crate::types::Direction;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Binary Bat Algorithm.
///
/// Echolocation-inspired population search: every bat carries a per-bit
/// velocity driven by a randomly drawn frequency, a V-shaped transfer
/// function turns velocity into a flip probability, and the pulse rate pulls
/// bits back toward the global best as a local-exploitation step. Loudness
/// gates whether an improving trial actually replaces the bat.
pub struct BinaryBatAlgorithm {
    max_iteration: u32,
    population_size: usize,
    loudness: f64,
    pulse_rate: f64,
    freq_min: f64,
    freq_max: f64,
    direction: Direction,
    seed: Option<u64>,

    // Run state, valid after solve()
    best_solution: Vec<u8>,
    best_cost: f64,
    convergence: Vec<f64>,
    consumed: bool,
}

impl BinaryBatAlgorithm {
    pub fn new(direction: Direction, max_iteration: u32) -> Self {
        Self {
            max_iteration,
            population_size: 20,
            loudness: 0.25,
            pulse_rate: 0.1,
            freq_min: 0.0,
            freq_max: 2.0,
            direction,
            seed: None,
            best_solution: Vec::new(),
            best_cost: direction.worst_cost(),
            convergence: Vec::new(),
            consumed: false,
        }
    }

    /// Configure population size (default: 20).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Probability that an at-least-as-good trial replaces its bat
    /// (default: 0.25).
    pub fn with_loudness(mut self, loudness: f64) -> Self {
        self.loudness = loudness;
        self
    }

    /// Emission rate; each bit snaps to the global best with probability
    /// `1 - pulse_rate` (default: 0.1).
    pub fn with_pulse_rate(mut self, pulse_rate: f64) -> Self {
        self.pulse_rate = pulse_rate;
        self
    }

    /// Uniform range the per-bat frequency is drawn from (default: 0..2).
    pub fn with_frequency_range(mut self, min: f64, max: f64) -> Self {
        self.freq_min = min;
        self.freq_max = max;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ===== STATE ACCESSORS =====

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn best_solution(&self) -> &[u8] {
        &self.best_solution
    }

    /// One global-best entry per generation, recorded before that
    /// generation's updates ran.
    pub fn convergence(&self) -> &[f64] {
        &self.convergence
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// V-shaped transfer function mapping a velocity to a flip probability.
fn v_transfer(velocity: f64) -> f64 {
    (2.0 / PI * (PI / 2.0 * velocity).atan()).abs()
}

impl Solver for BinaryBatAlgorithm {
    fn name(&self) -> &str {
        "BBA"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn ProgressCallback,
    ) -> Result<SolverResult, OptimizeError> {
        if self.consumed {
            return Err(OptimizeError::AlreadyRun(self.name().into()));
        }
        if self.population_size == 0 {
            return Err(OptimizeError::InvalidConfig(
                "population size must be at least 1".into(),
            ));
        }
        if self.freq_min > self.freq_max {
            return Err(OptimizeError::InvalidConfig(format!(
                "frequency range {}..{} is inverted",
                self.freq_min, self.freq_max
            )));
        }
        // Config checks fire before the guard; a rejected configuration does
        // not consume the instance.
        self.consumed = true;

        let num_pixels = problem.num_pixels();
        let mut rng = self.rng();
        let mut cost_evals = 0usize;

        let mut population: Vec<Vec<u8>> = Vec::with_capacity(self.population_size);
        if let Some(initial) = problem.initial_layout() {
            if initial.len() != num_pixels {
                return Err(OptimizeError::SolutionLength {
                    expected: num_pixels,
                    got: initial.len(),
                });
            }
            population.push(initial.to_vec());
        }
        while population.len() < self.population_size {
            population.push((0..num_pixels).map(|_| rng.gen_range(0..=1u8)).collect());
        }

        let mut velocities: Vec<Vec<f64>> = vec![vec![0.0; num_pixels]; self.population_size];

        let mut costs = Vec::with_capacity(self.population_size);
        for (idx, member) in population.iter().enumerate() {
            let cost = problem.cost(member)?;
            cost_evals += 1;
            costs.push(cost);
            if idx == 0 || self.direction.strictly_better(cost, self.best_cost) {
                self.best_cost = cost;
                self.best_solution = member.clone();
            }
        }

        self.convergence = Vec::with_capacity(self.max_iteration as usize);
        debug!(
            "BBA start: {} bats x {} pixels, initial best {:.6e}",
            self.population_size, num_pixels, self.best_cost
        );

        let mut trial = vec![0u8; num_pixels];
        for iteration in 0..self.max_iteration {
            // Curve entry i is the best known before generation i's updates.
            self.convergence.push(self.best_cost);

            for p in 0..self.population_size {
                // One frequency draw per bat per generation.
                let frequency = rng.gen_range(self.freq_min..=self.freq_max);

                for i in 0..num_pixels {
                    velocities[p][i] += (f64::from(population[p][i])
                        - f64::from(self.best_solution[i]))
                        * frequency;

                    let mut bit = population[p][i];
                    if rng.gen::<f64>() < v_transfer(velocities[p][i]) {
                        bit ^= 1;
                    }
                    // Exploitation: snap toward the global best. Later bats in
                    // the same sweep see mid-sweep best updates.
                    if rng.gen::<f64>() > self.pulse_rate {
                        bit = self.best_solution[i];
                    }
                    trial[i] = bit;
                }

                let trial_cost = problem.cost(&trial)?;
                cost_evals += 1;

                // Loudness gates acceptance into the bat's slot; the global
                // best is updated regardless.
                if rng.gen::<f64>() < self.loudness
                    && self.direction.at_least_as_good(trial_cost, costs[p])
                {
                    population[p].copy_from_slice(&trial);
                    costs[p] = trial_cost;
                }
                if self.direction.strictly_better(trial_cost, self.best_cost) {
                    self.best_cost = trial_cost;
                    self.best_solution = trial.clone();
                }
            }

            callback.on_evaluation(&Snapshot {
                iteration,
                cost: self.best_cost,
                best_cost: self.best_cost,
                best_solution: &self.best_solution,
            })?;
        }

        Ok(SolverResult {
            cost: self.best_cost,
            iterations: self.max_iteration,
            message: format!("Completed {} generations", self.max_iteration),
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
    fn transfer_function_shape() {
        assert_eq!(v_transfer(0.0), 0.0);
        // Symmetric in the sign of the velocity.
        assert!((v_transfer(1.5) - v_transfer(-1.5)).abs() < 1e-12);
        // Monotone toward 1 for large magnitudes, never reaching it.
        assert!(v_transfer(100.0) > 0.99);
        assert!(v_transfer(100.0) < 1.0);
        assert!(v_transfer(0.5) < v_transfer(2.0));
    }

    #[test]
    fn convergence_curve_has_one_entry_per_generation() {
        let problem = FnProblem::new(5, |layout| Ok(popcount(layout)));
        let mut solver = BinaryBatAlgorithm::new(Direction::Minimize, 12)
            .with_population_size(4)
            .with_seed(8);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        assert_eq!(result.convergence.len(), 12);
        for pair in result.convergence.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert!(result.cost <= *result.convergence.last().unwrap());
    }

    #[test]
    fn minimizes_popcount_on_a_small_grid() {
        let problem = FnProblem::new(6, |layout| Ok(popcount(layout)));
        let mut solver = BinaryBatAlgorithm::new(Direction::Minimize, 40)
            .with_population_size(10)
            .with_seed(3);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();

        // Pulse-rate exploitation drags the population toward the best bat;
        // 400 evaluations land at or near the all-zero optimum.
        assert!(result.cost <= 2.0, "cost {} too high", result.cost);
        assert_eq!(result.cost, popcount(&result.solution));
        assert_eq!(result.cost_evals, 10 + 40 * 10);
    }

    #[test]
    fn every_trial_has_valid_bits() {
        let problem = FnProblem::new(7, |layout| {
            assert_eq!(layout.len(), 7);
            assert!(layout.iter().all(|&b| b <= 1));
            Ok(popcount(layout))
        });
        let mut solver = BinaryBatAlgorithm::new(Direction::Maximize, 10)
            .with_population_size(5)
            .with_seed(17);
        solver.solve(&problem, &mut NopCallback).unwrap();
    }

    #[test]
    fn initial_layout_seeds_the_first_bat() {
        // Zero generations: the run reduces to initialization and the best
        // over the seeded swarm must be at least as good as the first bat.
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)))
            .with_initial_layout(vec![0, 0, 0, 0]);
        let mut solver = BinaryBatAlgorithm::new(Direction::Minimize, 0)
            .with_population_size(3)
            .with_seed(1);

        let result = solver.solve(&problem, &mut NopCallback).unwrap();
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.solution, vec![0, 0, 0, 0]);
        assert_eq!(result.cost_evals, 3);
    }

    #[test]
    fn inverted_frequency_range_is_invalid() {
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)));
        let mut solver = BinaryBatAlgorithm::new(Direction::Minimize, 1)
            .with_population_size(2)
            .with_frequency_range(2.0, 0.0);
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfig(_)));

        // A rejected configuration does not consume the instance: the retry
        // reports the config problem again, not AlreadyRun.
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidConfig(_)));
    }

    #[test]
    fn second_solve_is_rejected() {
        let problem = FnProblem::new(4, |layout| Ok(popcount(layout)));
        let mut solver = BinaryBatAlgorithm::new(Direction::Maximize, 1)
            .with_population_size(2)
            .with_seed(0);
        solver.solve(&problem, &mut NopCallback).unwrap();
        let err = solver.solve(&problem, &mut NopCallback).unwrap_err();
        assert!(matches!(err, OptimizeError::AlreadyRun(_)));
    }
}
