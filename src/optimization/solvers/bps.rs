use super::traits::{Problem, ProgressCallback, Snapshot, Solver, SolverResult};
use crate::error::OptimizeError;
use crate::types::Direction;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Binary Particle Swarm Optimization.
///
/// The standard binary-PSO formulation: real-valued per-bit velocities are
/// updated from the personal and global bests, clamped, squashed through the
/// logistic function, and each member's whole vector is redrawn bit by bit as
/// Bernoulli trials on the mapped probabilities. The member is resampled
/// every generation, not perturbed.
pub struct BinaryParticleSwarm {
    max_iteration: u32,
    population_size: usize,
    v_max: f64,
    inertia: f64,
    cognitive: f64, // c1 - personal best influence
    social: f64,    // c2 - global best influence
    personal_ratio: f64,
    global_ratio: f64,
    direction: Direction,
    seed: Option<u64>,

    // Run state, valid after solve()
    best_solution: Vec<u8>,
    best_cost: f64,
    convergence: Vec<f64>,
    consumed: bool,
}

impl BinaryParticleSwarm {
    pub fn new(direction: Direction, max_iteration: u32) -> Self {
        Self {
            max_iteration,
            population_size: 20,
            v_max: 6.0,
            inertia: 1.0,
            cognitive: 2.0,
            social: 2.0,
            personal_ratio: 0.5,
            global_ratio: 0.5,
            direction,
            seed: None,
            best_solution: Vec::new(),
            best_cost: direction.worst_cost(),
            convergence: Vec::new(),
            consumed: false,
        }
    }

    /// Configure swarm size (default: 20).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Velocity clamp before the sigmoid mapping (default: 6.0).
    pub fn with_velocity_clamp(mut self, v_max: f64) -> Self {
        self.v_max = v_max;
        self
    }

    /// Configure PSO parameters (defaults: w=1.0, c1=2.0, c2=2.0).
    pub fn with_pso_params(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Fixed multipliers on the personal and global attraction terms
    /// (defaults: 0.5, 0.5).
    pub fn with_ratios(mut self, personal: f64, global: f64) -> Self {
        self.personal_ratio = personal;
        self.global_ratio = global;
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

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

impl Solver for BinaryParticleSwarm {
    fn name(&self) -> &str {
        "BPS"
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
        // Config checks fire before the guard; a rejected configuration does
        // not consume the instance.
        self.consumed = true;

        let num_pixels = problem.num_pixels();
        let mut rng = self.rng();
        let mut cost_evals = 0usize;

        // First member takes the provided starting layout, the rest are random.
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

        // Evaluate the whole swarm; each member starts as its own personal best.
        let mut personal_best = population.clone();
        let mut personal_best_costs = Vec::with_capacity(self.population_size);
        for (idx, member) in population.iter().enumerate() {
            let cost = problem.cost(member)?;
            cost_evals += 1;
            personal_best_costs.push(cost);
            // argbest over the initial swarm; ties keep the earliest member.
            if idx == 0 || self.direction.strictly_better(cost, self.best_cost) {
                self.best_cost = cost;
                self.best_solution = member.clone();
            }
        }

        self.convergence = Vec::with_capacity(self.max_iteration as usize);
        debug!(
            "BPS start: {} members x {} pixels, initial best {:.6e}",
            self.population_size, num_pixels, self.best_cost
        );

        for iteration in 0..self.max_iteration {
            // Curve entry i is the best known before generation i's updates.
            self.convergence.push(self.best_cost);

            // Velocity updates inside one generation all pull toward the
            // global best as it stood when the generation began; mid-sweep
            // improvements are not fed back until the next generation.
            let generation_best = self.best_solution.clone();

            for p in 0..self.population_size {
                for i in 0..num_pixels {
                    let velocity = self.inertia * velocities[p][i]
                        + self.cognitive
                            * self.personal_ratio
                            * (f64::from(personal_best[p][i]) - f64::from(population[p][i]))
                        + self.social
                            * self.global_ratio
                            * (f64::from(generation_best[i]) - f64::from(population[p][i]));
                    let velocity = velocity.clamp(-self.v_max, self.v_max);
                    velocities[p][i] = velocity;

                    // Full Bernoulli redraw of the bit, not a conditional flip.
                    population[p][i] = u8::from(rng.gen::<f64>() < sigmoid(velocity));
                }

                let cost = problem.cost(&population[p])?;
                cost_evals += 1;

                if self.direction.strictly_better(cost, personal_best_costs[p]) {
                    personal_best_costs[p] = cost;
                    personal_best[p].copy_from_slice(&population[p]);
                }
                if self.direction.strictly_better(cost, self.best_cost) {
                    self.best_cost = cost;
                    self.best_solution = population[p].clone();
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
