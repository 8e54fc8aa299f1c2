use crate::error::OptimizeError;
use crate::layout::PixelUpdatePolicy;
use crate::optimization::solvers::traits::Problem;
use std::cell::RefCell;

/// Closure-backed [`Problem`] for callers whose cost function already wraps
/// the full simulation round-trip (export layout, run the EM solver, score
/// the response).
pub struct FnProblem<F> {
    num_pixels: usize,
    rows: usize,
    initial: Option<Vec<u8>>,
    cost_fn: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[u8]) -> Result<f64, OptimizeError>,
{
    pub fn new(num_pixels: usize, cost_fn: F) -> Self {
        Self {
            num_pixels,
            rows: 1,
            initial: None,
            cost_fn,
        }
    }

    /// Row count of the layout grid, needed for symmetry reshaping.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_initial_layout(mut self, initial: Vec<u8>) -> Self {
        self.initial = Some(initial);
        self
    }
}

impl<F> Problem for FnProblem<F>
where
    F: Fn(&[u8]) -> Result<f64, OptimizeError>,
{
    fn cost(&self, layout: &[u8]) -> Result<f64, OptimizeError> {
        (self.cost_fn)(layout)
    }

    fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn initial_layout(&self) -> Option<&[u8]> {
        self.initial.as_deref()
    }
}

/// Layout problem binding a [`PixelUpdatePolicy`] to a cost backend.
///
/// The solver only ever sees the candidate side: with a mask installed, the
/// optimizable positions. Every evaluation resolves the candidate through
/// the policy (mask handling, delta bookkeeping) and hands the full layout
/// to the backend, which is where the exporter/simulator round-trip lives.
pub struct LayoutProblem<F> {
    // Interior mutability: the policy tracks layout history across cost
    // calls, which take &self.
    policy: RefCell<PixelUpdatePolicy>,
    num_candidate: usize,
    rows: usize,
    initial: Option<Vec<u8>>,
    backend: F,
}

impl<F> LayoutProblem<F>
where
    F: Fn(&[u8]) -> Result<f64, OptimizeError>,
{
    /// `num_pixels` is the full layout length; with a masked policy the
    /// solver-visible candidate shrinks to the enabled position count.
    pub fn new(policy: PixelUpdatePolicy, num_pixels: usize, backend: F) -> Self {
        let num_candidate = policy.enabled_positions().unwrap_or(num_pixels);
        Self {
            policy: RefCell::new(policy),
            num_candidate,
            rows: 1,
            initial: None,
            backend,
        }
    }

    /// Row count of the candidate grid, needed for symmetry reshaping.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Starting candidate (candidate-space length, not full-layout length).
    pub fn with_initial_layout(mut self, initial: Vec<u8>) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Full layout resolved by the most recent evaluation.
    pub fn last_layout(&self) -> Option<Vec<u8>> {
        self.policy.borrow().layout().map(<[u8]>::to_vec)
    }
}

impl<F> Problem for LayoutProblem<F>
where
    F: Fn(&[u8]) -> Result<f64, OptimizeError>,
{
    fn cost(&self, candidate: &[u8]) -> Result<f64, OptimizeError> {
        let mut policy = self.policy.borrow_mut();
        policy.update(candidate)?;
        // update() just stored the resolved layout, so this cannot be None.
        let layout = policy.layout().unwrap();
        (self.backend)(layout)
    }

    fn num_pixels(&self) -> usize {
        self.num_candidate
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn initial_layout(&self) -> Option<&[u8]> {
        self.initial.as_deref()
    }
}
