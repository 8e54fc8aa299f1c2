use serde::{Deserialize, Serialize};

// ===== ENUMS =====

/// Which way the cost function is driven.
///
/// The optimizers never assume a sign convention; every accept/reject and
/// best-update decision goes through these comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    /// Acceptance rule: ties count, so greedy search can make lateral moves
    /// across cost plateaus.
    pub fn at_least_as_good(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate <= incumbent,
            Self::Maximize => candidate >= incumbent,
        }
    }

    pub fn strictly_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
        }
    }

    /// Sentinel that any real evaluation beats.
    pub fn worst_cost(self) -> f64 {
        match self {
            Self::Minimize => f64::INFINITY,
            Self::Maximize => f64::NEG_INFINITY,
        }
    }
}

/// Spatial symmetry constraint on the layout grid.
///
/// Only `XAxis` mirroring is enforced by the search itself; the other
/// constrained variants are accepted but currently search unconstrained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symmetry {
    None,
    XAxis,
    YAxis,
    XYAxis,
}

// ===== CORE DATA TYPES =====

/// Row-major reshape of a flattened binary layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub rows: usize,
    pub cols: usize,
}

impl PixelGrid {
    pub fn new(num_pixels: usize, rows: usize) -> Self {
        let rows = rows.max(1);
        Self {
            rows,
            cols: num_pixels / rows,
        }
    }

    pub fn num_pixels(&self) -> usize {
        self.rows * self.cols
    }

    /// (row, col) of a flattened position.
    pub fn to_row_col(&self, position: usize) -> (usize, usize) {
        (position / self.cols, position % self.cols)
    }

    /// Flattened index of the x-axis mirror of `position`: (r, c) maps to
    /// (rows-1-r, c).
    pub fn mirror_x(&self, position: usize) -> usize {
        let (r, c) = self.to_row_col(position);
        (self.rows - 1 - r) * self.cols + c
    }

    /// Number of positions a symmetric pass visits: the first half of the
    /// rows (floored) across all columns, since mirrored cells move together.
    pub fn half_pixels(&self) -> usize {
        (self.rows / 2) * self.cols
    }
}

/// Final result of a facade-level optimization run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub cost: f64,
    pub iterations: u32,
    pub message: String,
    pub solution: Vec<u8>,
    pub cost_evals: usize,
    pub convergence: Vec<f64>,
    pub solver: String,
}

impl OptimizationResult {
    /// Reshape the flat solution into grid rows for export or display.
    pub fn solution_rows(&self, rows: usize) -> Vec<Vec<u8>> {
        let grid = PixelGrid::new(self.solution.len(), rows);
        self.solution
            .chunks(grid.cols.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_comparisons() {
        assert!(Direction::Minimize.at_least_as_good(1.0, 1.0));
        assert!(Direction::Minimize.at_least_as_good(0.5, 1.0));
        assert!(!Direction::Minimize.at_least_as_good(2.0, 1.0));
        assert!(!Direction::Minimize.strictly_better(1.0, 1.0));

        assert!(Direction::Maximize.at_least_as_good(2.0, 1.0));
        assert!(Direction::Maximize.strictly_better(2.0, 1.0));
        assert!(!Direction::Maximize.strictly_better(1.0, 1.0));

        assert_eq!(Direction::Minimize.worst_cost(), f64::INFINITY);
        assert_eq!(Direction::Maximize.worst_cost(), f64::NEG_INFINITY);
    }

    #[test]
    fn grid_mirror() {
        // 4x3 grid, row-major
        let grid = PixelGrid::new(12, 4);
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.mirror_x(0), 9); // (0,0) -> (3,0)
        assert_eq!(grid.mirror_x(4), 7); // (1,1) -> (2,1)
        assert_eq!(grid.mirror_x(9), 0);
        assert_eq!(grid.half_pixels(), 6);

        // Odd row count: the middle row mirrors onto itself and sits outside
        // the half range.
        let odd = PixelGrid::new(15, 5);
        assert_eq!(odd.mirror_x(7), 7); // (2,1) is the middle row
        assert_eq!(odd.half_pixels(), 6);
    }

    #[test]
    fn result_reshapes_row_major() {
        let result = OptimizationResult {
            cost: 0.0,
            iterations: 1,
            message: String::new(),
            solution: vec![1, 0, 0, 1],
            cost_evals: 1,
            convergence: vec![],
            solver: "dbs".into(),
        };
        assert_eq!(result.solution_rows(2), vec![vec![1, 0], vec![0, 1]]);
    }
}
