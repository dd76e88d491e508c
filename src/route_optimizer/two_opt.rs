//! 2-opt improvement of an open delivery path.

use log::trace;

use super::utils::DistanceMatrix;
use super::RouteOptimizer;

/// Minimum gain for a move to count as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

impl RouteOptimizer {
    /// Improve a path in place with first-improvement 2-opt.
    ///
    /// For edges `(i, i+1)` and `(j, j+1)` with `i + 2 <= j`, the segment
    /// `i+1..=j` is reversed when that shortens the path. Passes repeat until
    /// one makes no change or the configured pass bound is hit. The result is
    /// a local optimum, not an optimal tour. The origin at index 0 never moves.
    ///
    /// Returns the number of applied moves.
    pub fn two_opt(&self, matrix: &DistanceMatrix, path: &mut [usize]) -> usize {
        let n = path.len();
        if n < 4 {
            return 0;
        }

        let mut moves = 0;
        for pass in 0..self.config.max_two_opt_passes {
            let mut improved = false;

            for i in 0..n - 3 {
                for j in i + 2..n - 1 {
                    let delta = Self::evaluate_two_opt(matrix, path, i, j);
                    if delta < -IMPROVEMENT_EPSILON {
                        path[i + 1..=j].reverse();
                        improved = true;
                        moves += 1;
                        trace!("2-opt pass {}: reversed {}..={} (delta {:.4})", pass, i + 1, j, delta);
                    }
                }
            }

            if !improved {
                break;
            }
        }

        moves
    }

    /// Change in path length when reversing `path[i+1..=j]`.
    ///
    /// Only the two replaced edges differ: the matrix is symmetric, so the
    /// reversed interior keeps its length and this equals the full delta.
    fn evaluate_two_opt(matrix: &DistanceMatrix, path: &[usize], i: usize, j: usize) -> f64 {
        let (a, b) = (path[i], path[i + 1]);
        let (c, d) = (path[j], path[j + 1]);

        let old_cost = matrix.get(a, b) + matrix.get(c, d);
        let new_cost = matrix.get(a, c) + matrix.get(b, d);

        new_cost - old_cost
    }
}
