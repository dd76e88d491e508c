//! Density-weighted nearest-neighbour construction of the initial tour.

use super::utils::{DistanceMatrix, ORIGIN};
use super::RouteOptimizer;

/// Weight of origin proximity when choosing the first stop.
const FIRST_STOP_PROXIMITY_WEIGHT: f64 = 0.6;
/// Weight of SKU density when choosing the first stop.
const FIRST_STOP_DENSITY_WEIGHT: f64 = 0.4;

impl RouteOptimizer {
    /// Build an initial open path starting at the origin.
    ///
    /// `sku_counts[k]` is the number of SKUs delivered to stop `k` (matrix
    /// index `k + 1`). The first stop maximises a blend of closeness to the
    /// origin and SKU count; every following stop minimises distance divided
    /// by its SKU count plus one, so a farther stop can win when it takes
    /// many SKUs. Ties keep the stop listed first.
    pub fn nearest_neighbor_tour(&self, matrix: &DistanceMatrix, sku_counts: &[usize]) -> Vec<usize> {
        let stop_count = matrix.stop_count();
        let mut path = Vec::with_capacity(stop_count + 1);
        path.push(ORIGIN);

        if stop_count == 0 {
            return path;
        }

        let mut visited = vec![false; stop_count + 1];
        visited[ORIGIN] = true;

        let mut first = 1;
        let mut best_score = f64::NEG_INFINITY;
        for stop in 1..=stop_count {
            let score = FIRST_STOP_PROXIMITY_WEIGHT / (matrix.get(ORIGIN, stop) + 1.0)
                + FIRST_STOP_DENSITY_WEIGHT * sku_counts[stop - 1] as f64;
            if score > best_score {
                best_score = score;
                first = stop;
            }
        }
        visited[first] = true;
        path.push(first);

        let mut current = first;
        while path.len() <= stop_count {
            let mut next = None;
            let mut best_cost = f64::INFINITY;

            for candidate in 1..=stop_count {
                if visited[candidate] {
                    continue;
                }
                let cost =
                    matrix.get(current, candidate) / (sku_counts[candidate - 1] as f64 + 1.0);
                if next.is_none() || cost < best_cost {
                    best_cost = cost;
                    next = Some(candidate);
                }
            }

            match next {
                Some(stop) => {
                    visited[stop] = true;
                    path.push(stop);
                    current = stop;
                }
                None => break,
            }
        }

        path
    }
}
