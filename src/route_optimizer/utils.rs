//! Distance matrix over the origin and the stops of one trip.

use crate::geometry::{haversine_distance, Coordinate};

/// Index of the trip origin in every distance matrix.
pub const ORIGIN: usize = 0;

/// Symmetric great-circle distance matrix. Index 0 is the origin, index
/// `k + 1` is the k-th stop.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    distances: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Build the matrix for an origin and its stops.
    pub fn new(origin: Coordinate, stops: &[Coordinate]) -> Self {
        let points: Vec<Coordinate> = std::iter::once(origin).chain(stops.iter().copied()).collect();
        let n = points.len();
        let mut distances = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let distance = haversine_distance(points[i], points[j]);
                distances[i][j] = distance;
                distances[j][i] = distance;
            }
        }

        DistanceMatrix { distances }
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    /// Number of points, origin included.
    pub fn size(&self) -> usize {
        self.distances.len()
    }

    /// Number of stops, origin excluded.
    pub fn stop_count(&self) -> usize {
        self.size() - 1
    }

    /// Length of an open path: sum of consecutive legs, no return leg.
    pub fn path_distance(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|leg| self.get(leg[0], leg[1])).sum()
    }
}
