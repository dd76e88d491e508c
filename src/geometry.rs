//! Great-circle distance and simple geographic aggregates.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for all great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Check that latitude lies in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Calculate the great-circle distance to another coordinate in kilometers.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        haversine_distance(*self, *other)
    }
}

/// Haversine distance between two coordinates in kilometers.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Arithmetic mean of latitudes and longitudes.
///
/// This is not a spherical centroid. It is close enough for city and regional
/// spreads and is undefined near the antimeridian. Returns `None` for an
/// empty input.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }

    let count = points.len() as f64;
    let (sum_lat, sum_lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));

    Some(Coordinate::new(sum_lat / count, sum_lon / count))
}

/// Largest pairwise haversine distance in a set of points; zero for fewer
/// than two points.
pub fn geographic_spread(points: &[Coordinate]) -> f64 {
    points
        .iter()
        .tuple_combinations()
        .map(|(a, b)| a.distance(b))
        .fold(0.0, f64::max)
}

/// Spread of `existing` after adding `added`, given the current spread of
/// `existing`. Only the pairs involving new points are evaluated.
pub fn extended_spread(existing: &[Coordinate], current_spread: f64, added: &[Coordinate]) -> f64 {
    let mut spread = current_spread;

    for (i, new_point) in added.iter().enumerate() {
        for other in existing.iter().chain(&added[..i]) {
            spread = spread.max(new_point.distance(other));
        }
    }

    spread
}
