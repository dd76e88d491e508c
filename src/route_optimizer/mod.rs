//! Stop sequencing and trip metrics for a single trip.

pub mod construction;
pub mod two_opt;
pub mod utils;

use chrono::Utc;
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::error::Result;
use crate::geometry::Coordinate;
use crate::problem::{DeliveryLocation, ManufacturingLocation};
use crate::solution::{unique_locations, DeliveryDemand, TripItem, TripRoute, TripSkuGroup};

use self::utils::DistanceMatrix;

/// Orders the stops of a trip and derives its distance, duration and load.
pub struct RouteOptimizer {
    config: Config,
    /// Routes issued so far, part of every trip id
    sequence: AtomicU64,
}

impl RouteOptimizer {
    /// Create a new optimizer for the given limits.
    pub fn new(config: Config) -> Self {
        RouteOptimizer {
            config,
            sequence: AtomicU64::new(0),
        }
    }

    /// Sequence the unique stops of `items` starting from `origin`.
    ///
    /// The tour is built by density-weighted nearest neighbour and improved by
    /// 2-opt. Every item is validated first, so a zero quantity or an item
    /// without stops is rejected. An empty item list produces an empty route
    /// with zero distance and duration. Capacity is reported, not enforced.
    pub fn optimize_trip_route<D: DeliveryDemand>(
        &self,
        items: &[D],
        origin: &ManufacturingLocation,
    ) -> Result<TripRoute> {
        origin.validate()?;
        for item in items {
            item.validate()?;
        }

        let stops = unique_locations(items);
        let sku_counts = Self::sku_counts(items, &stops);
        let coordinates: Vec<Coordinate> =
            stops.iter().map(|stop| stop.coordinate()).collect();

        let matrix = DistanceMatrix::new(origin.coordinate(), &coordinates);
        let mut path = self.nearest_neighbor_tour(&matrix, &sku_counts);
        let initial_distance = matrix.path_distance(&path);
        let moves = self.two_opt(&matrix, &mut path);

        let total_distance_km = matrix.path_distance(&path);
        debug!(
            "Routed {} stops from {}: {:.2} km after {} 2-opt moves (initial {:.2} km)",
            stops.len(),
            origin.id,
            total_distance_km,
            moves,
            initial_distance
        );

        let ordered_stops: Vec<DeliveryLocation> = path[1..]
            .iter()
            .map(|&idx| stops[idx - 1].clone())
            .collect();

        let arrival_offsets_hours = self.arrival_offsets(&matrix, &path);
        let stop_count = ordered_stops.len() as f64;
        let estimated_duration_hours = total_distance_km / self.config.average_driving_speed_kmh
            + stop_count * self.config.per_stop_dwell_hours;

        let total_weight_kg: f64 = items.iter().map(|item| item.total_weight_kg()).sum();
        let total_volume_m3: f64 = items.iter().map(|item| item.total_volume_m3()).sum();
        let capacity_utilization = (total_weight_kg / self.config.max_trip_weight_kg)
            .max(total_volume_m3 / self.config.max_trip_volume_m3);

        let trip_items: Vec<TripItem> = items
            .iter()
            .map(|item| TripItem {
                sku_code: item.sku_code().to_string(),
                quantity: item.quantity(),
                weight_kg: item.total_weight_kg(),
                volume_m3: item.total_volume_m3(),
            })
            .collect();

        Ok(TripRoute {
            trip_id: self.generate_trip_id(origin, &ordered_stops, &trip_items),
            group_id: None,
            origin_id: origin.id.clone(),
            stops: ordered_stops,
            arrival_offsets_hours,
            items: trip_items,
            total_distance_km,
            estimated_duration_hours,
            total_weight_kg,
            total_volume_m3,
            capacity_utilization,
        })
    }

    /// Sequence the stops of a trip group and tag the route with its id.
    pub fn optimize_group(
        &self,
        group: &TripSkuGroup,
        origin: &ManufacturingLocation,
    ) -> Result<TripRoute> {
        let mut route = self.optimize_trip_route(&group.members, origin)?;
        route.group_id = Some(group.group_id.clone());
        Ok(route)
    }

    /// Number of items delivering to each stop.
    fn sku_counts<D: DeliveryDemand>(items: &[D], stops: &[&DeliveryLocation]) -> Vec<usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for item in items {
            let mut seen: Vec<&str> = Vec::new();
            for location in item.delivery_locations() {
                if !seen.contains(&location.id.as_str()) {
                    seen.push(location.id.as_str());
                    *counts.entry(location.id.as_str()).or_insert(0) += 1;
                }
            }
        }

        stops
            .iter()
            .map(|stop| counts.get(stop.id.as_str()).copied().unwrap_or(0))
            .collect()
    }

    /// Hours after departure at which each stop of `path` is reached.
    fn arrival_offsets(&self, matrix: &DistanceMatrix, path: &[usize]) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(path.len().saturating_sub(1));
        let mut elapsed = 0.0;

        for leg in path.windows(2) {
            elapsed += matrix.get(leg[0], leg[1]) / self.config.average_driving_speed_kmh;
            offsets.push(elapsed);
            elapsed += self.config.per_stop_dwell_hours;
        }

        offsets
    }

    /// Unique per optimizer call: creation time, issue sequence and a hash of
    /// the route content.
    fn generate_trip_id(
        &self,
        origin: &ManufacturingLocation,
        stops: &[DeliveryLocation],
        items: &[TripItem],
    ) -> String {
        let now = Utc::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut hasher = DefaultHasher::new();

        origin.id.hash(&mut hasher);
        for stop in stops {
            stop.id.hash(&mut hasher);
        }
        for item in items {
            item.sku_code.hash(&mut hasher);
            item.quantity.hash(&mut hasher);
        }
        sequence.hash(&mut hasher);

        format!(
            "TRIP-{}-{:06}-{:016x}",
            now.timestamp_millis(),
            sequence,
            hasher.finish()
        )
    }
}
