//! Tests for stop sequencing, 2-opt and trip metrics.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use trip_planner::config::Config;
use trip_planner::consolidation::ConsolidationEngine;
use trip_planner::error::Error;
use trip_planner::geometry::{haversine_distance, Coordinate};
use trip_planner::problem::{DeliveryLocation, ManufacturingLocation, SkuDeliveryInfo};
use trip_planner::route_optimizer::utils::DistanceMatrix;
use trip_planner::route_optimizer::RouteOptimizer;
use trip_planner::solution::ConsolidatedSku;

fn create_test_origin() -> ManufacturingLocation {
    ManufacturingLocation::new("FACTORY-1", "M1", 52.45, 13.30)
}

fn create_test_demand(sku: &str, order: &str, quantity: u32, location: DeliveryLocation) -> SkuDeliveryInfo {
    SkuDeliveryInfo::new(sku, order, "M1", quantity, 10.0, 0.01).with_location(location)
}

fn equator_location(id: &str, longitude: f64) -> DeliveryLocation {
    DeliveryLocation::new(id, id, 0.0, longitude)
}

#[test]
fn test_scenario_route_over_three_stops() {
    let config = Config::new().with_sku_count_range(1, 100);
    let engine = ConsolidationEngine::new(config.clone());
    let optimizer = RouteOptimizer::new(config.clone());

    let demand = vec![
        create_test_demand("A", "O1", 100, DeliveryLocation::new("L1", "Mitte", 52.52, 13.40)),
        create_test_demand("B", "O2", 200, DeliveryLocation::new("L2", "Pankow", 52.60, 13.40)),
        create_test_demand("C", "O3", 300, DeliveryLocation::new("L3", "Lichtenberg", 52.52, 13.55)),
    ];

    let consolidated = engine.consolidate(&demand, "M1").unwrap();
    let groups = engine.create_trip_groups(&consolidated);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].total_sku_count, 3);

    let route = optimizer.optimize_group(&groups[0], &create_test_origin()).unwrap();
    assert_eq!(route.stop_count(), 3);
    assert_eq!(route.group_id.as_deref(), Some(groups[0].group_id.as_str()));
    assert_eq!(route.origin_id, "FACTORY-1");
    assert!(route.total_distance_km > 0.0);
    assert!((route.total_weight_kg - 6000.0).abs() < 1e-9);
    assert!((route.total_volume_m3 - 6.0).abs() < 1e-9);
    assert!((route.capacity_utilization - 6000.0 / 25_000.0).abs() < 1e-12);

    let expected_duration = route.total_distance_km / 60.0 + 3.0 * 0.5;
    assert!((route.estimated_duration_hours - expected_duration).abs() < 1e-9);

    let mut ids = route.stop_ids();
    ids.sort();
    assert_eq!(ids, vec!["L1", "L2", "L3"]);
}

#[test]
fn test_route_distance_is_sum_of_legs_without_return() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = create_test_origin();

    let demand = vec![
        create_test_demand("A", "O1", 1, DeliveryLocation::new("L1", "L1", 52.52, 13.40)),
        create_test_demand("B", "O1", 1, DeliveryLocation::new("L2", "L2", 52.40, 13.60)),
        create_test_demand("C", "O1", 1, DeliveryLocation::new("L3", "L3", 52.55, 13.20)),
        create_test_demand("D", "O1", 1, DeliveryLocation::new("L4", "L4", 52.48, 13.45)),
    ];

    let route = optimizer.optimize_trip_route(&demand, &origin).unwrap();

    let mut expected = 0.0;
    let mut previous = origin.coordinate();
    for stop in &route.stops {
        expected += haversine_distance(previous, stop.coordinate());
        previous = stop.coordinate();
    }
    assert!((route.total_distance_km - expected).abs() < 1e-9);

    // Arrival at stop k: driving so far plus dwell at the k earlier stops
    let mut elapsed_km = 0.0;
    let mut previous = origin.coordinate();
    for (k, stop) in route.stops.iter().enumerate() {
        elapsed_km += haversine_distance(previous, stop.coordinate());
        previous = stop.coordinate();
        let expected_offset = elapsed_km / 60.0 + k as f64 * 0.5;
        assert!((route.arrival_offsets_hours[k] - expected_offset).abs() < 1e-9);
    }
}

#[test]
fn test_empty_trip_returns_degenerate_route() {
    let optimizer = RouteOptimizer::new(Config::default());
    let items: Vec<ConsolidatedSku> = Vec::new();

    let route = optimizer.optimize_trip_route(&items, &create_test_origin()).unwrap();
    assert!(route.is_empty());
    assert!(route.arrival_offsets_hours.is_empty());
    assert_eq!(route.total_distance_km, 0.0);
    assert_eq!(route.estimated_duration_hours, 0.0);
    assert_eq!(route.capacity_utilization, 0.0);
    assert!(route.trip_id.starts_with("TRIP-"));
}

#[test]
fn test_single_stop_trip() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = create_test_origin();
    let location = DeliveryLocation::new("L1", "Only", 52.52, 13.40);

    let route = optimizer
        .optimize_trip_route(&[create_test_demand("A", "O1", 5, location.clone())], &origin)
        .unwrap();

    let distance = haversine_distance(origin.coordinate(), location.coordinate());
    assert_eq!(route.stop_ids(), vec!["L1"]);
    assert!((route.total_distance_km - distance).abs() < 1e-9);
    assert!((route.estimated_duration_hours - (distance / 60.0 + 0.5)).abs() < 1e-9);
}

#[test]
fn test_shared_stops_are_visited_once() {
    let optimizer = RouteOptimizer::new(Config::default());
    let shared = DeliveryLocation::new("L1", "Shared", 52.52, 13.40);

    let demand = vec![
        create_test_demand("A", "O1", 1, shared.clone()),
        create_test_demand("B", "O2", 1, shared.clone()),
        create_test_demand("C", "O3", 1, DeliveryLocation::new("L2", "Other", 52.50, 13.45)),
    ];

    let route = optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap();
    assert_eq!(route.stop_count(), 2);
    assert_eq!(route.items.len(), 3);
}

#[test]
fn test_first_stop_prefers_sku_density() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = ManufacturingLocation::new("F", "M1", 0.0, 0.0);

    let near = equator_location("NEAR", 0.01);
    let dense = equator_location("DENSE", 0.5);
    let demand = vec![
        create_test_demand("A", "O1", 1, near),
        create_test_demand("B", "O1", 1, dense.clone()),
        create_test_demand("C", "O1", 1, dense.clone()),
        create_test_demand("D", "O1", 1, dense),
    ];

    let route = optimizer.optimize_trip_route(&demand, &origin).unwrap();
    assert_eq!(route.stop_ids(), vec!["DENSE", "NEAR"]);
}

#[test]
fn test_nearest_neighbor_follows_closest_stop() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = Coordinate::new(0.0, 0.0);
    let stops = [
        Coordinate::new(0.0, 3.0),
        Coordinate::new(0.0, 1.0),
        Coordinate::new(0.0, 2.0),
    ];

    let matrix = DistanceMatrix::new(origin, &stops);
    let path = optimizer.nearest_neighbor_tour(&matrix, &[1, 1, 1]);
    assert_eq!(path, vec![0, 2, 3, 1]);
}

#[test]
fn test_two_opt_removes_crossing() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = Coordinate::new(0.0, 0.0);
    let stops = [
        Coordinate::new(0.0, 1.0),
        Coordinate::new(0.0, 2.0),
        Coordinate::new(0.0, 3.0),
        Coordinate::new(0.0, 4.0),
    ];
    let matrix = DistanceMatrix::new(origin, &stops);

    let mut path = vec![0, 1, 3, 2, 4];
    let before = matrix.path_distance(&path);
    let moves = optimizer.two_opt(&matrix, &mut path);

    assert!(moves >= 1);
    assert_eq!(path, vec![0, 1, 2, 3, 4]);
    assert!(matrix.path_distance(&path) < before);
}

#[test]
fn test_two_opt_never_lengthens_the_tour() {
    let optimizer = RouteOptimizer::new(Config::default());
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..200 {
        let stop_count = rng.gen_range(4..25);
        let origin = Coordinate::new(rng.gen_range(47.0..55.0), rng.gen_range(6.0..15.0));
        let stops: Vec<Coordinate> = (0..stop_count)
            .map(|_| {
                Coordinate::new(
                    origin.latitude + rng.gen_range(-1.0..1.0),
                    origin.longitude + rng.gen_range(-1.0..1.0),
                )
            })
            .collect();
        let counts: Vec<usize> = (0..stop_count).map(|_| rng.gen_range(1..6)).collect();

        let matrix = DistanceMatrix::new(origin, &stops);
        let mut path = optimizer.nearest_neighbor_tour(&matrix, &counts);
        let initial = matrix.path_distance(&path);

        optimizer.two_opt(&matrix, &mut path);
        assert!(matrix.path_distance(&path) <= initial + 1e-9);

        // Still a permutation of all stops starting at the origin
        assert_eq!(path[0], 0);
        let mut sorted = path.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..=stop_count).collect::<Vec<_>>());
    }
}

#[test]
fn test_optimization_is_deterministic() {
    let optimizer = RouteOptimizer::new(Config::default());
    let origin = create_test_origin();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let demand: Vec<SkuDeliveryInfo> = (0..30)
        .map(|i| {
            create_test_demand(
                &format!("SKU-{}", i),
                "O1",
                rng.gen_range(1..10),
                DeliveryLocation::new(
                    &format!("L{}", rng.gen_range(0..15)),
                    "Store",
                    52.3 + rng.gen_range(0.0..0.4),
                    13.1 + rng.gen_range(0.0..0.5),
                ),
            )
        })
        .collect();

    let first = optimizer.optimize_trip_route(&demand, &origin).unwrap();
    let second = optimizer.optimize_trip_route(&demand, &origin).unwrap();

    assert_eq!(first.stop_ids(), second.stop_ids());
    assert_eq!(first.total_distance_km, second.total_distance_km);
    assert_eq!(first.estimated_duration_hours, second.estimated_duration_hours);
    assert_eq!(first.arrival_offsets_hours, second.arrival_offsets_hours);
    assert_eq!(first.capacity_utilization, second.capacity_utilization);
    assert_eq!(first.items, second.items);
}

#[test]
fn test_capacity_utilization_is_reported_not_enforced() {
    let optimizer = RouteOptimizer::new(Config::default());
    let demand = vec![SkuDeliveryInfo::new("STEEL", "O1", "M1", 3, 10_000.0, 1.0)
        .with_location(DeliveryLocation::new("L1", "Yard", 52.5, 13.4))];

    let route = optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap();
    assert!((route.capacity_utilization - 1.2).abs() < 1e-12);
    assert_eq!(route.stop_count(), 1);
}

#[test]
fn test_volume_can_drive_capacity_utilization() {
    let optimizer = RouteOptimizer::new(Config::default());
    let demand = vec![SkuDeliveryInfo::new("FOAM", "O1", "M1", 10, 1.0, 9.0)
        .with_location(DeliveryLocation::new("L1", "Depot", 52.5, 13.4))];

    let route = optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap();
    assert!((route.capacity_utilization - 0.9).abs() < 1e-12);
}

#[test]
fn test_malformed_input_is_rejected() {
    let optimizer = RouteOptimizer::new(Config::default());
    let location = DeliveryLocation::new("L1", "Store", 52.5, 13.4);

    let bad_origin = ManufacturingLocation::new("F", "M1", 120.0, 13.4);
    let result =
        optimizer.optimize_trip_route(&[create_test_demand("A", "O1", 1, location.clone())], &bad_origin);
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let negative = SkuDeliveryInfo::new("NEG", "O1", "M1", 1, -5.0, 0.1).with_location(location.clone());
    let result = optimizer.optimize_trip_route(&[negative], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let zero_quantity = create_test_demand("ZERO", "O1", 0, location.clone());
    let result = optimizer.optimize_trip_route(&[zero_quantity], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let no_stops = SkuDeliveryInfo::new("NOWHERE", "O1", "M1", 3, 1.0, 0.1);
    let result = optimizer.optimize_trip_route(&[no_stops], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));
}

#[test]
fn test_malformed_consolidated_sku_is_rejected() {
    let optimizer = RouteOptimizer::new(Config::default());
    let engine = ConsolidationEngine::new(Config::default());
    let demand = vec![create_test_demand("A", "O1", 2, DeliveryLocation::new("L1", "Store", 52.5, 13.4))];
    let consolidated = engine.consolidate(&demand, "M1").unwrap();

    let mut zero_quantity = consolidated[0].clone();
    zero_quantity.total_quantity = 0;
    let result = optimizer.optimize_trip_route(&[zero_quantity], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let mut no_stops = consolidated[0].clone();
    no_stops.delivery_locations.clear();
    let result = optimizer.optimize_trip_route(&[no_stops], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let mut nan_volume = consolidated[0].clone();
    nan_volume.total_volume_m3 = f64::NAN;
    let result = optimizer.optimize_trip_route(&[nan_volume], &create_test_origin());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    assert!(optimizer.optimize_trip_route(&consolidated, &create_test_origin()).is_ok());
}

#[test]
fn test_trip_ids_differ_between_calls() {
    let optimizer = RouteOptimizer::new(Config::default());
    let demand = vec![create_test_demand("A", "O1", 1, DeliveryLocation::new("L1", "S", 52.5, 13.4))];

    let first = optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap();

    assert_ne!(first.trip_id, second.trip_id);
}

#[test]
fn test_trip_ids_are_unique_for_identical_back_to_back_calls() {
    let optimizer = RouteOptimizer::new(Config::default());
    let demand = vec![create_test_demand("A", "O1", 1, DeliveryLocation::new("L1", "S", 52.5, 13.4))];

    let ids: HashSet<String> = (0..500)
        .map(|_| optimizer.optimize_trip_route(&demand, &create_test_origin()).unwrap().trip_id)
        .collect();

    assert_eq!(ids.len(), 500);
}
