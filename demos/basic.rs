//! Basic example of using the trip planner library.

use std::time::Duration;

use trip_planner::config::Config;
use trip_planner::problem::{DeliveryLocation, ManufacturingLocation, SkuDeliveryInfo, TemperatureRequirement};
use trip_planner::utils::{format_hours, PlanStatistics};
use trip_planner::TripPlanner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A bakery supplier in Berlin delivering to six supermarkets
    let factory = ManufacturingLocation::new("F-BER-01", "BAKERY", 52.4125, 13.2841);
    let stores = [
        ("S-01", "Mitte", 52.5200, 13.4050),
        ("S-02", "Prenzlauer Berg", 52.5389, 13.4244),
        ("S-03", "Kreuzberg", 52.4986, 13.4030),
        ("S-04", "Charlottenburg", 52.5163, 13.3041),
        ("S-05", "Neukoelln", 52.4811, 13.4350),
        ("S-06", "Spandau", 52.5359, 13.2016),
    ];

    let mut demand = Vec::new();
    for (order, (id, name, lat, lon)) in stores.iter().enumerate() {
        let location = DeliveryLocation::new(id, name, *lat, *lon).with_retailer("RETAIL-1");
        for sku in 0..20 {
            let record = SkuDeliveryInfo::new(
                &format!("BREAD-{:02}", sku),
                &format!("ORDER-{}", order + 1),
                "BAKERY",
                (sku % 5 + 1) as u32,
                0.8,
                0.004,
            )
            .with_product("Sourdough loaf", "Bakery", "Acme")
            .with_temperature(TemperatureRequirement::Ambient)
            .with_location(location.clone());
            demand.push(record);
        }
    }

    // Few SKUs here, so relax the group size window
    let config = Config::new()
        .with_sku_count_range(1, 100)
        .with_time_limit(Duration::from_secs(10));

    let planner = TripPlanner::new(config)?;
    let plan = planner.plan(&demand, &[factory])?;

    for trip in plan.trips() {
        println!(
            "Group {}: {} SKUs, {:.1} kg, valid: {}",
            trip.group.group_id,
            trip.group.total_sku_count,
            trip.group.total_weight_kg,
            trip.group_validation.is_valid
        );
        if let Some(route) = &trip.route {
            println!(
                "  {} -> {} ({:.1} km, {})",
                route.origin_id,
                route.stop_ids().join(" -> "),
                route.total_distance_km,
                format_hours(route.estimated_duration_hours)
            );
        }
    }

    println!();
    println!("{}", PlanStatistics::from_plan(&plan).format());

    Ok(())
}
