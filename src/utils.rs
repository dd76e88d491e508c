//! Formatting and reporting helpers for plan results.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::PlanResult;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Format fractional hours as hours and minutes.
pub fn format_hours(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as u64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

/// Summary figures of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStatistics {
    pub manufacturers: usize,
    pub consolidated_skus: usize,
    pub groups: usize,
    pub valid_groups: usize,
    pub routes: usize,
    pub valid_routes: usize,
    pub unrouted_groups: usize,
    pub total_distance_km: f64,
    pub average_capacity_utilization: f64,
    pub runtime: Duration,
}

impl PlanStatistics {
    /// Collect the statistics of a plan.
    pub fn from_plan(plan: &PlanResult) -> Self {
        let routes: Vec<_> = plan.routes().collect();
        let average_capacity_utilization = if routes.is_empty() {
            0.0
        } else {
            routes
                .iter()
                .map(|route| route.capacity_utilization)
                .sum::<f64>()
                / routes.len() as f64
        };

        PlanStatistics {
            manufacturers: plan.scopes.len(),
            consolidated_skus: plan
                .scopes
                .iter()
                .map(|scope| scope.consolidated_sku_count)
                .sum(),
            groups: plan.trips().count(),
            valid_groups: plan
                .trips()
                .filter(|trip| trip.group_validation.is_valid)
                .count(),
            routes: routes.len(),
            valid_routes: plan
                .trips()
                .filter_map(|trip| trip.route_validation.as_ref())
                .filter(|validation| validation.is_valid)
                .count(),
            unrouted_groups: plan.unrouted_groups.len(),
            total_distance_km: routes.iter().map(|route| route.total_distance_km).sum(),
            average_capacity_utilization,
            runtime: plan.run_time,
        }
    }

    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Plan Statistics:
- Manufacturers: {}
- Consolidated SKUs: {}
- Trip Groups: {} ({} valid)
- Routes: {} ({} valid)
- Unrouted Groups: {}
- Total Distance: {:.2} km
- Average Capacity Utilization: {:.2}
- Runtime: {}",
            self.manufacturers,
            self.consolidated_skus,
            self.groups,
            self.valid_groups,
            self.routes,
            self.valid_routes,
            self.unrouted_groups,
            self.total_distance_km,
            self.average_capacity_utilization,
            format_duration(self.runtime)
        )
    }
}

/// Save a human-readable report of a plan to a file.
pub fn save_plan_report<P: AsRef<Path>>(plan: &PlanResult, path: P) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "{}", PlanStatistics::from_plan(plan).format())?;
    writeln!(file)?;

    for scope in &plan.scopes {
        writeln!(
            file,
            "Manufacturer {} (origin {})",
            scope.manufacturer_id, scope.manufacturing_location_id
        )?;

        for trip in &scope.trips {
            let group = &trip.group;
            writeln!(
                file,
                "  Group {}: {} SKUs, {:.2} kg, {:.2} m3, {}",
                group.group_id,
                group.total_sku_count,
                group.total_weight_kg,
                group.total_volume_m3,
                if trip.group_validation.is_valid {
                    "valid"
                } else {
                    "INVALID"
                }
            )?;
            for violation in &trip.group_validation.violations {
                writeln!(file, "    violation: {}", violation)?;
            }
            for warning in &trip.group_validation.warnings {
                writeln!(file, "    warning: {}", warning)?;
            }

            let Some(route) = &trip.route else {
                writeln!(file, "    Route: not computed")?;
                continue;
            };

            write!(file, "    Route {}: {}", route.trip_id, scope.manufacturing_location_id)?;
            for stop in &route.stops {
                write!(file, " -> {}", stop.id)?;
            }
            writeln!(file)?;
            writeln!(
                file,
                "      Distance: {:.2} km, Duration: {}, Utilization: {:.2}",
                route.total_distance_km,
                format_hours(route.estimated_duration_hours),
                route.capacity_utilization
            )?;

            if let Some(validation) = &trip.route_validation {
                for violation in &validation.violations {
                    writeln!(file, "      violation: {}", violation)?;
                }
                for warning in &validation.warnings {
                    writeln!(file, "      warning: {}", warning)?;
                }
            }
        }
        writeln!(file)?;
    }

    if !plan.unmatched_manufacturers.is_empty() {
        writeln!(
            file,
            "Manufacturers without a manufacturing location: {}",
            plan.unmatched_manufacturers.join(", ")
        )?;
    }

    Ok(())
}
