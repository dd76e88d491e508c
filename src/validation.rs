//! Business-rule checks for trip groups and routes.
//!
//! Rule failures are returned as violations (hard) or warnings (soft). Errors
//! are reserved for malformed values such as negative weights.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::problem::TemperatureRequirement;
use crate::solution::{TripRoute, TripSkuGroup};

/// A hard constraint that a group or route breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    SkuCountBelowMinimum { count: usize, min: usize },
    SkuCountAboveMaximum { count: usize, max: usize },
    WeightExceeded { weight_kg: f64, max_kg: f64 },
    VolumeExceeded { volume_m3: f64, max_m3: f64 },
    TooManyStops { stops: usize, max: usize },
    DurationExceeded { hours: f64, max_hours: f64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SkuCountBelowMinimum { count, min } => {
                write!(f, "SKU count {} is below the minimum of {}", count, min)
            }
            Violation::SkuCountAboveMaximum { count, max } => {
                write!(f, "SKU count {} is above the maximum of {}", count, max)
            }
            Violation::WeightExceeded { weight_kg, max_kg } => {
                write!(f, "weight {:.2} kg exceeds {:.2} kg", weight_kg, max_kg)
            }
            Violation::VolumeExceeded { volume_m3, max_m3 } => {
                write!(f, "volume {:.2} m3 exceeds {:.2} m3", volume_m3, max_m3)
            }
            Violation::TooManyStops { stops, max } => {
                write!(f, "{} delivery stops exceed the limit of {}", stops, max)
            }
            Violation::DurationExceeded { hours, max_hours } => {
                write!(f, "duration {:.2} h exceeds {:.2} h", hours, max_hours)
            }
        }
    }
}

/// A soft constraint worth a second look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    GeographicSpreadExceeded { spread_km: f64, max_km: f64 },
    MixedTemperatures { requirements: Vec<TemperatureRequirement> },
    LowCapacityUtilization { utilization: f64, min: f64 },
    HighCapacityUtilization { utilization: f64, max: f64 },
    ShortTimeWindow { location_id: String, window_hours: f64, dwell_hours: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::GeographicSpreadExceeded { spread_km, max_km } => write!(
                f,
                "geographic spread {:.2} km exceeds {:.2} km",
                spread_km, max_km
            ),
            Warning::MixedTemperatures { requirements } => write!(
                f,
                "group mixes temperature requirements: {}",
                requirements.iter().join(", ")
            ),
            Warning::LowCapacityUtilization { utilization, min } => write!(
                f,
                "capacity utilization {:.2} is below {:.2}",
                utilization, min
            ),
            Warning::HighCapacityUtilization { utilization, max } => write!(
                f,
                "capacity utilization {:.2} is above {:.2}",
                utilization, max
            ),
            Warning::ShortTimeWindow {
                location_id,
                window_hours,
                dwell_hours,
            } => write!(
                f,
                "time window of {} ({:.2} h) is shorter than the dwell time ({:.2} h)",
                location_id, window_hours, dwell_hours
            ),
        }
    }
}

/// Load and shape figures of a trip group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub sku_count: usize,
    pub stop_count: usize,
    pub fragile_count: usize,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub weight_utilization: f64,
    pub volume_utilization: f64,
    pub geographic_spread_km: f64,
}

/// Outcome of validating a group or a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    /// Only filled in for groups
    pub metrics: Option<GroupMetrics>,
}

impl ValidationResult {
    fn new(violations: Vec<Violation>, warnings: Vec<Warning>, metrics: Option<GroupMetrics>) -> Self {
        ValidationResult {
            is_valid: violations.is_empty(),
            violations,
            warnings,
            metrics,
        }
    }
}

/// Checks finished groups and routes against the configured limits.
pub struct ConstraintValidator {
    config: Config,
}

impl ConstraintValidator {
    /// Create a new validator for the given limits.
    pub fn new(config: Config) -> Self {
        ConstraintValidator { config }
    }

    /// Validate SKU count, weight and volume of a group. Spread above the
    /// limit and mixed temperature requirements are warnings.
    pub fn validate_group(&self, group: &TripSkuGroup) -> Result<ValidationResult> {
        let record = || format!("group {}", group.group_id);
        check_quantity(group.total_weight_kg, "weight", record)?;
        check_quantity(group.total_volume_m3, "volume", record)?;
        for member in &group.members {
            check_quantity(member.total_weight_kg, "member weight", record)?;
            check_quantity(member.total_volume_m3, "member volume", record)?;
        }

        let config = &self.config;
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let count = group.total_sku_count;
        if count < config.target_sku_count_min {
            violations.push(Violation::SkuCountBelowMinimum {
                count,
                min: config.target_sku_count_min,
            });
        }
        if count > config.target_sku_count_max {
            violations.push(Violation::SkuCountAboveMaximum {
                count,
                max: config.target_sku_count_max,
            });
        }
        self.check_capacity(group.total_weight_kg, group.total_volume_m3, &mut violations);

        let spread = group.geographic_spread();
        if spread > config.max_geographic_spread_km {
            warnings.push(Warning::GeographicSpreadExceeded {
                spread_km: spread,
                max_km: config.max_geographic_spread_km,
            });
        }

        let requirements: Vec<TemperatureRequirement> = group
            .members
            .iter()
            .filter_map(|member| member.temperature_requirement)
            .unique()
            .collect();
        if requirements.len() > 1 {
            warnings.push(Warning::MixedTemperatures { requirements });
        }

        let metrics = GroupMetrics {
            sku_count: count,
            stop_count: group.delivery_locations().len(),
            fragile_count: group.members.iter().filter(|member| member.fragile).count(),
            weight_kg: group.total_weight_kg,
            volume_m3: group.total_volume_m3,
            weight_utilization: group.total_weight_kg / config.max_trip_weight_kg,
            volume_utilization: group.total_volume_m3 / config.max_trip_volume_m3,
            geographic_spread_km: spread,
        };

        Ok(ValidationResult::new(violations, warnings, Some(metrics)))
    }

    /// Validate stop count, duration, weight and volume of a route.
    /// Utilization outside the configured band and time windows shorter
    /// than the dwell time are warnings.
    pub fn validate_route(&self, route: &TripRoute) -> Result<ValidationResult> {
        let record = || format!("route {}", route.trip_id);
        check_quantity(route.total_weight_kg, "weight", record)?;
        check_quantity(route.total_volume_m3, "volume", record)?;
        check_quantity(route.total_distance_km, "distance", record)?;
        check_quantity(route.estimated_duration_hours, "duration", record)?;

        let config = &self.config;
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        if route.stop_count() > config.max_delivery_stops {
            violations.push(Violation::TooManyStops {
                stops: route.stop_count(),
                max: config.max_delivery_stops,
            });
        }
        if route.estimated_duration_hours > config.max_trip_duration_hours {
            violations.push(Violation::DurationExceeded {
                hours: route.estimated_duration_hours,
                max_hours: config.max_trip_duration_hours,
            });
        }
        self.check_capacity(route.total_weight_kg, route.total_volume_m3, &mut violations);

        if route.capacity_utilization < config.min_capacity_utilization {
            warnings.push(Warning::LowCapacityUtilization {
                utilization: route.capacity_utilization,
                min: config.min_capacity_utilization,
            });
        } else if route.capacity_utilization > config.max_capacity_utilization {
            warnings.push(Warning::HighCapacityUtilization {
                utilization: route.capacity_utilization,
                max: config.max_capacity_utilization,
            });
        }

        for stop in &route.stops {
            if let Some(window) = &stop.time_window {
                let window_hours = window.duration_hours();
                if window_hours < config.per_stop_dwell_hours {
                    warnings.push(Warning::ShortTimeWindow {
                        location_id: stop.id.clone(),
                        window_hours,
                        dwell_hours: config.per_stop_dwell_hours,
                    });
                }
            }
        }

        Ok(ValidationResult::new(violations, warnings, None))
    }

    fn check_capacity(&self, weight_kg: f64, volume_m3: f64, violations: &mut Vec<Violation>) {
        if weight_kg > self.config.max_trip_weight_kg {
            violations.push(Violation::WeightExceeded {
                weight_kg,
                max_kg: self.config.max_trip_weight_kg,
            });
        }
        if volume_m3 > self.config.max_trip_volume_m3 {
            violations.push(Violation::VolumeExceeded {
                volume_m3,
                max_m3: self.config.max_trip_volume_m3,
            });
        }
    }
}

fn check_quantity(value: f64, name: &str, record: impl Fn() -> String) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(
            record(),
            format!("{} {} is negative or not a number", name, value),
        ))
    }
}
