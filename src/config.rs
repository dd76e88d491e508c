//! Business limits and tuning parameters for consolidation and routing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration settings shared by the consolidation engine, the route
/// optimizer and the constraint validator.
///
/// Values are read once by the host application and treated as immutable for
/// the lifetime of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum number of consolidated SKUs in a trip group
    pub target_sku_count_min: usize,
    /// Maximum number of consolidated SKUs in a trip group
    pub target_sku_count_max: usize,
    /// Vehicle weight limit in kilograms
    pub max_trip_weight_kg: f64,
    /// Vehicle volume limit in cubic meters
    pub max_trip_volume_m3: f64,
    /// Largest allowed distance between any two stops of a group
    pub max_geographic_spread_km: f64,
    /// Longest allowed trip, driving plus dwell time
    pub max_trip_duration_hours: f64,
    /// Maximum number of stops on one route
    pub max_delivery_stops: usize,
    /// Speed used to convert distance into driving time
    pub average_driving_speed_kmh: f64,
    /// Time spent unloading at every stop
    pub per_stop_dwell_hours: f64,
    /// Capacity utilization below which a route is reported as underused
    pub min_capacity_utilization: f64,
    /// Capacity utilization above which a route is reported as near-saturated
    pub max_capacity_utilization: f64,
    /// Upper bound on full 2-opt passes over one route
    pub max_two_opt_passes: usize,
    /// Optional wall-clock limit for routing a whole batch
    pub time_limit: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_sku_count_min: 90,
            target_sku_count_max: 100,
            max_trip_weight_kg: 25_000.0,
            max_trip_volume_m3: 100.0,
            max_geographic_spread_km: 200.0,
            max_trip_duration_hours: 8.0,
            max_delivery_stops: 20,
            average_driving_speed_kmh: 60.0,
            per_stop_dwell_hours: 0.5,
            min_capacity_utilization: 0.8,
            max_capacity_utilization: 0.95,
            max_two_opt_passes: 1000,
            time_limit: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings describe a usable vehicle and grouping policy.
    pub fn validate(&self) -> Result<()> {
        if self.target_sku_count_max == 0 {
            return Err(Error::InvalidConfig(
                "target_sku_count_max must be at least 1".to_string(),
            ));
        }
        if self.target_sku_count_min > self.target_sku_count_max {
            return Err(Error::InvalidConfig(format!(
                "target_sku_count_min ({}) exceeds target_sku_count_max ({})",
                self.target_sku_count_min, self.target_sku_count_max
            )));
        }

        let positive = [
            ("max_trip_weight_kg", self.max_trip_weight_kg),
            ("max_trip_volume_m3", self.max_trip_volume_m3),
            ("max_geographic_spread_km", self.max_geographic_spread_km),
            ("max_trip_duration_hours", self.max_trip_duration_hours),
            ("average_driving_speed_kmh", self.average_driving_speed_kmh),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if !(self.per_stop_dwell_hours.is_finite() && self.per_stop_dwell_hours >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "per_stop_dwell_hours must be non-negative, got {}",
                self.per_stop_dwell_hours
            )));
        }
        if self.min_capacity_utilization > self.max_capacity_utilization {
            return Err(Error::InvalidConfig(format!(
                "min_capacity_utilization ({}) exceeds max_capacity_utilization ({})",
                self.min_capacity_utilization, self.max_capacity_utilization
            )));
        }

        Ok(())
    }

    /// Set the accepted range of SKUs per trip group.
    pub fn with_sku_count_range(mut self, min: usize, max: usize) -> Self {
        self.target_sku_count_min = min;
        self.target_sku_count_max = max;
        self
    }

    /// Set the vehicle weight limit.
    pub fn with_max_trip_weight_kg(mut self, weight: f64) -> Self {
        self.max_trip_weight_kg = weight;
        self
    }

    /// Set the vehicle volume limit.
    pub fn with_max_trip_volume_m3(mut self, volume: f64) -> Self {
        self.max_trip_volume_m3 = volume;
        self
    }

    /// Set the largest allowed geographic spread of a group.
    pub fn with_max_geographic_spread_km(mut self, spread: f64) -> Self {
        self.max_geographic_spread_km = spread;
        self
    }

    /// Set the longest allowed trip duration.
    pub fn with_max_trip_duration_hours(mut self, hours: f64) -> Self {
        self.max_trip_duration_hours = hours;
        self
    }

    /// Set the maximum number of stops per route.
    pub fn with_max_delivery_stops(mut self, stops: usize) -> Self {
        self.max_delivery_stops = stops;
        self
    }

    /// Set the average driving speed.
    pub fn with_average_driving_speed_kmh(mut self, speed: f64) -> Self {
        self.average_driving_speed_kmh = speed;
        self
    }

    /// Set the dwell time per stop.
    pub fn with_per_stop_dwell_hours(mut self, hours: f64) -> Self {
        self.per_stop_dwell_hours = hours;
        self
    }

    /// Set the capacity utilization band outside of which routes get a warning.
    pub fn with_capacity_utilization_band(mut self, min: f64, max: f64) -> Self {
        self.min_capacity_utilization = min;
        self.max_capacity_utilization = max;
        self
    }

    /// Set the bound on 2-opt passes.
    pub fn with_max_two_opt_passes(mut self, passes: usize) -> Self {
        self.max_two_opt_passes = passes;
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }
}
