//! Output data: consolidated SKUs, trip groups and sequenced trip routes.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{geographic_spread, Coordinate};
use crate::problem::{DeliveryLocation, SkuDeliveryInfo, TemperatureRequirement};

/// Anything that puts a load on a vehicle and has to reach a set of stops.
pub trait DeliveryDemand {
    fn sku_code(&self) -> &str;
    fn quantity(&self) -> u64;
    fn total_weight_kg(&self) -> f64;
    fn total_volume_m3(&self) -> f64;
    fn delivery_locations(&self) -> &[DeliveryLocation];

    /// Reject quantities, loads or locations that cannot be routed.
    fn validate(&self) -> Result<()>;
}

impl DeliveryDemand for SkuDeliveryInfo {
    fn sku_code(&self) -> &str {
        &self.sku_code
    }

    fn quantity(&self) -> u64 {
        self.quantity as u64
    }

    fn total_weight_kg(&self) -> f64 {
        SkuDeliveryInfo::total_weight_kg(self)
    }

    fn total_volume_m3(&self) -> f64 {
        SkuDeliveryInfo::total_volume_m3(self)
    }

    fn delivery_locations(&self) -> &[DeliveryLocation] {
        &self.delivery_locations
    }

    fn validate(&self) -> Result<()> {
        SkuDeliveryInfo::validate(self)
    }
}

/// Locations referenced by a set of demand items, deduplicated by id in
/// first-seen order.
pub fn unique_locations<D: DeliveryDemand>(items: &[D]) -> Vec<&DeliveryLocation> {
    items
        .iter()
        .flat_map(|item| item.delivery_locations().iter())
        .unique_by(|location| location.id.clone())
        .collect()
}

/// All demand for one SKU code within one manufacturer scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSku {
    pub sku_code: String,
    pub manufacturer_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub total_quantity: u64,
    pub total_weight_kg: f64,
    pub total_volume_m3: f64,
    /// First requirement seen among the contributing records
    pub temperature_requirement: Option<TemperatureRequirement>,
    /// True if any contributing record is fragile
    pub fragile: bool,
    pub order_ids: Vec<String>,
    pub delivery_locations: Vec<DeliveryLocation>,
    /// Relative score in [0, 1), only meaningful for sorting
    pub consolidation_efficiency: f64,
}

impl DeliveryDemand for ConsolidatedSku {
    fn sku_code(&self) -> &str {
        &self.sku_code
    }

    fn quantity(&self) -> u64 {
        self.total_quantity
    }

    fn total_weight_kg(&self) -> f64 {
        self.total_weight_kg
    }

    fn total_volume_m3(&self) -> f64 {
        self.total_volume_m3
    }

    fn delivery_locations(&self) -> &[DeliveryLocation] {
        &self.delivery_locations
    }

    fn validate(&self) -> Result<()> {
        let record = || format!("consolidated SKU {} ({})", self.sku_code, self.manufacturer_id);

        if self.total_quantity == 0 {
            return Err(Error::invalid_input(record(), "quantity must be positive"));
        }
        if !(self.total_weight_kg.is_finite() && self.total_weight_kg >= 0.0) {
            return Err(Error::invalid_input(
                record(),
                format!("weight {} kg is negative or not a number", self.total_weight_kg),
            ));
        }
        if !(self.total_volume_m3.is_finite() && self.total_volume_m3 >= 0.0) {
            return Err(Error::invalid_input(
                record(),
                format!("volume {} m3 is negative or not a number", self.total_volume_m3),
            ));
        }
        if self.delivery_locations.is_empty() {
            return Err(Error::invalid_input(record(), "no delivery locations"));
        }

        for location in &self.delivery_locations {
            location.validate()?;
        }

        Ok(())
    }
}

/// The consolidated SKUs loaded onto one vehicle trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSkuGroup {
    pub group_id: String,
    pub members: Vec<ConsolidatedSku>,
    /// Number of members, i.e. distinct consolidated SKUs
    pub total_sku_count: usize,
    pub total_weight_kg: f64,
    pub total_volume_m3: f64,
    /// Mean latitude/longitude of the member locations
    pub geographic_center: Option<Coordinate>,
    pub delivery_efficiency: f64,
}

impl TripSkuGroup {
    /// Distinct delivery locations of all members.
    pub fn delivery_locations(&self) -> Vec<&DeliveryLocation> {
        unique_locations(&self.members)
    }

    /// Largest distance between two member locations.
    pub fn geographic_spread(&self) -> f64 {
        let coordinates: Vec<Coordinate> = self
            .delivery_locations()
            .into_iter()
            .map(DeliveryLocation::coordinate)
            .collect();
        geographic_spread(&coordinates)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Load line of a trip route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripItem {
    pub sku_code: String,
    pub quantity: u64,
    pub weight_kg: f64,
    pub volume_m3: f64,
}

/// A sequenced delivery plan for one trip.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRoute {
    pub trip_id: String,
    /// Trip group the route was built from, when known
    pub group_id: Option<String>,
    pub origin_id: String,
    /// Stops in visiting order, the origin excluded
    pub stops: Vec<DeliveryLocation>,
    /// Hours after departure at which each stop is reached
    pub arrival_offsets_hours: Vec<f64>,
    pub items: Vec<TripItem>,
    /// Origin to last stop, no return leg
    pub total_distance_km: f64,
    pub estimated_duration_hours: f64,
    pub total_weight_kg: f64,
    pub total_volume_m3: f64,
    /// Higher of the weight and volume ratios; may exceed 1.0
    pub capacity_utilization: f64,
}

impl TripRoute {
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Ids of the stops in visiting order.
    pub fn stop_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|stop| stop.id.as_str()).collect()
    }
}

impl fmt::Debug for TripRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TripRoute {}:", self.trip_id)?;
        writeln!(f, "  Origin: {}", self.origin_id)?;
        writeln!(f, "  Stops: {:?}", self.stop_ids())?;
        writeln!(f, "  Distance: {:.2} km", self.total_distance_km)?;
        writeln!(f, "  Duration: {:.2} h", self.estimated_duration_hours)?;
        writeln!(
            f,
            "  Load: {:.2} kg / {:.2} m3 (utilization {:.2})",
            self.total_weight_kg, self.total_volume_m3, self.capacity_utilization
        )?;
        Ok(())
    }
}
