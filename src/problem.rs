//! Input data: delivery locations, SKU demand records and manufacturing sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::Coordinate;

/// Window in which a delivery location accepts drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a new time window.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    /// Length of the window in hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// A single drop point owned by a retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub retailer_id: String,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
}

impl DeliveryLocation {
    /// Create a new location without address, retailer or time window.
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        DeliveryLocation {
            id: id.to_string(),
            name: name.to_string(),
            address: String::new(),
            latitude,
            longitude,
            retailer_id: String::new(),
            time_window: None,
        }
    }

    /// Set the street address.
    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Set the owning retailer.
    pub fn with_retailer(mut self, retailer_id: &str) -> Self {
        self.retailer_id = retailer_id.to_string();
        self
    }

    /// Set the delivery time window.
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Check coordinates and time window.
    pub fn validate(&self) -> Result<()> {
        if !self.coordinate().is_valid() {
            return Err(Error::invalid_input(
                format!("location {}", self.id),
                format!(
                    "coordinates ({}, {}) out of range",
                    self.latitude, self.longitude
                ),
            ));
        }

        if let Some(window) = &self.time_window {
            if window.start > window.end {
                return Err(Error::invalid_input(
                    format!("location {}", self.id),
                    "time window ends before it starts",
                ));
            }
        }

        Ok(())
    }
}

/// Storage temperature a product needs during transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureRequirement {
    Ambient,
    Chilled,
    Frozen,
}

impl fmt::Display for TemperatureRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemperatureRequirement::Ambient => "AMBIENT",
            TemperatureRequirement::Chilled => "CHILLED",
            TemperatureRequirement::Frozen => "FROZEN",
        };
        write!(f, "{}", name)
    }
}

/// Demand for one SKU coming from one retailer order.
///
/// Weight and volume are per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuDeliveryInfo {
    pub sku_code: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub quantity: u32,
    pub weight_kg: f64,
    pub volume_m3: f64,
    #[serde(default)]
    pub temperature_requirement: Option<TemperatureRequirement>,
    #[serde(default)]
    pub fragile: bool,
    pub delivery_locations: Vec<DeliveryLocation>,
    pub order_id: String,
    pub manufacturer_id: String,
}

impl SkuDeliveryInfo {
    /// Create a new demand record with no delivery locations yet.
    pub fn new(
        sku_code: &str,
        order_id: &str,
        manufacturer_id: &str,
        quantity: u32,
        weight_kg: f64,
        volume_m3: f64,
    ) -> Self {
        SkuDeliveryInfo {
            sku_code: sku_code.to_string(),
            product_name: String::new(),
            category: String::new(),
            brand: String::new(),
            quantity,
            weight_kg,
            volume_m3,
            temperature_requirement: None,
            fragile: false,
            delivery_locations: Vec::new(),
            order_id: order_id.to_string(),
            manufacturer_id: manufacturer_id.to_string(),
        }
    }

    /// Set the descriptive product fields.
    pub fn with_product(mut self, name: &str, category: &str, brand: &str) -> Self {
        self.product_name = name.to_string();
        self.category = category.to_string();
        self.brand = brand.to_string();
        self
    }

    /// Set the temperature requirement.
    pub fn with_temperature(mut self, requirement: TemperatureRequirement) -> Self {
        self.temperature_requirement = Some(requirement);
        self
    }

    /// Mark the product as fragile.
    pub fn with_fragile(mut self, fragile: bool) -> Self {
        self.fragile = fragile;
        self
    }

    /// Add a delivery location.
    pub fn with_location(mut self, location: DeliveryLocation) -> Self {
        self.delivery_locations.push(location);
        self
    }

    /// Quantity-weighted weight of this record.
    pub fn total_weight_kg(&self) -> f64 {
        self.weight_kg * self.quantity as f64
    }

    /// Quantity-weighted volume of this record.
    pub fn total_volume_m3(&self) -> f64 {
        self.volume_m3 * self.quantity as f64
    }

    /// Check that the record can be consolidated and routed.
    pub fn validate(&self) -> Result<()> {
        let record = || format!("SKU {} (order {})", self.sku_code, self.order_id);

        if self.quantity == 0 {
            return Err(Error::invalid_input(record(), "quantity must be positive"));
        }
        if !(self.weight_kg.is_finite() && self.weight_kg >= 0.0) {
            return Err(Error::invalid_input(
                record(),
                format!("weight {} kg is negative or not a number", self.weight_kg),
            ));
        }
        if !(self.volume_m3.is_finite() && self.volume_m3 >= 0.0) {
            return Err(Error::invalid_input(
                record(),
                format!("volume {} m3 is negative or not a number", self.volume_m3),
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

/// Origin of every trip of a manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingLocation {
    pub id: String,
    pub manufacturer_id: String,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ManufacturingLocation {
    /// Create a new manufacturing location.
    pub fn new(id: &str, manufacturer_id: &str, latitude: f64, longitude: f64) -> Self {
        ManufacturingLocation {
            id: id.to_string(),
            manufacturer_id: manufacturer_id.to_string(),
            name: String::new(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Check that the coordinates are in range.
    pub fn validate(&self) -> Result<()> {
        if !self.coordinate().is_valid() {
            return Err(Error::invalid_input(
                format!("manufacturing location {}", self.id),
                format!(
                    "coordinates ({}, {}) out of range",
                    self.latitude, self.longitude
                ),
            ));
        }
        Ok(())
    }
}
