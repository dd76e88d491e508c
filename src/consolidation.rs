//! SKU consolidation and greedy trip grouping.
//!
//! Demand records are first merged per SKU code within a manufacturer scope.
//! The consolidated SKUs are then packed into trip groups by a single-pass
//! greedy heuristic ordered by consolidation efficiency. The packing is not
//! optimal; the grouping it produces (group count and membership) is
//! deterministic for a given input and configuration.

use itertools::Itertools;
use log::{debug, info, trace};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::Config;
use crate::error::Result;
use crate::geometry::{centroid, extended_spread, geographic_spread, Coordinate};
use crate::problem::{DeliveryLocation, SkuDeliveryInfo};
use crate::solution::{ConsolidatedSku, TripSkuGroup};

/// Weight of the order reuse ratio in the consolidation efficiency score.
const REUSE_WEIGHT: f64 = 0.5;
/// Weight of the geographic compactness in the consolidation efficiency score.
const COMPACTNESS_WEIGHT: f64 = 0.5;

/// Merges demand records and partitions them into trip groups.
pub struct ConsolidationEngine {
    config: Config,
}

impl ConsolidationEngine {
    /// Create a new engine for the given limits.
    pub fn new(config: Config) -> Self {
        ConsolidationEngine { config }
    }

    /// Merge the demand of one manufacturer scope into one record per SKU code.
    ///
    /// Records of other manufacturers are ignored. An empty scope yields an
    /// empty list. Output is ordered by SKU code.
    pub fn consolidate(
        &self,
        demand: &[SkuDeliveryInfo],
        manufacturer_id: &str,
    ) -> Result<Vec<ConsolidatedSku>> {
        let mut by_sku: BTreeMap<&str, Vec<&SkuDeliveryInfo>> = BTreeMap::new();

        for record in demand
            .iter()
            .filter(|record| record.manufacturer_id == manufacturer_id)
        {
            record.validate()?;
            by_sku
                .entry(record.sku_code.as_str())
                .or_default()
                .push(record);
        }

        if by_sku.is_empty() {
            debug!("No demand to consolidate for manufacturer {}", manufacturer_id);
            return Ok(Vec::new());
        }

        let consolidated: Vec<ConsolidatedSku> = by_sku
            .values()
            .map(|records| self.merge_records(manufacturer_id, records))
            .collect();

        debug!(
            "Consolidated {} records into {} SKUs for manufacturer {}",
            by_sku.values().map(Vec::len).sum::<usize>(),
            consolidated.len(),
            manufacturer_id
        );

        Ok(consolidated)
    }

    /// Consolidate every manufacturer scope found in the demand.
    pub fn consolidate_by_manufacturer(
        &self,
        demand: &[SkuDeliveryInfo],
    ) -> Result<BTreeMap<String, Vec<ConsolidatedSku>>> {
        let manufacturers: BTreeSet<&str> = demand
            .iter()
            .map(|record| record.manufacturer_id.as_str())
            .collect();

        let mut scopes = BTreeMap::new();
        for manufacturer_id in manufacturers {
            let consolidated = self.consolidate(demand, manufacturer_id)?;
            scopes.insert(manufacturer_id.to_string(), consolidated);
        }

        Ok(scopes)
    }

    /// Merge records sharing a SKU code. `records` is never empty.
    fn merge_records(&self, manufacturer_id: &str, records: &[&SkuDeliveryInfo]) -> ConsolidatedSku {
        let first = records[0];

        let order_ids: Vec<String> = records
            .iter()
            .map(|record| record.order_id.clone())
            .unique()
            .collect();

        let delivery_locations: Vec<DeliveryLocation> = records
            .iter()
            .flat_map(|record| record.delivery_locations.iter())
            .unique_by(|location| location.id.clone())
            .cloned()
            .collect();

        let consolidation_efficiency =
            self.consolidation_efficiency(order_ids.len(), &delivery_locations);

        ConsolidatedSku {
            sku_code: first.sku_code.clone(),
            manufacturer_id: manufacturer_id.to_string(),
            product_name: first.product_name.clone(),
            category: first.category.clone(),
            brand: first.brand.clone(),
            total_quantity: records.iter().map(|record| record.quantity as u64).sum(),
            total_weight_kg: records.iter().map(|record| record.total_weight_kg()).sum(),
            total_volume_m3: records.iter().map(|record| record.total_volume_m3()).sum(),
            temperature_requirement: records
                .iter()
                .find_map(|record| record.temperature_requirement),
            fragile: records.iter().any(|record| record.fragile),
            order_ids,
            delivery_locations,
            consolidation_efficiency,
        }
    }

    /// Blend of order reuse and geographic compactness, in [0, 1).
    ///
    /// Reuse grows with the number of orders sharing the SKU; compactness
    /// decays with the spread of its delivery locations relative to the
    /// configured maximum.
    pub fn consolidation_efficiency(&self, order_count: usize, locations: &[DeliveryLocation]) -> f64 {
        let reuse = if order_count == 0 {
            0.0
        } else {
            1.0 - 1.0 / order_count as f64
        };

        let coordinates: Vec<Coordinate> =
            locations.iter().map(DeliveryLocation::coordinate).collect();
        let spread = geographic_spread(&coordinates);
        let compactness = 1.0 / (1.0 + spread / self.config.max_geographic_spread_km);

        REUSE_WEIGHT * reuse + COMPACTNESS_WEIGHT * compactness
    }

    /// Partition consolidated SKUs into trip groups.
    ///
    /// SKUs are visited by descending efficiency (ties by SKU code). Each pass
    /// opens a group and adds every unconsumed SKU that keeps weight, volume,
    /// member count and geographic spread within limits. A SKU that fits in no
    /// group, even an empty one, is emitted alone once nothing else can be
    /// placed; the validator rejects such groups. Undersized groups are emitted
    /// as well.
    pub fn create_trip_groups(&self, consolidated: &[ConsolidatedSku]) -> Vec<TripSkuGroup> {
        let mut order: Vec<usize> = (0..consolidated.len()).collect();
        order.sort_by(|&a, &b| {
            consolidated[b]
                .consolidation_efficiency
                .total_cmp(&consolidated[a].consolidation_efficiency)
                .then_with(|| consolidated[a].sku_code.cmp(&consolidated[b].sku_code))
        });

        let mut consumed = vec![false; consolidated.len()];
        let mut remaining = consolidated.len();
        let mut groups = Vec::new();

        // Every pass consumes at least one SKU.
        for _ in 0..consolidated.len() {
            if remaining == 0 {
                break;
            }

            let mut builder = GroupBuilder::new();

            for &idx in &order {
                if builder.members.len() >= self.config.target_sku_count_max {
                    break;
                }
                if consumed[idx] {
                    continue;
                }

                let sku = &consolidated[idx];
                if let Some(spread) = self.try_fit(&builder, sku) {
                    builder.add(idx, sku, spread);
                    consumed[idx] = true;
                    remaining -= 1;
                } else {
                    trace!("SKU {} does not fit in current group", sku.sku_code);
                }
            }

            if builder.members.is_empty() {
                if let Some(&idx) = order.iter().find(|&&idx| !consumed[idx]) {
                    let sku = &consolidated[idx];
                    debug!(
                        "SKU {} exceeds trip limits on its own, emitting it as a single-member group",
                        sku.sku_code
                    );
                    let spread = self.extended_spread(&builder, sku);
                    builder.add(idx, sku, spread);
                    consumed[idx] = true;
                    remaining -= 1;
                }
            }

            let group_id = format!("TG-{:04}", groups.len() + 1);
            let group = builder.finalize(group_id, consolidated);
            debug!(
                "Finalized group {} with {} SKUs, {:.1} kg, {:.2} m3",
                group.group_id, group.total_sku_count, group.total_weight_kg, group.total_volume_m3
            );
            groups.push(group);
        }

        info!(
            "Packed {} consolidated SKUs into {} trip groups",
            consolidated.len(),
            groups.len()
        );

        groups
    }

    /// Resulting spread if `sku` can join the group, `None` otherwise.
    fn try_fit(&self, builder: &GroupBuilder, sku: &ConsolidatedSku) -> Option<f64> {
        if builder.members.len() + 1 > self.config.target_sku_count_max {
            return None;
        }
        if builder.weight_kg + sku.total_weight_kg > self.config.max_trip_weight_kg {
            return None;
        }
        if builder.volume_m3 + sku.total_volume_m3 > self.config.max_trip_volume_m3 {
            return None;
        }

        let spread = self.extended_spread(builder, sku);
        if spread > self.config.max_geographic_spread_km {
            return None;
        }

        Some(spread)
    }

    fn extended_spread(&self, builder: &GroupBuilder, sku: &ConsolidatedSku) -> f64 {
        let added: Vec<Coordinate> = builder
            .new_locations(sku)
            .map(DeliveryLocation::coordinate)
            .collect();
        extended_spread(&builder.coordinates, builder.spread_km, &added)
    }
}

/// Running totals of the group under construction.
struct GroupBuilder {
    members: Vec<usize>,
    weight_kg: f64,
    volume_m3: f64,
    location_ids: HashSet<String>,
    coordinates: Vec<Coordinate>,
    spread_km: f64,
}

impl GroupBuilder {
    fn new() -> Self {
        GroupBuilder {
            members: Vec::new(),
            weight_kg: 0.0,
            volume_m3: 0.0,
            location_ids: HashSet::new(),
            coordinates: Vec::new(),
            spread_km: 0.0,
        }
    }

    /// Locations of `sku` not yet part of the group.
    fn new_locations<'a>(
        &'a self,
        sku: &'a ConsolidatedSku,
    ) -> impl Iterator<Item = &'a DeliveryLocation> + 'a {
        sku.delivery_locations
            .iter()
            .filter(move |location| !self.location_ids.contains(&location.id))
            .unique_by(|location| location.id.clone())
    }

    fn add(&mut self, idx: usize, sku: &ConsolidatedSku, spread_km: f64) {
        let added: Vec<(String, Coordinate)> = self
            .new_locations(sku)
            .map(|location| (location.id.clone(), location.coordinate()))
            .collect();

        for (id, coordinate) in added {
            self.location_ids.insert(id);
            self.coordinates.push(coordinate);
        }

        self.members.push(idx);
        self.weight_kg += sku.total_weight_kg;
        self.volume_m3 += sku.total_volume_m3;
        self.spread_km = spread_km;
    }

    fn finalize(self, group_id: String, consolidated: &[ConsolidatedSku]) -> TripSkuGroup {
        let members: Vec<ConsolidatedSku> = self
            .members
            .iter()
            .map(|&idx| consolidated[idx].clone())
            .collect();

        let delivery_efficiency = if members.is_empty() {
            0.0
        } else {
            members
                .iter()
                .map(|sku| sku.consolidation_efficiency)
                .sum::<f64>()
                / members.len() as f64
        };

        TripSkuGroup {
            group_id,
            total_sku_count: members.len(),
            total_weight_kg: self.weight_kg,
            total_volume_m3: self.volume_m3,
            geographic_center: centroid(&self.coordinates),
            delivery_efficiency,
            members,
        }
    }
}
