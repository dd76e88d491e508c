//! # Trip Planner
//!
//! Consolidation and routing core for retailer deliveries.
//!
//! SKU-level demand drawn from many retailer orders is merged per
//! manufacturer and SKU code, packed into trip groups bounded by weight,
//! volume, SKU count and geographic spread, and each group's stops are
//! sequenced into a delivery route with distance and duration estimates.
//!
//! Grouping is a deterministic greedy heuristic and routing combines a
//! density-weighted nearest-neighbour construction with 2-opt. Neither is
//! optimal. Everything here is a pure computation over its inputs and a
//! [`Config`](crate::config::Config); no I/O happens outside of the optional
//! file helpers.

pub mod config;
pub mod consolidation;
pub mod error;
pub mod geometry;
pub mod problem;
pub mod route_optimizer;
pub mod solution;
pub mod utils;
pub mod validation;

use crate::config::Config;
use crate::consolidation::ConsolidationEngine;
use crate::error::Result;
use crate::problem::{ManufacturingLocation, SkuDeliveryInfo};
use crate::route_optimizer::RouteOptimizer;
use crate::solution::{TripRoute, TripSkuGroup};
use crate::validation::{ConstraintValidator, ValidationResult};

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A trip group with its route and the validation of both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTrip {
    pub group: TripSkuGroup,
    pub group_validation: ValidationResult,
    /// `None` when the batch time limit expired before routing this group
    pub route: Option<TripRoute>,
    pub route_validation: Option<ValidationResult>,
}

/// All trips of one manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopePlan {
    pub manufacturer_id: String,
    pub manufacturing_location_id: String,
    pub consolidated_sku_count: usize,
    pub trips: Vec<PlannedTrip>,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub scopes: Vec<ScopePlan>,
    /// Manufacturers with demand but no manufacturing location
    pub unmatched_manufacturers: Vec<String>,
    /// Ids of groups left without a route because the time limit expired
    pub unrouted_groups: Vec<String>,
    pub run_time: Duration,
}

impl PlanResult {
    /// Every planned trip across all scopes.
    pub fn trips(&self) -> impl Iterator<Item = &PlannedTrip> {
        self.scopes.iter().flat_map(|scope| scope.trips.iter())
    }

    /// Every computed route across all scopes.
    pub fn routes(&self) -> impl Iterator<Item = &TripRoute> {
        self.trips().filter_map(|trip| trip.route.as_ref())
    }
}

/// Runs consolidation, grouping, routing and validation for a batch of demand.
pub struct TripPlanner {
    pub config: Config,
    pub engine: ConsolidationEngine,
    pub optimizer: RouteOptimizer,
    pub validator: ConstraintValidator,
}

impl TripPlanner {
    /// Create a new planner. Fails if the configuration is unusable.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(TripPlanner {
            engine: ConsolidationEngine::new(config.clone()),
            optimizer: RouteOptimizer::new(config.clone()),
            validator: ConstraintValidator::new(config.clone()),
            config,
        })
    }

    /// Plan trips for every manufacturer found in `demand`.
    ///
    /// Consolidation and grouping run sequentially per manufacturer; routes are
    /// computed in parallel, one task per group. Groups not started before the
    /// time limit are returned without a route.
    pub fn plan(
        &self,
        demand: &[SkuDeliveryInfo],
        manufacturing_locations: &[ManufacturingLocation],
    ) -> Result<PlanResult> {
        let start_time = Instant::now();
        let deadline = self.config.time_limit.map(|limit| start_time + limit);

        let mut origins: BTreeMap<&str, &ManufacturingLocation> = BTreeMap::new();
        for location in manufacturing_locations {
            location.validate()?;
            origins
                .entry(location.manufacturer_id.as_str())
                .or_insert(location);
        }

        let consolidated_scopes = self.engine.consolidate_by_manufacturer(demand)?;

        let mut scopes = Vec::new();
        let mut unmatched_manufacturers = Vec::new();
        let mut unrouted_groups = Vec::new();

        for (manufacturer_id, consolidated) in consolidated_scopes {
            let Some(origin) = origins.get(manufacturer_id.as_str()).copied() else {
                warn!(
                    "No manufacturing location for manufacturer {}, skipping {} SKUs",
                    manufacturer_id,
                    consolidated.len()
                );
                unmatched_manufacturers.push(manufacturer_id);
                continue;
            };

            // Group ids restart per scope; qualify them so they are unique in the batch.
            let mut groups = self.engine.create_trip_groups(&consolidated);
            for group in &mut groups {
                group.group_id = format!("{}-{}", manufacturer_id, group.group_id);
            }
            let routes = self.route_groups(&groups, origin, deadline)?;

            let mut trips = Vec::with_capacity(groups.len());
            for (group, route) in groups.into_iter().zip(routes) {
                let group_validation = self.validator.validate_group(&group)?;
                let route_validation = match &route {
                    Some(route) => Some(self.validator.validate_route(route)?),
                    None => {
                        unrouted_groups.push(group.group_id.clone());
                        None
                    }
                };

                trips.push(PlannedTrip {
                    group,
                    group_validation,
                    route,
                    route_validation,
                });
            }

            debug!(
                "Manufacturer {}: {} consolidated SKUs in {} trips",
                manufacturer_id,
                consolidated.len(),
                trips.len()
            );

            scopes.push(ScopePlan {
                manufacturer_id,
                manufacturing_location_id: origin.id.clone(),
                consolidated_sku_count: consolidated.len(),
                trips,
            });
        }

        if !unrouted_groups.is_empty() {
            warn!(
                "Time limit reached, {} groups left without a route",
                unrouted_groups.len()
            );
        }

        let plan = PlanResult {
            scopes,
            unmatched_manufacturers,
            unrouted_groups,
            run_time: start_time.elapsed(),
        };

        info!(
            "Planned {} trips for {} manufacturers in {:?}",
            plan.trips().count(),
            plan.scopes.len(),
            plan.run_time
        );

        Ok(plan)
    }

    /// Route every group in parallel; `None` for groups reached after the deadline.
    fn route_groups(
        &self,
        groups: &[TripSkuGroup],
        origin: &ManufacturingLocation,
        deadline: Option<Instant>,
    ) -> Result<Vec<Option<TripRoute>>> {
        groups
            .par_iter()
            .map(|group| {
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    return Ok(None);
                }
                self.optimizer.optimize_group(group, origin).map(Some)
            })
            .collect()
    }
}
