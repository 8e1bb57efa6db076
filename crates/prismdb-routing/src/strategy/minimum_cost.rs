//! Minimum-cost strategy.
//!
//! Produces exactly one plan per scan, minimizing the number of distinct
//! stores the plan touches. Cost here is store count: every extra store is
//! an extra connection, an extra dialect, and a potential cross-store join.

use std::collections::BTreeSet;

use super::{
    extend_builders, mixed_cover_distribution, ordered_columns, partition_candidate_stores,
    placements_on, route_single_store, viable_single_stores, PlacementStrategy, RoutingContext,
    StrategyOutcome,
};
use crate::algebra::{PlacementDistribution, PlanBuilder, ScanNode};
use crate::error::RoutingError;
use crate::information::QueryInformation;
use prismdb_catalog::{StoreId, Table};

/// Routes each scan through as few stores as possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumCostStrategy;

impl MinimumCostStrategy {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for MinimumCostStrategy {
    fn handle_horizontal(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError> {
        let needed = ordered_columns(table, &info.columns_used_or_all(table));
        let partitions = info.partitions_accessed_or_all(scan.id, table);

        let mut used: BTreeSet<StoreId> = BTreeSet::new();
        let mut distribution = PlacementDistribution::new();
        for partition in &partitions {
            let candidates = partition_candidate_stores(ctx.catalog, *partition, &needed)?;
            if candidates.is_empty() {
                // No store serves this partition whole; fall back to a
                // cross-store cover for the whole scan.
                let Some(mixed) =
                    mixed_cover_distribution(ctx.catalog, table, &partitions, &needed)?
                else {
                    return Ok(StrategyOutcome::Decline);
                };
                return Ok(StrategyOutcome::Plans(extend_builders(
                    ctx,
                    scan,
                    table,
                    &builders,
                    &[mixed],
                )?));
            }

            // Reuse a store the plan already touches when possible.
            let store = candidates
                .iter()
                .copied()
                .find(|candidate| used.contains(candidate))
                .unwrap_or(candidates[0]);
            used.insert(store);
            distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
        }

        Ok(StrategyOutcome::Plans(extend_builders(ctx, scan, table, &builders, &[distribution])?))
    }

    fn handle_vertical_or_replicated(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError> {
        let needed = ordered_columns(table, &info.columns_used_or_all(table));
        let partitions = info.partitions_accessed_or_all(scan.id, table);

        let viable = viable_single_stores(ctx.catalog, table, &partitions, &needed)?;
        let distribution = if let Some(store) = viable.first().copied() {
            let mut distribution = PlacementDistribution::new();
            for partition in &partitions {
                distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
            }
            distribution
        } else {
            let Some(mixed) =
                mixed_cover_distribution(ctx.catalog, table, &partitions, &needed)?
            else {
                return Ok(StrategyOutcome::Decline);
            };
            mixed
        };

        Ok(StrategyOutcome::Plans(extend_builders(ctx, scan, table, &builders, &[distribution])?))
    }

    fn handle_none(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError> {
        route_single_store(ctx, scan, table, &builders, info)
    }
}
