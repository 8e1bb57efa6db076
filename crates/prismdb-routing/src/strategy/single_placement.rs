//! Single-placement strategy.
//!
//! Reads every scan from exactly one store per partition and never joins
//! placements across stores. Cheap plans when they exist; declines whenever
//! the needed columns are not fully placed on a usable store.

use super::{
    extend_builders, ordered_columns, placements_on, route_single_store, viable_single_stores,
    PlacementStrategy, RoutingContext, StrategyOutcome,
};
use crate::algebra::{PlacementDistribution, PlanBuilder, ScanNode};
use crate::error::RoutingError;
use crate::information::QueryInformation;
use prismdb_catalog::Table;

/// Routes each partition to its primary placement, and vertically split or
/// replicated tables to one fully covering store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePlacementStrategy;

impl SinglePlacementStrategy {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for SinglePlacementStrategy {
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

        let mut distribution = PlacementDistribution::new();
        for partition in &partitions {
            let primary = ctx.catalog.primary_placement(*partition)?;
            let covered = needed
                .iter()
                .all(|column| ctx.catalog.has_column_placement(*column, primary.store));
            if !covered {
                return Ok(StrategyOutcome::Decline);
            }
            distribution.insert(*partition, placements_on(ctx.catalog, &needed, primary.store)?);
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
        if viable.is_empty() {
            return Ok(StrategyOutcome::Decline);
        }

        // Prefer the store holding the primary of the first partition; the
        // lowest viable store otherwise.
        let store = partitions
            .iter()
            .next()
            .and_then(|partition| ctx.catalog.primary_placement(*partition).ok())
            .map(|primary| primary.store)
            .filter(|primary_store| viable.contains(primary_store))
            .unwrap_or(viable[0]);

        let mut distribution = PlacementDistribution::new();
        for partition in &partitions {
            distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
        }

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
