//! Full-placement strategy.
//!
//! Enumerates every complete placement alternative so the cost model
//! downstream has real choices: one builder per store that can serve the
//! whole scan, plus a cross-store cover when no single store can.

use super::{
    extend_builders, mixed_cover_distribution, ordered_columns, partition_candidate_stores,
    placements_on, route_single_store, viable_single_stores, PlacementStrategy, RoutingContext,
    StrategyOutcome,
};
use crate::algebra::{PlacementDistribution, PlanBuilder, ScanNode};
use crate::error::RoutingError;
use crate::information::QueryInformation;
use prismdb_catalog::Table;

/// Routes every feasible complete placement alternative, in stable order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullPlacementStrategy;

impl FullPlacementStrategy {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for FullPlacementStrategy {
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

        let mut candidates = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            candidates.push((
                *partition,
                partition_candidate_stores(ctx.catalog, *partition, &needed)?,
            ));
        }

        // A partition nobody serves whole forces a cross-store cover for
        // every partition.
        if candidates.iter().any(|(_, stores)| stores.is_empty()) {
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

        // Alternative k reads each partition from its k-th best candidate
        // (saturating), so the first alternative is primaries everywhere.
        // The full cross product of candidates is never explored.
        let depth = candidates.iter().map(|(_, stores)| stores.len()).max().unwrap_or(0);
        let mut distributions: Vec<PlacementDistribution> = Vec::new();
        for rank in 0..depth {
            let mut distribution = PlacementDistribution::new();
            for (partition, stores) in &candidates {
                let store = stores[rank.min(stores.len() - 1)];
                distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
            }
            if !distributions.contains(&distribution) {
                distributions.push(distribution);
            }
        }

        Ok(StrategyOutcome::Plans(extend_builders(ctx, scan, table, &builders, &distributions)?))
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
        let mut distributions: Vec<PlacementDistribution> = Vec::with_capacity(viable.len());
        for store in viable {
            let mut distribution = PlacementDistribution::new();
            for partition in &partitions {
                distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
            }
            distributions.push(distribution);
        }

        if distributions.is_empty() {
            let Some(mixed) =
                mixed_cover_distribution(ctx.catalog, table, &partitions, &needed)?
            else {
                return Ok(StrategyOutcome::Decline);
            };
            distributions.push(mixed);
        }

        Ok(StrategyOutcome::Plans(extend_builders(ctx, scan, table, &builders, &distributions)?))
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
