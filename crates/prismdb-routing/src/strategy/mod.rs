//! Placement strategies.
//!
//! A strategy decides, for one scan, which column placements serve which
//! partitions. The driver classifies the scanned table and calls one of the
//! three handlers; the strategy answers with routed plan builders, or
//! [`StrategyOutcome::Decline`] when it cannot serve the scan (cooperative
//! abort: the driver then returns an empty plan list and the universal
//! router asks someone else).
//!
//! Strategies are pure: everything they decide is visible in the returned
//! builders, and identical inputs produce builders in the same order.

mod full_placement;
mod minimum_cost;
mod single_placement;

use std::collections::BTreeSet;

use prismdb_catalog::{
    Catalog, CatalogError, ColumnId, ColumnPlacement, PartitionId, PlacementRole, StoreId, Table,
};

pub use full_placement::FullPlacementStrategy;
pub use minimum_cost::MinimumCostStrategy;
pub use single_placement::SinglePlacementStrategy;

use crate::algebra::{PlacementDistribution, PlanBuilder, ScanNode};
use crate::cache::JoinedScanCache;
use crate::error::RoutingError;
use crate::information::QueryInformation;
use crate::transaction::Transaction;

/// The dependencies a strategy routes against.
#[derive(Clone, Copy)]
pub struct RoutingContext<'a> {
    /// The catalog snapshot of the query.
    pub catalog: &'a Catalog,
    /// The joined-scan cache.
    pub cache: &'a JoinedScanCache,
    /// The transaction the query runs under.
    pub transaction: &'a Transaction,
}

/// What a strategy handler decided.
#[derive(Debug)]
pub enum StrategyOutcome {
    /// The routed builders, in the strategy's preference order.
    Plans(Vec<PlanBuilder>),
    /// The strategy cannot serve this scan; abort this router's traversal.
    Decline,
}

/// Chooses column-placement distributions per partition for one table.
pub trait PlacementStrategy {
    /// Routes a scan of a horizontally partitioned table.
    fn handle_horizontal(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError>;

    /// Routes a scan of a vertically partitioned or replicated table
    /// (multiple data placements, single partition set).
    fn handle_vertical_or_replicated(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError>;

    /// Routes a scan of a table with a single data placement.
    fn handle_none(
        &self,
        ctx: &RoutingContext<'_>,
        scan: &ScanNode,
        table: &Table,
        builders: Vec<PlanBuilder>,
        info: &QueryInformation,
    ) -> Result<StrategyOutcome, RoutingError>;
}

/// The needed columns in the table's declaration order.
pub(crate) fn ordered_columns(table: &Table, needed: &BTreeSet<ColumnId>) -> Vec<ColumnId> {
    table.columns.iter().copied().filter(|column| needed.contains(column)).collect()
}

/// Ranks placement roles for the non-tolerant path: primaries first,
/// refreshable replicas second. Outdated copies never qualify here.
pub(crate) const fn role_rank(role: PlacementRole) -> u8 {
    match role {
        PlacementRole::Primary => 0,
        PlacementRole::Refreshable => 1,
        PlacementRole::Outdated => 2,
    }
}

/// The placements of the needed columns on one store, in column order.
///
/// Callers verify coverage first; a missing placement here means the
/// catalog lost a column placement mid-query.
pub(crate) fn placements_on(
    catalog: &Catalog,
    needed: &[ColumnId],
    store: StoreId,
) -> Result<Vec<ColumnPlacement>, RoutingError> {
    needed
        .iter()
        .map(|column| {
            catalog.column_placement(*column, store).cloned().ok_or_else(|| {
                RoutingError::inconsistency(format!(
                    "column {column} has no placement on store {store}"
                ))
            })
        })
        .collect()
}

/// The stores holding a readable (non-outdated) placement of the given
/// partition that also cover every needed column, ordered by
/// (role, store id).
pub(crate) fn partition_candidate_stores(
    catalog: &Catalog,
    partition: PartitionId,
    needed: &[ColumnId],
) -> Result<Vec<StoreId>, RoutingError> {
    let mut candidates: Vec<(u8, StoreId)> = catalog
        .partition_placements(partition)?
        .iter()
        .filter(|placement| placement.role != PlacementRole::Outdated)
        .filter(|placement| {
            needed.iter().all(|column| catalog.has_column_placement(*column, placement.store))
        })
        .map(|placement| (role_rank(placement.role), placement.store))
        .collect();
    candidates.sort_unstable();
    Ok(candidates.into_iter().map(|(_, store)| store).collect())
}

/// The data-placement stores that cover every needed column and hold a
/// readable placement of every accessed partition, in store-id order.
pub(crate) fn viable_single_stores(
    catalog: &Catalog,
    table: &Table,
    partitions: &BTreeSet<PartitionId>,
    needed: &[ColumnId],
) -> Result<Vec<StoreId>, RoutingError> {
    let mut viable = Vec::new();
    for store in &table.data_placements {
        let covers_columns =
            needed.iter().all(|column| catalog.has_column_placement(*column, *store));
        if !covers_columns {
            continue;
        }
        let mut holds_partitions = true;
        for partition in partitions {
            match catalog.partition_placement(*partition, *store) {
                Ok(placement) if placement.role != PlacementRole::Outdated => {}
                Ok(_) | Err(CatalogError::PartitionPlacementNotFound { .. }) => {
                    holds_partitions = false;
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        if holds_partitions {
            viable.push(*store);
        }
    }
    Ok(viable)
}

/// Builds a multi-store distribution: per partition, a greedy cover of the
/// needed columns over the stores holding a readable placement of that
/// partition. Returns `None` when some column cannot be covered.
pub(crate) fn mixed_cover_distribution(
    catalog: &Catalog,
    table: &Table,
    partitions: &BTreeSet<PartitionId>,
    needed: &[ColumnId],
) -> Result<Option<PlacementDistribution>, RoutingError> {
    let mut distribution = PlacementDistribution::new();
    for partition in partitions {
        let stores: Vec<StoreId> = catalog
            .partition_placements(*partition)?
            .iter()
            .filter(|placement| placement.role != PlacementRole::Outdated)
            .map(|placement| placement.store)
            .collect();

        let mut uncovered: Vec<ColumnId> = needed.to_vec();
        let mut placements = Vec::new();
        while !uncovered.is_empty() {
            // The store covering most of what is still uncovered; ties go
            // to the lower store id.
            let best = stores
                .iter()
                .map(|store| {
                    let covered = uncovered
                        .iter()
                        .filter(|column| catalog.has_column_placement(**column, *store))
                        .count();
                    (covered, *store)
                })
                .filter(|(covered, _)| *covered > 0)
                .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

            let Some((_, store)) = best else {
                return Ok(None);
            };
            let (on_store, rest): (Vec<ColumnId>, Vec<ColumnId>) = uncovered
                .into_iter()
                .partition(|column| catalog.has_column_placement(*column, store));
            placements.extend(placements_on(catalog, &on_store, store)?);
            uncovered = rest;
        }
        distribution.insert(*partition, placements);
    }
    Ok(Some(distribution))
}

/// Forks every incoming builder once per candidate distribution, pushing
/// the joined scan and recording the placement mapping.
///
/// Also drives the freshness path of the router, which produces its own
/// distributions.
pub fn extend_builders(
    ctx: &RoutingContext<'_>,
    scan: &ScanNode,
    table: &Table,
    builders: &[PlanBuilder],
    distributions: &[PlacementDistribution],
) -> Result<Vec<PlanBuilder>, RoutingError> {
    if distributions.is_empty() {
        return Err(RoutingError::inconsistency(format!(
            "no placement distribution produced for table {}",
            table.id
        )));
    }

    let mut routed = Vec::with_capacity(builders.len() * distributions.len());
    for distribution in distributions {
        let subtree =
            ctx.cache.build_scan(ctx.transaction.id(), ctx.catalog, table, distribution)?;
        for builder in builders {
            let mut forked = builder.fork();
            forked.record_placements(scan.id, distribution.clone());
            forked.push((*subtree).clone());
            routed.push(forked);
        }
    }
    Ok(routed)
}

/// Routes a single-data-placement table: there is exactly one choice.
pub(crate) fn route_single_store(
    ctx: &RoutingContext<'_>,
    scan: &ScanNode,
    table: &Table,
    builders: &[PlanBuilder],
    info: &QueryInformation,
) -> Result<StrategyOutcome, RoutingError> {
    let Some(store) = table.data_placements.first().copied() else {
        return Err(RoutingError::inconsistency(format!(
            "table {} has no data placement",
            table.id
        )));
    };

    let needed = ordered_columns(table, &info.columns_used_or_all(table));
    let partitions = info.partitions_accessed_or_all(scan.id, table);

    let mut distribution = PlacementDistribution::new();
    for partition in &partitions {
        let _ = ctx.catalog.partition_placement(*partition, store)?;
        distribution.insert(*partition, placements_on(ctx.catalog, &needed, store)?);
    }

    Ok(StrategyOutcome::Plans(extend_builders(ctx, scan, table, builders, &[distribution])?))
}
