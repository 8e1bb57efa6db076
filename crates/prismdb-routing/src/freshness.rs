//! Freshness-tolerant placement selection.
//!
//! When a transaction accepts outdated copies and the table supports them,
//! reads may be served from refreshable or outdated placements instead of
//! primaries, trading staleness for primary offload. The resolver picks the
//! placements that satisfy the transaction's tolerated-staleness bound; if
//! any required partition has no satisfying placement, it signals
//! [`RoutingError::InsufficientFreshness`] and the driver falls back to the
//! locking path.

use std::collections::{BTreeMap, BTreeSet};

use prismdb_catalog::{
    Catalog, ColumnId, FreshnessBound, PartitionId, PartitionPlacement, Table,
};

use crate::algebra::PlacementDistribution;
use crate::error::RoutingError;
use crate::strategy::ordered_columns;

/// Selects placement sets that satisfy a tolerated-staleness bound.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> FreshnessResolver<'a> {
    /// Creates a resolver over a catalog snapshot.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// For every required partition, the non-primary placements whose
    /// staleness satisfies the bound, ordered freshest first (ties by
    /// store id).
    ///
    /// An empty candidate list for any partition means freshness cannot be
    /// delivered for this scan.
    pub fn candidate_partition_placements(
        &self,
        table: &Table,
        partitions_needed: &BTreeSet<PartitionId>,
        bound: &FreshnessBound,
    ) -> Result<BTreeMap<PartitionId, Vec<PartitionPlacement>>, RoutingError> {
        let mut candidates = BTreeMap::new();
        for partition in partitions_needed {
            let mut options: Vec<PartitionPlacement> = self
                .catalog
                .partition_placements(*partition)?
                .iter()
                .filter(|placement| {
                    placement.table == table.id
                        && placement.role.is_tolerant_readable()
                        && placement.staleness.satisfies(bound)
                })
                .cloned()
                .collect();

            if options.is_empty() {
                return Err(RoutingError::InsufficientFreshness);
            }
            options.sort_by_key(|placement| (placement.staleness.metric(bound), placement.store));
            candidates.insert(*partition, options);
        }
        Ok(candidates)
    }

    /// Turns partition-placement candidates into column-placement
    /// distributions.
    ///
    /// A candidate is usable only if its store holds a placement of every
    /// needed column. Per partition the staleness-minimal usable candidate
    /// wins (ties by lower store id); further distributions take the next
    /// best candidate per partition, so a tighter bound can only shrink the
    /// returned list and a looser one can only grow it.
    pub fn candidate_column_distributions(
        &self,
        candidates: &BTreeMap<PartitionId, Vec<PartitionPlacement>>,
        table: &Table,
        columns_used: &BTreeSet<ColumnId>,
    ) -> Result<Vec<PlacementDistribution>, RoutingError> {
        let needed = ordered_columns(table, columns_used);

        let mut usable: BTreeMap<PartitionId, Vec<&PartitionPlacement>> = BTreeMap::new();
        for (partition, options) in candidates {
            let covering: Vec<&PartitionPlacement> = options
                .iter()
                .filter(|placement| {
                    needed
                        .iter()
                        .all(|column| self.catalog.has_column_placement(*column, placement.store))
                })
                .collect();
            if covering.is_empty() {
                return Err(RoutingError::InsufficientFreshness);
            }
            usable.insert(*partition, covering);
        }

        let depth = usable.values().map(Vec::len).max().unwrap_or(0);
        let mut distributions: Vec<PlacementDistribution> = Vec::new();
        for rank in 0..depth {
            let mut distribution = PlacementDistribution::new();
            for (partition, options) in &usable {
                let placement = options[rank.min(options.len() - 1)];
                let placements = needed
                    .iter()
                    .map(|column| {
                        self.catalog
                            .column_placement(*column, placement.store)
                            .cloned()
                            .ok_or_else(|| {
                                RoutingError::inconsistency(format!(
                                    "column {column} vanished from store {}",
                                    placement.store
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                distribution.insert(*partition, placements);
            }
            if !distributions.contains(&distribution) {
                distributions.push(distribution);
            }
        }

        if distributions.is_empty() {
            return Err(RoutingError::InsufficientFreshness);
        }
        Ok(distributions)
    }
}
