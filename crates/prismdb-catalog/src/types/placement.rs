//! Physical placement records.
//!
//! A placement is a physical copy of catalog data on a specific store.
//! Column placements record which stores hold which columns; partition
//! placements record which stores hold which partitions, in which role and
//! at which staleness.

use serde::{Deserialize, Serialize};

use super::{ColumnId, PartitionId, Staleness, StoreId, TableId};

/// A physical copy of a column on a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlacement {
    /// The table the column belongs to.
    pub table: TableId,
    /// The placed column.
    pub column: ColumnId,
    /// The store holding the copy.
    pub store: StoreId,
}

impl ColumnPlacement {
    /// Create a new column placement.
    #[must_use]
    pub const fn new(table: TableId, column: ColumnId, store: StoreId) -> Self {
        Self { table, column, store }
    }
}

/// The replication role of a partition placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementRole {
    /// The authoritative copy. Every partition has exactly one.
    Primary,
    /// A lagging copy that is kept up to date by the replication engine.
    Refreshable,
    /// A copy that is no longer refreshed and only serves
    /// freshness-tolerant reads.
    Outdated,
}

impl PlacementRole {
    /// Whether this role may serve freshness-tolerant reads.
    #[must_use]
    pub const fn is_tolerant_readable(self) -> bool {
        matches!(self, Self::Refreshable | Self::Outdated)
    }
}

/// A physical copy of a partition on a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlacement {
    /// The table the partition belongs to.
    pub table: TableId,
    /// The placed partition.
    pub partition: PartitionId,
    /// The store holding the copy.
    pub store: StoreId,
    /// The replication role of this copy.
    pub role: PlacementRole,
    /// How far this copy lags behind the primary.
    pub staleness: Staleness,
}

impl PartitionPlacement {
    /// Create a placement with an explicit role and staleness.
    #[must_use]
    pub const fn new(
        table: TableId,
        partition: PartitionId,
        store: StoreId,
        role: PlacementRole,
        staleness: Staleness,
    ) -> Self {
        Self { table, partition, store, role, staleness }
    }

    /// Create the primary placement of a partition. Primaries are current
    /// by definition.
    #[must_use]
    pub const fn primary(table: TableId, partition: PartitionId, store: StoreId) -> Self {
        Self::new(table, partition, store, PlacementRole::Primary, Staleness::current())
    }

    /// Create a refreshable replica with the given staleness.
    #[must_use]
    pub const fn refreshable(
        table: TableId,
        partition: PartitionId,
        store: StoreId,
        staleness: Staleness,
    ) -> Self {
        Self::new(table, partition, store, PlacementRole::Refreshable, staleness)
    }

    /// Create an outdated replica with the given staleness.
    #[must_use]
    pub const fn outdated(
        table: TableId,
        partition: PartitionId,
        store: StoreId,
        staleness: Staleness,
    ) -> Self {
        Self::new(table, partition, store, PlacementRole::Outdated, staleness)
    }
}
