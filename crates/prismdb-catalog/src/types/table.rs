//! Table entities and partitioning metadata.

use serde::{Deserialize, Serialize};

use super::{ColumnId, PartitionId, StoreId, TableId};

/// How a table is split and/or replicated across stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKind {
    /// One partition, one column group.
    None,
    /// Horizontally split by key ranges.
    HorizontalRange,
    /// Horizontally split by key hash.
    HorizontalHash,
    /// Vertically split: different columns live on different stores.
    Vertical,
    /// Fully replicated across multiple stores.
    Replicated,
    /// Horizontally split and vertically split or replicated.
    Mixed,
}

/// The partitioning property of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionProperty {
    /// The partitioning regime.
    pub kind: PartitionKind,
    /// The table's partitions, in partition-id order.
    pub partitions: Vec<PartitionId>,
}

impl PartitionProperty {
    /// Create a partition property.
    ///
    /// Partition ids are kept sorted so every consumer sees a deterministic
    /// order.
    #[must_use]
    pub fn new(kind: PartitionKind, mut partitions: Vec<PartitionId>) -> Self {
        partitions.sort_unstable();
        Self { kind, partitions }
    }

    /// The property of an unpartitioned table with its single partition.
    #[must_use]
    pub fn unpartitioned(partition: PartitionId) -> Self {
        Self::new(PartitionKind::None, vec![partition])
    }

    /// The property of a range-partitioned table.
    #[must_use]
    pub fn horizontal_range(partitions: Vec<PartitionId>) -> Self {
        Self::new(PartitionKind::HorizontalRange, partitions)
    }

    /// The property of a hash-partitioned table.
    #[must_use]
    pub fn horizontal_hash(partitions: Vec<PartitionId>) -> Self {
        Self::new(PartitionKind::HorizontalHash, partitions)
    }

    /// The property of a vertically split table with its single partition.
    #[must_use]
    pub fn vertical(partition: PartitionId) -> Self {
        Self::new(PartitionKind::Vertical, vec![partition])
    }

    /// The property of a replicated table with its single partition.
    #[must_use]
    pub fn replicated(partition: PartitionId) -> Self {
        Self::new(PartitionKind::Replicated, vec![partition])
    }

    /// Whether the table is split horizontally. Mixed layouts count: their
    /// scans must be routed partition by partition.
    #[must_use]
    pub const fn is_horizontal(&self) -> bool {
        matches!(
            self.kind,
            PartitionKind::HorizontalRange | PartitionKind::HorizontalHash | PartitionKind::Mixed
        )
    }
}

/// A logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// The table identifier.
    pub id: TableId,
    /// The table name.
    pub name: String,
    /// The table's columns, in declaration order.
    pub columns: Vec<ColumnId>,
    /// How the table is partitioned and/or replicated.
    pub partition_property: PartitionProperty,
    /// The stores holding a data placement of this table.
    pub data_placements: Vec<StoreId>,
    /// Whether reads of this table may be served from outdated placements.
    pub supports_outdated: bool,
}

impl Table {
    /// Create a table with no columns, no placements, and a placeholder
    /// partition property. Callers chain the `with_*` builders.
    #[must_use]
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            partition_property: PartitionProperty { kind: PartitionKind::None, partitions: Vec::new() },
            data_placements: Vec::new(),
            supports_outdated: false,
        }
    }

    /// Append a column.
    #[must_use]
    pub fn with_column(mut self, column: ColumnId) -> Self {
        self.columns.push(column);
        self
    }

    /// Append several columns.
    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnId>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Set the partition property.
    #[must_use]
    pub fn with_partition_property(mut self, property: PartitionProperty) -> Self {
        self.partition_property = property;
        self
    }

    /// Register a store holding a data placement of this table. Stores are
    /// kept sorted and deduplicated.
    #[must_use]
    pub fn with_data_placement(mut self, store: StoreId) -> Self {
        if !self.data_placements.contains(&store) {
            self.data_placements.push(store);
            self.data_placements.sort_unstable();
        }
        self
    }

    /// Allow freshness-tolerant reads of this table.
    #[must_use]
    pub const fn with_outdated_support(mut self) -> Self {
        self.supports_outdated = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_ids_are_sorted() {
        let property = PartitionProperty::horizontal_range(vec![
            PartitionId::new(3),
            PartitionId::new(1),
            PartitionId::new(2),
        ]);
        let values: Vec<u64> = property.partitions.iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn horizontal_detection() {
        assert!(PartitionProperty::horizontal_hash(vec![PartitionId::new(1)]).is_horizontal());
        assert!(!PartitionProperty::vertical(PartitionId::new(1)).is_horizontal());
        assert!(!PartitionProperty::replicated(PartitionId::new(1)).is_horizontal());
        assert!(!PartitionProperty::unpartitioned(PartitionId::new(1)).is_horizontal());
    }

    #[test]
    fn data_placements_deduplicate() {
        let table = Table::new(TableId::new(1), "t")
            .with_data_placement(StoreId::new(2))
            .with_data_placement(StoreId::new(1))
            .with_data_placement(StoreId::new(2));
        assert_eq!(table.data_placements, vec![StoreId::new(1), StoreId::new(2)]);
    }
}
