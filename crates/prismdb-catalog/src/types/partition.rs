//! Partition entities.

use serde::{Deserialize, Serialize};

use super::{PartitionId, TableId};

/// The key predicate that selects rows into a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionSelector {
    /// The partition holds the whole table (unpartitioned, vertically
    /// partitioned, or replicated tables).
    WholeTable,
    /// The partition holds rows whose key falls into a half-open range.
    Range {
        /// Inclusive lower bound; `None` means unbounded.
        lower: Option<i64>,
        /// Exclusive upper bound; `None` means unbounded.
        upper: Option<i64>,
    },
    /// The partition holds rows whose key hashes into a bucket.
    Hash {
        /// The bucket this partition covers.
        bucket: u64,
        /// The total number of buckets.
        modulus: u64,
    },
}

/// A horizontal partition of a table.
///
/// Every table has at least one partition; unpartitioned tables have exactly
/// one with a [`PartitionSelector::WholeTable`] selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// The partition identifier.
    pub id: PartitionId,
    /// The table this partition belongs to.
    pub table: TableId,
    /// The predicate selecting rows into this partition.
    pub selector: PartitionSelector,
}

impl Partition {
    /// Create a new partition.
    #[must_use]
    pub const fn new(id: PartitionId, table: TableId, selector: PartitionSelector) -> Self {
        Self { id, table, selector }
    }

    /// Create the single partition of an unpartitioned table.
    #[must_use]
    pub const fn whole_table(id: PartitionId, table: TableId) -> Self {
        Self::new(id, table, PartitionSelector::WholeTable)
    }

    /// Create a range partition.
    #[must_use]
    pub const fn range(
        id: PartitionId,
        table: TableId,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Self {
        Self::new(id, table, PartitionSelector::Range { lower, upper })
    }

    /// Create a hash partition.
    #[must_use]
    pub const fn hash(id: PartitionId, table: TableId, bucket: u64, modulus: u64) -> Self {
        Self::new(id, table, PartitionSelector::Hash { bucket, modulus })
    }
}
