//! Per-query access information.
//!
//! Upstream analysis records which partitions each scan touches and which
//! columns each table contributes. Routing only reads this; a missing entry
//! widens to "everything" so a scan is never silently under-covered.

use std::collections::{BTreeMap, BTreeSet};

use prismdb_catalog::{ColumnId, PartitionId, ScanId, Table, TableId};

/// Precomputed access information for one query.
#[derive(Debug, Clone, Default)]
pub struct QueryInformation {
    accessed_partitions: BTreeMap<ScanId, BTreeSet<PartitionId>>,
    used_columns: BTreeMap<TableId, BTreeSet<ColumnId>>,
}

impl QueryInformation {
    /// Creates empty query information (every lookup widens to "all").
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the partitions a scan accesses.
    #[must_use]
    pub fn with_accessed_partitions(
        mut self,
        scan: ScanId,
        partitions: impl IntoIterator<Item = PartitionId>,
    ) -> Self {
        self.accessed_partitions.entry(scan).or_default().extend(partitions);
        self
    }

    /// Records the columns a query uses from a table.
    #[must_use]
    pub fn with_used_columns(
        mut self,
        table: TableId,
        columns: impl IntoIterator<Item = ColumnId>,
    ) -> Self {
        self.used_columns.entry(table).or_default().extend(columns);
        self
    }

    /// The recorded partition access set of a scan, if any.
    #[must_use]
    pub fn partitions_accessed(&self, scan: ScanId) -> Option<&BTreeSet<PartitionId>> {
        self.accessed_partitions.get(&scan)
    }

    /// The recorded column use set of a table, if any.
    #[must_use]
    pub fn columns_used(&self, table: TableId) -> Option<&BTreeSet<ColumnId>> {
        self.used_columns.get(&table)
    }

    /// The partitions a scan accesses, widened to all partitions of the
    /// table when nothing was recorded.
    #[must_use]
    pub fn partitions_accessed_or_all(&self, scan: ScanId, table: &Table) -> BTreeSet<PartitionId> {
        match self.accessed_partitions.get(&scan) {
            Some(partitions) if !partitions.is_empty() => partitions.clone(),
            _ => table.partition_property.partitions.iter().copied().collect(),
        }
    }

    /// The columns used from a table, widened to all its columns when
    /// nothing was recorded.
    #[must_use]
    pub fn columns_used_or_all(&self, table: &Table) -> BTreeSet<ColumnId> {
        match self.used_columns.get(&table.id) {
            Some(columns) if !columns.is_empty() => columns.clone(),
            _ => table.columns.iter().copied().collect(),
        }
    }
}
