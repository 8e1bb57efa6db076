//! Read-only catalog snapshots.
//!
//! A [`Catalog`] is the view of the logical schema and its physical layout
//! that a query holds for its lifetime. The routing core only reads from it;
//! the upstream DDL layer constructs snapshots with the `with_*` methods.

use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::types::{
    Column, ColumnId, ColumnPlacement, Partition, PartitionId, PartitionPlacement, PlacementRole,
    StoreId, Table, TableId,
};

/// An immutable-for-the-query view of tables, columns, partitions, and
/// placements.
///
/// Lookups return references into the snapshot; entity-not-found is a
/// [`CatalogError`], which routing treats as fatal.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<TableId, Table>,
    columns: BTreeMap<ColumnId, Column>,
    partitions: BTreeMap<PartitionId, Partition>,
    column_placements: BTreeMap<(ColumnId, StoreId), ColumnPlacement>,
    partition_placements: BTreeMap<PartitionId, Vec<PartitionPlacement>>,
}

impl Catalog {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table.
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table.id, table);
        self
    }

    /// Add a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.insert(column.id, column);
        self
    }

    /// Add a partition.
    #[must_use]
    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partitions.insert(partition.id, partition);
        self
    }

    /// Add a column placement.
    #[must_use]
    pub fn with_column_placement(mut self, placement: ColumnPlacement) -> Self {
        self.column_placements.insert((placement.column, placement.store), placement);
        self
    }

    /// Add a partition placement. Placements of a partition are kept in
    /// store-id order.
    #[must_use]
    pub fn with_partition_placement(mut self, placement: PartitionPlacement) -> Self {
        let placements = self.partition_placements.entry(placement.partition).or_default();
        placements.push(placement);
        placements.sort_by_key(|p| p.store);
        self
    }

    /// Look up a table.
    pub fn table(&self, id: TableId) -> Result<&Table, CatalogError> {
        self.tables.get(&id).ok_or(CatalogError::TableNotFound(id))
    }

    /// Look up a column.
    pub fn column(&self, id: ColumnId) -> Result<&Column, CatalogError> {
        self.columns.get(&id).ok_or(CatalogError::ColumnNotFound(id))
    }

    /// Look up a partition.
    pub fn partition(&self, id: PartitionId) -> Result<&Partition, CatalogError> {
        self.partitions.get(&id).ok_or(CatalogError::PartitionNotFound(id))
    }

    /// The partitions of a table, in partition-id order.
    pub fn partitions_of(&self, table: TableId) -> Result<Vec<&Partition>, CatalogError> {
        let table = self.table(table)?;
        table.partition_property.partitions.iter().map(|id| self.partition(*id)).collect()
    }

    /// All column placements of a table, ordered by (column, store).
    pub fn placements_of(&self, table: TableId) -> Result<Vec<&ColumnPlacement>, CatalogError> {
        // Fail on unknown tables rather than answering with an empty list.
        let _ = self.table(table)?;
        Ok(self.column_placements.values().filter(|p| p.table == table).collect())
    }

    /// The placement of a column on a specific store, if any.
    #[must_use]
    pub fn column_placement(&self, column: ColumnId, store: StoreId) -> Option<&ColumnPlacement> {
        self.column_placements.get(&(column, store))
    }

    /// Whether a column has a placement on a specific store.
    #[must_use]
    pub fn has_column_placement(&self, column: ColumnId, store: StoreId) -> bool {
        self.column_placements.contains_key(&(column, store))
    }

    /// The column placements a store holds for a table, ordered by column id.
    pub fn column_placements_on(
        &self,
        table: TableId,
        store: StoreId,
    ) -> Result<Vec<&ColumnPlacement>, CatalogError> {
        let _ = self.table(table)?;
        Ok(self
            .column_placements
            .values()
            .filter(|p| p.table == table && p.store == store)
            .collect())
    }

    /// All placements of a partition, in store-id order.
    pub fn partition_placements(
        &self,
        partition: PartitionId,
    ) -> Result<&[PartitionPlacement], CatalogError> {
        // Distinguish "unknown partition" from "known partition with no
        // placements yet": both are lookup failures for routing, but the
        // former points at a caller bug.
        let _ = self.partition(partition)?;
        Ok(self.partition_placements.get(&partition).map_or(&[], Vec::as_slice))
    }

    /// The placement of a partition on a specific store.
    pub fn partition_placement(
        &self,
        partition: PartitionId,
        store: StoreId,
    ) -> Result<&PartitionPlacement, CatalogError> {
        self.partition_placements(partition)?
            .iter()
            .find(|p| p.store == store)
            .ok_or(CatalogError::PartitionPlacementNotFound { partition, store })
    }

    /// The primary placement of a partition.
    pub fn primary_placement(
        &self,
        partition: PartitionId,
    ) -> Result<&PartitionPlacement, CatalogError> {
        self.partition_placements(partition)?
            .iter()
            .find(|p| p.role == PlacementRole::Primary)
            .ok_or(CatalogError::MissingPrimaryPlacement(partition))
    }

    /// Whether reads of a table may be served from outdated placements.
    pub fn supports_outdated(&self, table: TableId) -> Result<bool, CatalogError> {
        Ok(self.table(table)?.supports_outdated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnType, PartitionProperty, Staleness};
    use std::time::Duration;

    fn sample_catalog() -> Catalog {
        let t = TableId::new(1);
        let a = ColumnId::new(10);
        let b = ColumnId::new(11);
        let p = PartitionId::new(100);
        let x = StoreId::new(1);
        let y = StoreId::new(2);

        Catalog::new()
            .with_table(
                Table::new(t, "customers")
                    .with_columns([a, b])
                    .with_partition_property(PartitionProperty::vertical(p))
                    .with_data_placement(x)
                    .with_data_placement(y),
            )
            .with_column(Column::new(a, t, "id", ColumnType::BigInt))
            .with_column(Column::new(b, t, "name", ColumnType::Varchar))
            .with_partition(Partition::whole_table(p, t))
            .with_column_placement(ColumnPlacement::new(t, a, x))
            .with_column_placement(ColumnPlacement::new(t, b, y))
            .with_partition_placement(PartitionPlacement::primary(t, p, x))
            .with_partition_placement(PartitionPlacement::refreshable(
                t,
                p,
                y,
                Staleness::new(Duration::from_secs(5), 1, 10),
            ))
    }

    #[test]
    fn lookups_resolve() {
        let catalog = sample_catalog();
        let t = TableId::new(1);

        assert_eq!(catalog.table(t).unwrap().name, "customers");
        assert_eq!(catalog.column(ColumnId::new(10)).unwrap().name, "id");
        assert_eq!(catalog.partitions_of(t).unwrap().len(), 1);
        assert_eq!(catalog.placements_of(t).unwrap().len(), 2);
        assert!(!catalog.supports_outdated(t).unwrap());
    }

    #[test]
    fn missing_entities_are_errors() {
        let catalog = sample_catalog();

        assert_eq!(
            catalog.table(TableId::new(99)),
            Err(CatalogError::TableNotFound(TableId::new(99)))
        );
        assert_eq!(
            catalog.partition(PartitionId::new(99)),
            Err(CatalogError::PartitionNotFound(PartitionId::new(99)))
        );
        assert!(catalog.column_placement(ColumnId::new(10), StoreId::new(2)).is_none());
    }

    #[test]
    fn partition_placement_resolution() {
        let catalog = sample_catalog();
        let p = PartitionId::new(100);

        let placements = catalog.partition_placements(p).unwrap();
        assert_eq!(placements.len(), 2);
        // Store-id order.
        assert_eq!(placements[0].store, StoreId::new(1));

        let primary = catalog.primary_placement(p).unwrap();
        assert_eq!(primary.store, StoreId::new(1));
        assert_eq!(primary.role, PlacementRole::Primary);

        assert!(matches!(
            catalog.partition_placement(p, StoreId::new(3)),
            Err(CatalogError::PartitionPlacementNotFound { .. })
        ));
    }

    #[test]
    fn column_placements_on_store() {
        let catalog = sample_catalog();
        let t = TableId::new(1);

        let on_x = catalog.column_placements_on(t, StoreId::new(1)).unwrap();
        assert_eq!(on_x.len(), 1);
        assert_eq!(on_x[0].column, ColumnId::new(10));
    }
}
