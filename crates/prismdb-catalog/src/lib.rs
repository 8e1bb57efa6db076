//! PrismDB Catalog
//!
//! This crate provides the logical catalog entities that describe how data
//! in a PrismDB deployment is laid out across heterogeneous physical stores.
//!
//! # Overview
//!
//! A logical table may be replicated across stores, split horizontally into
//! partitions, split vertically into per-store column groups, or a mixture
//! of all three. The catalog records that layout:
//!
//! - **Identifiers**: [`TableId`], [`ColumnId`], [`PartitionId`], [`StoreId`]
//! - **Entities**: [`Table`], [`Column`], [`Partition`]
//! - **Placements**: [`ColumnPlacement`] (a column copy on a store) and
//!   [`PartitionPlacement`] (a partition copy on a store, with a
//!   [`PlacementRole`] and a [`Staleness`] metric)
//! - **Snapshots**: [`Catalog`], a read-only view for the lifetime of a query
//!
//! # Example
//!
//! ```
//! use prismdb_catalog::{
//!     Catalog, Column, ColumnId, ColumnPlacement, ColumnType, Partition,
//!     PartitionId, PartitionPlacement, PartitionProperty, PlacementRole,
//!     StoreId, Table, TableId,
//! };
//!
//! let table_id = TableId::new(1);
//! let column_id = ColumnId::new(10);
//! let partition_id = PartitionId::new(100);
//! let store = StoreId::new(1);
//!
//! let catalog = Catalog::new()
//!     .with_table(
//!         Table::new(table_id, "orders")
//!             .with_column(column_id)
//!             .with_partition_property(PartitionProperty::unpartitioned(partition_id))
//!             .with_data_placement(store),
//!     )
//!     .with_column(Column::new(column_id, table_id, "total", ColumnType::Double))
//!     .with_partition(Partition::whole_table(partition_id, table_id))
//!     .with_column_placement(ColumnPlacement::new(table_id, column_id, store))
//!     .with_partition_placement(PartitionPlacement::primary(table_id, partition_id, store));
//!
//! assert_eq!(catalog.table(table_id).unwrap().name, "orders");
//! assert!(catalog.primary_placement(partition_id).is_ok());
//! ```

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::CatalogError;
pub use snapshot::Catalog;
pub use types::{
    Column, ColumnId, ColumnPlacement, ColumnType, FreshnessBound, Partition, PartitionId,
    PartitionKind, PartitionPlacement, PartitionProperty, PartitionSelector, PlacementRole,
    ScanId, Staleness, StoreId, Table, TableId,
};
