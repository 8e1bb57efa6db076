//! Error types for the catalog crate.

use thiserror::Error;

use crate::types::{ColumnId, PartitionId, StoreId, TableId};

/// Errors that can occur when resolving catalog entities.
///
/// The routing core treats the catalog as consistent; any of these errors is
/// fatal for the query being routed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The referenced table does not exist.
    #[error("table {0} not found")]
    TableNotFound(TableId),

    /// The referenced column does not exist.
    #[error("column {0} not found")]
    ColumnNotFound(ColumnId),

    /// The referenced partition does not exist.
    #[error("partition {0} not found")]
    PartitionNotFound(PartitionId),

    /// No column placement exists for the given column on the given store.
    #[error("no placement of column {column} on store {store}")]
    ColumnPlacementNotFound {
        /// The column that was looked up.
        column: ColumnId,
        /// The store it was expected on.
        store: StoreId,
    },

    /// No partition placement exists for the given partition on the given store.
    #[error("no placement of partition {partition} on store {store}")]
    PartitionPlacementNotFound {
        /// The partition that was looked up.
        partition: PartitionId,
        /// The store it was expected on.
        store: StoreId,
    },

    /// A partition has no primary placement. Every partition must have
    /// exactly one.
    #[error("partition {0} has no primary placement")]
    MissingPrimaryPlacement(PartitionId),
}
