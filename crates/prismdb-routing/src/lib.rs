//! PrismDB DQL Routing
//!
//! This crate turns logical relational-algebra trees into candidate
//! physical plans whose scans reference concrete column placements on
//! concrete partition placements on concrete stores.
//!
//! # Overview
//!
//! A query arrives as a [`LogicalPlan`] referring only to logical tables
//! and columns. Before execution it must be rewritten against the physical
//! layout the catalog records: replicas, horizontal partitions, vertical
//! column groups. The [`DqlRouter`] walks the logical tree post-order and,
//! for every scan:
//!
//! 1. tries the **freshness path** when the transaction accepts outdated
//!    copies and the table supports them ([`FreshnessResolver`]);
//! 2. otherwise acquires shared read locks ([`locking`]) and
//! 3. dispatches to a [`PlacementStrategy`] keyed by the table's
//!    partitioning regime.
//!
//! Chosen distributions are materialized into physical subtrees through the
//! process-wide [`JoinedScanCache`] and spliced into forkable
//! [`PlanBuilder`]s. The result is a list of candidate plans for the cost
//! model to choose from, or an empty list when this router declines the
//! query (universal routing).
//!
//! # Example
//!
//! ```
//! use prismdb_catalog::{
//!     Catalog, Column, ColumnId, ColumnPlacement, ColumnType, Partition,
//!     PartitionId, PartitionPlacement, PartitionProperty, ScanId, StoreId,
//!     Table, TableId,
//! };
//! use prismdb_routing::locking::{EntityKey, LockError, LockManager};
//! use prismdb_routing::{
//!     DqlRouter, JoinedScanCache, LogicalPlan, QueryInformation,
//!     SinglePlacementStrategy, Transaction, TransactionId,
//! };
//!
//! struct NoopLocks;
//! impl LockManager for NoopLocks {
//!     fn lock_global_shared(
//!         &self,
//!         _tx: TransactionId,
//!     ) -> Result<(), LockError> {
//!         Ok(())
//!     }
//!     fn lock_shared(
//!         &self,
//!         _tx: TransactionId,
//!         _entity: EntityKey,
//!     ) -> Result<(), LockError> {
//!         Ok(())
//!     }
//! }
//!
//! let table = TableId::new(1);
//! let column = ColumnId::new(10);
//! let partition = PartitionId::new(100);
//! let store = StoreId::new(1);
//!
//! let catalog = Catalog::new()
//!     .with_table(
//!         Table::new(table, "orders")
//!             .with_column(column)
//!             .with_partition_property(PartitionProperty::unpartitioned(partition))
//!             .with_data_placement(store),
//!     )
//!     .with_column(Column::new(column, table, "total", ColumnType::Double))
//!     .with_partition(Partition::whole_table(partition, table))
//!     .with_column_placement(ColumnPlacement::new(table, column, store))
//!     .with_partition_placement(PartitionPlacement::primary(table, partition, store));
//!
//! let cache = JoinedScanCache::new();
//! let locks = NoopLocks;
//! let router = DqlRouter::new(&catalog, &cache, &locks, SinglePlacementStrategy::new());
//!
//! let tx = Transaction::new(TransactionId::new(1));
//! let info = QueryInformation::new();
//! let plans = router
//!     .route(&LogicalPlan::scan(ScanId::new(1), table), &tx, &info)
//!     .unwrap();
//!
//! assert_eq!(plans.len(), 1);
//! ```

pub mod algebra;
pub mod cache;
pub mod error;
pub mod freshness;
pub mod information;
pub mod locking;
pub mod router;
pub mod strategy;
pub mod transaction;


pub use algebra::{
    BuilderState, Literal, LogicalPlan, OperatorKind, OperatorNode, PhysicalPlan,
    PhysicalScanNode, PlacementDistribution, PlanBuilder, RoutingPlan, ScanNode, SetOpKind,
    SetOpNode, ValuesNode,
};
pub use cache::{distribution_fingerprint, JoinedScanCache};
pub use error::RoutingError;
pub use freshness::FreshnessResolver;
pub use information::QueryInformation;
pub use router::DqlRouter;
pub use strategy::{
    FullPlacementStrategy, MinimumCostStrategy, PlacementStrategy, RoutingContext,
    SinglePlacementStrategy, StrategyOutcome,
};
pub use transaction::{Transaction, TransactionId};
