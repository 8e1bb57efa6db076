//! Shared fixtures for routing integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use prismdb_catalog::{
    Catalog, Column, ColumnId, ColumnPlacement, ColumnType, Partition, PartitionId,
    PartitionPlacement, PartitionProperty, Staleness, StoreId, Table, TableId,
};
use prismdb_routing::locking::{EntityKey, LockError, LockManager};
use prismdb_routing::TransactionId;

pub const STORE_X: StoreId = StoreId::new(1);
pub const STORE_Y: StoreId = StoreId::new(2);
pub const STORE_Z: StoreId = StoreId::new(3);

/// T1: one placement, columns {a, b}, one partition.
pub const T1: TableId = TableId::new(1);
pub const T1_A: ColumnId = ColumnId::new(10);
pub const T1_B: ColumnId = ColumnId::new(11);
pub const T1_P: PartitionId = PartitionId::new(100);

/// T2: vertically split, column a on X, column b on Y, one partition.
pub const T2: TableId = TableId::new(2);
pub const T2_A: ColumnId = ColumnId::new(20);
pub const T2_B: ColumnId = ColumnId::new(21);
pub const T2_P: PartitionId = PartitionId::new(200);

/// T3: partitions {p1, p2, p3} with primaries on X, Y, Z.
pub const T3: TableId = TableId::new(3);
pub const T3_A: ColumnId = ColumnId::new(30);
pub const T3_P1: PartitionId = PartitionId::new(300);
pub const T3_P2: PartitionId = PartitionId::new(301);
pub const T3_P3: PartitionId = PartitionId::new(302);

/// T4: supports outdated reads; primaries on X, refreshable replicas of p1
/// on Y (10s) and Z (20s), of p2 on Z (40s).
pub const T4: TableId = TableId::new(4);
pub const T4_A: ColumnId = ColumnId::new(40);
pub const T4_P1: PartitionId = PartitionId::new(400);
pub const T4_P2: PartitionId = PartitionId::new(401);

fn staleness(secs: u64) -> Staleness {
    Staleness::new(Duration::from_secs(secs), secs, secs)
}

/// The catalog all scenarios run against.
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();

    // T1: single placement on X.
    catalog = catalog
        .with_table(
            Table::new(T1, "orders")
                .with_columns([T1_A, T1_B])
                .with_partition_property(PartitionProperty::unpartitioned(T1_P))
                .with_data_placement(STORE_X),
        )
        .with_column(Column::new(T1_A, T1, "id", ColumnType::BigInt))
        .with_column(Column::new(T1_B, T1, "total", ColumnType::Double))
        .with_partition(Partition::whole_table(T1_P, T1))
        .with_column_placement(ColumnPlacement::new(T1, T1_A, STORE_X))
        .with_column_placement(ColumnPlacement::new(T1, T1_B, STORE_X))
        .with_partition_placement(PartitionPlacement::primary(T1, T1_P, STORE_X));

    // T2: vertical split across X and Y.
    catalog = catalog
        .with_table(
            Table::new(T2, "customers")
                .with_columns([T2_A, T2_B])
                .with_partition_property(PartitionProperty::vertical(T2_P))
                .with_data_placement(STORE_X)
                .with_data_placement(STORE_Y),
        )
        .with_column(Column::new(T2_A, T2, "id", ColumnType::BigInt))
        .with_column(Column::new(T2_B, T2, "name", ColumnType::Varchar))
        .with_partition(Partition::whole_table(T2_P, T2))
        .with_column_placement(ColumnPlacement::new(T2, T2_A, STORE_X))
        .with_column_placement(ColumnPlacement::new(T2, T2_B, STORE_Y))
        .with_partition_placement(PartitionPlacement::primary(T2, T2_P, STORE_X))
        .with_partition_placement(PartitionPlacement::refreshable(
            T2,
            T2_P,
            STORE_Y,
            Staleness::current(),
        ));

    // T3: horizontal range, one primary per partition.
    catalog = catalog
        .with_table(
            Table::new(T3, "events")
                .with_column(T3_A)
                .with_partition_property(PartitionProperty::horizontal_range(vec![
                    T3_P1, T3_P2, T3_P3,
                ]))
                .with_data_placement(STORE_X)
                .with_data_placement(STORE_Y)
                .with_data_placement(STORE_Z),
        )
        .with_column(Column::new(T3_A, T3, "payload", ColumnType::Varchar))
        .with_partition(Partition::range(T3_P1, T3, None, Some(100)))
        .with_partition(Partition::range(T3_P2, T3, Some(100), Some(200)))
        .with_partition(Partition::range(T3_P3, T3, Some(200), None))
        .with_column_placement(ColumnPlacement::new(T3, T3_A, STORE_X))
        .with_column_placement(ColumnPlacement::new(T3, T3_A, STORE_Y))
        .with_column_placement(ColumnPlacement::new(T3, T3_A, STORE_Z))
        .with_partition_placement(PartitionPlacement::primary(T3, T3_P1, STORE_X))
        .with_partition_placement(PartitionPlacement::primary(T3, T3_P2, STORE_Y))
        .with_partition_placement(PartitionPlacement::primary(T3, T3_P3, STORE_Z));

    // T4: horizontal with lagging replicas, freshness-readable.
    catalog = catalog
        .with_table(
            Table::new(T4, "readings")
                .with_column(T4_A)
                .with_partition_property(PartitionProperty::horizontal_range(vec![T4_P1, T4_P2]))
                .with_data_placement(STORE_X)
                .with_data_placement(STORE_Y)
                .with_data_placement(STORE_Z)
                .with_outdated_support(),
        )
        .with_column(Column::new(T4_A, T4, "value", ColumnType::Double))
        .with_partition(Partition::range(T4_P1, T4, None, Some(0)))
        .with_partition(Partition::range(T4_P2, T4, Some(0), None))
        .with_column_placement(ColumnPlacement::new(T4, T4_A, STORE_X))
        .with_column_placement(ColumnPlacement::new(T4, T4_A, STORE_Y))
        .with_column_placement(ColumnPlacement::new(T4, T4_A, STORE_Z))
        .with_partition_placement(PartitionPlacement::primary(T4, T4_P1, STORE_X))
        .with_partition_placement(PartitionPlacement::refreshable(T4, T4_P1, STORE_Y, staleness(10)))
        .with_partition_placement(PartitionPlacement::refreshable(T4, T4_P1, STORE_Z, staleness(20)))
        .with_partition_placement(PartitionPlacement::primary(T4, T4_P2, STORE_X))
        .with_partition_placement(PartitionPlacement::refreshable(T4, T4_P2, STORE_Z, staleness(40)));

    catalog
}

/// Lock manager stub recording every acquisition in order.
#[derive(Default)]
pub struct RecordingLockManager {
    global: Mutex<Vec<TransactionId>>,
    entities: Mutex<Vec<EntityKey>>,
    deadlock: AtomicBool,
}

impl RecordingLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent acquisition fail with a deadlock.
    pub fn break_with_deadlock(&self) {
        self.deadlock.store(true, Ordering::Relaxed);
    }

    pub fn global_locks(&self) -> usize {
        self.global.lock().unwrap().len()
    }

    pub fn entity_locks(&self) -> Vec<EntityKey> {
        self.entities.lock().unwrap().clone()
    }
}

impl LockManager for RecordingLockManager {
    fn lock_global_shared(&self, tx: TransactionId) -> Result<(), LockError> {
        if self.deadlock.load(Ordering::Relaxed) {
            return Err(LockError::Deadlock);
        }
        self.global.lock().unwrap().push(tx);
        Ok(())
    }

    fn lock_shared(&self, _tx: TransactionId, entity: EntityKey) -> Result<(), LockError> {
        if self.deadlock.load(Ordering::Relaxed) {
            return Err(LockError::Deadlock);
        }
        self.entities.lock().unwrap().push(entity);
        Ok(())
    }
}
