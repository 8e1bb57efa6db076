//! Read-lock acquisition.
//!
//! The non-freshness routing path must lock everything it will read before
//! placements are chosen: first the shared global schema lock (serialized
//! against exclusive schema locks held by DDL), then a shared lock per
//! `(table, partition)` entity. Entities are locked in ascending key order
//! so concurrent routers cannot deadlock each other; the lock manager may
//! still detect a deadlock against other lock holders, which routing
//! surfaces without retrying.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use prismdb_catalog::{PartitionId, Table, TableId};

use crate::error::RoutingError;
use crate::transaction::{Transaction, TransactionId};

/// A lockable `(table, partition)` entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    /// The table.
    pub table: TableId,
    /// The partition.
    pub partition: PartitionId,
}

impl EntityKey {
    /// Creates an entity key.
    #[must_use]
    pub const fn new(table: TableId, partition: PartitionId) -> Self {
        Self { table, partition }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.table, self.partition)
    }
}

/// Errors reported by the lock manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    /// Granting the lock would deadlock.
    #[error("deadlock detected")]
    Deadlock,
}

/// The lock-manager contract routing depends on.
///
/// Implementations live in the transaction layer; routing only acquires
/// shared locks and never releases them (release happens on transaction
/// commit or abort).
pub trait LockManager: Send + Sync {
    /// Acquires the shared global schema lock.
    fn lock_global_shared(&self, tx: TransactionId) -> Result<(), LockError>;

    /// Acquires a shared lock on one `(table, partition)` entity.
    fn lock_shared(&self, tx: TransactionId, entity: EntityKey) -> Result<(), LockError>;
}

/// The entities a scan of `table` over `partitions` reads.
#[must_use]
pub fn read_entities(table: &Table, partitions: &BTreeSet<PartitionId>) -> BTreeSet<EntityKey> {
    partitions.iter().map(|partition| EntityKey::new(table.id, *partition)).collect()
}

/// Acquires the shared global schema lock and a shared lock per accessed
/// entity, in ascending `(table, partition)` order, registering each entity
/// lock on the transaction.
pub fn acquire_read_locks(
    locks: &dyn LockManager,
    tx: &Transaction,
    table: &Table,
    partitions: &BTreeSet<PartitionId>,
) -> Result<(), RoutingError> {
    locks.lock_global_shared(tx.id())?;

    for entity in read_entities(table, partitions) {
        locks.lock_shared(tx.id(), entity)?;
        tx.register_lock(entity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismdb_catalog::PartitionProperty;
    use std::sync::Mutex;

    /// Lock manager stub that records the acquisition order.
    struct Recording {
        order: Mutex<Vec<Option<EntityKey>>>,
        deadlock_on: Option<EntityKey>,
    }

    impl Recording {
        fn new() -> Self {
            Self { order: Mutex::new(Vec::new()), deadlock_on: None }
        }
    }

    impl LockManager for Recording {
        fn lock_global_shared(&self, _tx: TransactionId) -> Result<(), LockError> {
            self.order.lock().unwrap().push(None);
            Ok(())
        }

        fn lock_shared(&self, _tx: TransactionId, entity: EntityKey) -> Result<(), LockError> {
            if self.deadlock_on == Some(entity) {
                return Err(LockError::Deadlock);
            }
            self.order.lock().unwrap().push(Some(entity));
            Ok(())
        }
    }

    fn table() -> Table {
        Table::new(TableId::new(1), "t").with_partition_property(
            PartitionProperty::horizontal_range(vec![PartitionId::new(3), PartitionId::new(1)]),
        )
    }

    #[test]
    fn global_lock_comes_first_then_ascending_entities() {
        let locks = Recording::new();
        let tx = Transaction::new(TransactionId::new(9));
        let partitions: BTreeSet<_> = [PartitionId::new(3), PartitionId::new(1)].into();

        acquire_read_locks(&locks, &tx, &table(), &partitions).unwrap();

        let order = locks.order.lock().unwrap();
        assert_eq!(order[0], None);
        assert_eq!(order[1], Some(EntityKey::new(TableId::new(1), PartitionId::new(1))));
        assert_eq!(order[2], Some(EntityKey::new(TableId::new(1), PartitionId::new(3))));

        let registered = tx.read_locks().unwrap();
        assert_eq!(registered.len(), 2);
    }

    #[test]
    fn deadlock_surfaces() {
        let mut locks = Recording::new();
        locks.deadlock_on = Some(EntityKey::new(TableId::new(1), PartitionId::new(3)));
        let tx = Transaction::new(TransactionId::new(9));
        let partitions: BTreeSet<_> = [PartitionId::new(1), PartitionId::new(3)].into();

        let err = acquire_read_locks(&locks, &tx, &table(), &partitions).unwrap_err();
        assert!(err.is_deadlock());

        // The earlier entity was still registered; the transaction layer
        // releases it on abort.
        assert_eq!(tx.read_locks().unwrap().len(), 1);
    }
}
