//! Joined-scan cache.
//!
//! Materializing a placement distribution into a physical subtree is pure
//! but not free, and the same distribution recurs across the scans of one
//! transaction. The [`JoinedScanCache`] memoizes the built subtree per
//! (transaction scope, distribution fingerprint).
//!
//! Concurrency contract:
//!
//! - At most one build runs per key; concurrent callers for the same key
//!   block until the in-flight build finishes and share its result.
//! - [`invalidate_all`](JoinedScanCache::invalidate_all) drops all ready
//!   entries atomically, waits for in-flight builds to complete, and
//!   prevents their insertion. Builds started after the invalidation cache
//!   normally again.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use prismdb_catalog::{Catalog, ColumnId, StoreId, Table};

use crate::algebra::{PhysicalPlan, PhysicalScanNode, PlacementDistribution};
use crate::error::RoutingError;
use crate::transaction::TransactionId;

/// A stable fingerprint of a placement distribution.
///
/// Two distributions with the same partition to placement-list mapping
/// (list order sensitive) fingerprint identically.
#[must_use]
pub fn distribution_fingerprint(distribution: &PlacementDistribution) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (partition, placements) in distribution {
        partition.value().hash(&mut hasher);
        placements.len().hash(&mut hasher);
        for placement in placements {
            placement.column.value().hash(&mut hasher);
            placement.store.value().hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    scope: TransactionId,
    fingerprint: u64,
}

enum Slot {
    /// A build is in flight; waiters block on the condvar.
    Building,
    /// The built subtree.
    Ready(Arc<PhysicalPlan>),
}

struct CacheState {
    entries: HashMap<CacheKey, Slot>,
    /// Bumped by every invalidation; a build only inserts its result if the
    /// epoch it started under is still current.
    epoch: u64,
}

/// Process-wide memoized builder of joined placement scans.
pub struct JoinedScanCache {
    state: Mutex<CacheState>,
    done: Condvar,
    hits: AtomicU64,
    builds: AtomicU64,
}

impl JoinedScanCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState { entries: HashMap::new(), epoch: 0 }),
            done: Condvar::new(),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    /// Returns the physical subtree reading the given distribution,
    /// building and caching it if necessary.
    pub fn build_scan(
        &self,
        scope: TransactionId,
        catalog: &Catalog,
        table: &Table,
        distribution: &PlacementDistribution,
    ) -> Result<Arc<PhysicalPlan>, RoutingError> {
        let key = CacheKey { scope, fingerprint: distribution_fingerprint(distribution) };

        let started_epoch = {
            let mut state = self.state.lock().map_err(|_| RoutingError::LockPoisoned)?;
            loop {
                match state.entries.get(&key) {
                    Some(Slot::Ready(plan)) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(Arc::clone(plan));
                    }
                    Some(Slot::Building) => {
                        state = self.done.wait(state).map_err(|_| RoutingError::LockPoisoned)?;
                    }
                    None => {
                        state.entries.insert(key, Slot::Building);
                        break state.epoch;
                    }
                }
            }
        };

        self.builds.fetch_add(1, Ordering::Relaxed);
        let built = assemble_joined_scan(catalog, table, distribution);

        let mut state = self.state.lock().map_err(|_| RoutingError::LockPoisoned)?;
        let result = match built {
            Ok(plan) => {
                let plan = Arc::new(plan);
                if state.epoch == started_epoch {
                    state.entries.insert(key, Slot::Ready(Arc::clone(&plan)));
                } else {
                    // Invalidated while building: hand the result to the
                    // caller but keep it out of the cache.
                    state.entries.remove(&key);
                }
                Ok(plan)
            }
            Err(err) => {
                state.entries.remove(&key);
                Err(err)
            }
        };
        drop(state);
        self.done.notify_all();
        result
    }

    /// Drops all cached subtrees.
    ///
    /// Waits for in-flight builds to complete; their results are handed to
    /// their callers but not inserted. Called by the environment after a
    /// DDL may have changed placements.
    pub fn invalidate_all(&self) {
        tracing::debug!("invalidating joined-scan cache");
        if let Ok(mut state) = self.state.lock() {
            state.epoch += 1;
            state.entries.retain(|_, slot| matches!(slot, Slot::Building));
            while state.entries.values().any(|slot| matches!(slot, Slot::Building)) {
                match self.done.wait(state) {
                    Ok(next) => state = next,
                    Err(_) => return,
                }
            }
        }
    }

    /// Number of cached subtrees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| {
                state.entries.values().filter(|slot| matches!(slot, Slot::Ready(_))).count()
            })
            .unwrap_or(0)
    }

    /// Whether the cache holds no subtrees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of builds performed.
    #[must_use]
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Default for JoinedScanCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Materializes a distribution into a physical subtree.
///
/// Per partition, the placement list is grouped by store (first-occurrence
/// order); each group becomes one scan, groups are joined left-deep on the
/// implicit row identifier, and the per-partition subtrees are unioned in
/// partition-id order. A single partition read from a single store
/// short-circuits to one multi-column scan.
fn assemble_joined_scan(
    catalog: &Catalog,
    table: &Table,
    distribution: &PlacementDistribution,
) -> Result<PhysicalPlan, RoutingError> {
    if distribution.is_empty() {
        return Err(RoutingError::inconsistency(format!(
            "empty placement distribution for table {}",
            table.id
        )));
    }

    let mut per_partition = Vec::with_capacity(distribution.len());
    for (partition, placements) in distribution {
        if placements.is_empty() {
            return Err(RoutingError::inconsistency(format!(
                "no column placements for partition {partition}"
            )));
        }

        // Group by store, preserving the first occurrence order of stores
        // in the placement list.
        let mut groups: Vec<(StoreId, Vec<ColumnId>)> = Vec::new();
        for placement in placements {
            if placement.table != table.id {
                return Err(RoutingError::inconsistency(format!(
                    "placement of table {} in a distribution for table {}",
                    placement.table, table.id
                )));
            }
            if catalog.column_placement(placement.column, placement.store).is_none() {
                return Err(RoutingError::Catalog(
                    prismdb_catalog::CatalogError::ColumnPlacementNotFound {
                        column: placement.column,
                        store: placement.store,
                    },
                ));
            }
            match groups.iter_mut().find(|(store, _)| *store == placement.store) {
                Some((_, columns)) => columns.push(placement.column),
                None => groups.push((placement.store, vec![placement.column])),
            }
        }

        let mut scans = Vec::with_capacity(groups.len());
        for (store, columns) in groups {
            // The store must actually hold this partition.
            let _ = catalog.partition_placement(*partition, store)?;
            scans.push(PhysicalPlan::Scan(PhysicalScanNode::new(
                table.id, *partition, store, columns,
            )));
        }

        let mut scans = scans.into_iter();
        let first = scans
            .next()
            .ok_or_else(|| RoutingError::inconsistency("partition produced no scans"))?;
        let joined = scans.fold(first, |left, right| PhysicalPlan::RowIdJoin {
            left: Box::new(left),
            right: Box::new(right),
        });
        per_partition.push(joined);
    }

    if per_partition.len() == 1 {
        let mut per_partition = per_partition;
        Ok(per_partition.remove(0))
    } else {
        Ok(PhysicalPlan::Union { inputs: per_partition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismdb_catalog::{
        Column, ColumnPlacement, ColumnType, Partition, PartitionId, PartitionPlacement,
        PartitionProperty, TableId,
    };
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;

    const T: TableId = TableId::new(1);
    const A: ColumnId = ColumnId::new(10);
    const B: ColumnId = ColumnId::new(11);
    const P1: PartitionId = PartitionId::new(100);
    const P2: PartitionId = PartitionId::new(101);
    const X: StoreId = StoreId::new(1);
    const Y: StoreId = StoreId::new(2);

    fn catalog() -> Catalog {
        Catalog::new()
            .with_table(
                Table::new(T, "t")
                    .with_columns([A, B])
                    .with_partition_property(PartitionProperty::horizontal_range(vec![P1, P2]))
                    .with_data_placement(X)
                    .with_data_placement(Y),
            )
            .with_column(Column::new(A, T, "a", ColumnType::BigInt))
            .with_column(Column::new(B, T, "b", ColumnType::Varchar))
            .with_partition(Partition::range(P1, T, None, Some(100)))
            .with_partition(Partition::range(P2, T, Some(100), None))
            .with_column_placement(ColumnPlacement::new(T, A, X))
            .with_column_placement(ColumnPlacement::new(T, B, X))
            .with_column_placement(ColumnPlacement::new(T, A, Y))
            .with_column_placement(ColumnPlacement::new(T, B, Y))
            .with_partition_placement(PartitionPlacement::primary(T, P1, X))
            .with_partition_placement(PartitionPlacement::refreshable(
                T,
                P1,
                Y,
                prismdb_catalog::Staleness::current(),
            ))
            .with_partition_placement(PartitionPlacement::primary(T, P2, Y))
    }

    fn table(catalog: &Catalog) -> Table {
        catalog.table(T).unwrap().clone()
    }

    fn single_store_distribution() -> PlacementDistribution {
        let mut distribution = BTreeMap::new();
        distribution
            .insert(P1, vec![ColumnPlacement::new(T, A, X), ColumnPlacement::new(T, B, X)]);
        distribution
    }

    #[test]
    fn single_partition_single_store_short_circuits() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();

        let plan = cache
            .build_scan(TransactionId::new(1), &catalog, &table(&catalog), &single_store_distribution())
            .unwrap();

        match plan.as_ref() {
            PhysicalPlan::Scan(scan) => {
                assert_eq!(scan.store, X);
                assert_eq!(scan.columns, vec![A, B]);
            }
            other => panic!("expected a plain scan, got {other:?}"),
        }
    }

    #[test]
    fn split_partition_joins_on_row_id() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();

        let mut distribution = BTreeMap::new();
        distribution
            .insert(P1, vec![ColumnPlacement::new(T, A, X), ColumnPlacement::new(T, B, Y)]);

        let plan = cache
            .build_scan(TransactionId::new(1), &catalog, &table(&catalog), &distribution)
            .unwrap();

        match plan.as_ref() {
            PhysicalPlan::RowIdJoin { left, right } => match (left.as_ref(), right.as_ref()) {
                (PhysicalPlan::Scan(left), PhysicalPlan::Scan(right)) => {
                    assert_eq!((left.store, left.columns.as_slice()), (X, &[A][..]));
                    assert_eq!((right.store, right.columns.as_slice()), (Y, &[B][..]));
                }
                other => panic!("expected scans, got {other:?}"),
            },
            other => panic!("expected a row-id join, got {other:?}"),
        }
    }

    #[test]
    fn partitions_union_in_id_order() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();

        let mut distribution = BTreeMap::new();
        distribution
            .insert(P1, vec![ColumnPlacement::new(T, A, X), ColumnPlacement::new(T, B, X)]);
        distribution
            .insert(P2, vec![ColumnPlacement::new(T, B, Y), ColumnPlacement::new(T, A, Y)]);

        let plan = cache
            .build_scan(TransactionId::new(1), &catalog, &table(&catalog), &distribution)
            .unwrap();

        match plan.as_ref() {
            PhysicalPlan::Union { inputs } => {
                assert_eq!(inputs.len(), 2);
                match (&inputs[0], &inputs[1]) {
                    (PhysicalPlan::Scan(first), PhysicalPlan::Scan(second)) => {
                        assert_eq!(first.partition, P1);
                        assert_eq!(second.partition, P2);
                        // Placement-list order is preserved.
                        assert_eq!(second.columns, vec![B, A]);
                    }
                    other => panic!("expected scans, got {other:?}"),
                }
            }
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn missing_partition_placement_is_fatal() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();

        // P2 has no placement on X.
        let mut distribution = BTreeMap::new();
        distribution.insert(P2, vec![ColumnPlacement::new(T, A, X)]);

        let err = cache
            .build_scan(TransactionId::new(1), &catalog, &table(&catalog), &distribution)
            .unwrap_err();
        assert!(matches!(err, RoutingError::Catalog(_)));
    }

    #[test]
    fn repeated_builds_hit_the_cache() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();
        let table = table(&catalog);
        let distribution = single_store_distribution();

        let first =
            cache.build_scan(TransactionId::new(1), &catalog, &table, &distribution).unwrap();
        let second =
            cache.build_scan(TransactionId::new(1), &catalog, &table, &distribution).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn scopes_do_not_share_entries() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();
        let table = table(&catalog);
        let distribution = single_store_distribution();

        let _ = cache.build_scan(TransactionId::new(1), &catalog, &table, &distribution).unwrap();
        let _ = cache.build_scan(TransactionId::new(2), &catalog, &table, &distribution).unwrap();

        assert_eq!(cache.builds(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_all_drops_entries() {
        let catalog = catalog();
        let cache = JoinedScanCache::new();
        let table = table(&catalog);
        let distribution = single_store_distribution();

        let _ = cache.build_scan(TransactionId::new(1), &catalog, &table, &distribution).unwrap();
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());

        let _ = cache.build_scan(TransactionId::new(1), &catalog, &table, &distribution).unwrap();
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn concurrent_same_key_builds_once() {
        let catalog = Arc::new(catalog());
        let cache = Arc::new(JoinedScanCache::new());
        let shared_table = Arc::new(table(&catalog));
        let distribution = Arc::new(single_store_distribution());
        let successes = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let catalog = Arc::clone(&catalog);
            let shared_table = Arc::clone(&shared_table);
            let distribution = Arc::clone(&distribution);
            let successes = Arc::clone(&successes);
            handles.push(std::thread::spawn(move || {
                let plan = cache
                    .build_scan(TransactionId::new(1), &catalog, &shared_table, &distribution)
                    .unwrap();
                assert!(matches!(plan.as_ref(), PhysicalPlan::Scan(_)));
                successes.fetch_add(1, Ordering::Relaxed);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(successes.load(Ordering::Relaxed), 8);
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn fingerprint_is_order_sensitive() {
        let forward =
            vec![ColumnPlacement::new(T, A, X), ColumnPlacement::new(T, B, X)];
        let backward =
            vec![ColumnPlacement::new(T, B, X), ColumnPlacement::new(T, A, X)];

        let mut first = BTreeMap::new();
        first.insert(P1, forward.clone());
        let mut second = BTreeMap::new();
        second.insert(P1, forward);
        let mut third = BTreeMap::new();
        third.insert(P1, backward);

        assert_eq!(distribution_fingerprint(&first), distribution_fingerprint(&second));
        assert_ne!(distribution_fingerprint(&first), distribution_fingerprint(&third));
    }
}
