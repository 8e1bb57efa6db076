//! Transaction context for routing.
//!
//! Routing never owns a transaction; it reads a handle the transaction
//! layer passes in: whether outdated copies are acceptable, the tolerated
//! staleness, the cancel flag, and the set of read locks acquired so far.
//! All mutation goes through interior mutability so routing can hold a
//! shared reference.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use prismdb_catalog::FreshnessBound;

use crate::error::RoutingError;
use crate::locking::EntityKey;

/// Identifier of a transaction scope.
///
/// Also keys the joined-scan cache: cached scans are never shared across
/// transactions that could observe different schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create a new identifier from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The transaction-side context a query is routed under.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    accepts_outdated: bool,
    freshness: Option<FreshnessBound>,
    use_cache: AtomicBool,
    cancelled: AtomicBool,
    read_locks: Mutex<BTreeSet<EntityKey>>,
}

impl Transaction {
    /// Creates a transaction context that requires current data.
    #[must_use]
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            accepts_outdated: false,
            freshness: None,
            use_cache: AtomicBool::new(true),
            cancelled: AtomicBool::new(false),
            read_locks: Mutex::new(BTreeSet::new()),
        }
    }

    /// Accept outdated copies within the given staleness bound.
    #[must_use]
    pub fn with_freshness(mut self, bound: FreshnessBound) -> Self {
        self.accepts_outdated = true;
        self.freshness = Some(bound);
        self
    }

    /// The transaction scope identifier.
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// Whether reads may be served from outdated placements.
    #[must_use]
    pub const fn accepts_outdated(&self) -> bool {
        self.accepts_outdated
    }

    /// The tolerated-staleness bound, if one was declared.
    #[must_use]
    pub const fn freshness_spec(&self) -> Option<&FreshnessBound> {
        self.freshness.as_ref()
    }

    /// Whether the result cache may serve this query.
    #[must_use]
    pub fn use_cache(&self) -> bool {
        self.use_cache.load(Ordering::Relaxed)
    }

    /// Enable or disable the result cache for this query.
    ///
    /// The router disables it whenever a plan was built from
    /// freshness-tolerant placements.
    pub fn set_use_cache(&self, use_cache: bool) {
        self.use_cache.store(use_cache, Ordering::Relaxed);
    }

    /// Whether the transaction has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cancel the transaction. Routing checks this flag before every
    /// recursive step and returns an empty plan list once set.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Records an entity read lock acquired on behalf of this transaction.
    pub fn register_lock(&self, entity: EntityKey) -> Result<(), RoutingError> {
        let mut locks = self.read_locks.lock().map_err(|_| RoutingError::LockPoisoned)?;
        locks.insert(entity);
        Ok(())
    }

    /// The entity read locks acquired so far.
    pub fn read_locks(&self) -> Result<BTreeSet<EntityKey>, RoutingError> {
        let locks = self.read_locks.lock().map_err(|_| RoutingError::LockPoisoned)?;
        Ok(locks.clone())
    }
}
