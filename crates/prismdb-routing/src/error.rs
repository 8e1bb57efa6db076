//! Error types for the routing crate.

use thiserror::Error;

use prismdb_catalog::CatalogError;

use crate::locking::LockError;

/// Errors that can occur while routing a read query.
///
/// Exactly three kinds are meaningful to callers: [`Deadlock`] (the
/// transaction layer aborts and may retry), [`Misuse`] (the pipeline handed
/// a non-DQL tree to the DQL router), and the catalog/consistency kinds
/// (fatal; the catalog is assumed consistent). [`InsufficientFreshness`] is
/// internal: the driver always catches it and falls back to the locking
/// path.
///
/// [`Deadlock`]: RoutingError::Deadlock
/// [`Misuse`]: RoutingError::Misuse
/// [`InsufficientFreshness`]: RoutingError::InsufficientFreshness
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No placement combination satisfies the transaction's freshness bound.
    #[error("no placement combination satisfies the freshness bound")]
    InsufficientFreshness,

    /// The lock manager reported a deadlock while acquiring read locks.
    #[error("deadlock while acquiring read locks: {0}")]
    Deadlock(#[from] LockError),

    /// A non-DQL node reached the DQL router.
    #[error("routing misuse: {0}")]
    Misuse(String),

    /// A catalog entity could not be resolved.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The catalog or a plan builder violated an internal invariant.
    #[error("routing inconsistency: {0}")]
    Inconsistency(String),

    /// An internal lock was poisoned (a thread panicked while holding it).
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl RoutingError {
    /// Creates a misuse error.
    #[must_use]
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }

    /// Creates an inconsistency error.
    #[must_use]
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency(message.into())
    }

    /// Returns `true` if this is the internal freshness-fallback signal.
    #[must_use]
    pub const fn is_insufficient_freshness(&self) -> bool {
        matches!(self, Self::InsufficientFreshness)
    }

    /// Returns `true` if the transaction layer should abort and retry.
    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Deadlock(_))
    }
}
