//! Staleness metrics and freshness bounds.
//!
//! A replicated placement lags behind its primary by some amount. The lag is
//! recorded as a [`Staleness`] metric on the placement; a transaction that
//! accepts outdated copies carries a [`FreshnessBound`] naming how much lag
//! it tolerates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How far a placement lags behind the primary copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Staleness {
    /// Wall-clock age of the newest replicated change.
    pub age: Duration,
    /// Number of committed versions the placement is behind.
    pub versions_behind: u64,
    /// Number of modified records not yet replicated.
    pub records_behind: u64,
}

impl Staleness {
    /// Create a staleness metric.
    #[must_use]
    pub const fn new(age: Duration, versions_behind: u64, records_behind: u64) -> Self {
        Self { age, versions_behind, records_behind }
    }

    /// The staleness of an up-to-date copy.
    #[must_use]
    pub const fn current() -> Self {
        Self { age: Duration::ZERO, versions_behind: 0, records_behind: 0 }
    }

    /// Whether this staleness is within the tolerated bound.
    ///
    /// Only the dimension named by the bound is compared.
    #[must_use]
    pub fn satisfies(&self, bound: &FreshnessBound) -> bool {
        match bound {
            FreshnessBound::Time(max_age) => self.age <= *max_age,
            FreshnessBound::Versions(max) => self.versions_behind <= *max,
            FreshnessBound::Records(max) => self.records_behind <= *max,
        }
    }

    /// The staleness value in the dimension the bound names, for ordering
    /// placements from freshest to stalest under that bound.
    #[must_use]
    pub fn metric(&self, bound: &FreshnessBound) -> u128 {
        match bound {
            FreshnessBound::Time(_) => self.age.as_millis(),
            FreshnessBound::Versions(_) => u128::from(self.versions_behind),
            FreshnessBound::Records(_) => u128::from(self.records_behind),
        }
    }
}

/// A tolerated-staleness bound carried by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreshnessBound {
    /// Accept placements at most this old.
    Time(Duration),
    /// Accept placements at most this many versions behind.
    Versions(u64),
    /// Accept placements with at most this many unreplicated records.
    Records(u64),
}
