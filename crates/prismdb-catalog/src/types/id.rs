//! Identifier newtypes for catalog entities.
//!
//! All catalog entities are referenced by stable 64-bit identifiers. Each
//! identifier kind gets its own newtype so a table id can never be passed
//! where a partition id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
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

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id! {
    /// Identifier of a logical table.
    TableId
}

define_id! {
    /// Identifier of a logical column.
    ColumnId
}

define_id! {
    /// Identifier of a horizontal partition.
    PartitionId
}

define_id! {
    /// Identifier of a physical data store (adapter instance).
    StoreId
}

define_id! {
    /// Identifier of a scan node in a logical query plan.
    ///
    /// Scan ids tie per-query access information (which partitions a scan
    /// touches) to the plan node that performs the access.
    ScanId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let id = TableId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id, TableId::from(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn ids_are_ordered() {
        assert!(PartitionId::new(1) < PartitionId::new(2));
        assert!(StoreId::new(7) > StoreId::new(3));
    }
}
