//! Physical plan nodes.
//!
//! A physical plan reads concrete placements: each scan names the store, the
//! partition placement, and the ordered column placements it reads. Pieces
//! of a logical table that live on different stores are reassembled with
//! row-identifier joins (vertical splits) and unions in partition-id order
//! (horizontal splits).

use std::fmt;
use std::fmt::Write as _;

use prismdb_catalog::{ColumnId, PartitionId, StoreId, TableId};

use super::logical::{OperatorNode, SetOpNode, ValuesNode};

/// A scan of column placements on one partition placement of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalScanNode {
    /// The logical table being read.
    pub table: TableId,
    /// The partition whose placement is read.
    pub partition: PartitionId,
    /// The store holding the placement.
    pub store: StoreId,
    /// The columns read, in placement-list order.
    pub columns: Vec<ColumnId>,
}

impl PhysicalScanNode {
    /// Creates a new physical scan node.
    #[must_use]
    pub const fn new(
        table: TableId,
        partition: PartitionId,
        store: StoreId,
        columns: Vec<ColumnId>,
    ) -> Self {
        Self { table, partition, store, columns }
    }
}

impl fmt::Display for PhysicalScanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan[table={} partition={} store={} columns=[{}]]",
            self.table,
            self.partition,
            self.store,
            self.columns.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        )
    }
}

/// A physical query plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    /// A placement scan (leaf).
    Scan(PhysicalScanNode),

    /// A join of two placement subtrees on the partition's implicit row
    /// identifier. Reassembles vertically split data.
    RowIdJoin {
        /// The left input.
        left: Box<PhysicalPlan>,
        /// The right input.
        right: Box<PhysicalPlan>,
    },

    /// A union of per-partition subtrees, in partition-id order.
    Union {
        /// The input plans.
        inputs: Vec<PhysicalPlan>,
    },

    /// Inline values (leaf).
    Values(ValuesNode),

    /// A set operation preserved from the logical plan.
    SetOp {
        /// The set operation.
        node: SetOpNode,
        /// The left input.
        left: Box<PhysicalPlan>,
        /// The right input.
        right: Box<PhysicalPlan>,
    },

    /// An opaque operator re-applied over routed inputs.
    Operator {
        /// The operator.
        node: OperatorNode,
        /// The input plans.
        inputs: Vec<PhysicalPlan>,
    },
}

impl PhysicalPlan {
    /// All placement scans in this plan, depth first.
    #[must_use]
    pub fn scans(&self) -> Vec<&PhysicalScanNode> {
        let mut out = Vec::new();
        self.collect_scans(&mut out);
        out
    }

    fn collect_scans<'a>(&'a self, out: &mut Vec<&'a PhysicalScanNode>) {
        match self {
            Self::Scan(scan) => out.push(scan),
            Self::RowIdJoin { left, right } | Self::SetOp { left, right, .. } => {
                left.collect_scans(out);
                right.collect_scans(out);
            }
            Self::Union { inputs } | Self::Operator { inputs, .. } => {
                for input in inputs {
                    input.collect_scans(out);
                }
            }
            Self::Values(_) => {}
        }
    }

    /// Renders the plan as an indented tree.
    #[must_use]
    pub fn display_tree(&self) -> String {
        let mut out = String::new();
        self.fmt_tree(&mut out, 0);
        out
    }

    fn fmt_tree(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match self {
            Self::Scan(scan) => {
                let _ = writeln!(out, "{scan}");
            }
            Self::RowIdJoin { left, right } => {
                out.push_str("RowIdJoin\n");
                left.fmt_tree(out, depth + 1);
                right.fmt_tree(out, depth + 1);
            }
            Self::Union { inputs } => {
                out.push_str("Union\n");
                for input in inputs {
                    input.fmt_tree(out, depth + 1);
                }
            }
            Self::Values(values) => {
                let _ = writeln!(out, "Values[{} rows]", values.rows.len());
            }
            Self::SetOp { node, left, right } => {
                let _ = writeln!(out, "{}", node.kind);
                left.fmt_tree(out, depth + 1);
                right.fmt_tree(out, depth + 1);
            }
            Self::Operator { node, inputs } => {
                let _ = writeln!(out, "{node}");
                for input in inputs {
                    input.fmt_tree(out, depth + 1);
                }
            }
        }
    }
}
