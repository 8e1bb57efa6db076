//! Relational algebra trees.
//!
//! Logical plans describe *what* a query computes against logical tables;
//! physical plans describe *where* the data is read: concrete column
//! placements on concrete partition placements on concrete stores. The
//! router turns the former into candidates of the latter through
//! [`PlanBuilder`]s.

mod builder;
mod logical;
mod physical;

pub use builder::{BuilderState, PlacementDistribution, PlanBuilder, RoutingPlan};
pub use logical::{
    Literal, LogicalPlan, OperatorKind, OperatorNode, ScanNode, SetOpKind, SetOpNode, ValuesNode,
};
pub use physical::{PhysicalPlan, PhysicalScanNode};
