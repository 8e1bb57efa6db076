//! Routed plan builders.
//!
//! A [`PlanBuilder`] is the mutable handle the router threads through its
//! traversal: a stack of physical subtrees plus a record of which placements
//! each logical scan was routed to. Builders are forkable so placement
//! alternatives can be explored, and are frozen into [`RoutingPlan`]s when
//! the traversal completes.
//!
//! A builder moves `OPEN → EXTENDED* → FROZEN`: it starts empty, is extended
//! by every push or top rewrite, and freezing consumes it. `FROZEN` is
//! terminal and is represented by the [`RoutingPlan`] type itself.

use std::collections::BTreeMap;

use prismdb_catalog::{ColumnPlacement, PartitionId, ScanId};

use super::logical::OperatorNode;
use super::physical::PhysicalPlan;
use crate::error::RoutingError;

/// A placement distribution: for each required partition, the ordered list
/// of column placements used to read it. List order is significant.
pub type PlacementDistribution = BTreeMap<PartitionId, Vec<ColumnPlacement>>;

/// The observable state of a plan builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing has been routed into the builder yet.
    Open,
    /// At least one subtree has been pushed or rewritten.
    Extended,
}

/// A partially built physical plan.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    /// Stack of physical subtrees; siblings await their parent operator.
    stack: Vec<PhysicalPlan>,
    /// Which placements each logical scan was routed to.
    placements: BTreeMap<ScanId, PlacementDistribution>,
    state: BuilderState,
}

impl PlanBuilder {
    /// Creates an open builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stack: Vec::new(), placements: BTreeMap::new(), state: BuilderState::Open }
    }

    /// The builder's current state.
    #[must_use]
    pub const fn state(&self) -> BuilderState {
        self.state
    }

    /// Deep structural clone for exploring an alternative.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Pushes a routed subtree.
    pub fn push(&mut self, subtree: PhysicalPlan) {
        self.stack.push(subtree);
        self.state = BuilderState::Extended;
    }

    /// The subtree routing would combine next, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&PhysicalPlan> {
        self.stack.last()
    }

    /// Rewrites the top subtree in place.
    ///
    /// Used by set operations to splice an already-built right side under a
    /// copied set-op node.
    pub fn replace_top_with(
        &mut self,
        rewrite: impl FnOnce(PhysicalPlan) -> PhysicalPlan,
    ) -> Result<(), RoutingError> {
        let top = self
            .stack
            .pop()
            .ok_or_else(|| RoutingError::inconsistency("replace_top on an empty plan builder"))?;
        self.stack.push(rewrite(top));
        self.state = BuilderState::Extended;
        Ok(())
    }

    /// Re-applies an opaque operator over its already-routed inputs.
    ///
    /// Pops `arity` subtrees (the operator's inputs, routed left to right)
    /// and pushes the operator node over them.
    pub fn apply_operator(
        &mut self,
        node: OperatorNode,
        arity: usize,
    ) -> Result<(), RoutingError> {
        if self.stack.len() < arity {
            return Err(RoutingError::inconsistency(format!(
                "operator {node} needs {arity} routed inputs, builder holds {}",
                self.stack.len()
            )));
        }
        let inputs = self.stack.split_off(self.stack.len() - arity);
        self.stack.push(PhysicalPlan::Operator { node, inputs });
        self.state = BuilderState::Extended;
        Ok(())
    }

    /// Records which placements a logical scan was routed to.
    pub fn record_placements(&mut self, scan: ScanId, distribution: PlacementDistribution) {
        self.placements.insert(scan, distribution);
    }

    /// Merges another builder's placement record into this one.
    pub fn merge_placements(&mut self, other: BTreeMap<ScanId, PlacementDistribution>) {
        self.placements.extend(other);
    }

    /// The placement record built so far.
    #[must_use]
    pub const fn placements(&self) -> &BTreeMap<ScanId, PlacementDistribution> {
        &self.placements
    }

    /// Consumes the builder, returning its single subtree and its placement
    /// record. Fails unless exactly one tree has been built.
    pub fn build(
        mut self,
    ) -> Result<(PhysicalPlan, BTreeMap<ScanId, PlacementDistribution>), RoutingError> {
        if self.stack.len() != 1 {
            return Err(RoutingError::inconsistency(format!(
                "plan builder holds {} subtrees, expected exactly one",
                self.stack.len()
            )));
        }
        let root = self.stack.remove(0);
        Ok((root, self.placements))
    }

    /// Freezes the builder into a completed routing plan.
    pub fn freeze(self) -> Result<RoutingPlan, RoutingError> {
        let (root, placements) = self.build()?;
        Ok(RoutingPlan { root, placements })
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A completed routing plan: a physical algebra tree plus the placement
/// annotations routing chose for each logical scan.
#[derive(Debug, Clone)]
pub struct RoutingPlan {
    root: PhysicalPlan,
    placements: BTreeMap<ScanId, PlacementDistribution>,
}

impl RoutingPlan {
    /// The physical algebra tree.
    #[must_use]
    pub const fn root(&self) -> &PhysicalPlan {
        &self.root
    }

    /// The placement record per logical scan.
    #[must_use]
    pub const fn placements(&self) -> &BTreeMap<ScanId, PlacementDistribution> {
        &self.placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::logical::{OperatorKind, ValuesNode};
    use crate::algebra::physical::PhysicalScanNode;
    use prismdb_catalog::{ColumnId, StoreId, TableId};

    fn scan() -> PhysicalPlan {
        PhysicalPlan::Scan(PhysicalScanNode::new(
            TableId::new(1),
            PartitionId::new(1),
            StoreId::new(1),
            vec![ColumnId::new(10)],
        ))
    }

    #[test]
    fn state_machine() {
        let mut builder = PlanBuilder::new();
        assert_eq!(builder.state(), BuilderState::Open);

        builder.push(scan());
        assert_eq!(builder.state(), BuilderState::Extended);

        let plan = builder.freeze().unwrap();
        assert!(matches!(plan.root(), PhysicalPlan::Scan(_)));
    }

    #[test]
    fn freeze_requires_exactly_one_tree() {
        let builder = PlanBuilder::new();
        assert!(builder.freeze().is_err());

        let mut two = PlanBuilder::new();
        two.push(scan());
        two.push(scan());
        assert!(two.freeze().is_err());
    }

    #[test]
    fn apply_operator_pops_inputs_in_order() {
        let mut builder = PlanBuilder::new();
        builder.push(scan());
        builder.push(PhysicalPlan::Values(ValuesNode::new(vec![])));

        builder.apply_operator(OperatorNode::join("l.id = r.id"), 2).unwrap();

        let (root, _) = builder.build().unwrap();
        match root {
            PhysicalPlan::Operator { node, inputs } => {
                assert_eq!(node.kind, OperatorKind::Join);
                assert_eq!(inputs.len(), 2);
                assert!(matches!(inputs[0], PhysicalPlan::Scan(_)));
                assert!(matches!(inputs[1], PhysicalPlan::Values(_)));
            }
            other => panic!("expected operator root, got {other:?}"),
        }
    }

    #[test]
    fn apply_operator_underflow_is_an_error() {
        let mut builder = PlanBuilder::new();
        builder.push(scan());
        assert!(builder.apply_operator(OperatorNode::join("x"), 2).is_err());
    }

    #[test]
    fn replace_top_rewrites_in_place() {
        let mut builder = PlanBuilder::new();
        builder.push(scan());
        builder
            .replace_top_with(|top| PhysicalPlan::Union { inputs: vec![top] })
            .unwrap();
        assert!(matches!(builder.peek(), Some(PhysicalPlan::Union { .. })));

        let mut empty = PlanBuilder::new();
        assert!(empty.replace_top_with(|top| top).is_err());
    }

    #[test]
    fn fork_is_independent() {
        let mut builder = PlanBuilder::new();
        builder.push(scan());

        let mut forked = builder.fork();
        forked.push(scan());

        // The original still holds a single tree; the fork holds two.
        assert!(builder.build().is_ok());
        assert!(forked.build().is_err());
    }
}
