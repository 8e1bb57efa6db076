//! The DQL router driver.
//!
//! Walks a logical algebra tree post-order and rewrites every scan into
//! physical placement scans, carrying a list of in-flight plan builders.
//! Scans go through the freshness path when the transaction tolerates
//! staleness, through lock acquisition and a placement strategy otherwise.
//! Set operations fork a fresh builder for their right side and splice the
//! first right-side build under a copy of the set-op node.
//!
//! The driver participates in universal routing: returning an empty list
//! means "this router declines this query", not failure.

use prismdb_catalog::{Catalog, Table};
use tracing::debug;

use crate::algebra::{LogicalPlan, PhysicalPlan, PlanBuilder, ScanNode, SetOpNode};
use crate::cache::JoinedScanCache;
use crate::error::RoutingError;
use crate::freshness::FreshnessResolver;
use crate::information::QueryInformation;
use crate::locking::{acquire_read_locks, LockManager};
use crate::strategy::{extend_builders, PlacementStrategy, RoutingContext, StrategyOutcome};
use crate::transaction::Transaction;

/// Routes read queries against a catalog snapshot.
pub struct DqlRouter<'a, S> {
    catalog: &'a Catalog,
    cache: &'a JoinedScanCache,
    locks: &'a dyn LockManager,
    strategy: S,
}

impl<'a, S: PlacementStrategy> DqlRouter<'a, S> {
    /// Creates a router over its injected dependencies.
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        cache: &'a JoinedScanCache,
        locks: &'a dyn LockManager,
        strategy: S,
    ) -> Self {
        Self { catalog, cache, locks, strategy }
    }

    /// Drops the joined-scan cache. Called by the environment after a DDL
    /// may have changed placements.
    pub fn invalidate_caches(&self) {
        self.cache.invalidate_all();
    }

    /// Routes a logical tree into candidate plan builders.
    ///
    /// Returns builders in the order the strategy proposed them; an empty
    /// list means this router declines the query. Only DQL trees are
    /// accepted: a modify or conditional-execute node is a fatal
    /// [`RoutingError::Misuse`].
    pub fn route(
        &self,
        root: &LogicalPlan,
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        match root {
            LogicalPlan::Modify { .. } | LogicalPlan::ConditionalExecute { .. } => {
                Err(Self::misuse(root))
            }
            _ => {
                debug!(tx = %tx.id(), "routing DQL query");
                self.build_dql(root, vec![PlanBuilder::new()], tx, info)
            }
        }
    }

    fn misuse(node: &LogicalPlan) -> RoutingError {
        let kind = match node {
            LogicalPlan::Modify { .. } => "a table modification",
            LogicalPlan::ConditionalExecute { .. } => "a conditional execute",
            _ => "an unroutable node",
        };
        RoutingError::misuse(format!("{kind} reached the DQL router"))
    }

    fn build_dql(
        &self,
        node: &LogicalPlan,
        builders: Vec<PlanBuilder>,
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        if tx.is_cancelled() {
            debug!(tx = %tx.id(), "routing cancelled");
            return Ok(Vec::new());
        }

        match node {
            LogicalPlan::SetOp { node: set_op, left, right } => {
                self.build_set_op(*set_op, left, right, builders, tx, info)
            }
            _ => self.build_select(node, builders, tx, info),
        }
    }

    fn build_select(
        &self,
        node: &LogicalPlan,
        mut builders: Vec<PlanBuilder>,
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        match node {
            LogicalPlan::Scan(scan) => self.route_scan(scan, builders, tx, info),

            LogicalPlan::Values(values) => {
                for builder in &mut builders {
                    builder.push(PhysicalPlan::Values(values.clone()));
                }
                Ok(builders)
            }

            LogicalPlan::Operator { node: operator, inputs } => {
                for input in inputs {
                    builders = self.build_dql(input, builders, tx, info)?;
                    if builders.is_empty() {
                        return Ok(builders);
                    }
                }
                for builder in &mut builders {
                    builder.apply_operator(operator.clone(), inputs.len())?;
                }
                Ok(builders)
            }

            // Handled by build_dql; kept for exhaustiveness.
            LogicalPlan::SetOp { node: set_op, left, right } => {
                self.build_set_op(*set_op, left, right, builders, tx, info)
            }

            LogicalPlan::Modify { .. } | LogicalPlan::ConditionalExecute { .. } => {
                Err(Self::misuse(node))
            }
        }
    }

    fn build_set_op(
        &self,
        set_op: SetOpNode,
        left: &LogicalPlan,
        right: &LogicalPlan,
        builders: Vec<PlanBuilder>,
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        if tx.is_cancelled() {
            return Ok(Vec::new());
        }

        let mut builders = self.build_dql(left, builders, tx, info)?;
        if builders.is_empty() {
            return Ok(builders);
        }

        // The right side is built once against a fresh builder; only its
        // first build is used, never a cross product with the left side.
        let right_builders = self.build_dql(right, vec![PlanBuilder::new()], tx, info)?;
        let Some(right_builder) = right_builders.into_iter().next() else {
            return Ok(Vec::new());
        };
        let (right_tree, right_placements) = right_builder.build()?;

        for builder in &mut builders {
            builder.merge_placements(right_placements.clone());
            builder.replace_top_with(|top| PhysicalPlan::SetOp {
                node: set_op,
                left: Box::new(top),
                right: Box::new(right_tree.clone()),
            })?;
        }
        Ok(builders)
    }

    fn route_scan(
        &self,
        scan: &ScanNode,
        builders: Vec<PlanBuilder>,
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        let table = self.catalog.table(scan.table)?;
        let partitions = info.partitions_accessed_or_all(scan.id, table);

        if tx.accepts_outdated() && table.supports_outdated {
            match self.route_scan_tolerant(scan, table, &builders, tx, info) {
                Ok(routed) => {
                    // Freshness-tolerant results must never come from or
                    // land in the result cache.
                    tx.set_use_cache(false);
                    return Ok(routed);
                }
                Err(err) if err.is_insufficient_freshness() => {
                    debug!(
                        table = %table.name,
                        "freshness bound unsatisfiable, continuing with locked routing"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        acquire_read_locks(self.locks, tx, table, &partitions)?;

        let ctx = RoutingContext { catalog: self.catalog, cache: self.cache, transaction: tx };
        let outcome = if table.partition_property.is_horizontal() {
            self.strategy.handle_horizontal(&ctx, scan, table, builders, info)
        } else if table.data_placements.len() > 1 {
            self.strategy.handle_vertical_or_replicated(&ctx, scan, table, builders, info)
        } else {
            self.strategy.handle_none(&ctx, scan, table, builders, info)
        }?;

        match outcome {
            StrategyOutcome::Plans(routed) => Ok(routed),
            StrategyOutcome::Decline => {
                debug!(table = %table.name, "strategy declined, aborting this router");
                Ok(Vec::new())
            }
        }
    }

    fn route_scan_tolerant(
        &self,
        scan: &ScanNode,
        table: &Table,
        builders: &[PlanBuilder],
        tx: &Transaction,
        info: &QueryInformation,
    ) -> Result<Vec<PlanBuilder>, RoutingError> {
        let bound = tx.freshness_spec().ok_or(RoutingError::InsufficientFreshness)?;
        let partitions = info.partitions_accessed_or_all(scan.id, table);
        let columns = info.columns_used_or_all(table);

        let resolver = FreshnessResolver::new(self.catalog);
        let candidates = resolver.candidate_partition_placements(table, &partitions, bound)?;
        let distributions = resolver.candidate_column_distributions(&candidates, table, &columns)?;

        let ctx = RoutingContext { catalog: self.catalog, cache: self.cache, transaction: tx };
        extend_builders(&ctx, scan, table, builders, &distributions)
    }
}
