//! Logical plan nodes.
//!
//! The router only distinguishes scans, inline values, set operations, and
//! the two node kinds it must reject (table modifications and conditional
//! executes). Every other operator is opaque: the router re-applies it over
//! routed inputs without looking inside.

use std::fmt;

use prismdb_catalog::{ScanId, TableId};

/// A scan of a logical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanNode {
    /// The identity of this scan node within the query.
    pub id: ScanId,
    /// The scanned table.
    pub table: TableId,
}

impl ScanNode {
    /// Creates a new scan node.
    #[must_use]
    pub const fn new(id: ScanId, table: TableId) -> Self {
        Self { id, table }
    }
}

/// A literal value inside a `VALUES` node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// SQL NULL.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

/// Inline row data (VALUES clause).
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesNode {
    /// The rows of values.
    pub rows: Vec<Vec<Literal>>,
    /// Optional column names.
    pub columns: Option<Vec<String>>,
}

impl ValuesNode {
    /// Creates a new values node.
    #[must_use]
    pub const fn new(rows: Vec<Vec<Literal>>) -> Self {
        Self { rows, columns: None }
    }

    /// Sets column names for the values.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// The kind of a set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    /// UNION.
    Union,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        };
        write!(f, "{name}")
    }
}

/// A set operation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOpNode {
    /// The kind of set operation.
    pub kind: SetOpKind,
}

impl SetOpNode {
    /// Creates a new set operation node.
    #[must_use]
    pub const fn new(kind: SetOpKind) -> Self {
        Self { kind }
    }
}

/// The kind of an opaque operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Row selection.
    Filter,
    /// Column projection or computation.
    Project,
    /// Grouping and aggregation.
    Aggregate,
    /// Ordering.
    Sort,
    /// Limit/offset.
    Limit,
    /// Duplicate elimination.
    Distinct,
    /// A join of two inputs.
    Join,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Filter => "Filter",
            Self::Project => "Project",
            Self::Aggregate => "Aggregate",
            Self::Sort => "Sort",
            Self::Limit => "Limit",
            Self::Distinct => "Distinct",
            Self::Join => "Join",
        };
        write!(f, "{name}")
    }
}

/// An operator the router treats structurally.
///
/// The router never interprets `detail`; it is carried through to the
/// physical plan verbatim (an expression rendering, a join condition, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorNode {
    /// The operator kind.
    pub kind: OperatorKind,
    /// Opaque payload describing the operator.
    pub detail: Option<String>,
}

impl OperatorNode {
    /// Creates an operator node.
    #[must_use]
    pub fn new(kind: OperatorKind, detail: Option<String>) -> Self {
        Self { kind, detail }
    }

    /// Creates a filter node with a predicate rendering.
    #[must_use]
    pub fn filter(predicate: impl Into<String>) -> Self {
        Self::new(OperatorKind::Filter, Some(predicate.into()))
    }

    /// Creates a projection node with an expression rendering.
    #[must_use]
    pub fn project(exprs: impl Into<String>) -> Self {
        Self::new(OperatorKind::Project, Some(exprs.into()))
    }

    /// Creates a join node with a condition rendering.
    #[must_use]
    pub fn join(condition: impl Into<String>) -> Self {
        Self::new(OperatorKind::Join, Some(condition.into()))
    }
}

impl fmt::Display for OperatorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}[{}]", self.kind, detail),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A logical query plan.
///
/// A tree where each node is an operation and children are its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// A table scan (leaf).
    Scan(ScanNode),

    /// Inline values (leaf).
    Values(ValuesNode),

    /// A set operation over exactly two inputs.
    SetOp {
        /// The set operation.
        node: SetOpNode,
        /// The left input.
        left: Box<LogicalPlan>,
        /// The right input.
        right: Box<LogicalPlan>,
    },

    /// Any operator the router treats structurally.
    Operator {
        /// The operator.
        node: OperatorNode,
        /// The input plans.
        inputs: Vec<LogicalPlan>,
    },

    /// A table modification. Never routable here; the DQL router rejects it.
    Modify {
        /// The modified table.
        table: TableId,
        /// The input plan.
        input: Box<LogicalPlan>,
    },

    /// A conditional execute. Never routable here; the DQL router rejects it.
    ConditionalExecute {
        /// The condition plan.
        condition: Box<LogicalPlan>,
        /// The plan executed when the condition holds.
        body: Box<LogicalPlan>,
    },
}

impl LogicalPlan {
    /// Creates a scan node.
    #[must_use]
    pub const fn scan(id: ScanId, table: TableId) -> Self {
        Self::Scan(ScanNode::new(id, table))
    }

    /// Creates a values node.
    #[must_use]
    pub const fn values(node: ValuesNode) -> Self {
        Self::Values(node)
    }

    /// Creates a set operation over two inputs.
    #[must_use]
    pub fn set_op(kind: SetOpKind, left: Self, right: Self) -> Self {
        Self::SetOp { node: SetOpNode::new(kind), left: Box::new(left), right: Box::new(right) }
    }

    /// Creates a union of two inputs.
    #[must_use]
    pub fn union(left: Self, right: Self) -> Self {
        Self::set_op(SetOpKind::Union, left, right)
    }

    /// Wraps inputs in an opaque operator.
    #[must_use]
    pub fn operator(node: OperatorNode, inputs: Vec<Self>) -> Self {
        Self::Operator { node, inputs }
    }

    /// Wraps an input in a filter.
    #[must_use]
    pub fn filter(predicate: impl Into<String>, input: Self) -> Self {
        Self::operator(OperatorNode::filter(predicate), vec![input])
    }

    /// Wraps an input in a projection.
    #[must_use]
    pub fn project(exprs: impl Into<String>, input: Self) -> Self {
        Self::operator(OperatorNode::project(exprs), vec![input])
    }

    /// The direct inputs of this node.
    #[must_use]
    pub fn inputs(&self) -> Vec<&Self> {
        match self {
            Self::Scan(_) | Self::Values(_) => Vec::new(),
            Self::SetOp { left, right, .. } => vec![left, right],
            Self::Operator { inputs, .. } => inputs.iter().collect(),
            Self::Modify { input, .. } => vec![input],
            Self::ConditionalExecute { condition, body } => vec![condition, body],
        }
    }
}
