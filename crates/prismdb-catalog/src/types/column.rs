//! Column entities.

use serde::{Deserialize, Serialize};

use super::{ColumnId, TableId};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Variable-length character string.
    Varchar,
    /// Timestamp with millisecond precision.
    Timestamp,
    /// Raw binary data.
    Binary,
}

/// A logical column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// The column identifier.
    pub id: ColumnId,
    /// The table this column belongs to.
    pub table: TableId,
    /// The column name.
    pub name: String,
    /// The declared type.
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column.
    #[must_use]
    pub fn new(
        id: ColumnId,
        table: TableId,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self { id, table, name: name.into(), column_type }
    }
}
