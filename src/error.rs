//! Error type shared by every table operation.
//!
//! Errors are values: a [`crate::Table`] that carries one hands it back unchanged from every
//! chained operation, so the variants are `Clone` and comparable.

use thiserror::Error;

use crate::data_type::DataType;
use crate::predicate::Operator;

/// Result type alias using [`TableError`].
pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    // --- Construction ---
    #[error("column name must not be empty")]
    EmptyColumnName,

    #[error("column name must not be quoted: {0}")]
    QuotedColumnName(String),

    #[error("column name must not start with $: {0}")]
    ReservedColumnName(String),

    #[error("duplicate column: {0:?}")]
    DuplicateColumn(String),

    #[error("column {column:?} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("number of columns ({columns}) and column order length ({order}) do not match")]
    ColumnOrderMismatch { order: usize, columns: usize },

    #[error("column {0:?} in column order does not exist")]
    UnknownOrderColumn(String),

    #[error("unknown enum columns: {0:?}")]
    UnknownEnumColumns(Vec<String>),

    #[error("enum setting given for non string column {0:?}")]
    EnumSpecOnNonString(String),

    #[error("enum max cardinality ({max}) exceeded")]
    EnumCardinalityExceeded { max: usize },

    #[error("unknown enum value {0:?} using strict enum")]
    UnknownEnumValue(String),

    #[error("string data of {len} bytes does not fit a string column")]
    StringTooLarge { len: usize },

    // --- Operations ---
    #[error("unknown column: {0:?}")]
    UnknownColumn(String),

    #[error("filter column {column:?}: {source}")]
    Filter {
        column: String,
        source: Box<TableError>,
    },

    #[error("unknown filter operator {0:?}")]
    UnknownOperator(String),

    #[error("operator {operator} is not supported for {data_type} columns")]
    InvalidOperator {
        operator: Operator,
        data_type: DataType,
    },

    #[error("predicate {predicate} cannot be applied to {data_type} column")]
    InvalidPredicate {
        predicate: String,
        data_type: DataType,
    },

    #[error("invalid argument {argument} for operator {operator} on {data_type} column")]
    InvalidArgument {
        operator: Operator,
        data_type: DataType,
        argument: String,
    },

    #[error("NaN is not a valid filter argument, use isnull/isnotnull")]
    NanArgument,

    #[error("invalid like pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("incompatible columns: {0}")]
    IncompatibleColumns(String),

    #[error("{0} clause needs at least one sub clause")]
    EmptyClause(&'static str),

    #[error("cannot aggregate on column that is part of group by: {0:?}")]
    AggregateOnGroupColumn(String),

    #[error("column {0:?} is already an aggregate")]
    DuplicateAggregate(String),

    #[error("aggregation {name:?} with {arity} argument(s) is not defined for {data_type} columns")]
    UnknownAggregation {
        name: String,
        data_type: DataType,
        arity: usize,
    },

    #[error("invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("invalid slice [{start}, {end}) of table with {len} rows")]
    InvalidSlice { start: usize, end: usize, len: usize },

    #[error("column {column:?} is a {actual} column, not {expected}")]
    ColumnType {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("apply: {0}")]
    Apply(String),

    #[error("invalid rolling window: {0}")]
    InvalidRolling(String),

    #[error("cannot append tables: {0}")]
    IncompatibleTables(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TableError {
    /// Attaches the name of the column a filter failed on.
    pub(crate) fn in_filter(self, column: &str) -> Self {
        Self::Filter {
            column: column.to_string(),
            source: Box::new(self),
        }
    }
}
