//! Option structs for table construction, GroupBy, Distinct and rolling windows.
//!
//! All of them implement `Default` and take chained builder calls:
//!
//! ```
//! use coltab::config::GroupByConfig;
//!
//! let config = GroupByConfig::new().columns(["a", "b"]).group_by_null(true);
//! assert_eq!(config.columns, vec!["a".to_string(), "b".to_string()]);
//! ```

use std::collections::HashMap;

use crate::error::{Result, TableError};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTableConfig {
    /// Column order of the table. Empty means sorted by name.
    pub column_order: Vec<String>,
    /// String columns to dictionary encode. `Some(values)` fixes a strict dictionary in that
    /// order, `None` builds a dynamic one.
    pub enums: HashMap<String, Option<Vec<String>>>,
}

impl NewTableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_order<S: Into<String>>(mut self, order: impl IntoIterator<Item = S>) -> Self {
        self.column_order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Encodes `column` with a dynamic dictionary.
    pub fn enum_column(mut self, column: impl Into<String>) -> Self {
        self.enums.insert(column.into(), None);
        self
    }

    /// Encodes `column` with a strict dictionary of `values`.
    pub fn strict_enum<S: Into<String>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.enums.insert(
            column.into(),
            Some(values.into_iter().map(Into::into).collect()),
        );
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupByConfig {
    /// Grouping columns. Empty puts every row in one group.
    pub columns: Vec<String>,
    /// Put all nulls of a column in one group instead of one group per null.
    pub group_by_null: bool,
}

impl GroupByConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by_null(mut self, group_by_null: bool) -> Self {
        self.group_by_null = group_by_null;
        self
    }
}

/// How [crate::Table::distinct] finds duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistinctStrategy {
    /// Sort on the columns, then keep each row that differs from the previous one. The
    /// result is in sorted order.
    #[default]
    Sort,
    /// Hash the columns and keep the first row of each group. The result keeps the order of
    /// first appearance.
    Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctConfig {
    /// Columns that decide whether two rows are duplicates. Empty means all columns.
    pub columns: Vec<String>,
    /// Treat nulls as equal to each other.
    pub group_by_null: bool,
    pub strategy: DistinctStrategy,
}

impl DistinctConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by_null(mut self, group_by_null: bool) -> Self {
        self.group_by_null = group_by_null;
        self
    }

    pub fn strategy(mut self, strategy: DistinctStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Where the result of a rolling window is written, relative to the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPosition {
    /// The window starts at the row.
    Start,
    /// The row is the middle of the window, the later of the two middles for even sizes.
    #[default]
    Center,
    /// The window ends at the row.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingConfig {
    pub window_size: usize,
    pub position: WindowPosition,
    /// Written to rows whose window runs past the first or last row.
    pub pad_value: Value,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            window_size: 1,
            position: WindowPosition::default(),
            pad_value: Value::Null,
        }
    }
}

impl RollingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn position(mut self, position: WindowPosition) -> Self {
        self.position = position;
        self
    }

    pub fn pad_value(mut self, pad_value: impl Into<Value>) -> Self {
        self.pad_value = pad_value.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(TableError::InvalidRolling(
                "window size must be positive".into(),
            ));
        }
        Ok(())
    }
}
