//! `Table`: named, equal-length columns and the row index that selects and orders their rows.
//!
//! Tables never change. Every operation returns a new table that shares the column storage of
//! its input and carries a new index, or new columns for GroupBy aggregates and applies. A
//! table that failed carries its error instead, and every later operation passes the error on.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::aggregation::ReduceFn;
use crate::apply::{Instruction, MapFn, ZipFn, concat_columns, map_positions, overlay, place_values};
use crate::clause::Clause;
use crate::column::{
    BoolColumn, Column, ColumnRef, Comparable, CompareResult, EnumColumn, FloatColumn, IntColumn,
    StringColumn, TextSource, downcast,
};
use crate::config::{
    DistinctConfig, DistinctStrategy, GroupByConfig, NewTableConfig, RollingConfig,
};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::grouped::Grouped;
use crate::grouper;
use crate::index::RowIndex;
use crate::rolling;
use crate::sorter::{Order, Sorter};
use crate::value::Value;
use crate::view::{BoolView, ColumnView, FloatView, IntView, StringView};

const MAX_PRINT_ROWS: usize = 50;
const MIN_PRINT_WIDTH: usize = 5;

/// Raw data for one column of a new table.
#[derive(Debug, Clone)]
pub enum ColumnData {
    Int(Vec<i64>),
    /// `NaN` is null.
    Float(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
    NullableString(Vec<Option<String>>),
    Enum(EnumColumn),
    ConstInt { value: i64, count: usize },
    ConstFloat { value: f64, count: usize },
    ConstBool { value: bool, count: usize },
    ConstString { value: Option<String>, count: usize },
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
            Self::NullableString(v) => v.len(),
            Self::Enum(c) => c.len(),
            Self::ConstInt { count, .. }
            | Self::ConstFloat { count, .. }
            | Self::ConstBool { count, .. }
            | Self::ConstString { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the column. `enum_setting` is the dictionary setting of a string column that should
    /// be dictionary encoded.
    fn into_column(self, name: &str, enum_setting: Option<Option<Vec<String>>>) -> Result<ColumnRef> {
        if let Some(dictionary) = enum_setting {
            let column = match self {
                Self::String(v) => EnumColumn::new(v, dictionary)?,
                Self::NullableString(v) => EnumColumn::from_options(v, dictionary)?,
                Self::ConstString { value, count } => {
                    EnumColumn::constant(value.as_deref(), count, dictionary)?
                }
                Self::Enum(c) => c,
                _ => return Err(TableError::EnumSpecOnNonString(name.to_string())),
            };
            return Ok(Arc::new(column));
        }

        let column: ColumnRef = match self {
            Self::Int(v) => Arc::new(IntColumn::new(v)),
            Self::Float(v) => Arc::new(FloatColumn::new(v)),
            Self::Bool(v) => Arc::new(BoolColumn::new(v)),
            Self::String(v) => Arc::new(StringColumn::new(v)?),
            Self::NullableString(v) => Arc::new(StringColumn::from_options(v)?),
            Self::Enum(c) => Arc::new(c),
            Self::ConstInt { value, count } => Arc::new(IntColumn::constant(value, count)),
            Self::ConstFloat { value, count } => Arc::new(FloatColumn::constant(value, count)),
            Self::ConstBool { value, count } => Arc::new(BoolColumn::constant(value, count)),
            Self::ConstString { value, count } => {
                Arc::new(StringColumn::constant(value.as_deref(), count)?)
            }
        };
        Ok(column)
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        Self::String(v)
    }
}

impl From<Vec<&str>> for ColumnData {
    fn from(v: Vec<&str>) -> Self {
        Self::String(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<Option<String>>> for ColumnData {
    fn from(v: Vec<Option<String>>) -> Self {
        Self::NullableString(v)
    }
}

impl From<Vec<Option<&str>>> for ColumnData {
    fn from(v: Vec<Option<&str>>) -> Self {
        Self::NullableString(v.into_iter().map(|s| s.map(str::to_string)).collect())
    }
}

impl From<EnumColumn> for ColumnData {
    fn from(c: EnumColumn) -> Self {
        Self::Enum(c)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NamedColumn {
    pub name: String,
    pub column: ColumnRef,
}

impl NamedColumn {
    pub fn new(name: impl Into<String>, column: ColumnRef) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }
}

/// Rejects empty, quoted and `$`-prefixed column names.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TableError::EmptyColumnName);
    }
    let quoted = name.len() >= 2
        && ((name.starts_with('"') && name.ends_with('"'))
            || (name.starts_with('\'') && name.ends_with('\'')));
    if quoted {
        return Err(TableError::QuotedColumnName(name.to_string()));
    }
    if name.starts_with('$') {
        return Err(TableError::ReservedColumnName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<NamedColumn>,
    index: Arc<RowIndex>,
    err: Option<TableError>,
}

impl Table {
    /// Builds a table from named column data.
    ///
    /// Columns are ordered by `config.column_order`, or by name when it is empty. String
    /// columns named in `config.enums` are dictionary encoded. A failure is carried by the
    /// returned table, see [Table::err].
    pub fn new(data: HashMap<String, ColumnData>, config: NewTableConfig) -> Self {
        Self::try_new(data, config).unwrap_or_else(Self::with_err)
    }

    /// Builds a table keeping the column order of `columns`.
    pub fn from_columns<S: Into<String>>(columns: impl IntoIterator<Item = (S, ColumnData)>) -> Self {
        let entries = columns
            .into_iter()
            .map(|(name, data)| (name.into(), data))
            .collect();
        Self::assemble(entries, HashMap::new()).unwrap_or_else(Self::with_err)
    }

    fn try_new(mut data: HashMap<String, ColumnData>, config: NewTableConfig) -> Result<Self> {
        for name in data.keys() {
            check_name(name)?;
        }

        let order = if config.column_order.is_empty() {
            let mut names: Vec<String> = data.keys().cloned().collect();
            names.sort();
            names
        } else {
            config.column_order
        };
        if order.len() != data.len() {
            return Err(TableError::ColumnOrderMismatch {
                order: order.len(),
                columns: data.len(),
            });
        }

        let mut entries = Vec::with_capacity(order.len());
        for name in order {
            let Some(column) = data.remove(&name) else {
                if entries.iter().any(|(n, _)| *n == name) {
                    return Err(TableError::DuplicateColumn(name));
                }
                return Err(TableError::UnknownOrderColumn(name));
            };
            entries.push((name, column));
        }
        Self::assemble(entries, config.enums)
    }

    fn assemble(
        entries: Vec<(String, ColumnData)>,
        mut enums: HashMap<String, Option<Vec<String>>>,
    ) -> Result<Self> {
        let mut unknown: Vec<String> = enums
            .keys()
            .filter(|name| !entries.iter().any(|(n, _)| n == *name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(TableError::UnknownEnumColumns(unknown));
        }

        let rows = entries.first().map_or(0, |(_, data)| data.len());
        let mut columns: Vec<NamedColumn> = Vec::with_capacity(entries.len());
        for (name, data) in entries {
            check_name(&name)?;
            if columns.iter().any(|c| c.name == name) {
                return Err(TableError::DuplicateColumn(name));
            }
            if data.len() != rows {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: rows,
                    actual: data.len(),
                });
            }
            let enum_setting = enums.remove(&name);
            let column = data.into_column(&name, enum_setting)?;
            columns.push(NamedColumn { name, column });
        }

        debug!(columns = columns.len(), rows, "new table");
        Ok(Self::assembled(columns, RowIndex::ascending(rows)))
    }

    pub(crate) fn assembled(columns: Vec<NamedColumn>, index: RowIndex) -> Self {
        Self {
            columns,
            index: Arc::new(index),
            err: None,
        }
    }

    pub(crate) fn with_err(err: TableError) -> Self {
        Self {
            columns: Vec::new(),
            index: Arc::default(),
            err: Some(err),
        }
    }

    fn with_index(&self, index: RowIndex) -> Self {
        Self {
            columns: self.columns.clone(),
            index: Arc::new(index),
            err: None,
        }
    }

    /// Runs `op` unless the table already carries an error.
    fn chain(&self, op: impl FnOnce(&Self) -> Result<Self>) -> Self {
        if self.err.is_some() {
            return self.clone();
        }
        op(self).unwrap_or_else(Self::with_err)
    }

    fn check(&self) -> Result<()> {
        match &self.err {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn err(&self) -> Option<&TableError> {
        self.err.as_ref()
    }

    pub fn into_result(self) -> Result<Self> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    pub(crate) fn column(&self, name: &str) -> Result<&ColumnRef> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.column)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Current row positions into the column storage.
    pub fn row_index(&self) -> &RowIndex {
        &self.index
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_types(&self) -> Vec<DataType> {
        self.columns.iter().map(|c| c.column.data_type()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Rows in the column storage, visible or not.
    fn storage_len(&self) -> usize {
        self.columns
            .first()
            .map_or(self.index.len(), |c| c.column.len())
    }

    /// Heap bytes of the columns, each distinct storage counted once, and of the index.
    pub fn byte_size(&self) -> usize {
        let mut seen = HashSet::new();
        let columns: usize = self
            .columns
            .iter()
            .filter(|c| seen.insert(Arc::as_ptr(&c.column) as *const () as usize))
            .map(|c| c.column.byte_size())
            .sum();
        columns + self.index.byte_size()
    }

    /// Keeps the rows selected by `clause`, in their current order.
    ///
    /// All atomic filters of one pass share a single mask. When any of them fails the whole
    /// filter fails and nothing is applied.
    pub fn filter(&self, clause: impl Into<Clause>) -> Self {
        let clause = clause.into();
        self.chain(|t| {
            let index = clause.evaluate(t, &t.index)?;
            trace!(rows_in = t.len(), rows_out = index.len(), "filter");
            Ok(t.with_index(index))
        })
    }

    /// Stable sort on `orders`, first order being the primary key.
    pub fn sort(&self, orders: &[Order]) -> Self {
        self.chain(|t| {
            if orders.is_empty() {
                return Ok(t.clone());
            }
            let mut keys = Vec::with_capacity(orders.len());
            for order in orders {
                keys.push(
                    t.column(&order.column)?
                        .comparable(order.reverse, false, order.nulls_last),
                );
            }
            let sorted = Sorter::new(keys).sort(&t.index);
            trace!(rows = sorted.len(), keys = orders.len(), "sort");
            Ok(t.with_index(sorted))
        })
    }

    /// Ascending comparables over `columns`, rejecting unknown and repeated names.
    fn comparables(
        &self,
        columns: &[String],
        nulls_equal: bool,
    ) -> Result<Vec<Box<dyn Comparable + '_>>> {
        let mut comparables = Vec::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
            comparables.push(self.column(name)?.comparable(false, nulls_equal, false));
        }
        Ok(comparables)
    }

    /// Groups the rows equal on `config.columns`. Without columns every row lands in a single
    /// group.
    pub fn group_by(&self, config: GroupByConfig) -> Grouped {
        if let Some(err) = &self.err {
            return Grouped::with_err(err.clone());
        }
        let comparables = match self.comparables(&config.columns, config.group_by_null) {
            Ok(comparables) => comparables,
            Err(err) => return Grouped::with_err(err),
        };
        let (groups, stats) = if self.index.is_empty() {
            (Vec::new(), grouper::GroupStats::default())
        } else {
            grouper::group_by(&self.index, &comparables)
        };
        Grouped::new(self.clone(), config.columns, groups, stats)
    }

    /// Removes rows that duplicate an earlier row on `config.columns`, or on all columns when
    /// none are given.
    pub fn distinct(&self, config: DistinctConfig) -> Self {
        self.chain(|t| {
            if t.is_empty() {
                return Ok(t.clone());
            }
            let columns = if config.columns.is_empty() {
                t.columns.iter().map(|c| c.name.clone()).collect()
            } else {
                config.columns.clone()
            };
            let comparables = t.comparables(&columns, config.group_by_null)?;

            let index = match config.strategy {
                DistinctStrategy::Hash => grouper::distinct(&t.index, &comparables).0,
                DistinctStrategy::Sort => {
                    let sorter = Sorter::new(comparables);
                    let sorted = sorter.sort(&t.index);
                    distinct_sorted(&sorted, sorter.keys())
                }
            };
            trace!(rows_in = t.len(), rows_out = index.len(), "distinct");
            Ok(t.with_index(index))
        })
    }

    /// Table with only `names`, in that order. Storage and index are shared.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        self.chain(|t| {
            if names.is_empty() {
                return Ok(Self::default());
            }
            let mut columns: Vec<NamedColumn> = Vec::with_capacity(names.len());
            for name in names {
                let name = name.as_ref();
                if columns.iter().any(|c| c.name == name) {
                    return Err(TableError::DuplicateColumn(name.to_string()));
                }
                columns.push(NamedColumn::new(name, t.column(name)?.clone()));
            }
            Ok(Self {
                columns,
                index: Arc::clone(&t.index),
                err: None,
            })
        })
    }

    /// Table without `names`. Names that are not columns are ignored.
    pub fn drop<S: AsRef<str>>(&self, names: &[S]) -> Self {
        if self.err.is_some() || names.is_empty() {
            return self.clone();
        }
        let keep: Vec<&str> = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !names.iter().any(|n| n.as_ref() == *name))
            .collect();
        self.select(&keep)
    }

    /// Rows `[start, end)` of the current index.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        self.chain(|t| {
            if start > end || end > t.len() {
                return Err(TableError::InvalidSlice {
                    start,
                    end,
                    len: t.len(),
                });
            }
            Ok(t.with_index(t.index.slice(start, end)))
        })
    }

    /// Adds or replaces column `name`, keeping the position of a replaced column.
    fn set_column(&self, name: &str, column: ColumnRef) -> Result<Self> {
        check_name(name)?;
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.column = column,
            None => columns.push(NamedColumn::new(name, column)),
        }
        Ok(Self {
            columns,
            index: Arc::clone(&self.index),
            err: None,
        })
    }

    /// Makes `dst` share the storage of `src`.
    pub fn copy_column(&self, dst: &str, src: &str) -> Self {
        self.chain(|t| {
            let column = t.column(src)?.clone();
            if dst == src {
                return Ok(t.clone());
            }
            t.set_column(dst, column)
        })
    }

    /// Writes `f(src)` for every visible row into column `dst` of type `output`.
    ///
    /// Rows outside the index hold the zero value of `output` (NaN for floats, null for
    /// strings).
    pub fn apply1(&self, dst: &str, src: &str, f: MapFn, output: DataType) -> Self {
        self.chain(|t| {
            let column = t.column(src)?.apply1(&f, output, &t.index)?;
            t.set_column(dst, column)
        })
    }

    /// Writes `f(a, b)` for every visible row into column `dst` of type `output`.
    pub fn apply2(&self, dst: &str, a: &str, b: &str, f: ZipFn, output: DataType) -> Self {
        self.chain(|t| {
            let other = t.column(b)?;
            let column = t.column(a)?.apply2(&f, &**other, output, &t.index)?;
            t.set_column(dst, column)
        })
    }

    /// Adds an int column `name` holding each row's position in the current order.
    pub fn with_row_nums(&self, name: &str) -> Self {
        self.chain(|t| {
            let mut nums = vec![0i64; t.storage_len()];
            for (k, &pos) in t.index.iter().enumerate() {
                nums[pos as usize] = k as i64;
            }
            t.set_column(name, Arc::new(IntColumn::new(nums)))
        })
    }

    /// Runs `instructions` in order over the visible rows. Each instruction sees the columns
    /// written by the ones before it. When one fails, none is applied.
    pub fn apply(&self, instructions: &[Instruction]) -> Self {
        self.chain(|t| {
            instructions.iter().try_fold(t.clone(), |acc, instruction| {
                acc.run_instruction(instruction, &acc.index, false)
            })
        })
    }

    /// Runs `instructions` on the visible rows selected by `clause` only.
    ///
    /// Outside the selection an existing destination column of the same type keeps its values,
    /// any other destination holds the zero value of its type. The visible rows are unchanged.
    pub fn filtered_apply(&self, clause: impl Into<Clause>, instructions: &[Instruction]) -> Self {
        let clause = clause.into();
        self.chain(|t| {
            let selected = clause.evaluate(t, &t.index)?;
            trace!(rows = t.len(), selected = selected.len(), "filtered apply");
            instructions.iter().try_fold(t.clone(), |acc, instruction| {
                acc.run_instruction(instruction, &selected, true)
            })
        })
    }

    fn run_instruction(
        &self,
        instruction: &Instruction,
        index: &RowIndex,
        keep_existing: bool,
    ) -> Result<Self> {
        let fresh = match instruction {
            Instruction::Map { src, f, output, .. } => self.column(src)?.apply1(f, *output, index)?,
            Instruction::Zip { a, b, f, output, .. } => {
                let other = self.column(b)?;
                self.column(a)?.apply2(f, &**other, *output, index)?
            }
            Instruction::Constant { value, output, .. } => {
                map_positions(index, self.storage_len(), *output, |_| value.clone())?
            }
        };
        let dst = instruction.dst();
        let column = match self.column(dst) {
            Ok(existing) if keep_existing && existing.data_type() == fresh.data_type() => {
                overlay(&**existing, &*fresh, index)?
            }
            _ => fresh,
        };
        self.set_column(dst, column)
    }

    /// Writes `function` over a sliding window of `src` into column `dst`.
    ///
    /// Windows follow the current row order. Rows whose window runs past the first or last
    /// visible row get `config.pad_value`. Int, Float and Bool functions write their own type,
    /// string functions a String column and [ReduceFn::Count] the window length.
    pub fn rolling(&self, dst: &str, src: &str, function: &ReduceFn, config: RollingConfig) -> Self {
        self.chain(|t| {
            config.validate()?;
            let (output, values) = match function {
                ReduceFn::Int(f) => {
                    let data: Vec<i64> = t.int_view(src)?.iter().collect();
                    (DataType::Int, rolling::roll(&data, &config, |w| Value::Int(f(w))))
                }
                ReduceFn::Float(f) => {
                    let data: Vec<f64> = t.float_view(src)?.iter().collect();
                    (DataType::Float, rolling::roll(&data, &config, |w| Value::from(f(w))))
                }
                ReduceFn::Bool(f) => {
                    let data: Vec<bool> = t.bool_view(src)?.iter().collect();
                    (DataType::Bool, rolling::roll(&data, &config, |w| Value::Bool(f(w))))
                }
                ReduceFn::Str(f) => {
                    let data: Vec<Option<&str>> = t.string_view(src)?.iter().collect();
                    let values = rolling::roll(&data, &config, |w| Value::from(f(w).as_deref()));
                    (DataType::String, values)
                }
                ReduceFn::Count => {
                    t.column(src)?;
                    let data = vec![(); t.len()];
                    (DataType::Int, rolling::roll(&data, &config, |w| Value::Int(w.len() as i64)))
                }
                _ => {
                    return Err(TableError::InvalidRolling(format!(
                        "{function:?} reads two columns"
                    )));
                }
            };
            rolling::check_pad(&config, output)?;
            let column = place_values(&t.index, t.storage_len(), output, values)?;
            t.set_column(dst, column)
        })
    }

    /// Visible rows of `self` followed by those of every table in `others`.
    ///
    /// All tables need the same column names and types in the same order. Enum dictionaries
    /// are merged. The result owns fresh storage in the appended row order.
    pub fn append(&self, others: &[&Table]) -> Self {
        self.chain(|t| {
            for other in others {
                other.check()?;
                check_appendable(t, other)?;
            }
            let mut columns = Vec::with_capacity(t.columns.len());
            for (k, named) in t.columns.iter().enumerate() {
                let mut parts: Vec<(&dyn Column, &[u32])> =
                    vec![(&*named.column, t.index.as_slice())];
                parts.extend(
                    others
                        .iter()
                        .map(|o| (&*o.columns[k].column, o.index.as_slice())),
                );
                let column = concat_columns(named.column.data_type(), &parts)?;
                columns.push(NamedColumn::new(named.name.clone(), column));
            }
            let rows = t.len() + others.iter().map(|o| o.len()).sum::<usize>();
            debug!(tables = others.len() + 1, rows, "append");
            Ok(Self::assembled(columns, RowIndex::ascending(rows)))
        })
    }

    /// Compares the visible content of two tables. The second value tells why they differ.
    pub fn equals(&self, other: &Table) -> (bool, String) {
        if self.err != other.err {
            return (false, "different errors".to_string());
        }
        if self.len() != other.len() {
            return (false, "different length".to_string());
        }
        if self.columns.len() != other.columns.len() {
            return (false, "different number of columns".to_string());
        }
        for (i, (a, b)) in self.columns.iter().zip(&other.columns).enumerate() {
            if a.name != b.name {
                return (
                    false,
                    format!("column name difference at {i}, {} != {}", a.name, b.name),
                );
            }
            if !a.column.equals(&self.index, &*b.column, &other.index) {
                return (false, format!("content of columns {} differ", a.name));
            }
        }
        (true, String::new())
    }

    pub fn column_view(&self, name: &str) -> Result<ColumnView<'_>> {
        self.check()?;
        Ok(ColumnView::new(&**self.column(name)?, &self.index))
    }

    pub fn int_view(&self, name: &str) -> Result<IntView<'_>> {
        let column = self.typed_column(name, DataType::Int)?;
        downcast::<IntColumn>(column)
            .map(|c| IntView::new(c, &self.index))
            .ok_or_else(|| type_error(name, DataType::Int, column))
    }

    pub fn float_view(&self, name: &str) -> Result<FloatView<'_>> {
        let column = self.typed_column(name, DataType::Float)?;
        downcast::<FloatColumn>(column)
            .map(|c| FloatView::new(c, &self.index))
            .ok_or_else(|| type_error(name, DataType::Float, column))
    }

    pub fn bool_view(&self, name: &str) -> Result<BoolView<'_>> {
        let column = self.typed_column(name, DataType::Bool)?;
        downcast::<BoolColumn>(column)
            .map(|c| BoolView::new(c, &self.index))
            .ok_or_else(|| type_error(name, DataType::Bool, column))
    }

    /// View of a String or Enum column.
    pub fn string_view(&self, name: &str) -> Result<StringView<'_>> {
        self.check()?;
        let column = &**self.column(name)?;
        TextSource::of(column)
            .map(|source| StringView::new(source, &self.index))
            .ok_or_else(|| type_error(name, DataType::String, column))
    }

    fn typed_column(&self, name: &str, expected: DataType) -> Result<&dyn Column> {
        self.check()?;
        let column = &**self.column(name)?;
        if column.data_type() != expected {
            return Err(type_error(name, expected, column));
        }
        Ok(column)
    }
}

fn type_error(name: &str, expected: DataType, column: &dyn Column) -> TableError {
    TableError::ColumnType {
        column: name.to_string(),
        expected,
        actual: column.data_type(),
    }
}

fn check_appendable(first: &Table, other: &Table) -> Result<()> {
    if first.columns.len() != other.columns.len() {
        return Err(TableError::IncompatibleTables(format!(
            "{} columns against {}",
            first.columns.len(),
            other.columns.len()
        )));
    }
    for (i, (a, b)) in first.columns.iter().zip(&other.columns).enumerate() {
        if a.name != b.name {
            return Err(TableError::IncompatibleTables(format!(
                "column {i} is {} in one table and {} in the other",
                a.name, b.name
            )));
        }
        let (ta, tb) = (a.column.data_type(), b.column.data_type());
        if ta != tb {
            return Err(TableError::IncompatibleTables(format!(
                "column {} is {ta} in one table and {tb} in the other",
                a.name
            )));
        }
    }
    Ok(())
}

/// Keeps every row of `sorted` that differs from its predecessor on some key.
fn distinct_sorted(sorted: &RowIndex, keys: &[Box<dyn Comparable + '_>]) -> RowIndex {
    let mut result = Vec::with_capacity(sorted.len());
    let mut prev: Option<u32> = None;
    for &pos in sorted.iter() {
        let duplicate = prev.is_some_and(|p| {
            keys.iter()
                .all(|key| key.compare(p, pos) == CompareResult::Equal)
        });
        if !duplicate {
            result.push(pos);
        }
        prev = Some(pos);
    }
    RowIndex::from(result)
}

/// Cuts or left-pads `s` to `width` characters.
fn fixed_width(s: &str, pad: char, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let mut cut: String = s.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        return cut;
    }
    let mut out: String = std::iter::repeat_n(pad, width - len).collect();
    out.push_str(s);
    out
}

impl fmt::Display for Table {
    /// Column headers carry the first letter of the column type. At most 50 rows are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.err {
            return write!(f, "{err}");
        }

        let mut widths = Vec::with_capacity(self.columns.len());
        let mut header = Vec::with_capacity(self.columns.len());
        for c in &self.columns {
            let type_letter: String = c.column.data_type().to_string().chars().take(1).collect();
            let title = format!("{}({type_letter})", c.name);
            let width = title.chars().count().max(MIN_PRINT_WIDTH);
            header.push(fixed_width(&title, ' ', width));
            widths.push(width);
        }
        writeln!(f, "{}", header.join(" "))?;
        let rule: Vec<String> = widths.iter().map(|&w| fixed_width("", '-', w)).collect();
        writeln!(f, "{}", rule.join(" "))?;

        for &pos in self.index.iter().take(MAX_PRINT_ROWS) {
            let row: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(c, &w)| fixed_width(&c.column.string_at(pos as usize, "null"), ' ', w))
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        if self.len() > MAX_PRINT_ROWS {
            writeln!(f, "... printout truncated ...")?;
        }

        write!(f, "\nDims = {} x {}", self.columns.len(), self.len())
    }
}
