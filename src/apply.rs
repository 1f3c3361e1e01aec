//! Element-wise functions that build new columns from existing ones.

use std::fmt;
use std::sync::Arc;

use crate::column::{
    BoolColumn, Column, ColumnRef, EnumColumn, FloatColumn, IntColumn, StringColumn, downcast,
};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::value::Value;

/// Function over one column, typed by the element type it reads.
///
/// Float functions see `NaN` for null cells, string functions see `None`.
#[derive(Clone)]
pub enum MapFn {
    Int(Arc<dyn Fn(i64) -> Value + Send + Sync>),
    Float(Arc<dyn Fn(f64) -> Value + Send + Sync>),
    Bool(Arc<dyn Fn(bool) -> Value + Send + Sync>),
    Str(Arc<dyn Fn(Option<&str>) -> Value + Send + Sync>),
}

impl MapFn {
    pub fn int(f: impl Fn(i64) -> Value + Send + Sync + 'static) -> Self {
        Self::Int(Arc::new(f))
    }

    pub fn float(f: impl Fn(f64) -> Value + Send + Sync + 'static) -> Self {
        Self::Float(Arc::new(f))
    }

    pub fn bool(f: impl Fn(bool) -> Value + Send + Sync + 'static) -> Self {
        Self::Bool(Arc::new(f))
    }

    pub fn str(f: impl Fn(Option<&str>) -> Value + Send + Sync + 'static) -> Self {
        Self::Str(Arc::new(f))
    }

    /// Element type the function reads.
    pub fn input_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Str(_) => DataType::String,
        }
    }
}

impl fmt::Debug for MapFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapFn({})", self.input_type())
    }
}

/// Function over two same-typed columns, read row by row.
#[derive(Clone)]
pub enum ZipFn {
    Int(Arc<dyn Fn(i64, i64) -> Value + Send + Sync>),
    Float(Arc<dyn Fn(f64, f64) -> Value + Send + Sync>),
    Bool(Arc<dyn Fn(bool, bool) -> Value + Send + Sync>),
    Str(Arc<dyn Fn(Option<&str>, Option<&str>) -> Value + Send + Sync>),
}

impl ZipFn {
    pub fn int(f: impl Fn(i64, i64) -> Value + Send + Sync + 'static) -> Self {
        Self::Int(Arc::new(f))
    }

    pub fn float(f: impl Fn(f64, f64) -> Value + Send + Sync + 'static) -> Self {
        Self::Float(Arc::new(f))
    }

    pub fn bool(f: impl Fn(bool, bool) -> Value + Send + Sync + 'static) -> Self {
        Self::Bool(Arc::new(f))
    }

    pub fn str(f: impl Fn(Option<&str>, Option<&str>) -> Value + Send + Sync + 'static) -> Self {
        Self::Str(Arc::new(f))
    }

    pub fn input_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Str(_) => DataType::String,
        }
    }
}

impl fmt::Debug for ZipFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZipFn({})", self.input_type())
    }
}

/// One step of [crate::Table::apply]: which columns to read, the function and where to
/// write its result.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// `dst = f(src)`.
    Map {
        dst: String,
        src: String,
        f: MapFn,
        output: DataType,
    },
    /// `dst = f(a, b)`.
    Zip {
        dst: String,
        a: String,
        b: String,
        f: ZipFn,
        output: DataType,
    },
    /// `dst = value` on every row.
    Constant {
        dst: String,
        value: Value,
        output: DataType,
    },
}

impl Instruction {
    pub fn map(dst: impl Into<String>, src: impl Into<String>, f: MapFn, output: DataType) -> Self {
        Self::Map {
            dst: dst.into(),
            src: src.into(),
            f,
            output,
        }
    }

    pub fn zip(
        dst: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        f: ZipFn,
        output: DataType,
    ) -> Self {
        Self::Zip {
            dst: dst.into(),
            a: a.into(),
            b: b.into(),
            f,
            output,
        }
    }

    pub fn constant(dst: impl Into<String>, value: impl Into<Value>, output: DataType) -> Self {
        Self::Constant {
            dst: dst.into(),
            value: value.into(),
            output,
        }
    }

    /// Column the instruction writes.
    pub fn dst(&self) -> &str {
        match self {
            Self::Map { dst, .. } | Self::Zip { dst, .. } | Self::Constant { dst, .. } => dst,
        }
    }
}

pub(crate) fn input_mismatch(expected: DataType, actual: DataType) -> TableError {
    TableError::Apply(format!(
        "function reads {expected} values but the column is {actual}"
    ))
}

/// Full-length output storage of an apply, pre-filled with the default of its type.
enum ColumnBuilder {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<Option<String>>),
    Enum(Vec<Option<String>>),
}

impl ColumnBuilder {
    fn new(output: DataType, len: usize) -> Self {
        match output {
            DataType::Int => Self::Int(vec![0; len]),
            DataType::Float => Self::Float(vec![f64::NAN; len]),
            DataType::Bool => Self::Bool(vec![false; len]),
            DataType::String => Self::Str(vec![None; len]),
            DataType::Enum => Self::Enum(vec![None; len]),
        }
    }

    fn set(&mut self, pos: usize, value: Value) -> Result<()> {
        match (self, value) {
            (Self::Int(v), Value::Int(x)) => v[pos] = x,
            (Self::Float(v), Value::Float(x)) => v[pos] = x,
            (Self::Float(v), Value::Int(x)) => v[pos] = x as f64,
            (Self::Float(v), Value::Null) => v[pos] = f64::NAN,
            (Self::Bool(v), Value::Bool(x)) => v[pos] = x,
            (Self::Str(v) | Self::Enum(v), Value::Text(s)) => v[pos] = Some(s.to_string()),
            (Self::Str(v) | Self::Enum(v), Value::Null) => v[pos] = None,
            (builder, value) => {
                return Err(TableError::Apply(format!(
                    "cannot store {value:?} in a {} column",
                    builder.data_type()
                )));
            }
        }
        Ok(())
    }

    fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Str(_) => DataType::String,
            Self::Enum(_) => DataType::Enum,
        }
    }

    fn finish(self) -> Result<ColumnRef> {
        let column: ColumnRef = match self {
            Self::Int(v) => Arc::new(IntColumn::new(v)),
            Self::Float(v) => Arc::new(FloatColumn::new(v)),
            Self::Bool(v) => Arc::new(BoolColumn::new(v)),
            Self::Str(v) => Arc::new(StringColumn::from_options(v)?),
            Self::Enum(v) => Arc::new(EnumColumn::from_options(v, None)?),
        };
        Ok(column)
    }
}

/// Builds a column of `len` rows of type `output` where row `index[k]` is `f(index[k])`.
pub(crate) fn map_positions(
    index: &[u32],
    len: usize,
    output: DataType,
    mut f: impl FnMut(usize) -> Value,
) -> Result<ColumnRef> {
    let mut builder = ColumnBuilder::new(output, len);
    for &pos in index {
        let pos = pos as usize;
        builder.set(pos, f(pos))?;
    }
    builder.finish()
}

/// Builds a column of `len` rows of type `output` where row `index[k]` is `values[k]`.
pub(crate) fn place_values(
    index: &[u32],
    len: usize,
    output: DataType,
    values: impl IntoIterator<Item = Value>,
) -> Result<ColumnRef> {
    let mut builder = ColumnBuilder::new(output, len);
    for (&pos, value) in index.iter().zip(values) {
        builder.set(pos as usize, value)?;
    }
    builder.finish()
}

/// Copy of `base` where the rows at `positions` come from `fresh`. Both columns have the
/// same type and length.
pub(crate) fn overlay(base: &dyn Column, fresh: &dyn Column, positions: &[u32]) -> Result<ColumnRef> {
    if let (Some(base), Some(fresh)) = (downcast::<EnumColumn>(base), downcast::<EnumColumn>(fresh))
    {
        let mut rows: Vec<Option<&str>> = (0..base.len()).map(|i| base.get(i)).collect();
        for &pos in positions {
            rows[pos as usize] = fresh.get(pos as usize);
        }
        let dictionary = base.is_strict().then(|| base.dictionary().to_vec());
        return Ok(Arc::new(EnumColumn::from_options(rows, dictionary)?));
    }

    let mut builder = ColumnBuilder::new(base.data_type(), base.len());
    for pos in 0..base.len() {
        builder.set(pos, base.value_at(pos))?;
    }
    for &pos in positions {
        builder.set(pos as usize, fresh.value_at(pos as usize))?;
    }
    builder.finish()
}

/// Rows `index` of every part, one part after the other, in a new column of `data_type`.
///
/// Enum parts are merged into one dictionary, see [EnumColumn::concat].
pub(crate) fn concat_columns(
    data_type: DataType,
    parts: &[(&dyn Column, &[u32])],
) -> Result<ColumnRef> {
    if data_type == DataType::Enum {
        let enums = parts
            .iter()
            .map(|&(column, index)| {
                downcast::<EnumColumn>(column)
                    .map(|c| (c, index))
                    .ok_or_else(|| {
                        TableError::IncompatibleTables(format!(
                            "cannot append a {} column to an enum column",
                            column.data_type()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(Arc::new(EnumColumn::concat(&enums)?));
    }

    let len = parts.iter().map(|(_, index)| index.len()).sum();
    let mut builder = ColumnBuilder::new(data_type, len);
    let values = parts
        .iter()
        .flat_map(|&(column, index)| index.iter().map(move |&i| column.value_at(i as usize)));
    for (pos, value) in values.enumerate() {
        builder.set(pos, value)?;
    }
    builder.finish()
}
