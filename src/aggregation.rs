//! Reductions applied per group after a GroupBy.
//!
//! Functions live in an [AggregationRegistry] owned by the caller and are looked up by element
//! type, number of input columns and name. `AggregationRegistry::default()` holds the built-ins.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::column::{ColumnRef, IntColumn};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::index::RowIndex;

/// A reduction from the values of one group (one or two columns) to a single value.
#[derive(Clone)]
pub enum ReduceFn {
    Int(Arc<dyn Fn(&[i64]) -> i64 + Send + Sync>),
    Int2(Arc<dyn Fn(&[i64], &[i64]) -> i64 + Send + Sync>),
    Float(Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>),
    Float2(Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>),
    Bool(Arc<dyn Fn(&[bool]) -> bool + Send + Sync>),
    Bool2(Arc<dyn Fn(&[bool], &[bool]) -> bool + Send + Sync>),
    /// String and Enum columns. Produces a String column.
    Str(Arc<dyn Fn(&[Option<&str>]) -> Option<String> + Send + Sync>),
    Str2(Arc<dyn Fn(&[Option<&str>], &[Option<&str>]) -> Option<String> + Send + Sync>),
    /// Group sizes, for any column type.
    Count,
}

impl ReduceFn {
    pub fn int(f: impl Fn(&[i64]) -> i64 + Send + Sync + 'static) -> Self {
        Self::Int(Arc::new(f))
    }

    pub fn int2(f: impl Fn(&[i64], &[i64]) -> i64 + Send + Sync + 'static) -> Self {
        Self::Int2(Arc::new(f))
    }

    pub fn float(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::Float(Arc::new(f))
    }

    pub fn float2(f: impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::Float2(Arc::new(f))
    }

    pub fn bool(f: impl Fn(&[bool]) -> bool + Send + Sync + 'static) -> Self {
        Self::Bool(Arc::new(f))
    }

    pub fn bool2(f: impl Fn(&[bool], &[bool]) -> bool + Send + Sync + 'static) -> Self {
        Self::Bool2(Arc::new(f))
    }

    pub fn str(f: impl Fn(&[Option<&str>]) -> Option<String> + Send + Sync + 'static) -> Self {
        Self::Str(Arc::new(f))
    }

    pub fn str2(
        f: impl Fn(&[Option<&str>], &[Option<&str>]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self::Str2(Arc::new(f))
    }

    /// Number of input columns.
    pub fn arity(&self) -> usize {
        match self {
            Self::Int2(_) | Self::Float2(_) | Self::Bool2(_) | Self::Str2(_) => 2,
            _ => 1,
        }
    }

    /// Element type the function reads, `None` for [ReduceFn::Count].
    pub fn input_type(&self) -> Option<DataType> {
        match self {
            Self::Int(_) | Self::Int2(_) => Some(DataType::Int),
            Self::Float(_) | Self::Float2(_) => Some(DataType::Float),
            Self::Bool(_) | Self::Bool2(_) => Some(DataType::Bool),
            Self::Str(_) | Self::Str2(_) => Some(DataType::String),
            Self::Count => None,
        }
    }
}

impl fmt::Debug for ReduceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.input_type() {
            Some(t) => write!(f, "ReduceFn({t}, arity {})", self.arity()),
            None => f.write_str("ReduceFn(count)"),
        }
    }
}

/// One requested aggregate: a function name, its input column(s) and an optional output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub function: String,
    pub columns: Vec<String>,
    pub alias: Option<String>,
}

impl Aggregation {
    pub fn new(function: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            columns: vec![column.into()],
            alias: None,
        }
    }

    /// Two-argument aggregation over `first` and `second`.
    pub fn binary(
        function: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            columns: vec![first.into(), second.into()],
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name of the result column: the alias, else the first input column.
    pub fn output_name(&self) -> &str {
        self.alias
            .as_deref()
            .or_else(|| self.columns.first().map(String::as_str))
            .unwrap_or_default()
    }
}

/// Named reductions keyed by element type and arity.
#[derive(Clone)]
pub struct AggregationRegistry {
    functions: HashMap<(DataType, usize, String), ReduceFn>,
}

impl AggregationRegistry {
    /// A registry without any functions, not even the built-ins.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers `function` under `name` for its element type and arity, replacing any
    /// previous entry. [ReduceFn::Count] is registered for every element type.
    pub fn register(&mut self, name: impl Into<String>, function: ReduceFn) -> &mut Self {
        let name = name.into();
        let arity = function.arity();
        match function.input_type() {
            Some(data_type) => {
                self.functions.insert((data_type, arity, name), function);
            }
            None => {
                for data_type in [DataType::Int, DataType::Float, DataType::Bool, DataType::String]
                {
                    self.functions
                        .insert((data_type, arity, name.clone()), function.clone());
                }
            }
        }
        self
    }

    /// Finds the function `name` taking `arity` columns of type `data_type`.
    ///
    /// Enum columns resolve to String functions.
    pub fn lookup(&self, data_type: DataType, arity: usize, name: &str) -> Result<&ReduceFn> {
        let element = data_type.element_type();
        self.functions
            .get(&(element, arity, name.to_string()))
            .ok_or_else(|| TableError::UnknownAggregation {
                name: name.to_string(),
                data_type,
                arity,
            })
    }

    pub fn contains(&self, data_type: DataType, arity: usize, name: &str) -> bool {
        self.lookup(data_type, arity, name).is_ok()
    }
}

impl Default for AggregationRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("sum", ReduceFn::int(|v| v.iter().fold(0i64, |a, &b| a.wrapping_add(b))))
            .register("sum", ReduceFn::float(|v| v.iter().sum()))
            .register("min", ReduceFn::int(|v| v.iter().copied().min().unwrap_or_default()))
            .register("max", ReduceFn::int(|v| v.iter().copied().max().unwrap_or_default()))
            .register("min", ReduceFn::float(|v| v.iter().fold(f64::NAN, |a, &b| a.min(b))))
            .register("max", ReduceFn::float(|v| v.iter().fold(f64::NAN, |a, &b| a.max(b))))
            .register("avg", ReduceFn::float(avg))
            .register("majority", ReduceFn::int(|v| majority(v.iter().copied()).unwrap_or_default()))
            .register("majority", ReduceFn::bool(bool_majority))
            .register(
                "majority",
                ReduceFn::str(|v| majority(v.iter().flatten().copied()).map(str::to_string)),
            )
            .register("count", ReduceFn::Count);
        registry
    }
}

impl fmt::Debug for AggregationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.functions.keys().collect();
        keys.sort_by(|a, b| (&a.2, a.1, a.0.to_string()).cmp(&(&b.2, b.1, b.0.to_string())));
        f.debug_struct("AggregationRegistry")
            .field("functions", &keys)
            .finish()
    }
}

fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Most frequent value, the smallest one on ties. `None` for no values.
fn majority<T: Hash + Ord + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(v, _)| v)
}

/// `true` only when trues strictly outnumber falses.
fn bool_majority(values: &[bool]) -> bool {
    let trues = values.iter().filter(|&&b| b).count();
    trues * 2 > values.len()
}

/// Runs `f` over the values of each group, read through `get`.
pub(crate) fn reduce_groups<T, R>(
    groups: &[RowIndex],
    get: impl Fn(usize) -> T,
    f: impl Fn(&[T]) -> R,
) -> Vec<R> {
    let mut scratch = Vec::new();
    groups
        .iter()
        .map(|group| {
            scratch.clear();
            scratch.extend(group.iter().map(|&i| get(i as usize)));
            f(&scratch)
        })
        .collect()
}

/// Two-column form of [reduce_groups].
pub(crate) fn reduce_groups2<T, R>(
    groups: &[RowIndex],
    get_a: impl Fn(usize) -> T,
    get_b: impl Fn(usize) -> T,
    f: impl Fn(&[T], &[T]) -> R,
) -> Vec<R> {
    let mut a = Vec::new();
    let mut b = Vec::new();
    groups
        .iter()
        .map(|group| {
            a.clear();
            b.clear();
            a.extend(group.iter().map(|&i| get_a(i as usize)));
            b.extend(group.iter().map(|&i| get_b(i as usize)));
            f(&a, &b)
        })
        .collect()
}

pub(crate) fn group_sizes(groups: &[RowIndex]) -> ColumnRef {
    Arc::new(IntColumn::new(
        groups.iter().map(|g| g.len() as i64).collect(),
    ))
}

pub(crate) fn unsupported(function: &ReduceFn, data_type: DataType) -> TableError {
    TableError::InvalidAggregation(format!("{function:?} cannot reduce a {data_type} column"))
}

pub(crate) fn missing_operand(function: &ReduceFn) -> TableError {
    TableError::InvalidAggregation(format!("{function:?} needs a second column of the same type"))
}
