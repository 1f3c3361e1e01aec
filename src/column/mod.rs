//! Column storage and the operations every column representation implements.
//!
//! A column owns full-length storage for all rows of a table and never changes after
//! construction. Operations take a slice of row positions (the current [RowIndex] of the
//! table) and never copy storage unless they build a new column.

mod boolean;
mod enumeration;
mod float;
mod int;
mod matcher;
mod pointer;
mod string;

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub use boolean::BoolColumn;
pub use enumeration::{EnumColumn, EnumFactory, MAX_CARDINALITY};
pub use float::FloatColumn;
pub use int::IntColumn;
pub use string::StringColumn;

pub(crate) use matcher::Matcher;

use crate::aggregation::ReduceFn;
use crate::apply::{MapFn, ZipFn};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::hash::RowHasher;
use crate::index::{Mask, RowIndex};
use crate::predicate::{Comparatee, Operator, Predicate};
use crate::value::Value;

/// Shared handle to an immutable column. Derived tables clone the handle, never the storage.
pub type ColumnRef = Arc<dyn Column>;

/// Operations shared by the five column representations.
pub trait Column: fmt::Debug + Send + Sync + Any {
    fn data_type(&self) -> DataType;

    /// Number of rows in the underlying storage, independent of any index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates `predicate` for every `index[k]` whose `mask[k]` is still unset and sets the
    /// bit when the result differs from `inverse`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator is not supported for this column type, the argument
    /// has the wrong type, or a user function was written for another element type.
    fn filter(
        &self,
        index: &[u32],
        predicate: &Predicate,
        arg: &Comparatee<'_>,
        inverse: bool,
        mask: &mut Mask,
    ) -> Result<()>;

    /// New column holding the rows at `index`, in that order. Positions may repeat.
    fn subset(&self, index: &[u32]) -> ColumnRef;

    /// Comparator over two row positions of this column.
    fn comparable(&self, reverse: bool, nulls_equal: bool, nulls_last: bool)
    -> Box<dyn Comparable + '_>;

    /// Reduces every group to one value.
    ///
    /// `other` is the second input column of a two-argument reduction.
    fn aggregate(
        &self,
        groups: &[RowIndex],
        function: &ReduceFn,
        other: Option<&dyn Column>,
    ) -> Result<ColumnRef>;

    /// Maps every row at `index` through `f` into a new full-length column of type `output`.
    /// Rows outside the index hold the default value of the output type.
    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef>;

    /// Like [Column::apply1], combining each row with the same row of `other`.
    fn apply2(
        &self,
        f: &ZipFn,
        other: &dyn Column,
        output: DataType,
        index: &[u32],
    ) -> Result<ColumnRef>;

    /// Element-wise equality of two indexed columns. Nulls are equal to each other.
    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool;

    fn value_at(&self, i: usize) -> Value;

    /// Printable form of row `i`.
    fn string_at(&self, i: usize, null_repr: &str) -> String;

    /// Heap bytes owned by the column storage.
    fn byte_size(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

/// Outcome of comparing two rows of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Less,
    Greater,
    Equal,
    /// Two nulls under a policy where nulls are not equal to each other.
    NotEqual,
}

impl CompareResult {
    /// Ordering used by sorting. `NotEqual` sorts as a tie.
    pub fn ordering(self) -> Ordering {
        match self {
            Self::Less => Ordering::Less,
            Self::Greater => Ordering::Greater,
            Self::Equal | Self::NotEqual => Ordering::Equal,
        }
    }
}

impl From<Ordering> for CompareResult {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Less,
            Ordering::Greater => Self::Greater,
            Ordering::Equal => Self::Equal,
        }
    }
}

/// A column bound to a direction and a null policy.
pub trait Comparable {
    fn compare(&self, i: u32, j: u32) -> CompareResult;

    /// Appends the canonical bytes of row `i`.
    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher);
}

/// Direction and null placement of one comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct NullPolicy {
    pub reverse: bool,
    pub nulls_equal: bool,
    pub nulls_last: bool,
}

impl NullPolicy {
    pub fn new(reverse: bool, nulls_equal: bool, nulls_last: bool) -> Self {
        Self {
            reverse,
            nulls_equal,
            nulls_last,
        }
    }

    /// Applies the direction to the ordering of two non-null values.
    pub fn order(&self, ordering: Ordering) -> CompareResult {
        if self.reverse {
            ordering.reverse().into()
        } else {
            ordering.into()
        }
    }

    /// Compares two optional values, null being the smallest value unless `nulls_last`.
    pub fn compare_options<T>(
        &self,
        a: Option<T>,
        b: Option<T>,
        cmp: impl FnOnce(T, T) -> Ordering,
    ) -> CompareResult {
        match (a, b) {
            (Some(a), Some(b)) => self.order(cmp(a, b)),
            (None, None) if self.nulls_equal => CompareResult::Equal,
            (None, None) => CompareResult::NotEqual,
            (None, Some(_)) => self.order(self.null_ordering()),
            (Some(_), None) => self.order(self.null_ordering().reverse()),
        }
    }

    fn null_ordering(&self) -> Ordering {
        if self.nulls_last {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }
}

/// Sets `mask[k]` for every unset entry where `pred(index[k])` differs from `inverse`.
pub(crate) fn fill_mask(
    index: &[u32],
    mask: &mut Mask,
    inverse: bool,
    mut pred: impl FnMut(usize) -> bool,
) {
    debug_assert_eq!(index.len(), mask.len());
    for (k, &pos) in index.iter().enumerate() {
        if !mask[k] && pred(pos as usize) != inverse {
            mask.set(k, true);
        }
    }
}

/// Comparison function for a relational operator, `None` for any other operator.
pub(crate) fn relation<T: PartialOrd + ?Sized>(op: Operator) -> Option<fn(&T, &T) -> bool> {
    let f: fn(&T, &T) -> bool = match op {
        Operator::Eq => |a, b| a == b,
        Operator::Neq => |a, b| a != b,
        Operator::Lt => |a, b| a < b,
        Operator::Lte => |a, b| a <= b,
        Operator::Gt => |a, b| a > b,
        Operator::Gte => |a, b| a >= b,
        _ => return None,
    };
    Some(f)
}

pub(crate) fn downcast<T: Column>(column: &dyn Column) -> Option<&T> {
    column.as_any().downcast_ref::<T>()
}

pub(crate) fn invalid_operator(operator: Operator, data_type: DataType) -> TableError {
    TableError::InvalidOperator {
        operator,
        data_type,
    }
}

pub(crate) fn invalid_argument(
    operator: Operator,
    data_type: DataType,
    arg: &Comparatee<'_>,
) -> TableError {
    TableError::InvalidArgument {
        operator,
        data_type,
        argument: arg.describe(),
    }
}

pub(crate) fn invalid_predicate(predicate: &Predicate, data_type: DataType) -> TableError {
    TableError::InvalidPredicate {
        predicate: predicate.to_string(),
        data_type,
    }
}

/// Second operand of a binary user function, which must be a column of type `T`.
pub(crate) fn binary_operand<'a, T: Column>(
    predicate: &Predicate,
    data_type: DataType,
    arg: &Comparatee<'a>,
) -> Result<&'a T> {
    match arg {
        Comparatee::Column(other) => downcast::<T>(*other).ok_or_else(|| {
            TableError::IncompatibleColumns(format!(
                "{predicate} needs a {data_type} column, got {}",
                other.data_type()
            ))
        }),
        _ => Err(TableError::IncompatibleColumns(format!(
            "{predicate} needs a column argument, got {}",
            arg.describe()
        ))),
    }
}

/// Read access to a column holding strings, either plain or dictionary encoded.
#[derive(Clone, Copy)]
pub(crate) enum TextSource<'a> {
    String(&'a StringColumn),
    Enum(&'a EnumColumn),
}

impl<'a> TextSource<'a> {
    pub fn of(column: &'a dyn Column) -> Option<Self> {
        if let Some(c) = downcast::<StringColumn>(column) {
            Some(Self::String(c))
        } else {
            downcast::<EnumColumn>(column).map(Self::Enum)
        }
    }

    pub fn get(self, i: usize) -> Option<&'a str> {
        match self {
            Self::String(c) => c.get(i),
            Self::Enum(c) => c.get(i),
        }
    }
}

pub(crate) fn gather<T: Copy>(data: &[T], index: &[u32]) -> Vec<T> {
    index.iter().map(|&i| data[i as usize]).collect()
}
