use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use allocative::Allocative;

use super::pointer::{MAX_OFFSET, MAX_STRING_LEN, Pointer};
use super::{
    Column, ColumnRef, Comparable, CompareResult, Matcher, NullPolicy, TextSource, downcast,
    fill_mask, gather, invalid_argument, invalid_operator, invalid_predicate, relation,
};
use crate::aggregation::{ReduceFn, group_sizes, missing_operand, reduce_groups, reduce_groups2, unsupported};
use crate::apply::{MapFn, ZipFn, input_mismatch, map_positions};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::hash::RowHasher;
use crate::index::{Mask, RowIndex};
use crate::predicate::{Comparatee, Operator, Predicate};
use crate::value::Value;

pub(crate) const NULL_TAG: u8 = 0;
pub(crate) const VALUE_TAG: u8 = 1;

/// Strings stored back to back in one blob, addressed by packed pointers.
///
/// Null is a flag in the pointer and is distinct from the empty string. Subsets share the blob
/// of the column they were taken from and only gather pointers.
#[derive(Debug, Clone, Default, Allocative)]
pub struct StringColumn {
    blob: Arc<String>,
    pointers: Vec<Pointer>,
}

impl StringColumn {
    /// Column without nulls.
    ///
    /// # Errors
    ///
    /// Returns [TableError::StringTooLarge] if a single string or the whole blob exceeds what a
    /// pointer can address.
    pub fn new<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::from_options(values.into_iter().map(Some))
    }

    /// Column where `None` entries are null.
    pub fn from_options<S: AsRef<str>>(
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Result<Self> {
        let values = values.into_iter();
        let mut blob = String::new();
        let mut pointers = Vec::with_capacity(values.size_hint().0);
        for value in values {
            let Some(value) = value else {
                pointers.push(Pointer::NULL);
                continue;
            };
            let s = value.as_ref();
            let offset = blob.len();
            if s.len() > MAX_STRING_LEN || offset > MAX_OFFSET {
                return Err(TableError::StringTooLarge {
                    len: offset + s.len(),
                });
            }
            blob.push_str(s);
            pointers.push(Pointer::new(offset, s.len()));
        }
        Ok(Self {
            blob: Arc::new(blob),
            pointers,
        })
    }

    pub fn constant(value: Option<&str>, count: usize) -> Result<Self> {
        let mut column = Self::from_options([value])?;
        column.pointers = vec![column.pointers[0]; count];
        Ok(column)
    }

    /// Value at row `i`, `None` for null.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.pointers[i].range().map(|r| &self.blob[r])
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.pointers[i].is_null()
    }

    fn filter_op(
        &self,
        op: Operator,
        arg: &Comparatee<'_>,
        index: &[u32],
        inverse: bool,
        mask: &mut Mask,
    ) -> Result<()> {
        match op {
            Operator::IsNull => fill_mask(index, mask, inverse, |i| self.is_null(i)),
            Operator::IsNotNull => fill_mask(index, mask, inverse, |i| !self.is_null(i)),
            Operator::In => {
                let Comparatee::StrSet(values) = arg else {
                    return Err(invalid_argument(op, DataType::String, arg));
                };
                let set: HashSet<&str> = values.iter().map(String::as_str).collect();
                fill_mask(index, mask, inverse, |i| {
                    self.get(i).is_some_and(|s| set.contains(s))
                });
            }
            Operator::Like | Operator::ILike => {
                let Comparatee::Str(pattern) = *arg else {
                    return Err(invalid_argument(op, DataType::String, arg));
                };
                let matcher = Matcher::new(pattern, op == Operator::Like)?;
                fill_mask(index, mask, inverse, |i| {
                    self.get(i).is_some_and(|s| matcher.matches(s))
                });
            }
            _ => {
                let Some(rel) = relation::<str>(op) else {
                    return Err(invalid_operator(op, DataType::String));
                };
                match *arg {
                    Comparatee::Str(v) => fill_mask(index, mask, inverse, |i| {
                        self.get(i).is_some_and(|s| rel(s, v))
                    }),
                    Comparatee::Column(other) => {
                        let other = TextSource::of(other).ok_or_else(|| {
                            TableError::IncompatibleColumns(format!(
                                "cannot compare string column with {} column",
                                other.data_type()
                            ))
                        })?;
                        fill_mask(index, mask, inverse, |i| match (self.get(i), other.get(i)) {
                            (Some(a), Some(b)) => rel(a, b),
                            _ => false,
                        });
                    }
                    _ => return Err(invalid_argument(op, DataType::String, arg)),
                }
            }
        }
        Ok(())
    }
}

impl Column for StringColumn {
    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn len(&self) -> usize {
        self.pointers.len()
    }

    fn filter(
        &self,
        index: &[u32],
        predicate: &Predicate,
        arg: &Comparatee<'_>,
        inverse: bool,
        mask: &mut Mask,
    ) -> Result<()> {
        match predicate {
            Predicate::Op(op) => self.filter_op(*op, arg, index, inverse, mask),
            Predicate::Str(f) => {
                fill_mask(index, mask, inverse, |i| f(self.get(i)));
                Ok(())
            }
            Predicate::Str2(f) => {
                let Comparatee::Column(other) = *arg else {
                    return Err(TableError::IncompatibleColumns(format!(
                        "{predicate} needs a column argument, got {}",
                        arg.describe()
                    )));
                };
                let other = TextSource::of(other).ok_or_else(|| {
                    TableError::IncompatibleColumns(format!(
                        "{predicate} needs a string column, got {}",
                        other.data_type()
                    ))
                })?;
                fill_mask(index, mask, inverse, |i| f(self.get(i), other.get(i)));
                Ok(())
            }
            _ => Err(invalid_predicate(predicate, DataType::String)),
        }
    }

    fn subset(&self, index: &[u32]) -> ColumnRef {
        Arc::new(Self {
            blob: Arc::clone(&self.blob),
            pointers: gather(&self.pointers, index),
        })
    }

    fn comparable(
        &self,
        reverse: bool,
        nulls_equal: bool,
        nulls_last: bool,
    ) -> Box<dyn Comparable + '_> {
        Box::new(StringComparable {
            column: self,
            policy: NullPolicy::new(reverse, nulls_equal, nulls_last),
        })
    }

    fn aggregate(
        &self,
        groups: &[RowIndex],
        function: &ReduceFn,
        other: Option<&dyn Column>,
    ) -> Result<ColumnRef> {
        let values = match (function, other) {
            (ReduceFn::Count, _) => return Ok(group_sizes(groups)),
            (ReduceFn::Str(f), None) => reduce_groups(groups, |i| self.get(i), |v| f(v)),
            (ReduceFn::Str2(f), Some(other)) => {
                let other = TextSource::of(other).ok_or_else(|| missing_operand(function))?;
                reduce_groups2(groups, |i| self.get(i), |i| other.get(i), |a, b| f(a, b))
            }
            (ReduceFn::Str2(_), None) => return Err(missing_operand(function)),
            _ => return Err(unsupported(function, DataType::String)),
        };
        Ok(Arc::new(Self::from_options(values)?))
    }

    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef> {
        let MapFn::Str(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::String));
        };
        map_positions(index, self.len(), output, |i| f(self.get(i)))
    }

    fn apply2(
        &self,
        f: &ZipFn,
        other: &dyn Column,
        output: DataType,
        index: &[u32],
    ) -> Result<ColumnRef> {
        let ZipFn::Str(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::String));
        };
        let other =
            TextSource::of(other).ok_or_else(|| input_mismatch(DataType::String, other.data_type()))?;
        map_positions(index, self.len(), output, |i| f(self.get(i), other.get(i)))
    }

    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool {
        let Some(other) = downcast::<StringColumn>(other) else {
            return false;
        };
        index.len() == other_index.len()
            && index
                .iter()
                .zip(other_index)
                .all(|(&a, &b)| self.get(a as usize) == other.get(b as usize))
    }

    fn value_at(&self, i: usize) -> Value {
        Value::from(self.get(i))
    }

    fn string_at(&self, i: usize, null_repr: &str) -> String {
        self.get(i).unwrap_or(null_repr).to_string()
    }

    fn byte_size(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct StringComparable<'a> {
    column: &'a StringColumn,
    policy: NullPolicy,
}

impl Comparable for StringComparable<'_> {
    fn compare(&self, i: u32, j: u32) -> CompareResult {
        self.policy.compare_options(
            self.column.get(i as usize),
            self.column.get(j as usize),
            str::cmp,
        )
    }

    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher) {
        match self.column.get(i as usize) {
            Some(s) => hash_str(s, hasher),
            None => hash_null(self.policy.nulls_equal, hasher),
        }
    }
}

fn hash_str(s: &str, hasher: &mut RowHasher) {
    hasher.write_u8(VALUE_TAG);
    hasher.write(&(s.len() as u32).to_le_bytes());
    hasher.write(s.as_bytes());
}

pub(crate) fn hash_null(nulls_equal: bool, hasher: &mut RowHasher) {
    hasher.write_u8(NULL_TAG);
    if !nulls_equal {
        hasher.write_random();
    }
}
