use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use allocative::Allocative;

use super::{
    Column, ColumnRef, Comparable, CompareResult, FloatColumn, NullPolicy, binary_operand,
    downcast, fill_mask, gather, invalid_argument, invalid_operator, invalid_predicate, relation,
};
use crate::aggregation::{ReduceFn, group_sizes, missing_operand, reduce_groups, reduce_groups2, unsupported};
use crate::apply::{MapFn, ZipFn, input_mismatch, map_positions};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::hash::RowHasher;
use crate::index::{Mask, RowIndex};
use crate::predicate::{Comparatee, Operator, Predicate};
use crate::value::Value;

/// Dense 64-bit integers. There is no null value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Allocative)]
pub struct IntColumn {
    data: Vec<i64>,
}

impl IntColumn {
    pub fn new(data: Vec<i64>) -> Self {
        Self { data }
    }

    pub fn constant(value: i64, count: usize) -> Self {
        Self::new(vec![value; count])
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    pub fn get(&self, i: usize) -> i64 {
        self.data[i]
    }

    fn filter_op(
        &self,
        op: Operator,
        arg: &Comparatee<'_>,
        index: &[u32],
        inverse: bool,
        mask: &mut Mask,
    ) -> Result<()> {
        let data = &self.data;
        match op {
            Operator::IsNull => {
                fill_mask(index, mask, inverse, |_| false);
                return Ok(());
            }
            Operator::IsNotNull => {
                fill_mask(index, mask, inverse, |_| true);
                return Ok(());
            }
            Operator::AnyBits | Operator::AllBits => {
                let Comparatee::Int(bits) = *arg else {
                    return Err(invalid_argument(op, DataType::Int, arg));
                };
                if op == Operator::AnyBits {
                    fill_mask(index, mask, inverse, |i| data[i] & bits != 0);
                } else {
                    fill_mask(index, mask, inverse, |i| data[i] & bits == bits);
                }
                return Ok(());
            }
            Operator::In => {
                let Comparatee::IntSet(values) = arg else {
                    return Err(invalid_argument(op, DataType::Int, arg));
                };
                let set: HashSet<i64> = values.iter().copied().collect();
                fill_mask(index, mask, inverse, |i| set.contains(&data[i]));
                return Ok(());
            }
            _ => {}
        }

        let (Some(rel), Some(frel)) = (relation::<i64>(op), relation::<f64>(op)) else {
            return Err(invalid_operator(op, DataType::Int));
        };
        match *arg {
            Comparatee::Int(v) => fill_mask(index, mask, inverse, |i| rel(&data[i], &v)),
            Comparatee::Float(v) => {
                if v.is_nan() {
                    return Err(TableError::NanArgument);
                }
                fill_mask(index, mask, inverse, |i| frel(&(data[i] as f64), &v));
            }
            Comparatee::Column(other) => {
                if let Some(other) = downcast::<IntColumn>(other) {
                    fill_mask(index, mask, inverse, |i| rel(&data[i], &other.data[i]));
                } else if let Some(other) = downcast::<FloatColumn>(other) {
                    // promoted to float, a NaN on the right never matches
                    fill_mask(index, mask, inverse, |i| {
                        let b = other.get(i);
                        !b.is_nan() && frel(&(data[i] as f64), &b)
                    });
                } else {
                    return Err(TableError::IncompatibleColumns(format!(
                        "cannot compare int column with {} column",
                        other.data_type()
                    )));
                }
            }
            _ => return Err(invalid_argument(op, DataType::Int, arg)),
        }
        Ok(())
    }
}

impl Column for IntColumn {
    fn data_type(&self) -> DataType {
        DataType::Int
    }

    fn len(&self) -> usize {
        self.data.len()
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
            Predicate::Int(f) => {
                fill_mask(index, mask, inverse, |i| f(self.data[i]));
                Ok(())
            }
            Predicate::Int2(f) => {
                let other = binary_operand::<IntColumn>(predicate, DataType::Int, arg)?;
                fill_mask(index, mask, inverse, |i| f(self.data[i], other.data[i]));
                Ok(())
            }
            _ => Err(invalid_predicate(predicate, DataType::Int)),
        }
    }

    fn subset(&self, index: &[u32]) -> ColumnRef {
        Arc::new(Self::new(gather(&self.data, index)))
    }

    fn comparable(
        &self,
        reverse: bool,
        nulls_equal: bool,
        nulls_last: bool,
    ) -> Box<dyn Comparable + '_> {
        Box::new(IntComparable {
            data: &self.data,
            policy: NullPolicy::new(reverse, nulls_equal, nulls_last),
        })
    }

    fn aggregate(
        &self,
        groups: &[RowIndex],
        function: &ReduceFn,
        other: Option<&dyn Column>,
    ) -> Result<ColumnRef> {
        let data = &self.data;
        let column = match (function, other) {
            (ReduceFn::Count, _) => return Ok(group_sizes(groups)),
            (ReduceFn::Int(f), None) => Self::new(reduce_groups(groups, |i| data[i], |v| f(v))),
            (ReduceFn::Int2(f), Some(other)) => {
                let other = downcast::<IntColumn>(other).ok_or_else(|| missing_operand(function))?;
                Self::new(reduce_groups2(
                    groups,
                    |i| data[i],
                    |i| other.data[i],
                    |a, b| f(a, b),
                ))
            }
            (ReduceFn::Int2(_), None) => return Err(missing_operand(function)),
            _ => return Err(unsupported(function, DataType::Int)),
        };
        Ok(Arc::new(column))
    }

    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef> {
        let MapFn::Int(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Int));
        };
        map_positions(index, self.len(), output, |i| f(self.data[i]))
    }

    fn apply2(
        &self,
        f: &ZipFn,
        other: &dyn Column,
        output: DataType,
        index: &[u32],
    ) -> Result<ColumnRef> {
        let ZipFn::Int(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Int));
        };
        let other = downcast::<IntColumn>(other)
            .ok_or_else(|| input_mismatch(DataType::Int, other.data_type()))?;
        map_positions(index, self.len(), output, |i| f(self.data[i], other.data[i]))
    }

    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool {
        let Some(other) = downcast::<IntColumn>(other) else {
            return false;
        };
        index.len() == other_index.len()
            && index
                .iter()
                .zip(other_index)
                .all(|(&a, &b)| self.data[a as usize] == other.data[b as usize])
    }

    fn value_at(&self, i: usize) -> Value {
        Value::Int(self.data[i])
    }

    fn string_at(&self, i: usize, _null_repr: &str) -> String {
        self.data[i].to_string()
    }

    fn byte_size(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct IntComparable<'a> {
    data: &'a [i64],
    policy: NullPolicy,
}

impl Comparable for IntComparable<'_> {
    fn compare(&self, i: u32, j: u32) -> CompareResult {
        self.policy
            .order(self.data[i as usize].cmp(&self.data[j as usize]))
    }

    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher) {
        hasher.write_u64(self.data[i as usize] as u64);
    }
}
