use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use allocative::Allocative;

use super::{
    Column, ColumnRef, Comparable, CompareResult, IntColumn, NullPolicy, binary_operand, downcast,
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

/// Bit pattern hashed for `NaN` when nulls group together.
const NAN_SENTINEL: u64 = 0x7ff8_0000_0000_0001;

/// Dense 64-bit floats. `NaN` is null.
#[derive(Debug, Clone, Default, Allocative)]
pub struct FloatColumn {
    data: Vec<f64>,
}

impl FloatColumn {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn constant(value: f64, count: usize) -> Self {
        Self::new(vec![value; count])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, i: usize) -> f64 {
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
                fill_mask(index, mask, inverse, |i| data[i].is_nan());
                return Ok(());
            }
            Operator::IsNotNull => {
                fill_mask(index, mask, inverse, |i| !data[i].is_nan());
                return Ok(());
            }
            _ => {}
        }

        let Some(rel) = relation::<f64>(op) else {
            return Err(invalid_operator(op, DataType::Float));
        };
        // IEEE semantics: NaN fails every relation except !=
        let test = |a: f64, b: f64| rel(&a, &b);
        if matches!(arg, Comparatee::Float(v) if v.is_nan()) {
            return Err(TableError::NanArgument);
        }
        match *arg {
            Comparatee::Float(v) => fill_mask(index, mask, inverse, |i| test(data[i], v)),
            Comparatee::Int(v) => {
                let v = v as f64;
                fill_mask(index, mask, inverse, |i| test(data[i], v));
            }
            Comparatee::Column(other) => {
                if let Some(other) = downcast::<FloatColumn>(other) {
                    fill_mask(index, mask, inverse, |i| test(data[i], other.data[i]));
                } else if let Some(other) = downcast::<IntColumn>(other) {
                    fill_mask(index, mask, inverse, |i| test(data[i], other.get(i) as f64));
                } else {
                    return Err(TableError::IncompatibleColumns(format!(
                        "cannot compare float column with {} column",
                        other.data_type()
                    )));
                }
            }
            _ => return Err(invalid_argument(op, DataType::Float, arg)),
        }
        Ok(())
    }
}

fn float_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn non_nan(x: f64) -> Option<f64> {
    if x.is_nan() { None } else { Some(x) }
}

impl Column for FloatColumn {
    fn data_type(&self) -> DataType {
        DataType::Float
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
            Predicate::Float(f) => {
                fill_mask(index, mask, inverse, |i| f(self.data[i]));
                Ok(())
            }
            Predicate::Float2(f) => {
                let other = binary_operand::<FloatColumn>(predicate, DataType::Float, arg)?;
                fill_mask(index, mask, inverse, |i| f(self.data[i], other.data[i]));
                Ok(())
            }
            _ => Err(invalid_predicate(predicate, DataType::Float)),
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
        Box::new(FloatComparable {
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
            (ReduceFn::Float(f), None) => Self::new(reduce_groups(groups, |i| data[i], |v| f(v))),
            (ReduceFn::Float2(f), Some(other)) => {
                let other =
                    downcast::<FloatColumn>(other).ok_or_else(|| missing_operand(function))?;
                Self::new(reduce_groups2(
                    groups,
                    |i| data[i],
                    |i| other.data[i],
                    |a, b| f(a, b),
                ))
            }
            (ReduceFn::Float2(_), None) => return Err(missing_operand(function)),
            _ => return Err(unsupported(function, DataType::Float)),
        };
        Ok(Arc::new(column))
    }

    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef> {
        let MapFn::Float(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Float));
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
        let ZipFn::Float(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Float));
        };
        let other = downcast::<FloatColumn>(other)
            .ok_or_else(|| input_mismatch(DataType::Float, other.data_type()))?;
        map_positions(index, self.len(), output, |i| f(self.data[i], other.data[i]))
    }

    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool {
        let Some(other) = downcast::<FloatColumn>(other) else {
            return false;
        };
        index.len() == other_index.len()
            && index.iter().zip(other_index).all(|(&a, &b)| {
                let (x, y) = (self.data[a as usize], other.data[b as usize]);
                x == y || (x.is_nan() && y.is_nan())
            })
    }

    fn value_at(&self, i: usize) -> Value {
        Value::from(self.data[i])
    }

    fn string_at(&self, i: usize, null_repr: &str) -> String {
        let x = self.data[i];
        if x.is_nan() {
            null_repr.to_string()
        } else {
            x.to_string()
        }
    }

    fn byte_size(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct FloatComparable<'a> {
    data: &'a [f64],
    policy: NullPolicy,
}

impl Comparable for FloatComparable<'_> {
    fn compare(&self, i: u32, j: u32) -> CompareResult {
        self.policy.compare_options(
            non_nan(self.data[i as usize]),
            non_nan(self.data[j as usize]),
            float_cmp,
        )
    }

    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher) {
        let x = self.data[i as usize];
        if x.is_nan() {
            if self.policy.nulls_equal {
                hasher.write_u64(NAN_SENTINEL);
            } else {
                hasher.write_random();
            }
        } else if x == 0.0 {
            // -0.0 and 0.0 compare equal and must hash equal
            hasher.write_u64(0);
        } else {
            hasher.write_u64(x.to_bits());
        }
    }
}
