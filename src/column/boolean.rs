use std::any::Any;
use std::sync::Arc;

use allocative::{Allocative, Key, Visitor};
use bitvec::prelude::*;

use super::{
    Column, ColumnRef, Comparable, CompareResult, NullPolicy, binary_operand, downcast, fill_mask,
    invalid_argument, invalid_operator, invalid_predicate,
};
use crate::aggregation::{ReduceFn, group_sizes, missing_operand, reduce_groups, reduce_groups2, unsupported};
use crate::apply::{MapFn, ZipFn, input_mismatch, map_positions};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::hash::RowHasher;
use crate::index::{Mask, RowIndex};
use crate::predicate::{Comparatee, Operator, Predicate};
use crate::value::Value;

/// Booleans packed one bit per row. There is no null value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoolColumn {
    data: BitVec,
}

impl BoolColumn {
    pub fn new(data: Vec<bool>) -> Self {
        Self {
            data: data.into_iter().collect(),
        }
    }

    pub fn from_bits(data: BitVec) -> Self {
        Self { data }
    }

    pub fn constant(value: bool, count: usize) -> Self {
        Self::from_bits(BitVec::repeat(value, count))
    }

    pub fn get(&self, i: usize) -> bool {
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
            Operator::IsNull => fill_mask(index, mask, inverse, |_| false),
            Operator::IsNotNull => fill_mask(index, mask, inverse, |_| true),
            Operator::Eq | Operator::Neq => {
                let want_equal = op == Operator::Eq;
                match *arg {
                    Comparatee::Bool(v) => {
                        fill_mask(index, mask, inverse, |i| (data[i] == v) == want_equal);
                    }
                    Comparatee::Column(other) => {
                        let other = downcast::<BoolColumn>(other).ok_or_else(|| {
                            TableError::IncompatibleColumns(format!(
                                "cannot compare bool column with {} column",
                                other.data_type()
                            ))
                        })?;
                        fill_mask(index, mask, inverse, |i| {
                            (data[i] == other.data[i]) == want_equal
                        });
                    }
                    _ => return Err(invalid_argument(op, DataType::Bool, arg)),
                }
            }
            _ => return Err(invalid_operator(op, DataType::Bool)),
        }
        Ok(())
    }
}

impl Allocative for BoolColumn {
    fn visit<'a, 'b: 'a>(&self, visitor: &'a mut Visitor<'b>) {
        let mut visitor = visitor.enter_self_sized::<Self>();
        {
            let mut bits = visitor.enter_unique(Key::new("bits"), std::mem::size_of::<usize>());
            bits.visit_simple(Key::new("words"), std::mem::size_of_val(self.data.as_raw_slice()));
            bits.exit();
        }
        visitor.exit();
    }
}

impl Column for BoolColumn {
    fn data_type(&self) -> DataType {
        DataType::Bool
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
            Predicate::Bool(f) => {
                fill_mask(index, mask, inverse, |i| f(self.data[i]));
                Ok(())
            }
            Predicate::Bool2(f) => {
                let other = binary_operand::<BoolColumn>(predicate, DataType::Bool, arg)?;
                fill_mask(index, mask, inverse, |i| f(self.data[i], other.data[i]));
                Ok(())
            }
            _ => Err(invalid_predicate(predicate, DataType::Bool)),
        }
    }

    fn subset(&self, index: &[u32]) -> ColumnRef {
        Arc::new(Self::from_bits(
            index.iter().map(|&i| self.data[i as usize]).collect(),
        ))
    }

    fn comparable(
        &self,
        reverse: bool,
        nulls_equal: bool,
        nulls_last: bool,
    ) -> Box<dyn Comparable + '_> {
        Box::new(BoolComparable {
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
        let values = match (function, other) {
            (ReduceFn::Count, _) => return Ok(group_sizes(groups)),
            (ReduceFn::Bool(f), None) => reduce_groups(groups, |i| data[i], |v| f(v)),
            (ReduceFn::Bool2(f), Some(other)) => {
                let other =
                    downcast::<BoolColumn>(other).ok_or_else(|| missing_operand(function))?;
                reduce_groups2(groups, |i| data[i], |i| other.data[i], |a, b| f(a, b))
            }
            (ReduceFn::Bool2(_), None) => return Err(missing_operand(function)),
            _ => return Err(unsupported(function, DataType::Bool)),
        };
        Ok(Arc::new(Self::new(values)))
    }

    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef> {
        let MapFn::Bool(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Bool));
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
        let ZipFn::Bool(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Bool));
        };
        let other = downcast::<BoolColumn>(other)
            .ok_or_else(|| input_mismatch(DataType::Bool, other.data_type()))?;
        map_positions(index, self.len(), output, |i| f(self.data[i], other.data[i]))
    }

    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool {
        let Some(other) = downcast::<BoolColumn>(other) else {
            return false;
        };
        index.len() == other_index.len()
            && index
                .iter()
                .zip(other_index)
                .all(|(&a, &b)| self.data[a as usize] == other.data[b as usize])
    }

    fn value_at(&self, i: usize) -> Value {
        Value::Bool(self.data[i])
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

struct BoolComparable<'a> {
    data: &'a BitSlice,
    policy: NullPolicy,
}

impl Comparable for BoolComparable<'_> {
    fn compare(&self, i: u32, j: u32) -> CompareResult {
        self.policy
            .order(self.data[i as usize].cmp(&self.data[j as usize]))
    }

    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher) {
        hasher.write_u8(self.data[i as usize] as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::new_mask;

    fn run(column: &BoolColumn, predicate: Predicate, arg: Comparatee<'_>) -> Result<Vec<usize>> {
        let index: Vec<u32> = (0..column.len() as u32).collect();
        let mut mask = new_mask(index.len());
        column.filter(&index, &predicate, &arg, false, &mut mask)?;
        Ok(mask.iter_ones().collect())
    }

    #[test]
    fn test_equality_filters() {
        let c = BoolColumn::new(vec![true, false, true]);
        let other = BoolColumn::new(vec![true, true, false]);

        assert_eq!(run(&c, Operator::Eq.into(), Comparatee::Bool(true)).unwrap(), vec![0, 2]);
        assert_eq!(run(&c, Operator::Neq.into(), Comparatee::Bool(true)).unwrap(), vec![1]);
        assert_eq!(run(&c, Operator::Eq.into(), Comparatee::Column(&other)).unwrap(), vec![0]);
        assert!(run(&c, Operator::IsNull.into(), Comparatee::None).unwrap().is_empty());
    }

    #[test]
    fn test_ordering_operators_rejected() {
        let c = BoolColumn::new(vec![true]);

        assert!(matches!(
            run(&c, Operator::Lt.into(), Comparatee::Bool(true)),
            Err(TableError::InvalidOperator { .. })
        ));
        assert!(matches!(
            run(&c, Operator::Eq.into(), Comparatee::Int(1)),
            Err(TableError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_user_predicate() {
        let c = BoolColumn::new(vec![true, false]);
        assert_eq!(run(&c, Predicate::bool(|b| !b), Comparatee::None).unwrap(), vec![1]);
    }

    #[test]
    fn test_false_sorts_before_true() {
        let c = BoolColumn::new(vec![true, false]);

        assert_eq!(c.comparable(false, true, false).compare(0, 1), CompareResult::Greater);
        assert_eq!(c.comparable(true, true, false).compare(0, 1), CompareResult::Less);
    }

    #[test]
    fn test_majority_and_subset() {
        let c = BoolColumn::new(vec![true, false, true, true]);
        let groups = vec![RowIndex::from(vec![0, 1]), RowIndex::from(vec![2, 3])];
        let any = ReduceFn::bool(|v| v.iter().any(|&b| b));

        let result = c.aggregate(&groups, &any, None).unwrap();
        assert_eq!(result.value_at(0), Value::Bool(true));

        let sub = c.subset(&[1, 1]);
        assert_eq!(sub.value_at(0), Value::Bool(false));
        assert_eq!(sub.len(), 2);
    }

    #[test]
    fn test_byte_size_counts_words() {
        let c = BoolColumn::constant(true, 1000);
        assert!(c.byte_size() >= 1000 / 8);
    }
}
