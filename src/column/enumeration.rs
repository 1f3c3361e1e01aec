use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use allocative::Allocative;

use super::string::hash_null;
use super::{
    Column, ColumnRef, Comparable, CompareResult, Matcher, NullPolicy, StringColumn, TextSource,
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

/// Largest number of distinct values an enum column can hold.
pub const MAX_CARDINALITY: usize = 255;
const NULL_CODE: u8 = MAX_CARDINALITY as u8;

#[derive(Debug, Clone, PartialEq, Eq, Default, Allocative)]
struct Dictionary {
    values: Vec<String>,
    strict: bool,
}

/// Dictionary encoded strings: one code byte per row, code 255 is null.
///
/// A strict dictionary is fixed when the column is built and rejects other values. A dynamic
/// one grows in order of first appearance. Ordering operators and sorting follow dictionary
/// order, not string order.
#[derive(Debug, Clone, Default, Allocative)]
pub struct EnumColumn {
    codes: Vec<u8>,
    dictionary: Arc<Dictionary>,
}

/// Incremental builder for an [EnumColumn].
#[derive(Debug)]
pub struct EnumFactory {
    codes: Vec<u8>,
    values: Vec<String>,
    lookup: HashMap<String, u8>,
    strict: bool,
}

impl EnumFactory {
    /// `dictionary` fixes the allowed values in order. `None` or an empty list builds a dynamic
    /// dictionary.
    ///
    /// # Errors
    ///
    /// Returns [TableError::EnumCardinalityExceeded] if the dictionary has more than
    /// [MAX_CARDINALITY] values.
    pub fn new(dictionary: Option<Vec<String>>, size_hint: usize) -> Result<Self> {
        let values = dictionary.unwrap_or_default();
        if values.len() > MAX_CARDINALITY {
            return Err(TableError::EnumCardinalityExceeded {
                max: MAX_CARDINALITY,
            });
        }
        let mut lookup = HashMap::with_capacity(values.len());
        for (code, value) in values.iter().enumerate() {
            lookup.entry(value.clone()).or_insert(code as u8);
        }
        Ok(Self {
            codes: Vec::with_capacity(size_hint),
            strict: !values.is_empty(),
            values,
            lookup,
        })
    }

    pub fn append(&mut self, value: Option<&str>) -> Result<()> {
        let code = self.code_for(value)?;
        self.codes.push(code);
        Ok(())
    }

    fn code_for(&mut self, value: Option<&str>) -> Result<u8> {
        let Some(value) = value else {
            return Ok(NULL_CODE);
        };
        if let Some(&code) = self.lookup.get(value) {
            return Ok(code);
        }
        if self.strict {
            return Err(TableError::UnknownEnumValue(value.to_string()));
        }
        if self.values.len() >= MAX_CARDINALITY {
            return Err(TableError::EnumCardinalityExceeded {
                max: MAX_CARDINALITY,
            });
        }
        let code = self.values.len() as u8;
        self.values.push(value.to_string());
        self.lookup.insert(value.to_string(), code);
        Ok(code)
    }

    pub fn finish(self) -> EnumColumn {
        EnumColumn {
            codes: self.codes,
            dictionary: Arc::new(Dictionary {
                values: self.values,
                strict: self.strict,
            }),
        }
    }
}

impl EnumColumn {
    /// Column without nulls. See [EnumFactory::new] for `dictionary`.
    pub fn new<S: AsRef<str>>(
        values: impl IntoIterator<Item = S>,
        dictionary: Option<Vec<String>>,
    ) -> Result<Self> {
        Self::from_options(values.into_iter().map(Some), dictionary)
    }

    /// Column where `None` entries are null.
    pub fn from_options<S: AsRef<str>>(
        values: impl IntoIterator<Item = Option<S>>,
        dictionary: Option<Vec<String>>,
    ) -> Result<Self> {
        let values = values.into_iter();
        let mut factory = EnumFactory::new(dictionary, values.size_hint().0)?;
        for value in values {
            factory.append(value.as_ref().map(|s| s.as_ref()))?;
        }
        Ok(factory.finish())
    }

    pub fn constant(
        value: Option<&str>,
        count: usize,
        dictionary: Option<Vec<String>>,
    ) -> Result<Self> {
        let mut factory = EnumFactory::new(dictionary, count)?;
        let code = factory.code_for(value)?;
        factory.codes.resize(count, code);
        Ok(factory.finish())
    }

    /// Rows `index` of every part, one part after the other.
    ///
    /// The dictionary holds the values of the first part's dictionary, then the values of each
    /// later dictionary not seen yet, so codes of the first part keep their order. It is strict
    /// only when every part is strict.
    ///
    /// # Errors
    ///
    /// Returns [TableError::EnumCardinalityExceeded] if the merged dictionary is too large.
    pub fn concat(parts: &[(&EnumColumn, &[u32])]) -> Result<Self> {
        let mut values: Vec<String> = Vec::new();
        for (column, _) in parts {
            for value in column.dictionary() {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }

        let len = parts.iter().map(|(_, index)| index.len()).sum();
        let mut factory = EnumFactory::new(Some(values), len)?;
        factory.strict = parts.iter().all(|(column, _)| column.is_strict());
        for (column, index) in parts {
            for &i in index.iter() {
                factory.append(column.get(i as usize))?;
            }
        }
        Ok(factory.finish())
    }

    /// Value at row `i`, `None` for null.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.decode(self.codes[i])
    }

    /// Dictionary values in code order.
    pub fn dictionary(&self) -> &[String] {
        &self.dictionary.values
    }

    pub fn is_strict(&self) -> bool {
        self.dictionary.strict
    }

    fn decode(&self, code: u8) -> Option<&str> {
        if code == NULL_CODE {
            None
        } else {
            self.dictionary.values.get(code as usize).map(String::as_str)
        }
    }

    fn code_of(&self, value: &str) -> Option<u8> {
        self.dictionary
            .values
            .iter()
            .position(|v| v == value)
            .map(|p| p as u8)
    }

    /// Evaluates `f` once per dictionary entry and once for null, indexed by code.
    fn code_table(&self, f: impl Fn(Option<&str>) -> bool) -> [bool; 256] {
        let mut table = [false; 256];
        for (code, value) in self.dictionary.values.iter().enumerate() {
            table[code] = f(Some(value));
        }
        table[NULL_CODE as usize] = f(None);
        table
    }

    fn filter_codes(&self, index: &[u32], mask: &mut Mask, inverse: bool, table: &[bool; 256]) {
        let codes = &self.codes;
        fill_mask(index, mask, inverse, |i| table[codes[i] as usize]);
    }

    fn filter_op(
        &self,
        op: Operator,
        arg: &Comparatee<'_>,
        index: &[u32],
        inverse: bool,
        mask: &mut Mask,
    ) -> Result<()> {
        let codes = &self.codes;
        match op {
            Operator::IsNull => {
                fill_mask(index, mask, inverse, |i| codes[i] == NULL_CODE);
                return Ok(());
            }
            Operator::IsNotNull => {
                fill_mask(index, mask, inverse, |i| codes[i] != NULL_CODE);
                return Ok(());
            }
            Operator::In => {
                let Comparatee::StrSet(values) = arg else {
                    return Err(invalid_argument(op, DataType::Enum, arg));
                };
                let table =
                    self.code_table(|v| v.is_some_and(|v| values.iter().any(|s| s == v)));
                self.filter_codes(index, mask, inverse, &table);
                return Ok(());
            }
            Operator::Like | Operator::ILike => {
                let Comparatee::Str(pattern) = *arg else {
                    return Err(invalid_argument(op, DataType::Enum, arg));
                };
                let matcher = Matcher::new(pattern, op == Operator::Like)?;
                let table = self.code_table(|v| v.is_some_and(|v| matcher.matches(v)));
                self.filter_codes(index, mask, inverse, &table);
                return Ok(());
            }
            _ => {}
        }

        let Some(rel) = relation::<u8>(op) else {
            return Err(invalid_operator(op, DataType::Enum));
        };
        // a null cell differs from every value
        let null_matches = op == Operator::Neq;
        match *arg {
            Comparatee::Str(value) => match self.code_of(value) {
                Some(code) => fill_mask(index, mask, inverse, |i| match codes[i] {
                    NULL_CODE => null_matches,
                    c => rel(&c, &code),
                }),
                None if self.is_strict() => {
                    return Err(TableError::UnknownEnumValue(value.to_string()));
                }
                None => match op {
                    Operator::Eq => fill_mask(index, mask, inverse, |_| false),
                    Operator::Neq => fill_mask(index, mask, inverse, |_| true),
                    _ => return Err(TableError::UnknownEnumValue(value.to_string())),
                },
            },
            Comparatee::Column(other) => {
                if let Some(other) = downcast::<EnumColumn>(other) {
                    if self.dictionary.values != other.dictionary.values {
                        return Err(TableError::IncompatibleColumns(
                            "enum columns with different dictionaries".into(),
                        ));
                    }
                    fill_mask(index, mask, inverse, |i| match (codes[i], other.codes[i]) {
                        (NULL_CODE, _) | (_, NULL_CODE) => null_matches,
                        (a, b) => rel(&a, &b),
                    });
                } else if let Some(other) = downcast::<StringColumn>(other) {
                    let srel = relation::<str>(op).ok_or_else(|| invalid_operator(op, DataType::Enum))?;
                    fill_mask(index, mask, inverse, |i| match (self.get(i), other.get(i)) {
                        (Some(a), Some(b)) => srel(a, b),
                        _ => null_matches,
                    });
                } else {
                    return Err(TableError::IncompatibleColumns(format!(
                        "cannot compare enum column with {} column",
                        other.data_type()
                    )));
                }
            }
            _ => return Err(invalid_argument(op, DataType::Enum, arg)),
        }
        Ok(())
    }
}

impl Column for EnumColumn {
    fn data_type(&self) -> DataType {
        DataType::Enum
    }

    fn len(&self) -> usize {
        self.codes.len()
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
                let table = self.code_table(|v| f(v));
                self.filter_codes(index, mask, inverse, &table);
                Ok(())
            }
            Predicate::Str2(f) => {
                let other = match *arg {
                    Comparatee::Column(other) => TextSource::of(other),
                    _ => None,
                };
                let other = other.ok_or_else(|| {
                    TableError::IncompatibleColumns(format!(
                        "{predicate} needs a string or enum column, got {}",
                        arg.describe()
                    ))
                })?;
                fill_mask(index, mask, inverse, |i| f(self.get(i), other.get(i)));
                Ok(())
            }
            _ => Err(invalid_predicate(predicate, DataType::Enum)),
        }
    }

    fn subset(&self, index: &[u32]) -> ColumnRef {
        Arc::new(Self {
            codes: gather(&self.codes, index),
            dictionary: Arc::clone(&self.dictionary),
        })
    }

    fn comparable(
        &self,
        reverse: bool,
        nulls_equal: bool,
        nulls_last: bool,
    ) -> Box<dyn Comparable + '_> {
        Box::new(EnumComparable {
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
            _ => return Err(unsupported(function, DataType::Enum)),
        };
        Ok(Arc::new(StringColumn::from_options(values)?))
    }

    fn apply1(&self, f: &MapFn, output: DataType, index: &[u32]) -> Result<ColumnRef> {
        let MapFn::Str(f) = f else {
            return Err(input_mismatch(f.input_type(), DataType::Enum));
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
            return Err(input_mismatch(f.input_type(), DataType::Enum));
        };
        let other =
            TextSource::of(other).ok_or_else(|| input_mismatch(DataType::String, other.data_type()))?;
        map_positions(index, self.len(), output, |i| f(self.get(i), other.get(i)))
    }

    fn equals(&self, index: &[u32], other: &dyn Column, other_index: &[u32]) -> bool {
        let Some(other) = downcast::<EnumColumn>(other) else {
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

struct EnumComparable<'a> {
    column: &'a EnumColumn,
    policy: NullPolicy,
}

impl EnumComparable<'_> {
    fn code(&self, i: u32) -> Option<u8> {
        let code = self.column.codes[i as usize];
        (code != NULL_CODE).then_some(code)
    }
}

impl Comparable for EnumComparable<'_> {
    fn compare(&self, i: u32, j: u32) -> CompareResult {
        self.policy
            .compare_options(self.code(i), self.code(j), |a: u8, b: u8| a.cmp(&b))
    }

    fn hash_bytes(&self, i: u32, hasher: &mut RowHasher) {
        match self.code(i) {
            Some(code) => hasher.write_u8(code),
            None => hash_null(self.policy.nulls_equal, hasher),
        }
    }
}
