//! Read-only access to one column through the row index of a table.
//!
//! Views borrow the table, so they see its current row order and cannot outlive it.

use crate::column::{BoolColumn, Column, FloatColumn, IntColumn, TextSource};
use crate::data_type::DataType;
use crate::value::Value;

/// Untyped view handing out [Value]s.
#[derive(Clone, Copy)]
pub struct ColumnView<'a> {
    column: &'a dyn Column,
    index: &'a [u32],
}

impl<'a> ColumnView<'a> {
    pub(crate) fn new(column: &'a dyn Column, index: &'a [u32]) -> Self {
        Self { column, index }
    }

    pub fn data_type(&self) -> DataType {
        self.column.data_type()
    }

    /// Value of the `i`-th visible row.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> Value {
        self.column.value_at(self.index[i] as usize)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + use<'a> {
        let column = self.column;
        self.index.iter().map(move |&i| column.value_at(i as usize))
    }
}

macro_rules! typed_view {
    ($(#[$doc:meta])* $name:ident, $column:ty, $item:ty) => {
        $(#[$doc])*
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            column: &'a $column,
            index: &'a [u32],
        }

        impl<'a> $name<'a> {
            pub(crate) fn new(column: &'a $column, index: &'a [u32]) -> Self {
                Self { column, index }
            }

            pub fn get(&self, i: usize) -> $item {
                self.column.get(self.index[i] as usize)
            }

            pub fn len(&self) -> usize {
                self.index.len()
            }

            pub fn is_empty(&self) -> bool {
                self.index.is_empty()
            }

            pub fn iter(&self) -> impl Iterator<Item = $item> + use<'a> {
                let column = self.column;
                self.index.iter().map(move |&i| column.get(i as usize))
            }
        }
    };
}

typed_view!(IntView, IntColumn, i64);
typed_view!(
    /// Float cells, `NaN` for null.
    FloatView,
    FloatColumn,
    f64
);
typed_view!(BoolView, BoolColumn, bool);

/// Cells of a String or Enum column, `None` for null.
#[derive(Clone, Copy)]
pub struct StringView<'a> {
    source: TextSource<'a>,
    index: &'a [u32],
}

impl<'a> StringView<'a> {
    pub(crate) fn new(source: TextSource<'a>, index: &'a [u32]) -> Self {
        Self { source, index }
    }

    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.source.get(self.index[i] as usize)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&'a str>> + use<'a> {
        let source = self.source;
        self.index.iter().map(move |&i| source.get(i as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{EnumColumn, StringColumn};

    #[test]
    fn test_views_follow_index() {
        let ints = IntColumn::new(vec![10, 20, 30]);
        let index = [2u32, 0];

        let view = IntView::new(&ints, &index);
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![30, 10]);
        assert_eq!(view.get(1), 10);

        let untyped = ColumnView::new(&ints, &index);
        assert_eq!(untyped.get(0), Value::Int(30));
        assert_eq!(untyped.data_type(), DataType::Int);
    }

    #[test]
    fn test_string_view_reads_both_representations() {
        let plain = StringColumn::from_options([Some("a"), None]).unwrap();
        let encoded = EnumColumn::from_options([None, Some("b")], None).unwrap();
        let index = [1u32, 0];

        let plain_view = StringView::new(TextSource::String(&plain), &index);
        assert_eq!(plain_view.iter().collect::<Vec<_>>(), vec![None, Some("a")]);

        let enum_view = StringView::new(TextSource::Enum(&encoded), &index);
        assert_eq!(enum_view.iter().collect::<Vec<_>>(), vec![Some("b"), None]);
    }
}
