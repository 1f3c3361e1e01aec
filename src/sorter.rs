use std::cmp::Ordering;

use crate::column::Comparable;
use crate::index::RowIndex;

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub reverse: bool,
    /// Place nulls after every other value instead of before them.
    pub nulls_last: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reverse: false,
            nulls_last: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            reverse: true,
            ..Self::asc(column)
        }
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }
}

impl From<&str> for Order {
    fn from(column: &str) -> Self {
        Self::asc(column)
    }
}

/// Chain of comparables, one per sort key. Later keys break ties of earlier ones.
pub(crate) struct Sorter<'a> {
    keys: Vec<Box<dyn Comparable + 'a>>,
}

impl<'a> Sorter<'a> {
    pub fn new(keys: Vec<Box<dyn Comparable + 'a>>) -> Self {
        Self { keys }
    }

    pub fn compare(&self, i: u32, j: u32) -> Ordering {
        for key in &self.keys {
            let ord = key.compare(i, j).ordering();
            // if it's not equal no need to compare more
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn keys(&self) -> &[Box<dyn Comparable + 'a>] {
        &self.keys
    }

    /// Returns a permuted copy of `index`. Rows equal on every key keep their relative order.
    pub fn sort(&self, index: &RowIndex) -> RowIndex {
        let mut positions = index.to_vec();
        positions.sort_by(|&a, &b| self.compare(a, b));
        RowIndex::from(positions)
    }
}
