//! Row indices: which underlying rows a table exposes, and in what order.

use std::ops::Deref;

use bitvec::prelude::*;

use crate::error::{Result, TableError};

/// Boolean mask with one bit per entry of a [RowIndex]. A set bit keeps the row.
pub type Mask = BitVec;

/// Allocates an all-false mask for an index of `len` entries.
pub fn new_mask(len: usize) -> Mask {
    BitVec::repeat(false, len)
}

/// Ordered sequence of row positions into full-length column storage.
///
/// Positions need not be sorted or contiguous. Every position must be smaller than the length
/// of the columns the index is used with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex(Vec<u32>);

impl RowIndex {
    /// `0, 1, ..., len - 1`
    pub fn ascending(len: usize) -> Self {
        Self((0..len as u32).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }

    /// Keeps the positions whose mask bit is set, preserving their relative order.
    pub fn compact(&self, mask: &Mask) -> RowIndex {
        debug_assert_eq!(mask.len(), self.0.len());
        let mut result = Vec::with_capacity(mask.count_ones());
        result.extend(mask.iter_ones().map(|k| self.0[k]));
        Self(result)
    }

    /// Returns `true` if `self` can be obtained from `other` by deleting entries.
    pub fn is_subsequence_of(&self, other: &RowIndex) -> bool {
        let mut cursor = 0;
        for &pos in &other.0 {
            if cursor < self.0.len() && self.0[cursor] == pos {
                cursor += 1;
            }
        }
        cursor == self.0.len()
    }

    /// Union of order-preserving subsequences of `self`, in the order of `self`.
    ///
    /// One co-walk over `self` advances a cursor per part. A part that is not a subsequence of
    /// `self` leaves its cursor short of the end and is reported as an error.
    pub fn union_of(&self, parts: &[RowIndex]) -> Result<RowIndex> {
        let mut cursors = vec![0usize; parts.len()];
        let capacity = parts.iter().map(RowIndex::len).max().unwrap_or(0);
        let mut result = Vec::with_capacity(capacity);

        for &pos in &self.0 {
            let mut found = false;
            for (part, cursor) in parts.iter().zip(cursors.iter_mut()) {
                if *cursor < part.0.len() && part.0[*cursor] == pos {
                    *cursor += 1;
                    found = true;
                }
            }
            if found {
                result.push(pos);
            }
        }

        if parts.iter().zip(&cursors).any(|(part, &c)| c != part.len()) {
            return Err(TableError::Internal(
                "or: sub clause result is not an ordered subset of its input".into(),
            ));
        }
        Ok(Self(result))
    }

    /// Entries of `self` that are absent from `removed`, which must be a subsequence of `self`.
    pub fn difference(&self, removed: &RowIndex) -> Result<RowIndex> {
        let mut result = Vec::with_capacity(self.0.len().saturating_sub(removed.len()));
        let mut cursor = 0;
        for &pos in &self.0 {
            if cursor < removed.0.len() && removed.0[cursor] == pos {
                cursor += 1;
            } else {
                result.push(pos);
            }
        }

        if cursor != removed.len() {
            return Err(TableError::Internal(
                "not: sub clause result is not an ordered subset of its input".into(),
            ));
        }
        Ok(Self(result))
    }

    /// Entries `[start, end)` as a new index.
    pub fn slice(&self, start: usize, end: usize) -> RowIndex {
        Self(self.0[start..end].to_vec())
    }

    /// Bytes held by the index.
    pub fn byte_size(&self) -> usize {
        self.0.capacity() * std::mem::size_of::<u32>()
    }
}

impl Deref for RowIndex {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for RowIndex {
    fn from(v: Vec<u32>) -> Self {
        Self(v)
    }
}

impl FromIterator<u32> for RowIndex {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ix(v: &[u32]) -> RowIndex {
        RowIndex::from(v.to_vec())
    }

    #[test]
    fn test_ascending() {
        assert_eq!(RowIndex::ascending(4).as_slice(), &[0, 1, 2, 3]);
        assert!(RowIndex::ascending(0).is_empty());
    }

    #[test]
    fn test_compact_preserves_order() {
        let index = ix(&[7, 3, 9, 1]);
        let mut mask = new_mask(4);
        mask.set(0, true);
        mask.set(3, true);

        assert_eq!(index.compact(&mask), ix(&[7, 1]));
    }

    #[test]
    fn test_union_walks_in_original_order() {
        let original = ix(&[4, 0, 3, 1, 2]);
        let a = ix(&[4, 1]);
        let b = ix(&[0, 1, 2]);

        assert_eq!(original.union_of(&[a, b]).unwrap(), ix(&[4, 0, 1, 2]));
    }

    #[test]
    fn test_union_rejects_reordered_part() {
        let original = ix(&[0, 1, 2]);
        let reordered = ix(&[2, 0]);

        assert!(matches!(
            original.union_of(&[reordered]),
            Err(TableError::Internal(_))
        ));
    }

    #[test]
    fn test_difference() {
        let original = ix(&[5, 2, 8, 1]);

        assert_eq!(original.difference(&ix(&[2, 1])).unwrap(), ix(&[5, 8]));
        assert_eq!(original.difference(&ix(&[])).unwrap(), original);
        assert!(original.difference(&ix(&[1, 2])).is_err());
    }

    #[test]
    fn test_subsequence() {
        let original = ix(&[3, 1, 2]);
        assert!(ix(&[3, 2]).is_subsequence_of(&original));
        assert!(!ix(&[2, 3]).is_subsequence_of(&original));
        assert!(ix(&[]).is_subsequence_of(&original));
    }
}
