//! Open addressing hash table that builds the groups of a GroupBy or the rows of a Distinct.
//!
//! Slots live in a power-of-two array probed linearly. Every slot stores the hash of its group
//! next to the group's position in an insertion-ordered entry list, so growing the table only
//! relocates slots by their stored hash and never rehashes a row. Groups come out in order of
//! first appearance in the input index.

use tracing::debug;

use crate::column::{Comparable, CompareResult};
use crate::hash::RowHasher;
use crate::index::RowIndex;

const EMPTY: u32 = u32::MAX;
const MIN_SIZE_EXP: u32 = 3;

/// Counters collected while building one hash table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStats {
    pub groups: usize,
    /// Number of times the table doubled.
    pub relocation_count: usize,
    /// Occupied slots probed past while relocating.
    pub relocation_collisions: usize,
    /// Occupied slots probed past while inserting rows.
    pub insert_collisions: usize,
    /// Occupied share of the final slot array.
    pub load_factor: f64,
}

/// Row positions of one group. The list is allocated when a second member arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Members {
    Singleton(u32),
    Group(Vec<u32>),
}

impl Members {
    fn first(&self) -> u32 {
        match self {
            Self::Singleton(pos) => *pos,
            Self::Group(positions) => positions[0],
        }
    }

    fn push(&mut self, pos: u32) {
        match self {
            Self::Singleton(first) => *self = Self::Group(vec![*first, pos]),
            Self::Group(positions) => positions.push(pos),
        }
    }

    fn into_index(self) -> RowIndex {
        match self {
            Self::Singleton(pos) => RowIndex::from(vec![pos]),
            Self::Group(positions) => RowIndex::from(positions),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    hash: u64,
    entry: u32,
}

impl Slot {
    const VACANT: Slot = Slot {
        hash: 0,
        entry: EMPTY,
    };

    fn is_vacant(self) -> bool {
        self.entry == EMPTY
    }
}

struct Entry {
    hash: u64,
    members: Members,
}

struct HashTable<'c, 'a> {
    slots: Vec<Slot>,
    entries: Vec<Entry>,
    comparables: &'c [Box<dyn Comparable + 'a>],
    hasher: RowHasher,
    /// Keep only the first position of each group.
    first_only: bool,
    stats: GroupStats,
}

impl<'c, 'a> HashTable<'c, 'a> {
    fn new(len: usize, comparables: &'c [Box<dyn Comparable + 'a>], first_only: bool) -> Self {
        Self {
            slots: vec![Slot::VACANT; 1 << initial_size_exp(len)],
            entries: Vec::new(),
            comparables,
            hasher: RowHasher::new(),
            first_only,
            stats: GroupStats::default(),
        }
    }

    fn row_hash(&mut self, pos: u32) -> u64 {
        self.hasher.reset();
        for c in self.comparables {
            c.hash_bytes(pos, &mut self.hasher);
        }
        self.hasher.finish()
    }

    fn rows_equal(&self, a: u32, b: u32) -> bool {
        self.comparables
            .iter()
            .all(|c| c.compare(a, b) == CompareResult::Equal)
    }

    fn insert(&mut self, pos: u32) {
        let hash = self.row_hash(pos);
        let mask = self.slots.len() - 1;
        let mut s = hash as usize & mask;
        loop {
            let slot = self.slots[s];
            if slot.is_vacant() {
                self.slots[s] = Slot {
                    hash,
                    entry: self.entries.len() as u32,
                };
                self.entries.push(Entry {
                    hash,
                    members: Members::Singleton(pos),
                });
                if self.entries.len() * 2 > self.slots.len() {
                    self.grow();
                }
                return;
            }

            let entry = slot.entry as usize;
            if slot.hash == hash && self.rows_equal(self.entries[entry].members.first(), pos) {
                if !self.first_only {
                    self.entries[entry].members.push(pos);
                }
                return;
            }

            self.stats.insert_collisions += 1;
            s = (s + 1) & mask;
        }
    }

    /// Doubles the slot array and relocates every group by its stored hash.
    fn grow(&mut self) {
        let size = self.slots.len() * 2;
        let mask = size - 1;
        let mut slots = vec![Slot::VACANT; size];
        for (i, entry) in self.entries.iter().enumerate() {
            let mut s = entry.hash as usize & mask;
            while !slots[s].is_vacant() {
                self.stats.relocation_collisions += 1;
                s = (s + 1) & mask;
            }
            slots[s] = Slot {
                hash: entry.hash,
                entry: i as u32,
            };
        }
        self.slots = slots;
        self.stats.relocation_count += 1;
    }

    fn finish_stats(&mut self) -> GroupStats {
        self.stats.groups = self.entries.len();
        self.stats.load_factor = self.entries.len() as f64 / self.slots.len() as f64;
        self.stats
    }
}

/// `max(3, bitlength(len / 4))`: about four input rows per slot, at least eight slots.
fn initial_size_exp(len: usize) -> u32 {
    let quarter = len / 4;
    let bit_length = usize::BITS - quarter.leading_zeros();
    bit_length.max(MIN_SIZE_EXP)
}

/// Inserts every row of `index` and logs the final counters.
fn build<'c, 'a>(
    index: &RowIndex,
    comparables: &'c [Box<dyn Comparable + 'a>],
    first_only: bool,
) -> (HashTable<'c, 'a>, GroupStats) {
    let mut table = HashTable::new(index.len(), comparables, first_only);
    for &pos in index.iter() {
        table.insert(pos);
    }
    let stats = table.finish_stats();
    debug!(
        rows = index.len(),
        first_only,
        groups = stats.groups,
        insert_collisions = stats.insert_collisions,
        relocations = stats.relocation_count,
        relocation_collisions = stats.relocation_collisions,
        load_factor = stats.load_factor,
        "hash grouping"
    );
    (table, stats)
}

/// Partitions `index` into groups of rows equal on every comparable.
///
/// Each group lists its positions in index order; groups are ordered by first appearance.
pub(crate) fn group_by(
    index: &RowIndex,
    comparables: &[Box<dyn Comparable + '_>],
) -> (Vec<RowIndex>, GroupStats) {
    let (table, stats) = build(index, comparables, false);

    let groups = table
        .entries
        .into_iter()
        .map(|entry| entry.members.into_index())
        .collect();
    (groups, stats)
}

/// First position of every group of `index`, in index order.
pub(crate) fn distinct(
    index: &RowIndex,
    comparables: &[Box<dyn Comparable + '_>],
) -> (RowIndex, GroupStats) {
    let (table, stats) = build(index, comparables, true);

    let firsts = table
        .entries
        .iter()
        .map(|entry| entry.members.first())
        .collect();
    (firsts, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, FloatColumn, IntColumn};

    // ─────────────────────────────────────────────────────────────
    // Test 1 : initial size
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_initial_size_exp() {
        assert_eq!(initial_size_exp(0), 3);
        assert_eq!(initial_size_exp(31), 3);
        assert_eq!(initial_size_exp(32), 4);
        assert_eq!(initial_size_exp(1000), 8);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : groups over two columns
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_group_two_columns() {
        let a = IntColumn::new(vec![0, 0, 1, 2]);
        let b = IntColumn::new(vec![0, 0, 1, 1]);
        let comparables = vec![a.comparable(false, true, false), b.comparable(false, true, false)];

        let (groups, stats) = group_by(&RowIndex::ascending(4), &comparables);

        assert_eq!(
            groups,
            vec![
                RowIndex::from(vec![0, 1]),
                RowIndex::from(vec![2]),
                RowIndex::from(vec![3])
            ]
        );
        assert_eq!(stats.groups, 3);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : growth keeps every group
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_growth_relocates() {
        let n = 1000;
        let a = IntColumn::new((0..n).map(|i| i % 300).collect());
        let comparables = vec![a.comparable(false, true, false)];

        let (groups, stats) = group_by(&RowIndex::ascending(n as usize), &comparables);

        assert_eq!(groups.len(), 300);
        assert!(stats.relocation_count > 0);
        assert!(stats.load_factor <= 0.5);
        assert_eq!(groups.iter().map(RowIndex::len).sum::<usize>(), n as usize);
        assert_eq!(groups[7].as_slice(), &[7, 307, 607, 907]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : NaN grouping follows the null policy
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_nan_grouping() {
        let f = FloatColumn::new(vec![1.0, f64::NAN, 2.0, f64::NAN]);
        let index = RowIndex::ascending(4);

        let scattered = vec![f.comparable(false, false, false)];
        assert_eq!(group_by(&index, &scattered).0.len(), 4);

        let together = vec![f.comparable(false, true, false)];
        let (groups, _) = group_by(&index, &together);
        assert_eq!(groups.len(), 3);
        assert!(groups.contains(&RowIndex::from(vec![1, 3])));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : distinct keeps first positions in index order
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_distinct_first_positions() {
        let a = IntColumn::new(vec![5, 3, 5, 1, 3]);
        let comparables = vec![a.comparable(false, true, false)];

        let (rows, stats) = distinct(&RowIndex::from(vec![4, 3, 2, 1, 0]), &comparables);
        assert_eq!(rows.as_slice(), &[4, 3, 2]);
        assert_eq!(stats.groups, 3);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : no grouping columns gives a single group
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_no_columns_single_group() {
        let (groups, _) = group_by(&RowIndex::from(vec![2, 0, 1]), &[]);
        assert_eq!(groups, vec![RowIndex::from(vec![2, 0, 1])]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 7 : group by and distinct collect the same counters
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_group_by_and_distinct_share_stats() {
        let a = IntColumn::new((0..200).map(|i| i % 150).collect());
        let comparables = vec![a.comparable(false, true, false)];
        let index = RowIndex::ascending(200);

        let (groups, grouped) = group_by(&index, &comparables);
        let (rows, deduped) = distinct(&index, &comparables);

        assert_eq!(groups.len(), 150);
        assert_eq!(rows.len(), 150);
        assert!(grouped.relocation_count > 0);
        assert_eq!(grouped, deduped);
    }
}
