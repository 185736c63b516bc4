//! # Sv39 page tables
//!
//! A virtual address selects one entry per level; the three 9-bit indices
//! sit above the 12-bit page offset:
//!
//! ```text
//! | 63‒39 (zero) | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |              |  L2   |  L1   |  L0   | offset |
//! ```
//!
//! The walk always starts at the root (L2) and ends at L0, where the leaf
//! lives; superpages are not used.

use core::fmt;

use kernel_memory_addresses::VirtualAddress;

use crate::PageTableEntry;

/// Entries per table.
pub const ENTRIES: usize = 512;

/// Level of a table in the Sv39 tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Level {
    /// Leaf tables.
    L0 = 0,
    L1 = 1,
    /// The root.
    L2 = 2,
}

impl Level {
    /// Levels in walk order, root first.
    pub const WALK: [Self; 3] = [Self::L2, Self::L1, Self::L0];

    /// Bit position of this level's index inside a virtual address.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        12 + 9 * self as u32
    }

    /// The level below, or `None` for leaf tables.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::L2 => Some(Self::L1),
            Self::L1 => Some(Self::L0),
            Self::L0 => None,
        }
    }
}

/// Index into a table at some level. Range is `0..512` (checked in debug
/// builds).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableIndex(u16);

impl TableIndex {
    /// Extracts the index of `level` from `va`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn of(va: VirtualAddress, level: Level) -> Self {
        Self::new(((va.as_u64() >> level.shift()) & 0x1FF) as u16)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!(v < 512);
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableIndex({})", self.0)
    }
}

/// One page-table page: 512 entries, 4 KiB-aligned.
#[doc(alias = "pagetable_t")]
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [PageTableEntry; ENTRIES],
}

const _: () = assert!(size_of::<PageTable>() == 4096);

impl PageTable {
    /// A table with every entry invalid.
    #[inline]
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            entries: [PageTableEntry::new(); ENTRIES],
        }
    }

    /// Invalidate every entry.
    #[inline]
    pub fn zero(&mut self) {
        self.entries.fill(PageTableEntry::new());
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, i: TableIndex) -> PageTableEntry {
        self.entries[i.as_usize()]
    }

    #[inline]
    pub const fn set(&mut self, i: TableIndex, e: PageTableEntry) {
        self.entries[i.as_usize()] = e;
    }

    #[inline]
    pub const fn entry_mut(&mut self, i: TableIndex) -> &mut PageTableEntry {
        &mut self.entries[i.as_usize()]
    }

    /// Valid entries with their index.
    pub fn valid_entries(&self) -> impl Iterator<Item = (usize, PageTableEntry)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, e)| e.valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_per_level() {
        let va = VirtualAddress::new((3 << 30) | (5 << 21) | (7 << 12) | 0x123);
        assert_eq!(TableIndex::of(va, Level::L2).as_usize(), 3);
        assert_eq!(TableIndex::of(va, Level::L1).as_usize(), 5);
        assert_eq!(TableIndex::of(va, Level::L0).as_usize(), 7);
    }

    #[test]
    fn trampoline_sits_below_maxva() {
        let trampoline = VirtualAddress::new(kernel_info::memory::TRAMPOLINE);
        assert_eq!(TableIndex::of(trampoline, Level::L2).as_usize(), 255);
        assert_eq!(TableIndex::of(trampoline, Level::L1).as_usize(), 511);
        assert_eq!(TableIndex::of(trampoline, Level::L0).as_usize(), 511);
    }

    #[test]
    fn walk_order() {
        assert_eq!(Level::L2.next(), Some(Level::L1));
        assert_eq!(Level::L0.next(), None);
        assert_eq!(Level::WALK[0].shift(), 30);
    }
}
