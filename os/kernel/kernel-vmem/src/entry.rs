use bitfield_struct::bitfield;
use kernel_alloc::Frame;

/// A single Sv39 page-table entry in its raw bitfield form.
///
/// The same layout is used at all three levels. An entry is either
///
/// - **invalid** (`V = 0`): every other bit is ignored by hardware,
/// - **non-leaf** (`V = 1`, `R = W = X = 0`): `ppn` names the next-level table,
/// - **leaf** (`V = 1` and at least one of `R`, `W`, `X`): `ppn` names the
///   mapped data frame.
///
/// ### Bit layout
///
/// | Bits   | Name    | Meaning |
/// |--------|---------|---------|
/// | 0      | `V`     | Valid |
/// | 1      | `R`     | Readable |
/// | 2      | `W`     | Writable |
/// | 3      | `X`     | Executable |
/// | 4      | `U`     | Accessible from U-mode |
/// | 5      | `G`     | Global mapping |
/// | 6      | `A`     | Accessed |
/// | 7      | `D`     | Dirty |
/// | 8      | `COW`   | Software: shared copy-on-write page (first RSW bit) |
/// | 9      | `RSW`   | Software, unused |
/// | 10–53  | `PPN`   | Physical page number |
/// | 54–63  | –       | Reserved, must be zero |
///
/// ### Example
/// ```rust
/// # use kernel_vmem::PageTableEntry;
/// # use kernel_memory_addresses::{PhysicalAddress, Size4K};
/// let frame = PhysicalAddress::new(0x8020_0000).page::<Size4K>();
/// let e = PageTableEntry::leaf(frame, PageTableEntry::user_rw());
/// assert!(e.valid() && e.is_leaf());
/// assert_eq!(e.frame(), frame);
/// assert_eq!(e.into_bits(), (0x80200 << 10) | 0b1_0111);
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageTableEntry {
    /// Valid (V, bit 0).
    pub valid: bool,

    /// Readable (R, bit 1).
    pub readable: bool,

    /// Writable (W, bit 2).
    ///
    /// Cleared on both sides of a copy-on-write share; restored when the
    /// fault is resolved.
    pub writable: bool,

    /// Executable (X, bit 3).
    pub executable: bool,

    /// User (U, bit 4).
    ///
    /// Only U-mode may access the page. Supervisor code reaches user memory
    /// through the copy helpers instead.
    pub user: bool,

    /// Global (G, bit 5).
    pub global: bool,

    /// Accessed (A, bit 6).
    pub accessed: bool,

    /// Dirty (D, bit 7).
    pub dirty: bool,

    /// Copy-on-write tag (RSW bit 8).
    ///
    /// Set on a read-only leaf whose frame is shared between address spaces
    /// that each believe they own a writable page.
    pub cow: bool,

    /// Second software bit (RSW bit 9).
    #[bits(1)]
    pub rsw: u8,

    /// Physical page number (bits 10..=53).
    #[bits(44)]
    ppn: u64,

    #[bits(10)]
    __reserved: u16,
}

impl PageTableEntry {
    /// A leaf mapping `frame` with the permission bits of `perm`; the
    /// valid bit is set, any PPN in `perm` is replaced.
    #[inline]
    #[must_use]
    pub const fn leaf(frame: Frame, perm: Self) -> Self {
        perm.flags().with_valid(true).with_ppn(frame.ppn())
    }

    /// A non-leaf entry pointing at the table in `frame`.
    #[inline]
    #[must_use]
    pub const fn table(frame: Frame) -> Self {
        Self::new().with_valid(true).with_ppn(frame.ppn())
    }

    /// The frame this entry points to (a table or a data page).
    #[inline]
    #[must_use]
    pub const fn frame(self) -> Frame {
        Frame::from_ppn(self.ppn())
    }

    /// The flag bits (0..=9) without the PPN.
    #[inline]
    #[must_use]
    pub const fn flags(self) -> Self {
        self.with_ppn(0)
    }

    /// Whether any of R, W or X is set.
    #[inline]
    #[must_use]
    pub const fn has_access(self) -> bool {
        self.readable() || self.writable() || self.executable()
    }

    /// A valid entry with access bits, i.e. one that maps data.
    #[inline]
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        self.valid() && self.has_access()
    }

    /// User read/write data.
    #[inline]
    #[must_use]
    pub const fn user_rw() -> Self {
        Self::new()
            .with_readable(true)
            .with_writable(true)
            .with_user(true)
    }

    /// User code.
    #[inline]
    #[must_use]
    pub const fn user_rx() -> Self {
        Self::new()
            .with_readable(true)
            .with_executable(true)
            .with_user(true)
    }

    /// User code that also writes to its own pages.
    #[inline]
    #[must_use]
    pub const fn user_rwx() -> Self {
        Self::user_rw().with_executable(true)
    }

    /// Supervisor-only data, e.g. the trap frame.
    #[inline]
    #[must_use]
    pub const fn kernel_rw() -> Self {
        Self::new().with_readable(true).with_writable(true)
    }

    /// Supervisor-only code, e.g. the trampoline.
    #[inline]
    #[must_use]
    pub const fn kernel_rx() -> Self {
        Self::new().with_readable(true).with_executable(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::{PhysicalAddress, Size4K};

    #[test]
    fn hardware_bit_positions() {
        assert_eq!(PageTableEntry::new().with_valid(true).into_bits(), 1 << 0);
        assert_eq!(PageTableEntry::new().with_readable(true).into_bits(), 1 << 1);
        assert_eq!(PageTableEntry::new().with_writable(true).into_bits(), 1 << 2);
        assert_eq!(PageTableEntry::new().with_executable(true).into_bits(), 1 << 3);
        assert_eq!(PageTableEntry::new().with_user(true).into_bits(), 1 << 4);
        assert_eq!(PageTableEntry::new().with_global(true).into_bits(), 1 << 5);
        assert_eq!(PageTableEntry::new().with_accessed(true).into_bits(), 1 << 6);
        assert_eq!(PageTableEntry::new().with_dirty(true).into_bits(), 1 << 7);
        assert_eq!(PageTableEntry::new().with_cow(true).into_bits(), 1 << 8);
    }

    #[test]
    fn ppn_occupies_bits_10_to_53() {
        let frame = PhysicalAddress::new(0xF_FFFF_FFFF_F000).page::<Size4K>();
        let e = PageTableEntry::table(frame);
        assert_eq!(e.into_bits() >> 10, frame.ppn());
        assert_eq!(e.into_bits() >> 54, 0);
        assert_eq!(e.frame(), frame);
    }

    #[test]
    fn leaf_and_table_are_distinguished_by_access_bits() {
        let frame = PhysicalAddress::new(0x8000_1000).page::<Size4K>();
        assert!(!PageTableEntry::table(frame).is_leaf());
        assert!(PageTableEntry::leaf(frame, PageTableEntry::user_rx()).is_leaf());
        assert!(!PageTableEntry::new().is_leaf());
    }

    #[test]
    fn leaf_replaces_ppn_of_permission_template() {
        let a = PhysicalAddress::new(0x8000_1000).page::<Size4K>();
        let b = PhysicalAddress::new(0x8000_2000).page::<Size4K>();
        let existing = PageTableEntry::leaf(a, PageTableEntry::user_rw());
        let moved = PageTableEntry::leaf(b, existing);
        assert_eq!(moved.frame(), b);
        assert_eq!(moved.flags(), existing.flags());
    }
}
