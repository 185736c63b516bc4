//! # Address Space (Sv39, three-level)
//!
//! [`AddressSpace`] owns one page-table tree and the operations that build,
//! query and tear it down. Table frames and data frames both come from the
//! caller's [`FrameAlloc`]; tables are reached through the [`PhysMapper`].
//!
//! ## Contract
//!
//! - Mappings are write-once: [`map`](AddressSpace::map) over a valid entry
//!   panics with `remap`. Replace a mapping by unmapping it first.
//! - Data frames are reference counted by the allocator. Every leaf entry
//!   holds one reference; [`unmap`](AddressSpace::unmap) with `free = true`
//!   drops it.
//! - Table mutation is not synchronized. The owner of the address space
//!   (the process) must guarantee exclusive access.
//! - Edits to the live tree need `sfence.vma` before they are guaranteed to be
//!   visible; the user return path switches `satp` and flushes.

mod clone;
mod copy;
mod kernel;
mod user;

pub use clone::CloneMode;
pub use kernel::KernelLayout;

use core::fmt;

use kernel_alloc::{Frame, FrameAlloc, PhysMapper};
use kernel_info::memory::{MAXVA, PAGE_SIZE};
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};
use kernel_registers::Satp;
use log::{debug, error, trace};

use crate::page_table::{Level, PageTable, TableIndex};
use crate::{PageTableEntry, VmemError, WalkError};

/// Handle to one page-table tree.
pub struct AddressSpace<'m, M: PhysMapper, A: FrameAlloc> {
    root: Frame,
    mapper: &'m M,
    frames: &'m A,
}

impl<'m, M: PhysMapper, A: FrameAlloc> AddressSpace<'m, M, A> {
    /// Allocates an empty root table.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] if no frame is left for the root.
    pub fn create(mapper: &'m M, frames: &'m A) -> Result<Self, VmemError> {
        let root = frames.alloc_4k().ok_or(VmemError::OutOfMemory)?;
        let space = Self::from_root(mapper, frames, root);
        space.table(root).zero();
        debug!("address space {root} created");
        Ok(space)
    }

    /// Wraps an existing root table.
    #[inline]
    pub const fn from_root(mapper: &'m M, frames: &'m A, root: Frame) -> Self {
        Self {
            root,
            mapper,
            frames,
        }
    }

    /// Frame of the root (level 2) table.
    #[inline]
    pub const fn root(&self) -> Frame {
        self.root
    }

    /// The `satp` value that activates this tree.
    #[inline]
    pub const fn satp(&self) -> Satp {
        Satp::sv39(self.root)
    }

    /// Switch the current hart to this tree.
    ///
    /// # Safety
    /// The running code, its stack and the trap vector must be mapped
    /// identically in this tree.
    #[cfg(target_arch = "riscv64")]
    #[inline]
    pub unsafe fn activate(&self) {
        use kernel_registers::StoreRegisterUnsafe;
        unsafe { self.satp().store_unsafe() }
    }

    #[inline]
    pub(crate) const fn mapper(&self) -> &'m M {
        self.mapper
    }

    #[inline]
    pub(crate) const fn frames(&self) -> &'m A {
        self.frames
    }

    #[inline]
    fn table(&self, frame: Frame) -> &'m mut PageTable {
        // SAFETY: table frames are owned by this tree and mapped by the mapper.
        unsafe { self.mapper.phys_to_mut::<PageTable>(frame.base()) }
    }

    /// Finds the level-0 entry for `va`.
    ///
    /// With `alloc` set, missing intermediate tables are allocated, zeroed and
    /// linked in; tables allocated before a failure stay linked and are
    /// reclaimed by [`destroy`](Self::destroy).
    ///
    /// # Errors
    /// - [`WalkError::OutOfRange`] if `va >= MAXVA`.
    /// - [`WalkError::Missing`] if a table is absent and `alloc` is not set.
    /// - [`WalkError::OutOfMemory`] if a table frame cannot be allocated.
    pub fn walk(&self, va: VirtualAddress, alloc: bool) -> Result<&'m mut PageTableEntry, WalkError> {
        if va.as_u64() >= MAXVA {
            return Err(WalkError::OutOfRange(va));
        }

        let mut table = self.table(self.root);
        for level in [Level::L2, Level::L1] {
            let entry = table.entry_mut(TableIndex::of(va, level));
            if entry.valid() {
                debug_assert!(!entry.is_leaf(), "walk: superpage at {va}");
                table = self.table(entry.frame());
            } else {
                if !alloc {
                    return Err(WalkError::Missing(va));
                }
                let frame = self.frames.alloc_4k().ok_or(WalkError::OutOfMemory)?;
                let next = self.table(frame);
                next.zero();
                *entry = PageTableEntry::table(frame);
                table = next;
            }
        }

        Ok(table.entry_mut(TableIndex::of(va, Level::L0)))
    }

    /// Installs leaf entries for `[va, va + size)` pointing at consecutive
    /// frames starting at `pa`. Neither needs to be aligned; the range is
    /// widened to whole pages.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] when a table frame is missing, after the
    /// entries installed by this call have been removed again.
    /// [`VmemError::OutOfRange`] when the range reaches `MAXVA`.
    ///
    /// # Panics
    /// If `size` is zero, if `perm` grants no access, or if a target entry is
    /// already valid (`remap`).
    pub fn map(
        &self,
        va: VirtualAddress,
        size: u64,
        pa: PhysicalAddress,
        perm: PageTableEntry,
    ) -> Result<(), VmemError> {
        assert!(size != 0, "mappages: size");
        assert!(perm.has_access(), "mappages: leaf without R/W/X at {va}");

        let first = va.align_down::<Size4K>();
        let last = va
            .checked_add(size - 1)
            .ok_or(VmemError::OutOfRange(va))?
            .align_down::<Size4K>();

        let mut a = first;
        let mut frame = pa.page::<Size4K>();
        loop {
            let entry = match self.walk(a, true) {
                Ok(entry) => entry,
                Err(err) => {
                    let installed = (a - first) / PAGE_SIZE;
                    if installed > 0 {
                        self.unmap(first, installed, false);
                    }
                    return Err(err.into());
                }
            };
            if entry.valid() {
                error!("mappages: {a} already maps {}", entry.frame());
                panic!("mappages: remap at {a}");
            }
            *entry = PageTableEntry::leaf(frame, perm);
            trace!("map {a} -> {frame}");

            if a == last {
                return Ok(());
            }
            a += PAGE_SIZE;
            frame = Frame::from_ppn(frame.ppn() + 1);
        }
    }

    /// Removes `npages` leaf entries starting at `va`. With `free` set, each
    /// frame loses one reference.
    ///
    /// # Panics
    /// If `va` is not page aligned, or if any of the entries is missing,
    /// invalid or not a leaf.
    pub fn unmap(&self, va: VirtualAddress, npages: u64, free: bool) {
        assert!(va.is_aligned::<Size4K>(), "uvmunmap: not aligned: {va}");

        for i in 0..npages {
            let a = va + i * PAGE_SIZE;
            let entry = match self.walk(a, false) {
                Ok(entry) => entry,
                Err(err) => panic!("uvmunmap: walk: {err}"),
            };
            assert!(entry.valid(), "uvmunmap: not mapped: {a}");
            assert!(entry.is_leaf(), "uvmunmap: not a leaf: {a}");
            if free {
                self.frames.free_4k(entry.frame());
            }
            trace!("unmap {a}");
            *entry = PageTableEntry::new();
        }
    }

    /// Physical address behind a user-accessible `va`.
    ///
    /// Kernel-only mappings (the trampoline, the trap frame) do not
    /// translate.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let entry = self.walk(va, false).ok()?;
        if !entry.valid() || !entry.user() {
            return None;
        }
        Some(entry.frame().join(va.offset::<Size4K>()))
    }

    /// Frees every table frame, leaves first, then the root.
    ///
    /// All leaf mappings must have been removed beforehand.
    ///
    /// # Panics
    /// If a valid leaf is still present.
    pub fn destroy(self) {
        debug!("address space {} destroyed", self.root);
        self.free_table(self.root, Level::L2);
    }

    fn free_table(&self, frame: Frame, level: Level) {
        let table = self.table(frame);
        for i in 0..crate::page_table::ENTRIES {
            #[allow(clippy::cast_possible_truncation)]
            let index = TableIndex::new(i as u16);
            let entry = table.get(index);
            if !entry.valid() {
                continue;
            }
            let next = match level.next() {
                Some(next) if !entry.is_leaf() => next,
                _ => panic!("freewalk: leaf {entry:?} in table {frame}"),
            };
            self.free_table(entry.frame(), next);
            table.set(index, PageTableEntry::new());
        }
        self.frames.free_4k(frame);
    }

    /// Prints the tree, one line per valid entry, indented by depth.
    ///
    /// ```text
    /// page table 0x0000000087F6E000
    ///  ..0: pte 0x0000000021FDA801 pa 0x0000000087F6A000
    ///  .. ..0: pte 0x0000000021FDA401 pa 0x0000000087F69000
    ///  .. .. ..0: pte 0x0000000021FDAC1F pa 0x0000000087F6B000
    /// ```
    ///
    /// # Errors
    /// Propagates formatter errors.
    pub fn dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "page table {}", self.root.base())?;
        self.dump_table(out, self.root, Level::L2, 1)
    }

    fn dump_table(&self, out: &mut impl fmt::Write, frame: Frame, level: Level, depth: usize) -> fmt::Result {
        for (i, entry) in self.table(frame).valid_entries() {
            for _ in 0..depth {
                out.write_str(" ..")?;
            }
            writeln!(
                out,
                "{i}: pte {:#018x} pa {}",
                entry.into_bits(),
                entry.frame().base()
            )?;
            if let Some(next) = level.next().filter(|_| !entry.is_leaf()) {
                self.dump_table(out, entry.frame(), next, depth + 1)?;
            }
        }
        Ok(())
    }
}
