//! Kernel page tables: the global one each hart boots into and the
//! per-process copies that also mirror the process's user memory, so the
//! kernel can dereference user pointers directly.

use kernel_alloc::{Frame, FrameAlloc, PhysMapper};
use kernel_info::devices::{CLINT, CLINT_SIZE, PLIC, PLIC_SIZE, UART0, VIRTIO0};
use kernel_info::memory::{KERNBASE, PAGE_SIZE, PHYSTOP, TRAMPOLINE};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use log::debug;

use super::user::page_round_up;
use crate::page_table::{ENTRIES, Level, TableIndex};
use crate::{AddressSpace, PageTableEntry, VmemError};

/// Where the kernel image and the trampoline live in physical memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelLayout {
    /// End of kernel text (`etext`), page aligned.
    pub text_end: PhysicalAddress,
    /// End of the RAM mapped read/write after the text.
    pub phys_top: PhysicalAddress,
    /// Physical page of the trampoline code.
    pub trampoline: PhysicalAddress,
}

impl KernelLayout {
    /// The QEMU `virt` layout, with RAM up to `PHYSTOP`.
    #[must_use]
    pub const fn qemu(text_end: PhysicalAddress, trampoline: PhysicalAddress) -> Self {
        Self {
            text_end,
            phys_top: PhysicalAddress::new(PHYSTOP),
            trampoline,
        }
    }
}

impl<'m, M: PhysMapper, A: FrameAlloc> AddressSpace<'m, M, A> {
    /// A kernel page table: device registers and RAM mapped one-to-one,
    /// text R|X, everything after it R|W, plus the trampoline at the top.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`]; the partial tree is released.
    ///
    /// # Panics
    /// If `text_end` does not lie in `[KERNBASE, phys_top)`.
    pub fn create_kernel(mapper: &'m M, frames: &'m A, layout: &KernelLayout) -> Result<Self, VmemError> {
        let text_end = layout.text_end.as_u64();
        let top = layout.phys_top.as_u64();
        assert!(
            KERNBASE < text_end && text_end < top,
            "kvminit: text end {} outside kernel RAM",
            layout.text_end
        );

        let space = Self::create(mapper, frames)?;
        let rw = PageTableEntry::kernel_rw();
        let rx = PageTableEntry::kernel_rx();
        let regions = [
            (UART0, UART0, PAGE_SIZE, rw),
            (VIRTIO0, VIRTIO0, PAGE_SIZE, rw),
            (CLINT, CLINT, CLINT_SIZE, rw),
            (PLIC, PLIC, PLIC_SIZE, rw),
            (KERNBASE, KERNBASE, text_end - KERNBASE, rx),
            (text_end, text_end, top - text_end, rw),
            (TRAMPOLINE, layout.trampoline.as_u64(), PAGE_SIZE, rx),
        ];
        for (va, pa, size, perm) in regions {
            if let Err(err) = space.map(VirtualAddress::new(va), size, PhysicalAddress::new(pa), perm) {
                space.free_kernel();
                return Err(err);
            }
        }

        debug!("kernel page table {} built", space.root());
        Ok(space)
    }

    /// Releases a kernel page table. Leaf entries are dropped without
    /// touching the frames they map; only table frames are freed.
    pub fn free_kernel(self) {
        debug!("kernel page table {} released", self.root());
        self.release_tables(self.root(), Level::L2);
    }

    fn release_tables(&self, frame: Frame, level: Level) {
        let table = self.table(frame);
        for i in 0..ENTRIES {
            #[allow(clippy::cast_possible_truncation)]
            let index = TableIndex::new(i as u16);
            let entry = table.get(index);
            if !entry.valid() {
                continue;
            }
            if let Some(next) = level.next().filter(|_| !entry.is_leaf()) {
                self.release_tables(entry.frame(), next);
            }
            table.set(index, PageTableEntry::new());
        }
        self.frames().free_4k(frame);
    }

    /// Copies the user mappings of `[start, end)` from `user` into this
    /// kernel table with the U bit cleared. Frames are shared, not
    /// referenced: the user table stays their owner.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] if a table frame cannot be allocated.
    ///
    /// # Panics
    /// If `end` reaches the CLINT window or if a page of the range has no
    /// entry in `user`.
    pub fn mirror_user(&self, user: &Self, start: u64, end: u64) -> Result<(), VmemError> {
        assert!(end <= CLINT, "u2kvmcopy: user memory up to {end:#x} overlaps devices");

        let mut a = page_round_up(start);
        while a < end {
            let va = VirtualAddress::new(a);
            let from = match user.walk(va, false) {
                Ok(entry) => *entry,
                Err(err) => panic!("u2kvmcopy: src pte does not exist: {err}"),
            };
            *self.walk(va, true)? = from.with_user(false);
            a += PAGE_SIZE;
        }
        Ok(())
    }

    /// Drops the mirror of user memory shrinking from `old_size` to
    /// `new_size`. The frames stay with the user table.
    pub fn unmirror_user(&self, old_size: u64, new_size: u64) {
        let keep = page_round_up(new_size);
        let end = page_round_up(old_size);
        if keep < end {
            self.unmap(VirtualAddress::new(keep), (end - keep) / PAGE_SIZE, false);
        }
    }
}
