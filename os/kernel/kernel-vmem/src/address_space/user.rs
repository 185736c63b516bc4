//! Process-level helpers: the fixed high mappings, heap growth and the
//! stack guard page.

use kernel_alloc::{FrameAlloc, PhysMapper};
use kernel_info::memory::{PAGE_SIZE, TRAMPOLINE, TRAPFRAME};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

use crate::{AddressSpace, PageTableEntry, VmemError};

#[inline]
pub(super) const fn page_round_up(size: u64) -> u64 {
    size.next_multiple_of(PAGE_SIZE)
}

impl<'m, M: PhysMapper, A: FrameAlloc> AddressSpace<'m, M, A> {
    /// A new user address space holding only the trampoline (kernel R|X) and
    /// the process's trap frame (kernel R|W) at the top of the range.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`]; nothing is left allocated in that case.
    pub fn create_user(
        mapper: &'m M,
        frames: &'m A,
        trampoline: PhysicalAddress,
        trap_frame: PhysicalAddress,
    ) -> Result<Self, VmemError> {
        let space = Self::create(mapper, frames)?;

        let trampoline_va = VirtualAddress::new(TRAMPOLINE);
        if let Err(err) = space.map(trampoline_va, PAGE_SIZE, trampoline, PageTableEntry::kernel_rx()) {
            space.destroy();
            return Err(err);
        }

        if let Err(err) = space.map(
            VirtualAddress::new(TRAPFRAME),
            PAGE_SIZE,
            trap_frame,
            PageTableEntry::kernel_rw(),
        ) {
            space.unmap(trampoline_va, 1, false);
            space.destroy();
            return Err(err);
        }

        Ok(space)
    }

    /// Tears down a space built by [`create_user`](Self::create_user) whose
    /// user memory is `[0, size)`.
    ///
    /// The trampoline and trap-frame frames are not freed; they belong to the
    /// kernel and the process record.
    pub fn free_user(self, size: u64) {
        self.unmap(VirtualAddress::new(TRAMPOLINE), 1, false);
        self.unmap(VirtualAddress::new(TRAPFRAME), 1, false);
        if size > 0 {
            self.unmap(VirtualAddress::zero(), page_round_up(size) / PAGE_SIZE, true);
        }
        self.destroy();
    }

    /// Grows user memory from `old_size` to `new_size` with zeroed pages
    /// mapped `perm | R | U`. Returns the new size.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] after removing the pages added by this call.
    pub fn grow(&self, old_size: u64, new_size: u64, perm: PageTableEntry) -> Result<u64, VmemError> {
        if new_size < old_size {
            return Ok(old_size);
        }

        let perm = perm.with_readable(true).with_user(true);
        let mut a = page_round_up(old_size);
        while a < new_size {
            let Some(frame) = self.frames().alloc_4k() else {
                self.shrink(a, old_size);
                return Err(VmemError::OutOfMemory);
            };
            // SAFETY: freshly allocated, not yet mapped anywhere.
            unsafe { self.mapper().frame_bytes(frame).fill(0) };

            if let Err(err) = self.map(VirtualAddress::new(a), PAGE_SIZE, frame.base(), perm) {
                self.frames().free_4k(frame);
                self.shrink(a, old_size);
                return Err(err);
            }
            a += PAGE_SIZE;
        }
        Ok(new_size)
    }

    /// Shrinks user memory from `old_size` to `new_size`, freeing whole pages
    /// that fall out of the range. Returns the new size.
    pub fn shrink(&self, old_size: u64, new_size: u64) -> u64 {
        if new_size >= old_size {
            return old_size;
        }

        let keep = page_round_up(new_size);
        let end = page_round_up(old_size);
        if keep < end {
            self.unmap(VirtualAddress::new(keep), (end - keep) / PAGE_SIZE, true);
        }
        new_size
    }

    /// Revokes user access to the page at `va`; used for the guard page
    /// below the user stack.
    ///
    /// # Panics
    /// If no valid entry covers `va`.
    pub fn clear_user(&self, va: VirtualAddress) {
        let entry = match self.walk(va, false) {
            Ok(entry) => entry,
            Err(err) => panic!("uvmclear: {err}"),
        };
        assert!(entry.valid(), "uvmclear: {va} not mapped");
        entry.set_user(false);
    }
}
