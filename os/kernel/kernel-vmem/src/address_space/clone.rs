use kernel_alloc::{FrameAlloc, PhysMapper};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::VirtualAddress;
use log::debug;

use crate::{AddressSpace, PageTableEntry, VmemError};

/// How [`AddressSpace::clone_into`] duplicates user pages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CloneMode {
    /// Every page gets a fresh frame with a copy of the contents.
    Copy,
    /// Frames are shared. Writable pages become read-only copy-on-write on
    /// both sides; read-only pages are shared as they are.
    Share,
}

impl<M: PhysMapper, A: FrameAlloc> AddressSpace<'_, M, A> {
    /// Duplicates the user pages `[0, size)` into `child`.
    ///
    /// On failure every page already mapped into `child` is unmapped again,
    /// releasing its frame reference. Parent entries that were already
    /// turned into copy-on-write stay that way; with the extra reference
    /// gone, their next write fault upgrades them in place.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] if a data or table frame is unavailable.
    ///
    /// # Panics
    /// If a page below `size` is not mapped in `self`.
    pub fn clone_into(&self, child: &Self, size: u64, mode: CloneMode) -> Result<(), VmemError> {
        debug!("clone {} -> {} ({size} bytes, {mode:?})", self.root(), child.root());

        let mut va = VirtualAddress::zero();
        while va.as_u64() < size {
            if let Err(err) = self.clone_page(child, va, mode) {
                let mapped = va.as_u64() / PAGE_SIZE;
                if mapped > 0 {
                    child.unmap(VirtualAddress::zero(), mapped, true);
                }
                return Err(err);
            }
            va += PAGE_SIZE;
        }
        Ok(())
    }

    fn clone_page(&self, child: &Self, va: VirtualAddress, mode: CloneMode) -> Result<(), VmemError> {
        let entry = match self.walk(va, false) {
            Ok(entry) => entry,
            Err(err) => panic!("uvmcopy: pte should exist: {err}"),
        };
        assert!(entry.valid(), "uvmcopy: page not present: {va}");
        let frame = entry.frame();

        match mode {
            CloneMode::Copy => {
                let copy = self.frames().alloc_4k().ok_or(VmemError::OutOfMemory)?;
                // SAFETY: `copy` is freshly allocated; `frame` is only read.
                unsafe {
                    self.mapper()
                        .frame_bytes(copy)
                        .copy_from_slice(self.mapper().frame_bytes(frame));
                }
                let perm = if entry.cow() {
                    entry.flags().with_cow(false).with_writable(true)
                } else {
                    entry.flags()
                };
                if let Err(err) = child.map(va, PAGE_SIZE, copy.base(), perm) {
                    self.frames().free_4k(copy);
                    return Err(err);
                }
            }
            CloneMode::Share => {
                let perm = if entry.writable() || entry.cow() {
                    entry.flags().with_writable(false).with_cow(true)
                } else {
                    entry.flags()
                };
                child.map(va, PAGE_SIZE, frame.base(), perm)?;
                self.frames().add_reference(frame);
                *entry = PageTableEntry::leaf(frame, perm);
            }
        }
        Ok(())
    }
}
