//! # Copy-on-write resolution
//!
//! A process cloned in [`CloneMode::Share`](crate::CloneMode::Share) maps its
//! parent's frames read-only with the COW tag set. The first write traps
//! (store page fault, cause 15) and the trap handler calls
//! [`AddressSpace::resolve_cow`]:
//!
//! - the last holder of a frame (reference count 1) gets its write bit back
//!   in place,
//! - every other holder receives a private copy and gives up one reference
//!   to the shared frame.
//!
//! The executable bit survives resolution, so shared code pages that are
//! also written to keep working after the copy.

use kernel_alloc::{FrameAlloc, PhysMapper};
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};
use log::{debug, trace};

use crate::{AddressSpace, CowError, PageTableEntry};

impl<M: PhysMapper, A: FrameAlloc> AddressSpace<'_, M, A> {
    /// Whether `va` lies in a valid, user-accessible, COW-tagged page.
    #[must_use]
    pub fn is_cow(&self, va: VirtualAddress) -> bool {
        self.walk(va, false)
            .is_ok_and(|entry| entry.valid() && entry.user() && entry.cow())
    }

    /// Gives the page containing `va` a private, writable frame and returns
    /// the frame's address.
    ///
    /// # Errors
    /// - [`CowError::Unmapped`] or [`CowError::NotCow`] if there is nothing
    ///   to resolve; the entry is not touched.
    /// - [`CowError::OutOfMemory`] if the copy cannot be allocated; the entry
    ///   still maps the shared frame.
    pub fn resolve_cow(&self, va: VirtualAddress) -> Result<PhysicalAddress, CowError> {
        let page = va.align_down::<Size4K>();
        let entry = self.walk(page, false).map_err(|_| CowError::Unmapped(page))?;
        if !entry.valid() || !entry.user() {
            return Err(CowError::Unmapped(page));
        }
        if !entry.cow() {
            return Err(CowError::NotCow(page));
        }

        let shared = entry.frame();
        let perm = entry.flags().with_cow(false).with_writable(true);

        if self.frames().ref_count(shared) == 1 {
            trace!("cow: {page} is the last holder of {shared}");
            *entry = PageTableEntry::leaf(shared, perm);
            return Ok(shared.base());
        }

        let private = self.frames().alloc_4k().ok_or(CowError::OutOfMemory(page))?;
        // SAFETY: `private` is freshly allocated; `shared` is only read.
        unsafe {
            self.mapper()
                .frame_bytes(private)
                .copy_from_slice(self.mapper().frame_bytes(shared));
        }

        *entry = PageTableEntry::leaf(private, perm);
        self.frames().free_4k(shared);

        debug!("cow: {page} copied from {shared} to {private}");
        Ok(private.base())
    }
}
