//! # Physical memory access
//!
//! Rust code can only dereference virtual addresses. The allocator stores
//! free-list links inside free frames, and the page-table code edits tables
//! that are identified by physical address, so both need a way to "see" a
//! physical address from the current address space. [`PhysMapper`] abstracts
//! over how that happens.
//!
//! In the kernel, all of RAM is mapped 1:1 (see [`DirectPhysMapper`]). Host
//! tests substitute an in-memory arena (`host::PhysArena`, behind the `host`
//! feature).

use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K};

use crate::frame_alloc::Frame;

/// Bytes in one frame, as an index type.
#[allow(clippy::cast_possible_truncation)]
pub const FRAME_BYTES: usize = Size4K::SIZE as usize;

/// Converts physical addresses to usable references in the current virtual
/// address space.
///
/// # Safety
/// - `pa` must be mapped writable in the current page tables for `&mut T`.
/// - Lifetime `'a` is purely borrow-checked; the mapping must remain valid
///   for `'a`.
/// - Type `T` must match the bytes at `pa`, and no other live reference may
///   alias them.
pub trait PhysMapper {
    /// Convert a *physical* address to a mutable reference.
    ///
    /// # Safety
    /// See the trait documentation.
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T;

    /// The full contents of `frame`.
    ///
    /// # Safety
    /// The caller must have exclusive access to `frame` for `'a`.
    #[inline]
    unsafe fn frame_bytes<'a>(&self, frame: Frame) -> &'a mut [u8; FRAME_BYTES] {
        unsafe { self.phys_to_mut::<[u8; FRAME_BYTES]>(frame.base()) }
    }
}

/// [`PhysMapper`] for kernels that map physical RAM at identical virtual
/// addresses.
///
/// The kernel page table maps `[KERNBASE, PHYSTOP)` and the device windows
/// identically, so a physical address is directly usable as a pointer.
pub struct DirectPhysMapper;

impl PhysMapper for DirectPhysMapper {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let va = pa.as_u64() as usize as *mut T;
        // SAFETY: Caller must ensure the physical address is valid and mapped 1:1.
        unsafe { &mut *va }
    }
}
