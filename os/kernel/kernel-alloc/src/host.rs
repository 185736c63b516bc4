//! In-memory stand-ins for physical RAM and hart identity.
//!
//! Used by this crate's tests and, through the `host` feature, by the tests
//! of crates that build on the allocator.

use core::cell::{Cell, UnsafeCell};
use std::vec::Vec;

use kernel_memory_addresses::{PhysicalAddress, Size4K};

use crate::frame_alloc::{CurrentCore, Frame};
use crate::phys_mapper::{FRAME_BYTES, PhysMapper};

/// A 4 KiB-aligned raw frame.
#[repr(C, align(4096))]
struct Aligned4K([u8; FRAME_BYTES]);

/// Simulated physical RAM covering `[base, base + frames * 4096)`.
///
/// Physical addresses are translated to the backing `Vec` by subtracting
/// `base`. Frames live in `UnsafeCell`s, so handing out `&mut` views from
/// `&self` mirrors what a real direct map does.
pub struct PhysArena {
    base: PhysicalAddress,
    frames: Vec<UnsafeCell<Aligned4K>>,
}

// SAFETY: as with real RAM, exclusivity of each frame is the callers' job.
unsafe impl Sync for PhysArena {}

impl PhysArena {
    /// An arena of `frames` zeroed frames starting at `base`.
    ///
    /// # Panics
    /// If `base` is not frame-aligned.
    #[must_use]
    pub fn new(base: PhysicalAddress, frames: usize) -> Self {
        assert!(base.is_aligned::<Size4K>(), "arena base must be aligned");
        let frames = (0..frames)
            .map(|_| UnsafeCell::new(Aligned4K([0; FRAME_BYTES])))
            .collect();
        Self { base, frames }
    }

    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.base
    }

    #[must_use]
    pub fn end(&self) -> PhysicalAddress {
        self.base + (self.frames.len() * FRAME_BYTES) as u64
    }

    /// A copy of the bytes of `frame`, for assertions.
    #[must_use]
    pub fn snapshot(&self, frame: Frame) -> [u8; FRAME_BYTES] {
        unsafe { *self.frame_bytes(frame) }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn locate(&self, pa: PhysicalAddress) -> (usize, usize) {
        assert!(
            pa >= self.base && pa < self.end(),
            "{pa} is outside the arena"
        );
        let rel = pa - self.base;
        ((rel >> 12) as usize, (rel & 0xFFF) as usize)
    }
}

impl PhysMapper for PhysArena {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let (idx, off) = self.locate(pa);
        debug_assert!(off + size_of::<T>() <= FRAME_BYTES, "access crosses a frame");
        // SAFETY: in bounds; the caller promises `T` matches the bytes and
        // that the access is exclusive.
        unsafe { &mut *self.frames[idx].get().cast::<u8>().add(off).cast::<T>() }
    }
}

/// Always reports the same hart.
#[derive(Debug, Copy, Clone, Default)]
pub struct FixedCore(pub usize);

impl CurrentCore for FixedCore {
    fn core_id(&self) -> usize {
        self.0
    }
}

std::thread_local! {
    static THREAD_CORE: Cell<usize> = const { Cell::new(0) };
}

/// Reports a per-thread hart id, so each test thread can play one hart.
#[derive(Debug, Copy, Clone, Default)]
pub struct ThreadCore;

impl ThreadCore {
    /// Declare the calling thread to be hart `id`.
    pub fn enter(id: usize) {
        THREAD_CORE.with(|c| c.set(id));
    }
}

impl CurrentCore for ThreadCore {
    fn core_id(&self) -> usize {
        THREAD_CORE.with(Cell::get)
    }
}
