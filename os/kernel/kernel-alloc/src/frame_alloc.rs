//! # Physical frame allocator
//!
//! Hands out 4 KiB frames from the RAM between the end of the kernel image
//! and `PHYSTOP`, and tracks how many leaf page-table entries reference each
//! frame so copy-on-write sharing can release frames at the right time.
//!
//! ## Layout
//!
//! ```text
//! FrameAllocator
//! ├── lists[0..NCPU]   SpinLock<FreeList>   one chain per hart
//! └── refs             SpinLock<[u16; N]>   per-frame reference counts
//! ```
//!
//! A hart allocates from and frees to its own list. When its list is empty
//! it steals a single frame from the other lists, visiting them in order
//! starting after its own index. At most one lock is held at any time, so
//! two harts stealing from each other cannot deadlock.
//!
//! ## Fill patterns
//!
//! Freed frames are filled with [`FREE_FILL`] and freshly allocated frames
//! with [`ALLOC_FILL`], so use-after-free and uninitialized reads show up as
//! recognizable garbage instead of stale data.

use kernel_info::NCPU;
use kernel_info::memory::{KERNBASE, PAGE_SIZE, PHYSTOP};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_sync::SpinLock;
use log::{debug, trace};

use crate::free_list::FreeList;
use crate::phys_mapper::PhysMapper;

/// One physical frame, identified by its page-aligned base address.
pub type Frame = PhysicalPage<Size4K>;

/// Byte written over every frame handed out by [`FrameAllocator::allocate`].
pub const ALLOC_FILL: u8 = 0x05;

/// Byte written over every frame returned to a free list.
pub const FREE_FILL: u8 = 0x01;

/// Number of frames in `[KERNBASE, PHYSTOP)`; an upper bound for the kernel's
/// managed range.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_FRAMES: usize = ((PHYSTOP - KERNBASE) / PAGE_SIZE) as usize;

/// Frame allocation as seen by the page-table code.
///
/// All methods take `&self`: implementations synchronize internally and may
/// be called from several harts at once.
pub trait FrameAlloc {
    /// Allocate one 4 KiB frame with a reference count of 1, or `None` when
    /// physical memory is exhausted.
    fn alloc_4k(&self) -> Option<Frame>;

    /// Drop one reference to `frame`; the frame is reclaimed when the last
    /// reference is gone.
    fn free_4k(&self, frame: Frame);

    /// Record one more leaf entry mapping `frame`.
    fn add_reference(&self, frame: Frame);

    /// Number of leaf entries currently mapping `frame`.
    fn ref_count(&self, frame: Frame) -> u16;
}

/// Source of the current hart's index.
pub trait CurrentCore {
    fn core_id(&self) -> usize;
}

/// Reads the hart id that the boot code keeps in `tp`.
#[cfg(target_arch = "riscv64")]
pub struct HartCore;

#[cfg(target_arch = "riscv64")]
impl CurrentCore for HartCore {
    #[allow(clippy::cast_possible_truncation)]
    fn core_id(&self) -> usize {
        unsafe { kernel_registers::csr::read_tp() as usize }
    }
}

/// Per-hart free lists plus a reference-count table.
///
/// `FRAMES` bounds the number of frames the instance can manage; the kernel
/// uses [`MAX_FRAMES`], tests use small arenas.
pub struct FrameAllocator<'m, M: PhysMapper, C: CurrentCore, const FRAMES: usize = MAX_FRAMES> {
    mapper: &'m M,
    cores: C,
    /// First managed frame (inclusive).
    start: PhysicalAddress,
    /// End of the last managed frame (exclusive).
    end: PhysicalAddress,
    lists: [SpinLock<FreeList>; NCPU],
    refs: SpinLock<[u16; FRAMES]>,
}

impl<'m, M: PhysMapper, C: CurrentCore, const FRAMES: usize> FrameAllocator<'m, M, C, FRAMES> {
    /// An allocator that manages nothing yet; see [`init`](Self::init).
    pub const fn new(mapper: &'m M, cores: C) -> Self {
        Self {
            mapper,
            cores,
            start: PhysicalAddress::zero(),
            end: PhysicalAddress::zero(),
            lists: [const { SpinLock::new(FreeList::new()) }; NCPU],
            refs: SpinLock::new([0; FRAMES]),
        }
    }

    /// Takes ownership of every whole frame in `[start, end)`.
    ///
    /// `start` is rounded up and `end` down to frame boundaries. Each frame
    /// goes through [`free`](Self::free), so it is scrubbed and lands on the
    /// calling hart's list; other harts steal from there.
    ///
    /// # Panics
    /// If the range holds more than `FRAMES` frames or starts at address 0.
    pub fn init(&mut self, start: PhysicalAddress, end: PhysicalAddress) {
        let first = start
            .checked_align_up::<Size4K>()
            .expect("frame range start overflows");
        let last = end.page::<Size4K>().base();
        assert!(first.as_u64() != 0, "frame 0 cannot be managed");
        let frames = if last > first {
            (last - first) / PAGE_SIZE
        } else {
            0
        };
        assert!(
            frames <= FRAMES as u64,
            "frame table holds {FRAMES} frames, range needs {frames}"
        );

        self.start = first;
        self.end = first + frames * PAGE_SIZE;

        #[allow(clippy::cast_possible_truncation)]
        self.refs.get_mut()[..frames as usize].fill(1);
        let mut pa = first;
        while pa < self.end {
            self.free(pa.page());
            pa += PAGE_SIZE;
        }
        debug!("frame allocator: {frames} frames in [{first}, {})", self.end);
    }

    /// Pops a frame, stealing from other harts when the local list is empty.
    ///
    /// The frame comes back with a reference count of 1 and filled with
    /// [`ALLOC_FILL`].
    pub fn allocate(&self) -> Option<Frame> {
        let core = self.core_index();
        let frame = self.pop_from(core).or_else(|| self.steal(core))?;

        {
            let mut refs = self.refs.lock();
            let slot = &mut refs[self.index_of(frame)];
            debug_assert_eq!(*slot, 0, "free frame {frame} had live references");
            *slot = 1;
        }

        unsafe { self.mapper.frame_bytes(frame) }.fill(ALLOC_FILL);
        trace!("allocated {frame} on hart {core}");
        Some(frame)
    }

    /// Drops one reference to `frame`, reclaiming it at zero.
    ///
    /// # Panics
    /// - if `frame` lies outside the managed range (this includes the kernel
    ///   image below it),
    /// - on a double free, i.e. when the frame has no references left.
    pub fn free(&self, frame: Frame) {
        let pa = frame.base();
        assert!(
            pa >= self.start && pa < self.end,
            "kfree: {pa} outside managed range [{}, {})",
            self.start,
            self.end
        );

        let remaining = {
            let mut refs = self.refs.lock();
            let slot = &mut refs[self.index_of(frame)];
            assert!(*slot != 0, "kfree: double free of {pa}");
            *slot -= 1;
            *slot
        };
        if remaining > 0 {
            return;
        }

        unsafe { self.mapper.frame_bytes(frame) }.fill(FREE_FILL);
        let core = self.core_index();
        let mut list = self.lists[core].lock();
        // SAFETY: the last reference is gone, nobody else can reach the frame.
        unsafe { list.push(self.mapper, frame) };
    }

    /// Frees the frame containing `pa`, rejecting unaligned addresses.
    ///
    /// # Panics
    /// If `pa` is not frame-aligned, and in every case [`free`](Self::free)
    /// panics.
    pub fn free_addr(&self, pa: PhysicalAddress) {
        assert!(pa.is_aligned::<Size4K>(), "kfree: unaligned address {pa}");
        self.free(pa.page());
    }

    /// Records one more mapping of `frame`.
    ///
    /// # Panics
    /// If `frame` is not allocated or the count would overflow.
    pub fn add_reference(&self, frame: Frame) {
        let mut refs = self.refs.lock();
        let slot = &mut refs[self.index_of(frame)];
        assert!(*slot > 0, "add_reference: {frame} is not allocated");
        *slot = slot.checked_add(1).expect("reference count overflow");
    }

    /// Current reference count of `frame`; 0 means it is free.
    pub fn ref_count(&self, frame: Frame) -> u16 {
        self.refs.lock()[self.index_of(frame)]
    }

    /// Frames currently on the free lists, summed one list at a time.
    pub fn free_count(&self) -> usize {
        self.lists.iter().map(|list| list.lock().len()).sum()
    }

    /// Free physical memory in bytes.
    pub fn free_memory(&self) -> u64 {
        self.free_count() as u64 * PAGE_SIZE
    }

    /// The managed range `[start, end)`.
    pub const fn range(&self) -> (PhysicalAddress, PhysicalAddress) {
        (self.start, self.end)
    }

    #[inline]
    pub const fn mapper(&self) -> &'m M {
        self.mapper
    }

    fn core_index(&self) -> usize {
        self.cores.core_id() % NCPU
    }

    fn pop_from(&self, core: usize) -> Option<Frame> {
        let mut list = self.lists[core].lock();
        // SAFETY: the list lock is held; links of listed frames are untouched.
        unsafe { list.pop(self.mapper) }
    }

    /// Visits the other lists, starting after `core` and wrapping around.
    fn steal(&self, core: usize) -> Option<Frame> {
        let frame = (1..NCPU)
            .map(|step| (core + step) % NCPU)
            .find_map(|victim| self.pop_from(victim))?;
        trace!("hart {core} stole {frame}");
        Some(frame)
    }

    /// Index of `frame` in the reference table.
    ///
    /// # Panics
    /// If `frame` is outside the managed range.
    #[allow(clippy::cast_possible_truncation)]
    fn index_of(&self, frame: Frame) -> usize {
        let pa = frame.base();
        assert!(
            pa >= self.start && pa < self.end,
            "{pa} is not a managed frame"
        );
        ((pa - self.start) / PAGE_SIZE) as usize
    }
}

impl<M: PhysMapper, C: CurrentCore, const FRAMES: usize> FrameAlloc
    for FrameAllocator<'_, M, C, FRAMES>
{
    #[inline]
    fn alloc_4k(&self) -> Option<Frame> {
        self.allocate()
    }

    #[inline]
    fn free_4k(&self, frame: Frame) {
        self.free(frame);
    }

    #[inline]
    fn add_reference(&self, frame: Frame) {
        Self::add_reference(self, frame);
    }

    #[inline]
    fn ref_count(&self, frame: Frame) -> u16 {
        Self::ref_count(self, frame)
    }
}
