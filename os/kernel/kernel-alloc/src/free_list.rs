use kernel_memory_addresses::PhysicalPage;

use crate::frame_alloc::Frame;
use crate::phys_mapper::PhysMapper;

/// Header stored at the beginning of every **free** frame.
///
/// ```text
/// +----------------------+------------------------------+
/// | FreeFrame (8 bytes)  |  free-fill pattern (0x01)    |
/// +----------------------+------------------------------+
/// ^ frame base                                   frame end ^
/// ```
///
/// `next` is the physical page number of the next free frame, or `0` for the
/// end of the list. Frame 0 never holds RAM on the `virt` machine.
#[repr(C)]
struct FreeFrame {
    next: u64,
}

/// A LIFO chain of free frames, linked through the frames' own memory.
///
/// The list only stores the head; every other link lives in the free frame
/// it describes and is reached through a [`PhysMapper`].
///
/// # Invariants
/// - Every frame on the list is exclusively owned by the list.
/// - `len` equals the number of frames reachable from `head`.
pub(crate) struct FreeList {
    head: Option<Frame>,
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Links `frame` in as the new head.
    ///
    /// # Safety
    /// `frame` must be owned by the caller and must not be on any list.
    pub(crate) unsafe fn push<M: PhysMapper>(&mut self, mapper: &M, frame: Frame) {
        let node = unsafe { mapper.phys_to_mut::<FreeFrame>(frame.base()) };
        node.next = self.head.map_or(0, PhysicalPage::ppn);
        self.head = Some(frame);
        self.len += 1;
    }

    /// Unlinks and returns the head frame.
    ///
    /// # Safety
    /// The list invariants must hold; the links of all listed frames must be
    /// intact.
    pub(crate) unsafe fn pop<M: PhysMapper>(&mut self, mapper: &M) -> Option<Frame> {
        let frame = self.head?;
        let node = unsafe { mapper.phys_to_mut::<FreeFrame>(frame.base()) };
        self.head = match node.next {
            0 => None,
            ppn => Some(Frame::from_ppn(ppn)),
        };
        self.len -= 1;
        Some(frame)
    }
}
