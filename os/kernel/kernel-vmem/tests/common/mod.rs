#![allow(dead_code)]

use kernel_alloc::host::{FixedCore, PhysArena};
use kernel_alloc::{Frame, FrameAllocator};
use kernel_memory_addresses::PhysicalAddress;

pub const BASE: u64 = 0x8000_0000;
pub const ARENA_FRAMES: usize = 64;

pub type Frames<'m> = FrameAllocator<'m, PhysArena, FixedCore, ARENA_FRAMES>;

pub fn arena() -> PhysArena {
    PhysArena::new(PhysicalAddress::new(BASE), ARENA_FRAMES)
}

pub fn frames(arena: &PhysArena) -> Frames<'_> {
    let mut frames = FrameAllocator::new(arena, FixedCore(0));
    frames.init(arena.start(), arena.end());
    frames
}

/// Allocates until only `left` frames remain free.
pub fn drain_to(frames: &Frames<'_>, left: usize) -> Vec<Frame> {
    let mut held = Vec::new();
    while frames.free_count() > left {
        held.push(frames.allocate().expect("frame"));
    }
    held
}
