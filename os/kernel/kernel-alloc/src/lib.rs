//! # Physical Frame Allocation
//!
//! This crate owns physical memory: every 4 KiB frame between the end of the
//! kernel image and `PHYSTOP` is either on exactly one free list or mapped by
//! one or more leaf page-table entries, and the reference count recorded
//! here equals the number of such entries.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              kernel-vmem (page tables, COW)         │
//! └─────────────────┬───────────────────────────────────┘
//!                   │ FrameAlloc / PhysMapper
//! ┌─────────────────▼───────────────────────────────────┐
//! │           FrameAllocator (this crate)               │
//! │    • per-hart free lists, stealing on empty         │
//! │    • reference counts under their own lock          │
//! │    • fill patterns on alloc and free                │
//! └─────────────────┬───────────────────────────────────┘
//!                   │ PhysMapper
//! ┌─────────────────▼───────────────────────────────────┐
//! │      physical RAM (direct map, or PhysArena)        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! * [`frame_alloc::FrameAllocator`]: the allocator. Instances are passed by
//!   reference; there is no global state, so tests build isolated ones.
//! * [`frame_alloc::FrameAlloc`]: the interface the page-table code uses.
//! * [`phys_mapper::PhysMapper`]: how physical memory is touched.
//! * `host` (feature `host`): an in-memory arena and fake hart ids.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_alloc::frame_alloc::{FrameAllocator, HartCore};
//! use kernel_alloc::phys_mapper::DirectPhysMapper;
//!
//! let mut frames = FrameAllocator::new(&DirectPhysMapper, HartCore);
//! frames.init(kernel_end, PhysicalAddress::new(PHYSTOP));
//! let frame = frames.allocate().expect("out of memory");
//! frames.free(frame);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(all(feature = "host", not(test)))]
extern crate std;

pub mod frame_alloc;
mod free_list;
#[cfg(any(test, feature = "host"))]
pub mod host;
pub mod phys_mapper;

pub use frame_alloc::{CurrentCore, Frame, FrameAlloc, FrameAllocator};
pub use phys_mapper::PhysMapper;
