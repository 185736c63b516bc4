//! # Virtual Memory Support
//!
//! RISC-V Sv39 page tables for a small multi-hart kernel.
//!
//! ## What you get
//! - [`PageTableEntry`]: the raw 64-bit entry as a bitfield, including the
//!   software copy-on-write tag.
//! - [`PageTable`]: a 4 KiB-aligned table of 512 entries and the
//!   [`TableIndex`] helpers to address it.
//! - [`AddressSpace`]: one page-table tree with walk, map, unmap, translate,
//!   clone and teardown, plus the user-memory copy helpers.
//! - Kernel page tables ([`AddressSpace::create_kernel`], [`KernelLayout`])
//!   and the mirror of user memory into a per-process kernel table.
//! - The [`cow`] resolver for write faults on shared pages.
//!
//! ## Sv39 Virtual Address → Physical Address Walk
//!
//! Only the low 39 bits of a virtual address are translated; the kernel never
//! uses addresses at or above [`MAXVA`](kernel_info::memory::MAXVA)
//! (`1 << 38`), which keeps bit 38 clear and avoids the sign-extension
//! requirement.
//!
//! ```text
//! | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |  L2   |  L1   |  L0   | Offset |
//! ```
//!
//! ```text
//!  satp.PPN → L2 table → L1 table → L0 table → Physical Page
//!                │          │          │
//!                │          │          └───► leaf entry (R, W or X set) → 4 KiB page
//!                │          └──────────────► non-leaf entry → L0 table
//!                └─────────────────────────► non-leaf entry → L1 table
//! ```
//!
//! Superpages (leaves at L1 or L2) are never created.
//!
//! ### Leaf vs. non-leaf entries
//!
//! | V | R/W/X | Meaning |
//! |---|-------|---------|
//! | 0 | any   | invalid |
//! | 1 | none  | pointer to the next table |
//! | 1 | some  | leaf mapping a data frame |
//!
//! ### Fixed high mappings
//!
//! Every user address space maps the trampoline page at
//! [`TRAMPOLINE`](kernel_info::memory::TRAMPOLINE) (kernel R|X, identical in
//! all spaces) and the process's trap frame right below it at
//! [`TRAPFRAME`](kernel_info::memory::TRAPFRAME) (kernel R|W).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod address_space;
pub mod cow;
mod entry;
mod error;
pub mod page_table;

pub use crate::address_space::{AddressSpace, CloneMode, KernelLayout};
pub use crate::entry::PageTableEntry;
pub use crate::error::{CowError, VmemError, WalkError};
pub use crate::page_table::{PageTable, TableIndex};
