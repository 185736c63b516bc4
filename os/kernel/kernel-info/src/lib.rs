//! # Kernel Configuration
//!
//! Memory layout constants and device wiring for the QEMU `virt` RISC-V
//! machine, shared by the frame allocator, the page-table code and the trap
//! dispatcher.
//!
//! ## Physical layout
//!
//! ```text
//! 0x0000_1000 ┌─────────────────────────────────┐ boot ROM (QEMU)
//! 0x0200_0000 ├─────────────────────────────────┤ CLINT
//! 0x0C00_0000 ├─────────────────────────────────┤ PLIC
//! 0x1000_0000 ├─────────────────────────────────┤ UART0
//! 0x1000_1000 ├─────────────────────────────────┤ VIRTIO0
//! KERNBASE    ├─────────────────────────────────┤ 0x8000_0000
//!             │  kernel text and data           │
//! end         ├─────────────────────────────────┤
//!             │  frames managed by the          │
//!             │  frame allocator                │
//! PHYSTOP     └─────────────────────────────────┘ KERNBASE + 128 MiB
//! ```
//!
//! ## Virtual layout (every address space)
//!
//! ```text
//! MAXVA       ┌─────────────────────────────────┐ 1 << 38
//! TRAMPOLINE  ├─────────────────────────────────┤ shared trampoline page
//! TRAPFRAME   ├─────────────────────────────────┤ per-process trap frame
//!             │  (kernel only: KSTACK(p) pages  │
//!             │   with guard pages in between)  │
//!             │                                 │
//!             │  user heap, stack, data, text   │
//! 0x0         └─────────────────────────────────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod devices;
pub mod memory;

/// Maximum number of harts the kernel supports.
pub const NCPU: usize = 8;
