//! # Memory Layout

use kernel_memory_addresses::{PageSize, Size4K};

/// Bytes per page and per physical frame.
pub const PAGE_SIZE: u64 = Size4K::SIZE;

/// One bit less than the Sv39 maximum, so that addresses never need sign
/// extension.
pub const MAXVA: u64 = 1 << (9 + 9 + 9 + 12 - 1);

/// Where the boot ROM jumps to and the kernel image begins.
pub const KERNBASE: u64 = 0x8000_0000;

/// End of the RAM used by the kernel and user pages.
pub const PHYSTOP: u64 = KERNBASE + 128 * 1024 * 1024;

/// The trampoline page, mapped at the highest address in both user and
/// kernel space.
pub const TRAMPOLINE: u64 = MAXVA - PAGE_SIZE;

/// The per-process trap frame, directly below the trampoline in user space.
pub const TRAPFRAME: u64 = TRAMPOLINE - PAGE_SIZE;

/// Kernel stack of process slot `slot`, each surrounded by an invalid guard
/// page.
#[must_use]
pub const fn kstack(slot: u64) -> u64 {
    TRAMPOLINE - (slot + 1) * 2 * PAGE_SIZE
}

const _: () = {
    assert!(PHYSTOP > KERNBASE);
    assert!(PHYSTOP.is_multiple_of(PAGE_SIZE));
    assert!(TRAMPOLINE.is_multiple_of(PAGE_SIZE));
    assert!(kstack(0) + PAGE_SIZE < TRAMPOLINE);
};
