//! # Devices on the QEMU `virt` machine

/// 16550 UART registers.
pub const UART0: u64 = 0x1000_0000;

/// PLIC source id of the UART.
pub const UART0_IRQ: u32 = 10;

/// virtio MMIO block device.
pub const VIRTIO0: u64 = 0x1000_1000;

/// PLIC source id of the virtio disk.
pub const VIRTIO0_IRQ: u32 = 1;

/// Core-local interruptor, which contains the machine timer.
pub const CLINT: u64 = 0x0200_0000;
pub const CLINT_SIZE: u64 = 0x1_0000;

/// Cycles since boot.
pub const CLINT_MTIME: u64 = CLINT + 0xBFF8;

/// Timer compare register of `hart`.
#[must_use]
pub const fn clint_mtimecmp(hart: u64) -> u64 {
    CLINT + 0x4000 + 8 * hart
}

/// Platform-level interrupt controller.
pub const PLIC: u64 = 0x0C00_0000;
pub const PLIC_SIZE: u64 = 0x40_0000;
pub const PLIC_PRIORITY: u64 = PLIC;
pub const PLIC_PENDING: u64 = PLIC + 0x1000;

/// Supervisor-mode enable bits of `hart`.
#[must_use]
pub const fn plic_senable(hart: u64) -> u64 {
    PLIC + 0x2080 + hart * 0x100
}

/// Supervisor-mode priority threshold of `hart`.
#[must_use]
pub const fn plic_spriority(hart: u64) -> u64 {
    PLIC + 0x20_1000 + hart * 0x2000
}

/// Supervisor-mode claim/complete register of `hart`.
#[must_use]
pub const fn plic_sclaim(hart: u64) -> u64 {
    PLIC + 0x20_1004 + hart * 0x2000
}
