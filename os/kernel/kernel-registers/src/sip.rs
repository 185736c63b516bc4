#[cfg(all(feature = "asm", target_arch = "riscv64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;

/// `sip`: Supervisor Interrupt Pending.
#[bitfield(u64)]
pub struct Sip {
    #[bits(1)]
    __r0: u8,

    /// Bit 1 (SSIP): supervisor software interrupt pending. The machine-mode
    /// timer handler raises it; the supervisor acknowledges by clearing it.
    pub ssip: bool,

    #[bits(3)]
    __r2: u8,

    /// Bit 5 (STIP): supervisor timer interrupt pending.
    pub stip: bool,

    #[bits(3)]
    __r6: u8,

    /// Bit 9 (SEIP): supervisor external interrupt pending.
    pub seip: bool,

    #[bits(54)]
    __r10: u64,
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl LoadRegisterUnsafe for Sip {
    #[inline]
    unsafe fn load_unsafe() -> Self {
        let bits: u64;
        unsafe {
            core::arch::asm!("csrr {}, sip", out(reg) bits, options(nomem, nostack));
        }
        Self::from_bits(bits)
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl StoreRegisterUnsafe for Sip {
    #[inline]
    unsafe fn store_unsafe(self) {
        let bits = self.into_bits();
        unsafe {
            core::arch::asm!("csrw sip, {}", in(reg) bits, options(nostack));
        }
    }
}
