#[cfg(all(feature = "asm", target_arch = "riscv64"))]
use crate::LoadRegisterUnsafe;
use bitfield_struct::bitfield;

/// `scause`: Supervisor Cause Register.
///
/// The top bit distinguishes asynchronous interrupts from synchronous
/// exceptions; the remaining bits hold the cause code.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Scause {
    /// Bits 0–62: exception or interrupt code.
    #[bits(63)]
    pub code: u64,

    /// Bit 63: set for interrupts.
    pub interrupt: bool,
}

impl Scause {
    /// Environment call from U-mode.
    pub const USER_ECALL: u64 = 8;
    pub const INSTRUCTION_PAGE_FAULT: u64 = 12;
    pub const LOAD_PAGE_FAULT: u64 = 13;
    /// Store/AMO page fault.
    pub const STORE_PAGE_FAULT: u64 = 15;

    /// Supervisor software interrupt, raised by the machine-mode timer handler.
    pub const SUPERVISOR_SOFTWARE: u64 = 1;
    /// Supervisor external interrupt, via the PLIC.
    pub const SUPERVISOR_EXTERNAL: u64 = 9;

    #[inline]
    #[must_use]
    pub const fn exception(code: u64) -> Self {
        Self::new().with_code(code)
    }

    #[inline]
    #[must_use]
    pub const fn interrupt_of(code: u64) -> Self {
        Self::new().with_code(code).with_interrupt(true)
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl LoadRegisterUnsafe for Scause {
    #[inline]
    unsafe fn load_unsafe() -> Self {
        let bits: u64;
        unsafe {
            core::arch::asm!("csrr {}, scause", out(reg) bits, options(nomem, nostack));
        }
        Self::from_bits(bits)
    }
}
