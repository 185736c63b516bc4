//! Untyped supervisor CSRs and general-purpose registers.
//!
//! These hold plain addresses or hart ids, so they are read and written as
//! `u64` rather than through bitfield types.

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
macro_rules! csr_accessors {
    ($csr:literal, $read:ident, $write:ident) => {
        #[doc = concat!("Reads `", $csr, "`.")]
        ///
        /// # Safety
        /// Must run in S-mode.
        #[inline]
        #[must_use]
        pub unsafe fn $read() -> u64 {
            let value: u64;
            unsafe {
                core::arch::asm!(concat!("csrr {}, ", $csr), out(reg) value, options(nomem, nostack));
            }
            value
        }

        #[doc = concat!("Writes `", $csr, "`.")]
        ///
        /// # Safety
        /// Must run in S-mode; the caller is responsible for the effect of
        /// the new value on trap handling.
        #[inline]
        pub unsafe fn $write(value: u64) {
            unsafe {
                core::arch::asm!(concat!("csrw ", $csr, ", {}"), in(reg) value, options(nostack));
            }
        }
    };
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
csr_accessors!("sepc", read_sepc, write_sepc);
#[cfg(all(feature = "asm", target_arch = "riscv64"))]
csr_accessors!("stvec", read_stvec, write_stvec);
#[cfg(all(feature = "asm", target_arch = "riscv64"))]
csr_accessors!("stval", read_stval, write_stval);

/// Reads the hart id the boot code keeps in `tp`.
///
/// # Safety
/// Only meaningful in kernel code, where `tp` is never repurposed.
#[cfg(all(feature = "asm", target_arch = "riscv64"))]
#[inline]
#[must_use]
pub unsafe fn read_tp() -> u64 {
    let value: u64;
    unsafe {
        core::arch::asm!("mv {}, tp", out(reg) value, options(nomem, nostack));
    }
    value
}

/// Flushes all TLB entries of the current hart.
///
/// # Safety
/// Must run in S-mode.
#[cfg(all(feature = "asm", target_arch = "riscv64"))]
#[inline]
pub unsafe fn sfence_vma() {
    unsafe {
        core::arch::asm!("sfence.vma zero, zero", options(nostack));
    }
}
