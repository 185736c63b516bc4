#[cfg(all(feature = "asm", target_arch = "riscv64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;

/// `sstatus`: Supervisor Status Register.
///
/// Only the fields the kernel touches are exposed; everything else is kept
/// as opaque padding so that a read-modify-write round trip preserves it.
#[bitfield(u64)]
pub struct Sstatus {
    #[bits(1)]
    __r0: u8,

    /// Bit 1 (SIE): supervisor interrupts enabled.
    pub sie: bool,

    #[bits(3)]
    __r2: u8,

    /// Bit 5 (SPIE): interrupts were enabled before the last trap; restored
    /// into SIE by `sret`.
    pub spie: bool,

    /// Bit 6 (UBE): user-mode big endian.
    pub ube: bool,

    #[bits(1)]
    __r7: u8,

    /// Bit 8 (SPP): previous privilege mode, `true` = supervisor.
    pub spp: bool,

    #[bits(9)]
    __r9: u16,

    /// Bit 18 (SUM): permit supervisor access to user pages.
    pub sum: bool,

    /// Bit 19 (MXR): make executable pages readable.
    pub mxr: bool,

    #[bits(44)]
    __r20: u64,
}

impl Sstatus {
    /// Whether the trap was taken from supervisor mode.
    #[inline]
    #[must_use]
    pub const fn from_supervisor(self) -> bool {
        self.spp()
    }

    /// Prepares the value for an `sret` into user mode with interrupts enabled.
    #[inline]
    #[must_use]
    pub const fn for_user_return(self) -> Self {
        self.with_spp(false).with_spie(true)
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl LoadRegisterUnsafe for Sstatus {
    #[inline]
    unsafe fn load_unsafe() -> Self {
        let bits: u64;
        unsafe {
            core::arch::asm!("csrr {}, sstatus", out(reg) bits, options(nomem, nostack));
        }
        Self::from_bits(bits)
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl StoreRegisterUnsafe for Sstatus {
    #[inline]
    unsafe fn store_unsafe(self) {
        let bits = self.into_bits();
        unsafe {
            core::arch::asm!("csrw sstatus, {}", in(reg) bits, options(nostack));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions() {
        assert_eq!(Sstatus::new().with_sie(true).into_bits(), 1 << 1);
        assert_eq!(Sstatus::new().with_spie(true).into_bits(), 1 << 5);
        assert_eq!(Sstatus::new().with_spp(true).into_bits(), 1 << 8);
        assert_eq!(Sstatus::new().with_sum(true).into_bits(), 1 << 18);
    }

    #[test]
    fn user_return_clears_spp_and_sets_spie() {
        let s = Sstatus::from_bits((1 << 8) | (1 << 13)).for_user_return();
        assert!(!s.spp());
        assert!(s.spie());
        // unrelated bits survive
        assert_eq!(s.into_bits() & (1 << 13), 1 << 13);
    }
}
