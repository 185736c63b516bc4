#[cfg(all(feature = "asm", target_arch = "riscv64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

/// Translation mode held in `satp[63:60]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum SatpMode {
    Bare = 0,
    Sv39 = 8,
    Sv48 = 9,
}

impl SatpMode {
    const fn into_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(value: u8) -> Self {
        match value {
            8 => Self::Sv39,
            9 => Self::Sv48,
            _ => Self::Bare,
        }
    }
}

/// `satp`: Supervisor Address Translation and Protection.
///
/// Holds the physical page number of the root page table, the ASID and the
/// translation mode.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Satp {
    /// Bits 0–43: PPN of the root page table.
    #[bits(44)]
    pub ppn: u64,

    /// Bits 44–59: address-space identifier.
    #[bits(16)]
    pub asid: u16,

    /// Bits 60–63: translation mode.
    #[bits(4)]
    pub mode: SatpMode,
}

impl Satp {
    /// Sv39 translation rooted at `root`, ASID 0.
    #[must_use]
    pub const fn sv39(root: PhysicalPage<Size4K>) -> Self {
        Self::new().with_mode(SatpMode::Sv39).with_ppn(root.ppn())
    }

    /// Physical address of the root page table.
    #[must_use]
    pub const fn root(self) -> PhysicalAddress {
        PhysicalPage::<Size4K>::from_ppn(self.ppn()).base()
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl LoadRegisterUnsafe for Satp {
    #[inline]
    unsafe fn load_unsafe() -> Self {
        let bits: u64;
        unsafe {
            core::arch::asm!("csrr {}, satp", out(reg) bits, options(nomem, nostack));
        }
        Self::from_bits(bits)
    }
}

#[cfg(all(feature = "asm", target_arch = "riscv64"))]
impl StoreRegisterUnsafe for Satp {
    /// Switches the page table and flushes stale TLB entries.
    #[inline]
    unsafe fn store_unsafe(self) {
        let bits = self.into_bits();
        unsafe {
            core::arch::asm!("sfence.vma zero, zero", options(nostack));
            core::arch::asm!("csrw satp, {}", in(reg) bits, options(nostack));
            core::arch::asm!("sfence.vma zero, zero", options(nostack));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sv39_encoding() {
        let root = PhysicalAddress::new(0x8765_4000).page::<Size4K>();
        let satp = Satp::sv39(root);
        assert_eq!(satp.into_bits(), (8 << 60) | 0x87654);
        assert_eq!(satp.mode(), SatpMode::Sv39);
        assert_eq!(satp.root(), PhysicalAddress::new(0x8765_4000));
    }
}
