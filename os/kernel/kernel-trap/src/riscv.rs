//! The live hart and the QEMU `virt` PLIC.

use kernel_info::devices::{
    PLIC_PRIORITY, UART0_IRQ, VIRTIO0_IRQ, plic_sclaim, plic_senable, plic_spriority,
};
use kernel_registers::csr::{read_sepc, read_stval, read_tp, write_sepc, write_stvec};
use kernel_registers::{LoadRegisterUnsafe, Satp, Scause, Sip, Sstatus, StoreRegisterUnsafe};

use crate::{Hart, InterruptController};

/// The hart executing the current code.
#[derive(Debug, Default, Copy, Clone)]
pub struct RiscvHart;

#[allow(clippy::cast_possible_truncation)]
impl Hart for RiscvHart {
    fn id(&self) -> usize {
        unsafe { read_tp() as usize }
    }

    fn scause(&self) -> Scause {
        unsafe { Scause::load_unsafe() }
    }

    fn stval(&self) -> u64 {
        unsafe { read_stval() }
    }

    fn sepc(&self) -> u64 {
        unsafe { read_sepc() }
    }

    fn set_sepc(&self, pc: u64) {
        unsafe { write_sepc(pc) }
    }

    fn sstatus(&self) -> Sstatus {
        unsafe { Sstatus::load_unsafe() }
    }

    fn set_sstatus(&self, value: Sstatus) {
        unsafe { value.store_unsafe() }
    }

    fn set_stvec(&self, vector: u64) {
        unsafe { write_stvec(vector) }
    }

    fn satp(&self) -> Satp {
        unsafe { Satp::load_unsafe() }
    }

    fn clear_ssip(&self) {
        unsafe { Sip::load_unsafe().with_ssip(false).store_unsafe() }
    }

    fn enable_interrupts(&self) {
        kernel_sync::irq::enable_interrupts();
    }

    fn disable_interrupts(&self) {
        kernel_sync::irq::disable_interrupts();
    }
}

/// Supervisor context of the PLIC for the current hart.
#[derive(Debug, Default, Copy, Clone)]
pub struct Plic;

impl Plic {
    /// Gives the UART and the disk a non-zero priority. Run once at boot.
    pub fn init() {
        unsafe {
            write_u32(PLIC_PRIORITY + u64::from(UART0_IRQ) * 4, 1);
            write_u32(PLIC_PRIORITY + u64::from(VIRTIO0_IRQ) * 4, 1);
        }
    }

    /// Enables both sources for the supervisor context of `hart` and
    /// accepts every priority.
    pub fn init_hart(hart: u64) {
        unsafe {
            write_u32(plic_senable(hart), (1 << UART0_IRQ) | (1 << VIRTIO0_IRQ));
            write_u32(plic_spriority(hart), 0);
        }
    }

    fn claim_register() -> u64 {
        plic_sclaim(unsafe { read_tp() })
    }
}

impl InterruptController for Plic {
    fn claim(&self) -> Option<u32> {
        match unsafe { read_u32(Self::claim_register()) } {
            0 => None,
            irq => Some(irq),
        }
    }

    fn complete(&self, irq: u32) {
        unsafe { write_u32(Self::claim_register(), irq) }
    }
}

#[allow(clippy::cast_possible_truncation)]
unsafe fn read_u32(addr: u64) -> u32 {
    unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
}

#[allow(clippy::cast_possible_truncation)]
unsafe fn write_u32(addr: u64, value: u32) {
    unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
}
