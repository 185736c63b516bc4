//! What the dispatcher needs from the machine and from the rest of the
//! kernel. The kernel binary wires in the RISC-V implementations and its
//! scheduler; tests substitute recording fakes.

use kernel_registers::{Satp, Scause, Sstatus};
use kernel_sync::SpinLockGuard;

/// Trap-related state of the current hart.
pub trait Hart {
    /// Hart index, as kept in `tp`.
    fn id(&self) -> usize;
    fn scause(&self) -> Scause;
    fn stval(&self) -> u64;
    fn sepc(&self) -> u64;
    fn set_sepc(&self, pc: u64);
    fn sstatus(&self) -> Sstatus;
    fn set_sstatus(&self, value: Sstatus);
    fn set_stvec(&self, vector: u64);
    /// The page table currently in use (the kernel's, inside a trap).
    fn satp(&self) -> Satp;
    /// Acknowledge the software interrupt that carries timer ticks.
    fn clear_ssip(&self);
    fn enable_interrupts(&self);
    fn disable_interrupts(&self);

    fn interrupts_enabled(&self) -> bool {
        self.sstatus().sie()
    }
}

/// Claim/complete protocol of the platform interrupt controller.
pub trait InterruptController {
    /// The highest-priority pending source, if any.
    fn claim(&self) -> Option<u32>;
    /// Tell the controller that `irq` has been serviced.
    fn complete(&self, irq: u32);
}

/// Interrupt handlers of the devices the kernel drives.
pub trait DeviceHandlers {
    fn console_interrupt(&self);
    fn disk_interrupt(&self);
}

/// The process scheduler, as far as traps are concerned.
pub trait Scheduler {
    /// Give up the hart to another runnable process.
    fn yield_now(&self);

    /// Wake every process sleeping on `channel`.
    fn wakeup(&self, channel: usize);

    /// Atomically release `guard` and sleep on `channel`; the lock is held
    /// again when this returns.
    fn sleep<'a, T>(&self, channel: usize, guard: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T>;
}

/// Everything needed to leave the kernel for user space.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UserReturn {
    /// Page table of the process being resumed.
    pub satp: Satp,
    /// Virtual address of the return stub inside the trampoline page.
    pub entry: u64,
}

/// The trampoline page, mapped at the same address in the kernel and in
/// every user address space.
pub trait Trampoline {
    /// Address of the stub that saves user registers and enters the kernel.
    fn user_vec(&self) -> u64;

    /// Address of the stub that restores user registers and executes `sret`.
    fn user_ret(&self) -> u64;

    /// Switch to the user page table, restore registers from the trap frame
    /// and return to user mode. Runs with interrupts disabled and never
    /// comes back.
    fn return_to_user(&self, ret: UserReturn) -> !;
}

/// The collaborators of one [`TrapDispatcher`](crate::TrapDispatcher).
pub trait Platform {
    type Hart: Hart;
    type Interrupts: InterruptController;
    type Devices: DeviceHandlers;
    type Scheduler: Scheduler;
    type Trampoline: Trampoline;

    fn hart(&self) -> &Self::Hart;
    fn interrupts(&self) -> &Self::Interrupts;
    fn devices(&self) -> &Self::Devices;
    fn scheduler(&self) -> &Self::Scheduler;
    fn trampoline(&self) -> &Self::Trampoline;
}
