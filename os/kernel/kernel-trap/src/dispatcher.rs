//! # Trap dispatch
//!
//! Every trap enters through one of two vectors:
//!
//! - **user vector** (trampoline `uservec` → [`TrapDispatcher::user_trap`]):
//!   registers are already saved in the trap frame, `satp` is the kernel's.
//! - **kernel vector** (`kernelvec` → [`TrapDispatcher::kernel_trap`]):
//!   taken while running kernel code; registers live on the kernel stack.
//!
//! ```text
//!   U-mode ──ecall/fault/irq──► uservec ──► user_trap ──► TrapOutcome
//!                                                │ Resume
//!                                                ▼
//!   U-mode ◄──sret── userret ◄── user_trap_return
//!
//!   S-mode ──fault/irq──► kernelvec ──► kernel_trap ──► back to sepc
//! ```
//!
//! A trap taken in the kernel must find interrupts disabled and must be a
//! device interrupt; anything else halts the hart.

use kernel_alloc::{FrameAlloc, PhysMapper};
use kernel_info::devices::{UART0_IRQ, VIRTIO0_IRQ};
use kernel_memory_addresses::VirtualAddress;
use kernel_syscall::SyscallTable;
use log::{error, trace, warn};

use crate::{
    Clock, DeviceHandlers, Hart, InterruptController, Platform, Scheduler, Trampoline, TrapCause,
    UserContext, UserReturn,
};

/// Addresses of the kernel's own trap entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrapVectors {
    /// `kernelvec`: installed in `stvec` while the hart runs kernel code.
    pub kernel_vec: u64,
    /// The function `uservec` jumps to after saving user registers; stored
    /// in each trap frame.
    pub user_trap: u64,
}

/// How a user trap ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Return to user space through [`TrapDispatcher::user_trap_return`].
    Resume,
    /// The process was killed; the caller must exit it.
    Terminate,
}

/// Result of [`TrapDispatcher::device_interrupt`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceInterrupt {
    Timer,
    External,
}

pub struct TrapDispatcher<'k, P: Platform> {
    platform: &'k P,
    syscalls: &'k SyscallTable,
    clock: &'k Clock,
    vectors: TrapVectors,
}

impl<'k, P: Platform> TrapDispatcher<'k, P> {
    pub const fn new(platform: &'k P, syscalls: &'k SyscallTable, clock: &'k Clock, vectors: TrapVectors) -> Self {
        Self {
            platform,
            syscalls,
            clock,
            vectors,
        }
    }

    #[must_use]
    pub const fn clock(&self) -> &'k Clock {
        self.clock
    }

    /// Handles an interrupt, exception or system call from user space.
    ///
    /// # Panics
    /// If the trap did not come from user mode.
    pub fn user_trap<M: PhysMapper, A: FrameAlloc>(&self, ctx: &mut UserContext<'_, '_, M, A>) -> TrapOutcome {
        let hart = self.platform.hart();
        assert!(!hart.sstatus().from_supervisor(), "usertrap: not from user mode");

        // Traps from here on are kernel traps.
        hart.set_stvec(self.vectors.kernel_vec);
        ctx.trap_frame.epc = hart.sepc();

        let cause = TrapCause::from(hart.scause());
        let mut timer = false;
        match cause {
            TrapCause::UserEcall => {
                if ctx.is_killed() {
                    return TrapOutcome::Terminate;
                }
                ctx.trap_frame.advance_past_ecall();
                // sepc, scause and sstatus are saved, so interrupts may
                // return now.
                hart.enable_interrupts();
                self.syscalls.dispatch_traced(ctx.trap_frame, ctx.pid, ctx.trace_mask);
            }
            TrapCause::StorePageFault if ctx.space.is_cow(VirtualAddress::new(hart.stval())) => {
                let va = VirtualAddress::new(hart.stval());
                if let Err(err) = ctx.space.resolve_cow(va) {
                    warn!("usertrap: pid {}: {err}", ctx.pid);
                    ctx.kill();
                }
            }
            _ => match self.device_interrupt(cause) {
                Some(DeviceInterrupt::Timer) => timer = true,
                Some(DeviceInterrupt::External) => {}
                None => {
                    warn!(
                        "usertrap: unexpected scause {cause} pid={} sepc={:#x} stval={:#x}",
                        ctx.pid,
                        hart.sepc(),
                        hart.stval()
                    );
                    ctx.kill();
                }
            },
        }

        if ctx.is_killed() {
            return TrapOutcome::Terminate;
        }

        if timer {
            if ctx.alarm.on_tick(ctx.trap_frame) {
                trace!("pid {}: alarm delivered", ctx.pid);
            }
            self.platform.scheduler().yield_now();
        }

        TrapOutcome::Resume
    }

    /// Prepares the hart for `sret` into the process described by `ctx`
    /// and returns what the trampoline needs to finish the switch.
    ///
    /// Interrupts are disabled here and stay disabled until user mode.
    pub fn user_trap_return<M: PhysMapper, A: FrameAlloc>(&self, ctx: &mut UserContext<'_, '_, M, A>) -> UserReturn {
        let hart = self.platform.hart();
        let trampoline = self.platform.trampoline();

        // stvec is about to point at the user vector, which must not be
        // entered from kernel mode.
        hart.disable_interrupts();
        hart.set_stvec(trampoline.user_vec());

        let tf = &mut *ctx.trap_frame;
        tf.kernel_satp = hart.satp().into_bits();
        tf.kernel_sp = ctx.kernel_stack_top;
        tf.kernel_trap = self.vectors.user_trap;
        tf.kernel_hartid = hart.id() as u64;

        hart.set_sstatus(hart.sstatus().for_user_return());
        hart.set_sepc(tf.epc);

        UserReturn {
            satp: ctx.space.satp(),
            entry: trampoline.user_ret(),
        }
    }

    /// [`user_trap_return`](Self::user_trap_return) followed by the jump
    /// through the trampoline.
    pub fn resume_user<M: PhysMapper, A: FrameAlloc>(&self, ctx: &mut UserContext<'_, '_, M, A>) -> ! {
        let ret = self.user_trap_return(ctx);
        self.platform.trampoline().return_to_user(ret)
    }

    /// Handles a trap taken in supervisor mode. `running` tells whether a
    /// process owns the hart, in which case timer ticks preempt it.
    ///
    /// # Panics
    /// If the trap did not come from supervisor mode, if interrupts were
    /// enabled, or if it is not a device interrupt.
    pub fn kernel_trap(&self, running: bool) {
        let hart = self.platform.hart();
        let sepc = hart.sepc();
        let sstatus = hart.sstatus();
        let scause = hart.scause();

        assert!(sstatus.from_supervisor(), "kerneltrap: not from supervisor mode");
        assert!(!hart.interrupts_enabled(), "kerneltrap: interrupts enabled");

        let cause = TrapCause::from(scause);
        match self.device_interrupt(cause) {
            Some(DeviceInterrupt::Timer) if running => self.platform.scheduler().yield_now(),
            Some(_) => {}
            None => {
                error!("kerneltrap: {cause}");
                panic!(
                    "kerneltrap: scause {:#x} sepc={sepc:#x} stval={:#x}",
                    scause.into_bits(),
                    hart.stval()
                );
            }
        }

        // Yielding may have taken other traps; restore for kernelvec's sret.
        hart.set_sepc(sepc);
        hart.set_sstatus(sstatus);
    }

    /// Services a timer or external interrupt. Returns `None` if `cause` is
    /// not a device interrupt.
    pub fn device_interrupt(&self, cause: TrapCause) -> Option<DeviceInterrupt> {
        match cause {
            TrapCause::External => {
                let plic = self.platform.interrupts();
                if let Some(irq) = plic.claim() {
                    match irq {
                        UART0_IRQ => self.platform.devices().console_interrupt(),
                        VIRTIO0_IRQ => self.platform.devices().disk_interrupt(),
                        other => warn!("unexpected interrupt irq={other}"),
                    }
                    plic.complete(irq);
                }
                Some(DeviceInterrupt::External)
            }
            TrapCause::Timer => {
                let hart = self.platform.hart();
                if hart.id() == 0 {
                    self.clock.tick(self.platform.scheduler());
                }
                hart.clear_ssip();
                Some(DeviceInterrupt::Timer)
            }
            _ => None,
        }
    }
}
