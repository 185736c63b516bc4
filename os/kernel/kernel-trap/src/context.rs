use core::sync::atomic::{AtomicBool, Ordering};

use kernel_alloc::{FrameAlloc, PhysMapper};
use kernel_syscall::TrapFrame;
use kernel_vmem::AddressSpace;
use log::warn;

use crate::AlarmState;

/// The parts of the running process a user trap touches.
pub struct UserContext<'a, 'm, M: PhysMapper, A: FrameAlloc> {
    pub pid: u32,
    pub trap_frame: &'a mut TrapFrame,
    pub alarm: &'a mut AlarmState,
    pub space: &'a AddressSpace<'m, M, A>,
    /// Set by `kill` from any hart; observed at trap checkpoints.
    pub killed: &'a AtomicBool,
    /// Calls selected by the process's `trace` mask are logged.
    pub trace_mask: u64,
    /// Top of this process's kernel stack.
    pub kernel_stack_top: u64,
}

impl<M: PhysMapper, A: FrameAlloc> UserContext<'_, '_, M, A> {
    #[inline]
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        warn!("pid {} killed", self.pid);
        self.killed.store(true, Ordering::Release);
    }
}
