use core::mem::offset_of;

/// Per-process save area for user registers, mapped at `TRAPFRAME` in the
/// user address space just below the trampoline.
///
/// The trampoline saves and restores registers by fixed offsets, so the
/// layout must not change. The first five words are written by the kernel
/// on every return to user space and read back by the trampoline on the
/// next entry.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct TrapFrame {
    /// `satp` of the kernel page table.
    pub kernel_satp: u64,
    /// Top of the process's kernel stack.
    pub kernel_sp: u64,
    /// Address of the user-trap handler.
    pub kernel_trap: u64,
    /// Saved user program counter.
    pub epc: u64,
    /// Hart id, restored into `tp`.
    pub kernel_hartid: u64,
    pub ra: u64,
    pub sp: u64,
    pub gp: u64,
    pub tp: u64,
    pub t0: u64,
    pub t1: u64,
    pub t2: u64,
    pub s0: u64,
    pub s1: u64,
    pub a0: u64,
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
    pub a4: u64,
    pub a5: u64,
    pub a6: u64,
    pub a7: u64,
    pub s2: u64,
    pub s3: u64,
    pub s4: u64,
    pub s5: u64,
    pub s6: u64,
    pub s7: u64,
    pub s8: u64,
    pub s9: u64,
    pub s10: u64,
    pub s11: u64,
    pub t3: u64,
    pub t4: u64,
    pub t5: u64,
    pub t6: u64,
}

const _: () = {
    assert!(size_of::<TrapFrame>() == 288);
    assert!(offset_of!(TrapFrame, kernel_satp) == 0);
    assert!(offset_of!(TrapFrame, kernel_sp) == 8);
    assert!(offset_of!(TrapFrame, kernel_trap) == 16);
    assert!(offset_of!(TrapFrame, epc) == 24);
    assert!(offset_of!(TrapFrame, kernel_hartid) == 32);
    assert!(offset_of!(TrapFrame, ra) == 40);
    assert!(offset_of!(TrapFrame, sp) == 48);
    assert!(offset_of!(TrapFrame, a0) == 112);
    assert!(offset_of!(TrapFrame, a7) == 168);
    assert!(offset_of!(TrapFrame, s2) == 176);
    assert!(offset_of!(TrapFrame, t3) == 256);
    assert!(offset_of!(TrapFrame, t6) == 280);
};

impl TrapFrame {
    /// Width of `ecall`; the resume address moves past it after a call.
    pub const ECALL_WIDTH: u64 = 4;

    /// The `n`-th system call argument register (`a0..=a5`).
    ///
    /// # Panics
    /// If `n > 5`.
    #[must_use]
    pub const fn arg_raw(&self, n: usize) -> u64 {
        match n {
            0 => self.a0,
            1 => self.a1,
            2 => self.a2,
            3 => self.a3,
            4 => self.a4,
            5 => self.a5,
            _ => panic!("argraw: no argument register"),
        }
    }

    /// The call number in `a7`.
    #[inline]
    #[must_use]
    pub const fn syscall_number(&self) -> u64 {
        self.a7
    }

    /// Skips the `ecall` so the process resumes after it.
    #[inline]
    pub const fn advance_past_ecall(&mut self) {
        self.epc += Self::ECALL_WIDTH;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_come_from_a_registers() {
        let tf = TrapFrame {
            a0: 10,
            a1: 11,
            a2: 12,
            a3: 13,
            a4: 14,
            a5: 15,
            a6: 16,
            ..TrapFrame::default()
        };
        let args: Vec<_> = (0..6).map(|n| tf.arg_raw(n)).collect();
        assert_eq!(args, [10, 11, 12, 13, 14, 15]);
    }

    #[test]
    #[should_panic(expected = "argraw")]
    fn seventh_argument_does_not_exist() {
        let _ = TrapFrame::default().arg_raw(6);
    }

    #[test]
    fn ecall_is_skipped() {
        let mut tf = TrapFrame {
            epc: 0x1000,
            ..TrapFrame::default()
        };
        tf.advance_past_ecall();
        assert_eq!(tf.epc, 0x1004);
    }
}
