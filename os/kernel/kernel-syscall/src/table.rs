use log::{info, trace, warn};

use crate::{Sysno, TrapFrame};

/// A system call implementation. It sees only the caller's saved registers;
/// the return value lands in `a0`.
pub type SyscallHandler = fn(&mut TrapFrame) -> u64;

/// Value returned for calls without a handler (`-1` as seen by user code).
pub const UNKNOWN_SYSCALL: u64 = u64::MAX;

#[allow(clippy::cast_possible_truncation)]
const SLOTS: usize = Sysno::MAX as usize + 1;

/// Handlers indexed by call number.
#[derive(Clone)]
pub struct SyscallTable {
    handlers: [Option<SyscallHandler>; SLOTS],
}

impl Default for SyscallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SyscallTable {
    /// A table without any handlers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: [None; SLOTS],
        }
    }

    /// Builder form of [`register`](Self::register), usable in constants.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with(mut self, sysno: Sysno, handler: SyscallHandler) -> Self {
        self.handlers[sysno.number() as usize] = Some(handler);
        self
    }

    /// Installs `handler` for `sysno`, replacing any previous one.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn register(&mut self, sysno: Sysno, handler: SyscallHandler) {
        self.handlers[sysno.number() as usize] = Some(handler);
    }

    /// The handler for call number `number`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn handler(&self, number: u64) -> Option<SyscallHandler> {
        let sysno = Sysno::from_number(number)?;
        self.handlers[sysno.number() as usize]
    }

    /// Runs the call named by `a7` and stores its result in `a0`.
    ///
    /// Unknown numbers are logged and answered with [`UNKNOWN_SYSCALL`].
    pub fn dispatch(&self, tf: &mut TrapFrame) {
        let number = tf.syscall_number();
        tf.a0 = match self.handler(number) {
            Some(handler) => {
                let ret = handler(tf);
                if let Some(sysno) = Sysno::from_number(number) {
                    trace!("syscall {sysno} -> {ret:#x}");
                }
                ret
            }
            None => {
                warn!("unknown sys call {number}");
                UNKNOWN_SYSCALL
            }
        };
    }

    /// [`dispatch`](Self::dispatch) for a process that installed a `trace`
    /// mask. Calls selected by `mask` are logged with `pid`, their name
    /// and the value left in `a0`.
    ///
    /// Returns whether the call was traced.
    pub fn dispatch_traced(&self, tf: &mut TrapFrame, pid: u32, mask: u64) -> bool {
        let sysno = Sysno::from_number(tf.syscall_number());
        self.dispatch(tf);
        match sysno {
            Some(sysno) if sysno.is_traced(mask) => {
                #[allow(clippy::cast_possible_wrap)]
                let ret = tf.a0 as i64;
                info!("{pid}: syscall {sysno} -> {ret}");
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn getpid(_: &mut TrapFrame) -> u64 {
        42
    }

    fn add(tf: &mut TrapFrame) -> u64 {
        tf.arg_raw(0) + tf.arg_raw(1)
    }

    const TABLE: SyscallTable = SyscallTable::new()
        .with(Sysno::Getpid, getpid)
        .with(Sysno::Write, add);

    fn frame(a7: u64, a0: u64, a1: u64) -> TrapFrame {
        TrapFrame {
            a0,
            a1,
            a7,
            ..TrapFrame::default()
        }
    }

    #[test]
    fn result_lands_in_a0() {
        let mut tf = frame(Sysno::Getpid.number(), 7, 0);
        TABLE.dispatch(&mut tf);
        assert_eq!(tf.a0, 42);

        let mut tf = frame(Sysno::Write.number(), 40, 2);
        TABLE.dispatch(&mut tf);
        assert_eq!(tf.a0, 42);
        assert_eq!(tf.a1, 2);
    }

    #[test]
    fn unknown_and_unregistered_calls_return_minus_one() {
        for number in [0, Sysno::Fork.number(), 26, u64::MAX] {
            let mut tf = frame(number, 5, 0);
            TABLE.dispatch(&mut tf);
            assert_eq!(tf.a0 as i64, -1);
        }
    }

    #[test]
    fn register_replaces_handler() {
        let mut table = TABLE;
        table.register(Sysno::Getpid, add);
        let mut tf = frame(Sysno::Getpid.number(), 1, 2);
        table.dispatch(&mut tf);
        assert_eq!(tf.a0, 3);
    }

    #[test]
    fn masked_calls_are_traced() {
        let mask = 1 << Sysno::Getpid.number();
        let mut tf = frame(Sysno::Getpid.number(), 0, 0);
        assert!(TABLE.dispatch_traced(&mut tf, 3, mask));
        assert_eq!(tf.a0, 42);

        let mut tf = frame(Sysno::Write.number(), 1, 1);
        assert!(!TABLE.dispatch_traced(&mut tf, 3, mask));
        assert_eq!(tf.a0, 2);
    }

    #[test]
    fn unmasked_and_unknown_calls_are_not_traced() {
        let mut tf = frame(Sysno::Getpid.number(), 0, 0);
        assert!(!TABLE.dispatch_traced(&mut tf, 3, 0));
        assert_eq!(tf.a0, 42);

        let mut tf = frame(40, 0, 0);
        assert!(!TABLE.dispatch_traced(&mut tf, 3, u64::MAX));
        assert_eq!(tf.a0, UNKNOWN_SYSCALL);
    }

    #[test]
    fn unregistered_traced_call_still_fails() {
        let mut tf = frame(Sysno::Fork.number(), 0, 0);
        assert!(TABLE.dispatch_traced(&mut tf, 1, 1 << Sysno::Fork.number()));
        assert_eq!(tf.a0, UNKNOWN_SYSCALL);
    }
}
