//! Interrupt masking for the current hart.
//!
//! Masking nests. Every [`push_off`] must be matched by a [`pop_off`], and
//! only the outermost `pop_off` restores the interrupt state that the first
//! `push_off` found. Locks may therefore be released in any order.

use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// RAII form of [`push_off`] / [`pop_off`].
///
/// The guard is tied to the hart that created it and cannot be sent to
/// another thread.
pub struct IrqGuard {
    _hart_local: PhantomData<*const ()>,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        push_off();
        Self {
            _hart_local: PhantomData,
        }
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        pop_off();
    }
}

/// Interrupt-off nesting of one hart. Only touched with interrupts
/// disabled, by the hart it belongs to.
struct Nesting {
    depth: AtomicUsize,
    /// SIE as seen by the outermost `push_off`.
    were_enabled: AtomicBool,
}

impl Nesting {
    const fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
            were_enabled: AtomicBool::new(false),
        }
    }

    fn push(&self, enabled: bool) {
        if self.depth.fetch_add(1, Ordering::Relaxed) == 0 {
            self.were_enabled.store(enabled, Ordering::Relaxed);
        }
    }

    /// Whether this pop ends the outermost section of a hart that had
    /// interrupts enabled.
    fn pop(&self) -> bool {
        let depth = self.depth.fetch_sub(1, Ordering::Relaxed);
        assert!(depth > 0, "pop_off: unbalanced");
        depth == 1 && self.were_enabled.load(Ordering::Relaxed)
    }
}

/// Disables interrupts on this hart and counts one more level of nesting.
pub fn push_off() {
    let enabled = interrupts_enabled();
    disable_interrupts();
    with_hart(|hart| hart.push(enabled));
}

/// Undoes one [`push_off`]. Interrupts come back on only when the outermost
/// level is left and they were on before it.
///
/// # Panics
/// If interrupts are enabled, or if there is no matching `push_off`.
pub fn pop_off() {
    assert!(!interrupts_enabled(), "pop_off: interruptible");
    if with_hart(Nesting::pop) {
        enable_interrupts();
    }
}

#[cfg(target_arch = "riscv64")]
static HARTS: [Nesting; kernel_info::NCPU] = [const { Nesting::new() }; kernel_info::NCPU];

#[cfg(target_arch = "riscv64")]
fn with_hart<R>(f: impl FnOnce(&Nesting) -> R) -> R {
    // SAFETY: the boot code stores the hart id in `tp` and kernel code
    // never changes it.
    #[allow(clippy::cast_possible_truncation)]
    let id = unsafe { kernel_registers::csr::read_tp() } as usize;
    f(&HARTS[id])
}

/// Whether supervisor interrupts are enabled on this hart.
#[cfg(target_arch = "riscv64")]
#[inline]
#[must_use]
pub fn interrupts_enabled() -> bool {
    use kernel_registers::{LoadRegisterUnsafe, Sstatus};
    unsafe { Sstatus::load_unsafe() }.sie()
}

#[cfg(target_arch = "riscv64")]
#[inline]
pub fn disable_interrupts() {
    unsafe { core::arch::asm!("csrc sstatus, {}", in(reg) 1u64 << 1, options(nostack)) }
}

#[cfg(target_arch = "riscv64")]
#[inline]
pub fn enable_interrupts() {
    unsafe { core::arch::asm!("csrs sstatus, {}", in(reg) 1u64 << 1, options(nostack)) }
}

// Host builds have no SIE. Unit tests give every thread its own simulated
// hart so nesting can be observed; other host builds keep interrupts off.

#[cfg(all(test, not(target_arch = "riscv64")))]
std::thread_local! {
    static SIE: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
    static NESTING: Nesting = const { Nesting::new() };
}

#[cfg(all(test, not(target_arch = "riscv64")))]
fn with_hart<R>(f: impl FnOnce(&Nesting) -> R) -> R {
    NESTING.with(f)
}

#[cfg(all(test, not(target_arch = "riscv64")))]
#[must_use]
pub fn interrupts_enabled() -> bool {
    SIE.with(core::cell::Cell::get)
}

#[cfg(all(test, not(target_arch = "riscv64")))]
pub fn disable_interrupts() {
    SIE.with(|sie| sie.set(false));
}

#[cfg(all(test, not(target_arch = "riscv64")))]
pub fn enable_interrupts() {
    SIE.with(|sie| sie.set(true));
}

#[cfg(all(not(test), not(target_arch = "riscv64")))]
static HOST: Nesting = Nesting::new();

#[cfg(all(not(test), not(target_arch = "riscv64")))]
fn with_hart<R>(f: impl FnOnce(&Nesting) -> R) -> R {
    f(&HOST)
}

#[cfg(all(not(test), not(target_arch = "riscv64")))]
#[inline]
#[must_use]
pub const fn interrupts_enabled() -> bool {
    false
}

#[cfg(all(not(test), not(target_arch = "riscv64")))]
#[inline]
pub const fn disable_interrupts() {}

#[cfg(all(not(test), not(target_arch = "riscv64")))]
#[inline]
pub const fn enable_interrupts() {}

#[cfg(all(test, not(target_arch = "riscv64")))]
mod tests {
    use super::*;
    use crate::SpinLock;

    #[test]
    fn out_of_order_release_keeps_interrupts_off() {
        enable_interrupts();
        let a = SpinLock::new(1);
        let b = SpinLock::new(2);

        let guard_a = a.lock();
        assert!(!interrupts_enabled());
        let guard_b = b.lock();

        drop(guard_a);
        assert!(!interrupts_enabled());
        assert!(!a.is_locked());

        drop(guard_b);
        assert!(interrupts_enabled());
    }

    #[test]
    fn masked_hart_stays_masked() {
        disable_interrupts();
        let lock = SpinLock::new(());
        let outer = lock.lock();
        let inner = IrqGuard::new();
        drop(outer);
        drop(inner);
        assert!(!interrupts_enabled());
    }

    #[test]
    fn nesting_restarts_after_the_outermost_release() {
        disable_interrupts();
        drop(IrqGuard::new());

        enable_interrupts();
        let guard = IrqGuard::new();
        assert!(!interrupts_enabled());
        drop(guard);
        assert!(interrupts_enabled());
    }

    #[test]
    #[should_panic(expected = "pop_off: interruptible")]
    fn release_with_interrupts_on_is_fatal() {
        let guard = IrqGuard::new();
        enable_interrupts();
        drop(guard);
    }

    #[test]
    #[should_panic(expected = "pop_off: unbalanced")]
    fn unmatched_pop_off_is_fatal() {
        pop_off();
    }
}
