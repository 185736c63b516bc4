use core::sync::atomic::{AtomicBool, Ordering};

use kernel_sync::SpinLock;

use crate::Scheduler;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SleepError {
    #[error("process was killed while sleeping")]
    Killed,
}

/// The global tick counter. Hart 0 advances it on every timer interrupt;
/// sleepers wait on its address.
pub struct Clock {
    ticks: SpinLock<u64>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: SpinLock::new(0),
        }
    }

    /// The sleep channel of tick waiters.
    #[must_use]
    pub fn channel(&self) -> usize {
        core::ptr::from_ref(&self.ticks).addr()
    }

    /// Advances the clock by one tick and wakes all sleepers.
    pub fn tick(&self, scheduler: &impl Scheduler) {
        let mut ticks = self.ticks.lock();
        *ticks += 1;
        scheduler.wakeup(self.channel());
    }

    /// Ticks since boot.
    #[must_use]
    pub fn uptime(&self) -> u64 {
        *self.ticks.lock()
    }

    /// Blocks until `n` ticks have passed.
    ///
    /// # Errors
    /// [`SleepError::Killed`] if `killed` is set when the sleeper wakes up.
    pub fn sleep(&self, scheduler: &impl Scheduler, n: u64, killed: &AtomicBool) -> Result<(), SleepError> {
        let mut ticks = self.ticks.lock();
        let start = *ticks;
        while *ticks - start < n {
            if killed.load(Ordering::Acquire) {
                return Err(SleepError::Killed);
            }
            ticks = scheduler.sleep(self.channel(), ticks);
        }
        Ok(())
    }
}
