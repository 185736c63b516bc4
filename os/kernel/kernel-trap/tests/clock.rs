use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use kernel_sync::SpinLockGuard;
use kernel_trap::{Clock, Scheduler, SleepError};

/// Sleeping drops the lock and lets other threads run.
#[derive(Default)]
struct Threads {
    wakeups: AtomicUsize,
}

impl Scheduler for Threads {
    fn yield_now(&self) {
        thread::yield_now();
    }

    fn wakeup(&self, _channel: usize) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    fn sleep<'a, T>(&self, _channel: usize, guard: SpinLockGuard<'a, T>) -> SpinLockGuard<'a, T> {
        let lock = SpinLockGuard::unlock(guard);
        thread::yield_now();
        lock.lock()
    }
}

#[test]
fn ticks_count_up_and_wake_sleepers() {
    let clock = Clock::new();
    let sched = Threads::default();
    for _ in 0..3 {
        clock.tick(&sched);
    }
    assert_eq!(clock.uptime(), 3);
    assert_eq!(sched.wakeups.load(Ordering::Relaxed), 3);
}

#[test]
fn zero_ticks_return_immediately() {
    let clock = Clock::new();
    let killed = AtomicBool::new(true);
    assert_eq!(clock.sleep(&Threads::default(), 0, &killed), Ok(()));
}

#[test]
fn sleeper_wakes_after_requested_ticks() {
    let clock = Clock::new();
    let sched = Threads::default();
    let killed = AtomicBool::new(false);

    thread::scope(|s| {
        let sleeper = s.spawn(|| {
            let start = clock.uptime();
            clock.sleep(&sched, 5, &killed).map(|()| clock.uptime() - start)
        });
        while !sleeper.is_finished() {
            clock.tick(&sched);
            thread::yield_now();
        }
        let slept = sleeper.join().expect("sleeper").expect("not killed");
        assert!(slept >= 5);
    });
}

#[test]
fn killed_sleeper_gives_up() {
    let clock = Clock::new();
    let sched = Threads::default();
    let killed = AtomicBool::new(false);

    thread::scope(|s| {
        let sleeper = s.spawn(|| clock.sleep(&sched, u64::MAX, &killed));
        clock.tick(&sched);
        killed.store(true, Ordering::Release);
        while !sleeper.is_finished() {
            clock.tick(&sched);
            thread::yield_now();
        }
        assert_eq!(sleeper.join().expect("sleeper"), Err(SleepError::Killed));
    });
}
